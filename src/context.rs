//! Knowledge snapshot assembly
//!
//! Reads the current hotel and package listings and renders the bounded
//! knowledge block that grounds every prompt. Built fresh per request.

use crate::catalog::{CatalogError, ContactBlock, ListingStore, ListingSummary};

/// Default cap on the rendered listing portion, in characters
pub const DEFAULT_MAX_LISTING_CHARS: usize = 12_000;

/// Point-in-time listing data plus the fixed contact block
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeSnapshot {
    listings: Vec<ListingSummary>,
    contact: ContactBlock,
}

impl KnowledgeSnapshot {
    pub fn new(listings: Vec<ListingSummary>, contact: ContactBlock) -> Self {
        Self { listings, contact }
    }

    /// Read both collections concurrently and build a snapshot
    ///
    /// Either read failing fails the whole snapshot; an empty knowledge
    /// block is never produced from a failed read.
    pub async fn collect(
        store: &dyn ListingStore,
        contact: &ContactBlock,
    ) -> Result<Self, CatalogError> {
        let (hotels, packages) = futures::try_join!(store.list_hotels(), store.list_packages())?;

        let listings = hotels
            .into_iter()
            .map(ListingSummary::Hotel)
            .chain(packages.into_iter().map(ListingSummary::Package))
            .collect();

        Ok(Self::new(listings, contact.clone()))
    }

    pub fn listings(&self) -> &[ListingSummary] {
        &self.listings
    }

    pub fn hotel_count(&self) -> usize {
        self.listings.iter().filter(|l| l.is_hotel()).count()
    }

    pub fn package_count(&self) -> usize {
        self.listings.len() - self.hotel_count()
    }

    /// Render the knowledge block
    ///
    /// Layout: hotel lines, blank line, package lines, blank line, contact
    /// block. Once `max_listing_chars` would be exceeded, the remaining
    /// listing lines are dropped whole; the contact block is always kept.
    pub fn render(&self, max_listing_chars: usize) -> String {
        let mut budget = max_listing_chars;
        let mut hotels = Vec::new();
        let mut packages = Vec::new();
        let mut dropped = 0usize;

        for listing in &self.listings {
            let line = listing.render_line();
            let cost = line.chars().count() + 1;
            if dropped > 0 || cost > budget {
                dropped += 1;
                continue;
            }
            budget -= cost;
            if listing.is_hotel() {
                hotels.push(line);
            } else {
                packages.push(line);
            }
        }

        if dropped > 0 {
            tracing::warn!(
                dropped_lines = dropped,
                kept_lines = hotels.len() + packages.len(),
                max_listing_chars = max_listing_chars,
                "Knowledge block truncated to fit listing budget"
            );
        }

        format!(
            "{}\n\n{}\n\n{}",
            hotels.join("\n"),
            packages.join("\n"),
            self.contact.render()
        )
    }
}
