//! In-memory listing store
//!
//! Used by tests. Returns clones so callers can never mutate the held
//! snapshot.

use super::{CatalogError, HotelSummary, ListingStore, PackageSummary};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct StaticListingStore {
    hotels: Vec<HotelSummary>,
    packages: Vec<PackageSummary>,
}

impl StaticListingStore {
    pub fn new(hotels: Vec<HotelSummary>, packages: Vec<PackageSummary>) -> Self {
        Self { hotels, packages }
    }
}

#[async_trait]
impl ListingStore for StaticListingStore {
    async fn list_hotels(&self) -> Result<Vec<HotelSummary>, CatalogError> {
        Ok(self.hotels.clone())
    }

    async fn list_packages(&self) -> Result<Vec<PackageSummary>, CatalogError> {
        Ok(self.packages.clone())
    }
}
