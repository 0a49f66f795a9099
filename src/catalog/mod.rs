//! Read-only listing data consumed by the gateway
//!
//! Hotels and packages are owned by an external collaborator; the gateway only
//! ever asks for "all records" of each collection. Implementations of
//! [`ListingStore`] must return a fresh snapshot on every call.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::StaticListingStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Summary of one hotel record
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HotelSummary {
    pub name: String,
    pub location: String,
    /// Nightly price in US dollars
    pub price: f64,
}

/// Summary of one package (tour/safari) record
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackageSummary {
    pub title: String,
    pub description: String,
    /// Package price in US dollars
    pub price: f64,
}

/// One line of the knowledge snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum ListingSummary {
    Hotel(HotelSummary),
    Package(PackageSummary),
}

impl ListingSummary {
    /// Render as a single descriptive line
    ///
    /// - hotel: `"{name} ({location}) - from ${price}/night"`
    /// - package: `"{title}: {description} - ${price}"`
    pub fn render_line(&self) -> String {
        match self {
            ListingSummary::Hotel(h) => format!(
                "{} ({}) - from ${}/night",
                h.name,
                h.location,
                format_price(h.price)
            ),
            ListingSummary::Package(p) => {
                format!("{}: {} - ${}", p.title, p.description, format_price(p.price))
            }
        }
    }

    pub fn is_hotel(&self) -> bool {
        matches!(self, ListingSummary::Hotel(_))
    }
}

/// Format a price the way listing pages show it: `80`, `80.5`, `1250`
///
/// `f64`'s `Display` already prints integral values without a fractional
/// part and fractional values in their shortest round-trip form.
pub fn format_price(price: f64) -> String {
    format!("{}", price)
}

/// Static contact information appended to every knowledge block
///
/// Loaded from the `[contact]` section of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ContactBlock {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub address: String,
}

impl ContactBlock {
    /// First configured email, used in short apology messages
    pub fn primary_email(&self) -> &str {
        self.emails.first().map(String::as_str).unwrap_or_default()
    }

    /// First configured phone number, used in short apology messages
    pub fn primary_phone(&self) -> &str {
        self.phones.first().map(String::as_str).unwrap_or_default()
    }

    /// Render the block appended to the knowledge snapshot
    pub fn render(&self) -> String {
        format!(
            "Contact information:\nEmail: {}\nPhone: {}\nAddress: {}",
            self.emails.join(", "),
            self.phones.join(", "),
            self.address
        )
    }
}

/// Which collaborator collection an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Hotels,
    Packages,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Hotels => write!(f, "hotels"),
            Collection::Packages => write!(f, "packages"),
        }
    }
}

/// Failure to read a listing collection
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {collection} listing from '{path}': {source}")]
    Read {
        collection: Collection,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {collection} listing from '{path}': {source}")]
    Parse {
        collection: Collection,
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Collaborator read interface: full-snapshot listings, no filtering
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// List all hotel records
    async fn list_hotels(&self) -> Result<Vec<HotelSummary>, CatalogError>;

    /// List all package records
    async fn list_packages(&self) -> Result<Vec<PackageSummary>, CatalogError>;
}
