//! JSON-file-backed listing store
//!
//! Each collection is a JSON array on disk maintained by the collaborator.
//! Files are re-read on every call so the gateway always sees the current
//! snapshot.

use super::{CatalogError, Collection, HotelSummary, ListingStore, PackageSummary};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct JsonFileStore {
    hotels_path: PathBuf,
    packages_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(hotels_path: impl Into<PathBuf>, packages_path: impl Into<PathBuf>) -> Self {
        Self {
            hotels_path: hotels_path.into(),
            packages_path: packages_path.into(),
        }
    }

    pub fn hotels_path(&self) -> &Path {
        &self.hotels_path
    }

    pub fn packages_path(&self) -> &Path {
        &self.packages_path
    }
}

async fn read_collection<T: DeserializeOwned>(
    collection: Collection,
    path: &Path,
) -> Result<Vec<T>, CatalogError> {
    let path_display = path.display().to_string();

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CatalogError::Read {
            collection,
            path: path_display.clone(),
            source,
        })?;

    let records: Vec<T> =
        serde_json::from_slice(&bytes).map_err(|source| CatalogError::Parse {
            collection,
            path: path_display.clone(),
            source,
        })?;

    tracing::debug!(
        collection = %collection,
        path = %path_display,
        records = records.len(),
        "Loaded listing snapshot"
    );

    Ok(records)
}

#[async_trait]
impl ListingStore for JsonFileStore {
    async fn list_hotels(&self) -> Result<Vec<HotelSummary>, CatalogError> {
        read_collection(Collection::Hotels, &self.hotels_path).await
    }

    async fn list_packages(&self) -> Result<Vec<PackageSummary>, CatalogError> {
        read_collection(Collection::Packages, &self.packages_path).await
    }
}
