//! Listing dataset loader.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use estate_core::error::{EstateError, Result};
use estate_core::types::Listing;

/// Read-only set of listings used for recommendations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingSet {
    listings: Vec<Listing>,
}

impl ListingSet {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    /// Parse a JSON array of listing objects.
    ///
    /// Records are validated one by one; an invalid record is skipped with a
    /// warning instead of failing the whole dataset.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let records: Vec<Value> = serde_json::from_str(content)
            .map_err(|e| EstateError::Dataset(format!("invalid listing dataset: {}", e)))?;

        let total = records.len();
        let listings: Vec<Listing> = records
            .into_iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                let listing = match serde_json::from_value::<Listing>(record) {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(index = idx, error = %e, "Malformed listing skipped");
                        return None;
                    }
                };
                match listing.validate() {
                    Ok(()) => Some(listing),
                    Err(reason) => {
                        warn!(index = idx, reason = %reason, "Invalid listing skipped");
                        None
                    }
                }
            })
            .collect();

        if listings.len() < total {
            warn!(
                kept = listings.len(),
                total,
                "Some listings were rejected"
            );
        }
        Ok(Self { listings })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let set = Self::from_json_str(&content)?;
        info!(path = %path.display(), listings = set.len(), "Listings loaded");
        Ok(set)
    }

    /// Load the dataset, degrading to an empty set on any error.
    pub fn load_or_empty(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Failed to load listings, using empty set");
            Self::default()
        })
    }

    pub fn as_slice(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
