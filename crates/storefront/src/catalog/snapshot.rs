//! Bundled static catalog.
//!
//! The snapshot doubles as the seed fixture for the hosted tables, so rows are
//! kept in insertion order (ascending id once seeded).

use serde::{Deserialize, Serialize};

use manipedi_core::{CatalogTable, GalleryItem, Product, Service, TeamMember, Testimonial};

const BUNDLED_JSON: &str = include_str!("../../data/catalog.json");

/// Every catalog table as shipped with the binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub testimonials: Vec<Testimonial>,
    #[serde(default)]
    pub gallery: Vec<GalleryItem>,
}

impl CatalogSnapshot {
    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled JSON does not match the catalog types.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_JSON)
    }

    /// Parse a snapshot from a JSON document with one array per table.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid catalog JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Gallery in display order (newest first).
    #[must_use]
    pub fn gallery_newest_first(&self) -> Vec<GalleryItem> {
        self.gallery.iter().rev().cloned().collect()
    }

    /// Rows of one table as JSON objects ready for upserting.
    ///
    /// # Errors
    ///
    /// Returns an error if a record fails to serialize.
    pub fn rows(&self, table: CatalogTable) -> Result<Vec<serde_json::Value>, serde_json::Error> {
        match table {
            CatalogTable::Services => to_rows(&self.services),
            CatalogTable::Products => to_rows(&self.products),
            CatalogTable::Team => to_rows(&self.team),
            CatalogTable::Testimonials => to_rows(&self.testimonials),
            CatalogTable::Gallery => to_rows(&self.gallery),
        }
    }

    /// Number of records in one table.
    #[must_use]
    pub fn row_count(&self, table: CatalogTable) -> usize {
        match table {
            CatalogTable::Services => self.services.len(),
            CatalogTable::Products => self.products.len(),
            CatalogTable::Team => self.team.len(),
            CatalogTable::Testimonials => self.testimonials.len(),
            CatalogTable::Gallery => self.gallery.len(),
        }
    }
}

fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<serde_json::Value>, serde_json::Error> {
    records.iter().map(serde_json::to_value).collect()
}
