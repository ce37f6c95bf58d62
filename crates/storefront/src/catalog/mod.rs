//! Catalog data access.
//!
//! # Architecture
//!
//! - [`TableStore`] is the seam to the hosted table store; production uses
//!   [`SupabaseClient`], tests plug in an in-memory fake
//! - [`CatalogService`] fetches a table, decodes the rows and substitutes the
//!   bundled [`CatalogSnapshot`] when the fetch fails or comes back empty
//! - No caching: every page render reads the store once per table it needs
//!
//! Fallbacks are silent for visitors. Failures are logged at `warn`, empty
//! tables at `debug`.

mod snapshot;
mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::instrument;

use manipedi_core::{
    CatalogTable, GalleryItem, Product, ProductId, Service, SortOrder, TeamMember, Testimonial,
};

pub use snapshot::CatalogSnapshot;
pub use supabase::SupabaseClient;

/// Errors that can occur when talking to the hosted table store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rows could not be decoded into catalog records.
    #[error("Invalid rows in table {table}: {source}")]
    Decode {
        table: CatalogTable,
        #[source]
        source: serde_json::Error,
    },

    /// Store URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Row-level access to the hosted table store.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Select every row of `table`, ordered by `id`.
    async fn select(
        &self,
        table: CatalogTable,
        order: SortOrder,
    ) -> Result<Vec<serde_json::Value>, CatalogError>;

    /// Insert `row`, or merge it into the row with the same primary key.
    async fn upsert(&self, table: CatalogTable, row: &serde_json::Value)
    -> Result<(), CatalogError>;

    /// Cheap connectivity check for the readiness endpoint.
    async fn ping(&self) -> Result<(), CatalogError> {
        self.select(CatalogTable::Services, SortOrder::Ascending)
            .await
            .map(|_| ())
    }
}

/// Catalog reads with static fallback.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn TableStore>,
    snapshot: Arc<CatalogSnapshot>,
}

impl CatalogService {
    #[must_use]
    pub fn new(store: Arc<dyn TableStore>, snapshot: CatalogSnapshot) -> Self {
        Self {
            store,
            snapshot: Arc::new(snapshot),
        }
    }

    /// The underlying store, for readiness checks.
    #[must_use]
    pub fn store(&self) -> &dyn TableStore {
        self.store.as_ref()
    }

    /// Fetch and decode a table without fallback.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the store call fails or a row does not
    /// decode.
    #[instrument(skip(self), fields(table = %table))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        table: CatalogTable,
    ) -> Result<Vec<T>, CatalogError> {
        let rows = self.store.select(table, table.default_order()).await?;
        rows.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|source| CatalogError::Decode { table, source })
    }

    /// Fetch a table, falling back to the snapshot on error or no rows.
    async fn load<T, F>(&self, table: CatalogTable, fallback: F) -> Vec<T>
    where
        T: DeserializeOwned,
        F: FnOnce(&CatalogSnapshot) -> Vec<T>,
    {
        match self.fetch::<T>(table).await {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                tracing::debug!(table = %table, "Table is empty, using bundled catalog");
                fallback(&self.snapshot)
            }
            Err(e) => {
                tracing::warn!(table = %table, error = %e, "Catalog fetch failed, using bundled catalog");
                fallback(&self.snapshot)
            }
        }
    }

    pub async fn services(&self) -> Vec<Service> {
        self.load(CatalogTable::Services, |s| s.services.clone())
            .await
    }

    pub async fn products(&self) -> Vec<Product> {
        self.load(CatalogTable::Products, |s| s.products.clone())
            .await
    }

    pub async fn team(&self) -> Vec<TeamMember> {
        self.load(CatalogTable::Team, |s| s.team.clone()).await
    }

    pub async fn testimonials(&self) -> Vec<Testimonial> {
        self.load(CatalogTable::Testimonials, |s| s.testimonials.clone())
            .await
    }

    /// Gallery items, newest first.
    pub async fn gallery(&self) -> Vec<GalleryItem> {
        self.load(CatalogTable::Gallery, CatalogSnapshot::gallery_newest_first)
            .await
    }

    /// Look up one product by id, from the same source the shop page shows.
    pub async fn product(&self, id: &ProductId) -> Option<Product> {
        self.products().await.into_iter().find(|p| &p.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Store that serves canned rows, or fails for tables without any.
    #[derive(Default)]
    struct CannedStore {
        rows: HashMap<CatalogTable, Vec<serde_json::Value>>,
        orders: Mutex<Vec<(CatalogTable, SortOrder)>>,
    }

    #[async_trait]
    impl TableStore for CannedStore {
        async fn select(
            &self,
            table: CatalogTable,
            order: SortOrder,
        ) -> Result<Vec<serde_json::Value>, CatalogError> {
            self.orders.lock().unwrap().push((table, order));
            self.rows.get(&table).cloned().ok_or(CatalogError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        async fn upsert(
            &self,
            _table: CatalogTable,
            _row: &serde_json::Value,
        ) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    fn service(store: CannedStore) -> CatalogService {
        CatalogService::new(Arc::new(store), CatalogSnapshot::bundled().unwrap())
    }

    #[tokio::test]
    async fn test_store_rows_win_over_snapshot() {
        let mut store = CannedStore::default();
        store.rows.insert(
            CatalogTable::Products,
            vec![serde_json::json!({
                "id": "p9",
                "name": "Lima de Cristal",
                "description": "Lima profesional",
                "price": 9.5,
                "image": "https://img.example/p9.jpg",
                "stripe_price_id": "price_p9"
            })],
        );

        let products = service(store).products().await;
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "p9");
    }

    #[tokio::test]
    async fn test_error_falls_back_to_snapshot() {
        let products = service(CannedStore::default()).products().await;
        assert_eq!(products.len(), 6);
        assert_eq!(products[0].name, "Esmalte Gel Premium");
    }

    #[tokio::test]
    async fn test_empty_table_falls_back_to_snapshot() {
        let mut store = CannedStore::default();
        store.rows.insert(CatalogTable::Team, Vec::new());

        let team = service(store).team().await;
        assert_eq!(team.len(), 4);
    }

    #[tokio::test]
    async fn test_undecodable_rows_fall_back() {
        let mut store = CannedStore::default();
        store.rows.insert(
            CatalogTable::Services,
            vec![serde_json::json!({ "id": "not-a-number" })],
        );

        let services = service(store).services().await;
        assert_eq!(services.len(), 10);
    }

    #[tokio::test]
    async fn test_gallery_requested_descending() {
        let store = Arc::new(CannedStore::default());
        let catalog = CatalogService::new(store.clone(), CatalogSnapshot::bundled().unwrap());

        let gallery = catalog.gallery().await;
        assert_eq!(gallery[0].title, "Pestañas Hollywood");

        let orders = store.orders.lock().unwrap();
        assert_eq!(
            orders.as_slice(),
            &[(CatalogTable::Gallery, SortOrder::Descending)]
        );
    }

    #[tokio::test]
    async fn test_product_lookup() {
        let catalog = service(CannedStore::default());
        assert!(catalog.product(&ProductId::from("p4")).await.is_some());
        assert!(catalog.product(&ProductId::from("nope")).await.is_none());
    }
}
