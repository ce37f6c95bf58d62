//! Report row counts of the hosted catalog tables.

use tracing::{error, info};

use manipedi_core::CatalogTable;
use manipedi_storefront::catalog::{SupabaseClient, TableStore};
use manipedi_storefront::config::SupabaseConfig;

use super::seed::SEED_TIMEOUT;

/// Row count of one table, or why it could not be read.
#[derive(Debug)]
pub struct TableStatus {
    pub table: CatalogTable,
    pub rows: Result<usize, String>,
}

/// Select every table once and count its rows.
pub async fn table_status(store: &dyn TableStore) -> Vec<TableStatus> {
    let mut statuses = Vec::with_capacity(CatalogTable::ALL.len());
    for table in CatalogTable::ALL {
        let rows = store
            .select(table, table.default_order())
            .await
            .map(|rows| rows.len())
            .map_err(|e| e.to_string());
        statuses.push(TableStatus { table, rows });
    }
    statuses
}

/// Check the tables with the public key, as the storefront reads them.
///
/// # Errors
///
/// Returns an error if configuration is missing or any table is unreadable.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = SupabaseConfig::from_env("SUPABASE_ANON_KEY")?;
    let store = SupabaseClient::new(&config, SEED_TIMEOUT)?;

    let mut unreadable = 0;
    for status in table_status(&store).await {
        match status.rows {
            Ok(0) => info!(table = %status.table, "Empty (storefront will use the bundled snapshot)"),
            Ok(rows) => info!(table = %status.table, rows, "OK"),
            Err(e) => {
                unreadable += 1;
                error!(table = %status.table, error = %e, "Unreadable");
            }
        }
    }

    if unreadable > 0 {
        return Err(format!("{unreadable} tables could not be read").into());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use manipedi_core::SortOrder;
    use manipedi_storefront::catalog::CatalogError;

    use super::*;

    struct GalleryOnlyStore;

    #[async_trait]
    impl TableStore for GalleryOnlyStore {
        async fn select(
            &self,
            table: CatalogTable,
            order: SortOrder,
        ) -> Result<Vec<serde_json::Value>, CatalogError> {
            match table {
                CatalogTable::Gallery => {
                    assert_eq!(order, SortOrder::Descending);
                    Ok(vec![serde_json::json!({ "id": 1 }), serde_json::json!({ "id": 2 })])
                }
                CatalogTable::Team => Err(CatalogError::Api {
                    status: 401,
                    message: "invalid key".to_string(),
                }),
                _ => Ok(Vec::new()),
            }
        }

        async fn upsert(
            &self,
            _table: CatalogTable,
            _row: &serde_json::Value,
        ) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_reports_each_table() {
        let statuses = table_status(&GalleryOnlyStore).await;
        assert_eq!(statuses.len(), CatalogTable::ALL.len());

        let gallery = statuses
            .iter()
            .find(|s| s.table == CatalogTable::Gallery)
            .unwrap();
        assert_eq!(gallery.rows, Ok(2));

        let team = statuses
            .iter()
            .find(|s| s.table == CatalogTable::Team)
            .unwrap();
        assert!(team.rows.is_err());
    }
}
