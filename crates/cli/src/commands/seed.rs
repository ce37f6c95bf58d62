//! Seed the hosted catalog tables from a JSON fixture.
//!
//! Every row is upserted on its own. A failing row is logged and the run
//! carries on with the next one, so one bad record does not leave the rest
//! of the catalog empty.

use std::path::Path;
use std::time::Duration;

use tracing::{error, info, warn};

use manipedi_core::CatalogTable;
use manipedi_storefront::catalog::{CatalogSnapshot, SupabaseClient, TableStore};
use manipedi_storefront::config::SupabaseConfig;

/// Environment variable holding the key allowed to write the tables.
pub const SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_KEY";

/// Seeding runs are one-off; allow slow projects to wake up.
pub const SEED_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub upserted: usize,
    pub failed: usize,
}

/// Upsert every row of `tables` from `snapshot` into `store`.
///
/// # Errors
///
/// Returns an error only if a record cannot be turned into JSON. Store
/// failures are counted in the report instead.
pub async fn seed_tables(
    store: &dyn TableStore,
    snapshot: &CatalogSnapshot,
    tables: &[CatalogTable],
) -> Result<SeedReport, serde_json::Error> {
    let mut report = SeedReport::default();

    for &table in tables {
        let rows = snapshot.rows(table)?;
        info!(%table, rows = rows.len(), "Seeding table");

        for row in &rows {
            let label = row_label(row);
            match store.upsert(table, row).await {
                Ok(()) => {
                    report.upserted += 1;
                    info!(%table, row = %label, "Upserted");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(%table, row = %label, error = %e, "Upsert failed");
                }
            }
        }
    }

    Ok(report)
}

/// Short description of a row for log lines: its id, else its name or title.
fn row_label(row: &serde_json::Value) -> String {
    ["id", "name", "title"]
        .iter()
        .find_map(|key| row.get(key))
        .map_or_else(
            || "<unnamed>".to_string(),
            |value| {
                value
                    .as_str()
                    .map_or_else(|| value.to_string(), ToString::to_string)
            },
        )
}

/// Seed the hosted tables.
///
/// # Arguments
///
/// * `file` - JSON fixture; the bundled catalog snapshot when `None`
/// * `table` - Only seed this table when set
///
/// # Errors
///
/// Returns an error if configuration is missing, the fixture cannot be read,
/// or any row failed to upsert.
pub async fn run(
    file: Option<&Path>,
    table: Option<CatalogTable>,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = match file {
        Some(path) => {
            info!(path = %path.display(), "Loading catalog fixture");
            let content = tokio::fs::read_to_string(path).await?;
            CatalogSnapshot::from_json(&content)?
        }
        None => {
            info!("Using bundled catalog snapshot");
            CatalogSnapshot::bundled()?
        }
    };

    let config = SupabaseConfig::from_env(SERVICE_KEY_VAR)?;
    let store = SupabaseClient::new(&config, SEED_TIMEOUT)?;
    info!(url = %config.url, "Connected to table store");

    let tables: Vec<CatalogTable> = table.map_or_else(|| CatalogTable::ALL.to_vec(), |t| vec![t]);
    for &t in &tables {
        if snapshot.row_count(t) == 0 {
            warn!(table = %t, "Fixture has no rows for table");
        }
    }

    let report = seed_tables(&store, &snapshot, &tables).await?;
    info!(
        upserted = report.upserted,
        failed = report.failed,
        "Seeding finished"
    );

    if report.failed > 0 {
        return Err(format!("{} rows failed to upsert", report.failed).into());
    }
    Ok(())
}
