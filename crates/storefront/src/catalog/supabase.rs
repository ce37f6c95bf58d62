//! REST client for the hosted table store (PostgREST under `/rest/v1`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};
use url::Url;

use manipedi_core::{CatalogTable, SortOrder};

use super::{CatalogError, TableStore};
use crate::config::SupabaseConfig;

/// Longest error body kept in `CatalogError::Api`.
const MAX_ERROR_BODY: usize = 200;

/// Client for the hosted table store.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl SupabaseClient {
    /// Create a client with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
                api_key: config.api_key.clone(),
            }),
        })
    }

    /// `{base}/rest/v1/{table}` with the given query pairs.
    fn table_url(&self, table: CatalogTable, query: &[(&str, &str)]) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{table}", self.inner.base_url))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let key = self.inner.api_key.expose_secret();
        self.inner
            .client
            .request(method, url)
            .header("apikey", key)
            .header(AUTHORIZATION, format!("Bearer {key}"))
    }
}

/// Turn a non-success response into `CatalogError::Api`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Table store returned non-success status"
    );
    Err(CatalogError::Api {
        status: status.as_u16(),
        message: body.chars().take(MAX_ERROR_BODY).collect(),
    })
}

#[async_trait]
impl TableStore for SupabaseClient {
    #[instrument(skip(self), fields(table = %table))]
    async fn select(
        &self,
        table: CatalogTable,
        order: SortOrder,
    ) -> Result<Vec<serde_json::Value>, CatalogError> {
        let order = format!("id.{}", order.as_query());
        let url = self.table_url(table, &[("select", "*"), ("order", &order)])?;

        let response = self.request(reqwest::Method::GET, url).send().await?;
        let rows: Vec<serde_json::Value> = check_status(response).await?.json().await?;

        debug!(rows = rows.len(), "Fetched table");
        Ok(rows)
    }

    #[instrument(skip(self, row), fields(table = %table))]
    async fn upsert(
        &self,
        table: CatalogTable,
        row: &serde_json::Value,
    ) -> Result<(), CatalogError> {
        let url = self.table_url(table, &[])?;

        let response = self
            .request(reqwest::Method::POST, url)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "resolution=merge-duplicates")
            .json(row)
            .send()
            .await?;
        check_status(response).await?;

        Ok(())
    }
}
