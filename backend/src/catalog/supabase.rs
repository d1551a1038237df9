//! Catalog lookups against the LMS database's PostgREST endpoint.

use async_trait::async_trait;

use super::CatalogSource;
use crate::error::{CatalogLoadError, CatalogResult};
use crate::models::{CatalogEntry, CatalogKind};

/// Reads catalogs from `{base_url}/rest/v1/{table}` with the service-role key.
#[derive(Clone)]
pub struct SupabaseCatalogs {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseCatalogs {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, service_key)
    }

    /// Share an existing HTTP client (connection pool).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        service_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    /// Query URL for one catalog.
    pub fn table_url(&self, kind: CatalogKind) -> String {
        format!(
            "{}/rest/v1/{}?select={}",
            self.base_url,
            kind.table(),
            kind.columns()
        )
    }
}

#[async_trait]
impl CatalogSource for SupabaseCatalogs {
    async fn fetch(&self, kind: CatalogKind) -> CatalogResult<Vec<CatalogEntry>> {
        let query_error = |message: String| CatalogLoadError::Query {
            catalog: kind.table().to_string(),
            message,
        };

        let response = self
            .client
            .get(self.table_url(kind))
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| query_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(query_error(format!("HTTP {}: {}", status, body)));
        }

        let rows: Option<Vec<CatalogEntry>> = response
            .json()
            .await
            .map_err(|e| query_error(format!("Invalid response: {}", e)))?;

        Ok(rows.unwrap_or_default())
    }
}
