//! Reference catalog loading.
//!
//! The validator checks names and codes against ten catalogs. They are
//! fetched fresh for every import, all at once, and the import fails if any
//! one of them cannot be loaded.
//!
//! # Sources
//!
//! - [`SupabaseCatalogs`] - PostgREST tables of the LMS database
//! - [`SnapshotCatalogs`] - JSON snapshot file (offline validation, CLI)

pub mod resolve;
pub mod snapshot;
pub mod supabase;

use async_trait::async_trait;
use futures::future::try_join_all;
use std::time::Duration;

use crate::error::{CatalogLoadError, CatalogResult};
use crate::models::{CatalogEntry, CatalogKind, ReferenceCatalogs};

pub use resolve::ResolvedReferences;
pub use snapshot::SnapshotCatalogs;
pub use supabase::SupabaseCatalogs;

/// Default bound on the whole fan-out.
pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// A read-only provider of reference catalogs.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every entry of one catalog. No rows is an empty list.
    async fn fetch(&self, kind: CatalogKind) -> CatalogResult<Vec<CatalogEntry>>;
}

/// Load all ten catalogs concurrently.
///
/// Fails fast: the first failed lookup aborts the rest. The whole fan-out is
/// bounded by `timeout`.
pub async fn load_catalogs(
    source: &dyn CatalogSource,
    timeout: Duration,
) -> CatalogResult<ReferenceCatalogs> {
    let lookups = CatalogKind::ALL
        .into_iter()
        .map(|kind| async move { source.fetch(kind).await.map(|entries| (kind, entries)) });

    let parts = tokio::time::timeout(timeout, try_join_all(lookups))
        .await
        .map_err(|_| CatalogLoadError::Timeout(timeout.as_secs()))??;

    Ok(ReferenceCatalogs::from_parts(parts))
}

/// Catalogs already in memory. Useful for tests and embedding.
#[async_trait]
impl CatalogSource for ReferenceCatalogs {
    async fn fetch(&self, kind: CatalogKind) -> CatalogResult<Vec<CatalogEntry>> {
        Ok(self.entries(kind).to_vec())
    }
}
