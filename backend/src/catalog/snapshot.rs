//! Catalog snapshots stored as JSON files.
//!
//! A snapshot holds all ten catalogs in one object keyed by catalog name
//! (`categories`, `languages`, ..., `classes`). Files are checked against the
//! embedded JSON Schema (Draft 7) before use:
//!
//! ```json
//! {
//!   "categories": [{ "id": "c1", "name": "Mathematics" }],
//!   "countries":  [{ "id": 1, "name": "Pakistan", "code": "PK" }]
//! }
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

use super::CatalogSource;
use crate::error::{CatalogLoadError, CatalogResult};
use crate::models::{CatalogEntry, CatalogKind, ReferenceCatalogs};

const SNAPSHOT_SCHEMA: &str = include_str!("../../schemas/reference-catalogs.json");

/// Catalogs loaded from a validated snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotCatalogs {
    catalogs: ReferenceCatalogs,
}

impl SnapshotCatalogs {
    /// Read and validate a snapshot file.
    pub fn from_path(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CatalogLoadError::Snapshot(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate snapshot JSON.
    pub fn from_json(content: &str) -> CatalogResult<Self> {
        let data: Value = serde_json::from_str(content)
            .map_err(|e| CatalogLoadError::Snapshot(format!("invalid JSON: {}", e)))?;

        check_schema(&data).map_err(|errors| CatalogLoadError::Snapshot(errors.join("; ")))?;

        let catalogs: ReferenceCatalogs = serde_json::from_value(data)
            .map_err(|e| CatalogLoadError::Snapshot(e.to_string()))?;
        Ok(Self { catalogs })
    }

    pub fn catalogs(&self) -> &ReferenceCatalogs {
        &self.catalogs
    }
}

#[async_trait]
impl CatalogSource for SnapshotCatalogs {
    async fn fetch(&self, kind: CatalogKind) -> CatalogResult<Vec<CatalogEntry>> {
        Ok(self.catalogs.entries(kind).to_vec())
    }
}

/// Validate snapshot JSON against the embedded schema.
///
/// Returns every schema violation, not just the first.
pub fn check_schema(data: &Value) -> Result<(), Vec<String>> {
    let schema: Value = serde_json::from_str(SNAPSHOT_SCHEMA)
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])?;
    let validator = jsonschema::draft7::new(&schema)
        .map_err(|e| vec![format!("Invalid embedded schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
