//! Resolve a course's catalog references to ids.
//!
//! Accepted batches are handed to the batch-insert step with ids already
//! looked up, so the names and codes only need matching once.

use serde::{Deserialize, Serialize};

use crate::models::{CatalogKind, CourseRecord, ReferenceCatalogs};

/// Catalog ids referenced by one course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReferences {
    pub source_row: usize,
    pub category_id: Option<String>,
    pub language_id: Option<String>,
    pub level_id: Option<String>,
    pub country_ids: Vec<String>,
    pub region_ids: Vec<String>,
    pub city_ids: Vec<String>,
    pub project_ids: Vec<String>,
    pub board_ids: Vec<String>,
    pub school_ids: Vec<String>,
    pub class_ids: Vec<String>,
}

impl ReferenceCatalogs {
    /// Look up every name and code on `course`. Unmatched values are dropped.
    pub fn resolve(&self, course: &CourseRecord) -> ResolvedReferences {
        let named = |kind: CatalogKind| {
            course
                .named_reference(kind)
                .filter(|name| !name.is_empty())
                .and_then(|name| self.find_by_name(kind, name))
                .map(|entry| entry.id.clone())
        };
        let coded = |kind: CatalogKind| -> Vec<String> {
            course
                .codes(kind)
                .iter()
                .filter_map(|code| self.find_by_code(kind, code))
                .map(|entry| entry.id.clone())
                .collect()
        };

        ResolvedReferences {
            source_row: course.source_row,
            category_id: named(CatalogKind::Categories),
            language_id: named(CatalogKind::Languages),
            level_id: named(CatalogKind::Levels),
            country_ids: coded(CatalogKind::Countries),
            region_ids: coded(CatalogKind::Regions),
            city_ids: coded(CatalogKind::Cities),
            project_ids: coded(CatalogKind::Projects),
            board_ids: coded(CatalogKind::Boards),
            school_ids: coded(CatalogKind::Schools),
            class_ids: coded(CatalogKind::Classes),
        }
    }
}
