//! # Course Import - XLSX bulk upload for the LMS
//!
//! Decodes course spreadsheets into nested course records, checks them
//! against field rules and the LMS reference catalogs, and either accepts the
//! whole batch or reports every problem at once.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  XLSX File  │────▶│   Parser    │────▶│  Validator  │────▶│   Report    │
//! │  (upload)   │     │ (sections…) │     │ (catalogs)  │     │ (accepted)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use course_import::{import_upload, ImportLog, ImportOptions, SnapshotCatalogs, Upload};
//!
//! #[tokio::main]
//! async fn main() {
//!     let catalogs = SnapshotCatalogs::from_path("catalogs.json").unwrap();
//!     let upload = Upload::new("courses.xlsx", std::fs::read("courses.xlsx").unwrap());
//!     let log = ImportLog::new("local");
//!     let report = import_upload(&upload, &catalogs, &ImportOptions::default(), &log)
//!         .await
//!         .unwrap();
//!     println!("Accepted {} courses", report.courses.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Course records, catalogs, validation errors
//! - [`parser`] - XLSX decoding and header layout
//! - [`catalog`] - Reference catalog loading and id resolution
//! - [`validation`] - Field and reference rules
//! - [`pipeline`] - Import stages
//! - [`auth`] - Bearer token verification
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Decoding
pub mod parser;

// Reference data
pub mod catalog;

// Validation
pub mod validation;

// Orchestration
pub mod pipeline;

// Service
pub mod auth;
pub mod config;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AuthError,
    CatalogLoadError,
    ConfigError,
    DecodeError,
    FormatError,
    ImportError,
    ImportResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CatalogEntry,
    CatalogKind,
    ContentItemRecord,
    ContentKind,
    ContentType,
    CourseRecord,
    LessonRecord,
    ReferenceCatalogs,
    SectionRecord,
    ValidationError,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_courses,
    decode_workbook,
    header_template,
    DecodedWorkbook,
    HeaderLayout,
};

// =============================================================================
// Re-exports - Catalogs
// =============================================================================

pub use catalog::{
    load_catalogs,
    CatalogSource,
    ResolvedReferences,
    SnapshotCatalogs,
    SupabaseCatalogs,
};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{validate_batch, validate_course};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    check_format,
    import_upload,
    parse_upload,
    ImportOptions,
    ImportReport,
    ImportStage,
    Upload,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::logs::ImportLog;
pub use api::types::{error_response, ImportResponse, ParseResponse};
pub use auth::{IdentityVerifier, SupabaseAuth};
pub use config::Config;

// Server
pub mod server {
    pub use crate::api::server::{build_router, start_server, AppState};
}
