//! Error types for the course import pipeline.
//!
//! Each stage of an import has its own error type:
//!
//! - [`AuthError`] - Missing or rejected bearer credential
//! - [`FormatError`] - Upload is not an `.xlsx` workbook
//! - [`DecodeError`] - Workbook structure problems (no sheet, no data, missing headers)
//! - [`CatalogLoadError`] - A reference catalog lookup failed
//! - [`ConfigError`] - Invalid environment configuration
//! - [`ImportError`] - Top-level terminal rejection of an import
//!
//! Field-level problems are not errors in this sense: they are accumulated as
//! [`crate::models::ValidationError`] values and reported together through
//! [`ImportError::Validation`].

use thiserror::Error;

use crate::models::ValidationError;

// =============================================================================
// Authentication Errors
// =============================================================================

/// Errors while verifying the caller's credential.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization` header on the request.
    #[error("Authorization header required")]
    MissingHeader,

    /// The auth provider did not recognise the token.
    #[error("Invalid authentication token")]
    InvalidToken,

    /// The auth provider could not be reached.
    #[error("Authentication service unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// Upload Format Errors
// =============================================================================

/// Errors about the uploaded file itself, before any decoding.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The multipart form had no `file` field.
    #[error("No file provided")]
    MissingFile,

    /// The file extension is not `.xlsx`.
    #[error("Unsupported file format. Please upload XLSX files only.")]
    UnsupportedExtension(String),
}

// =============================================================================
// Workbook Decode Errors
// =============================================================================

/// Errors while decoding the workbook into course records.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The bytes are not a readable XLSX archive.
    #[error("Failed to parse XLSX file: {0}")]
    Workbook(String),

    /// The workbook has no worksheet.
    #[error("Failed to parse XLSX file: No worksheets found in XLSX file")]
    NoWorksheet,

    /// Only a header row (or nothing at all).
    #[error("Failed to parse XLSX file: Invalid XLSX file: insufficient data")]
    InsufficientData,

    /// One of the fixed required headers is absent.
    #[error("Failed to parse XLSX file: Missing required header: {0}")]
    MissingHeader(String),
}

impl From<calamine::XlsxError> for DecodeError {
    fn from(err: calamine::XlsxError) -> Self {
        DecodeError::Workbook(err.to_string())
    }
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors while loading reference catalogs.
///
/// Any single failure aborts the whole load.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    /// Transport or query failure for one catalog.
    #[error("Failed to load {catalog} catalog: {message}")]
    Query { catalog: String, message: String },

    /// The fan-out did not finish in time.
    #[error("Reference catalogs did not load within {0} seconds")]
    Timeout(u64),

    /// A catalog snapshot file failed to load or validate.
    #[error("Invalid catalog snapshot: {0}")]
    Snapshot(String),
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors reading the service configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable not set.
    #[error("Missing {0} environment variable")]
    Missing(&'static str),

    /// Variable set but unparsable.
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

// =============================================================================
// Import Errors (top-level)
// =============================================================================

/// Terminal rejection of an import.
///
/// Every variant corresponds to one way the orchestrator ends in `Rejected`.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Credential check failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Wrong file type or no file.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Workbook could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Too many course rows in one upload.
    #[error("Maximum {limit} courses allowed per upload. Found {found} courses.")]
    TooManyCourses { found: usize, limit: usize },

    /// Reference catalogs unavailable.
    #[error(transparent)]
    CatalogLoad(#[from] CatalogLoadError),

    /// Accumulated field-level failures.
    #[error("Validation failed")]
    Validation(Vec<ValidationError>),
}

impl ImportError {
    /// HTTP status code the API answers with for this rejection.
    pub fn status_code(&self) -> u16 {
        match self {
            ImportError::Auth(_) => 401,
            _ => 400,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workbook decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for catalog loading.
pub type CatalogResult<T> = Result<T, CatalogLoadError>;

/// Result type for authentication.
pub type AuthResult<T> = Result<T, AuthError>;

/// Result type for a full import.
pub type ImportResult<T> = Result<T, ImportError>;
