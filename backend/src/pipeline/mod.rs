//! Import orchestration: Received → Decoded → Validated → Accepted | Rejected.
//!
//! ```text
//! ┌──────────┐    ┌─────────┐    ┌──────────┐    ┌───────────┐    ┌──────────┐
//! │ Received │───▶│ Decoded │───▶│ ceiling  │───▶│ Validated │───▶│ Accepted │
//! │ (.xlsx?) │    │ (sheet) │    │ (≤ max)  │    │ (catalogs)│    │ (report) │
//! └──────────┘    └─────────┘    └──────────┘    └───────────┘    └──────────┘
//!       └──────────────┴──────────────┴───────────────┴──────▶ Rejected
//! ```
//!
//! Each rejection is an [`ImportError`]. No partial batch is ever returned:
//! either every record is accepted or the caller gets the reason it was not.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::api::logs::ImportLog;
use crate::catalog::{load_catalogs, CatalogSource, ResolvedReferences, DEFAULT_CATALOG_TIMEOUT};
use crate::config::{Config, DEFAULT_MAX_COURSES};
use crate::error::{FormatError, ImportError, ImportResult};
use crate::models::CourseRecord;
use crate::parser::{decode_workbook, DecodedWorkbook};
use crate::validation::validate_batch;

/// Stage of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStage {
    Received,
    Decoded,
    Validated,
    Accepted,
    Rejected,
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Received => "received",
            ImportStage::Decoded => "decoded",
            ImportStage::Validated => "validated",
            ImportStage::Accepted => "accepted",
            ImportStage::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limits applied to every import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Largest accepted batch.
    pub max_courses: usize,
    /// Bound on loading all reference catalogs.
    pub catalog_timeout: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_courses: DEFAULT_MAX_COURSES,
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
        }
    }
}

impl From<&Config> for ImportOptions {
    fn from(config: &Config) -> Self {
        Self {
            max_courses: config.max_courses,
            catalog_timeout: config.catalog_timeout,
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }
}

/// An accepted batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub courses: Vec<CourseRecord>,
    /// Catalog ids per course, in the same order as `courses`.
    pub resolved: Vec<ResolvedReferences>,
    /// Non-fatal header layout warnings.
    pub warnings: Vec<String>,
    /// Stages passed, ending in `Accepted`.
    pub stages: Vec<ImportStage>,
}

/// Reject anything that is not named `*.xlsx` (any case).
pub fn check_format(file_name: &str) -> Result<(), FormatError> {
    let is_xlsx = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));

    if is_xlsx {
        Ok(())
    } else {
        Err(FormatError::UnsupportedExtension(file_name.to_string()))
    }
}

/// Decode an upload and apply the batch ceiling, without validating.
pub fn parse_upload(
    upload: &Upload,
    options: &ImportOptions,
    log: &ImportLog,
) -> ImportResult<DecodedWorkbook> {
    reject_on_error(log, || decode_stage(upload, options, log))
}

/// Run a full import against the given catalog source.
pub async fn import_upload(
    upload: &Upload,
    source: &dyn CatalogSource,
    options: &ImportOptions,
    log: &ImportLog,
) -> ImportResult<ImportReport> {
    let result = async {
        let decoded = decode_stage(upload, options, log)?;
        let mut stages = vec![ImportStage::Received, ImportStage::Decoded];

        log.info(ImportStage::Decoded.as_str(), "Loading reference catalogs...");
        let catalogs = load_catalogs(source, options.catalog_timeout).await?;
        log.detail(
            ImportStage::Decoded.as_str(),
            format!("{} catalog entries loaded", catalogs.total_entries()),
        );

        let errors = validate_batch(&decoded.courses, &catalogs);
        if !errors.is_empty() {
            for error in &errors {
                log.detail(ImportStage::Validated.as_str(), error.to_string());
            }
            return Err(ImportError::Validation(errors));
        }
        stages.push(ImportStage::Validated);
        log.success(
            ImportStage::Validated.as_str(),
            format!("{} courses passed validation", decoded.courses.len()),
        );

        let resolved = decoded.courses.iter().map(|c| catalogs.resolve(c)).collect();
        stages.push(ImportStage::Accepted);
        log.success(
            ImportStage::Accepted.as_str(),
            format!("Import accepted: {} courses", decoded.courses.len()),
        );

        Ok(ImportReport {
            courses: decoded.courses,
            resolved,
            warnings: decoded.layout.warnings(),
            stages,
        })
    }
    .await;

    if let Err(err) = &result {
        log_rejection(log, err);
    }
    result
}

fn decode_stage(
    upload: &Upload,
    options: &ImportOptions,
    log: &ImportLog,
) -> ImportResult<DecodedWorkbook> {
    log.info(
        ImportStage::Received.as_str(),
        format!("Received {} ({} bytes)", upload.file_name, upload.bytes.len()),
    );
    check_format(&upload.file_name)?;

    let decoded = decode_workbook(&upload.bytes)?;
    log.success(
        ImportStage::Decoded.as_str(),
        format!(
            "Decoded {} courses from sheet \"{}\"",
            decoded.courses.len(),
            decoded.sheet_name
        ),
    );
    if !decoded.skipped_rows.is_empty() {
        log.detail(
            ImportStage::Decoded.as_str(),
            format!("{} blank rows skipped", decoded.skipped_rows.len()),
        );
    }
    for warning in decoded.layout.warnings() {
        log.warning(ImportStage::Decoded.as_str(), warning);
    }

    if decoded.courses.len() > options.max_courses {
        return Err(ImportError::TooManyCourses {
            found: decoded.courses.len(),
            limit: options.max_courses,
        });
    }

    Ok(decoded)
}

fn reject_on_error<T>(log: &ImportLog, run: impl FnOnce() -> ImportResult<T>) -> ImportResult<T> {
    let result = run();
    if let Err(err) = &result {
        log_rejection(log, err);
    }
    result
}

fn log_rejection(log: &ImportLog, err: &ImportError) {
    let count = match err {
        ImportError::Validation(errors) => format!(" ({} errors)", errors.len()),
        _ => String::new(),
    };
    log.error(ImportStage::Rejected.as_str(), format!("{}{}", err, count));
}
