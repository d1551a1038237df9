//! REST API response bodies.
//!
//! Three shapes share the `success` flag:
//!
//! - accepted: `{ success: true, courses, totalCourses, message, resolvedReferences }`
//! - validation failure: `{ success: false, errors, message: "Validation failed" }`
//! - any other rejection: `{ success: false, error }`

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::catalog::ResolvedReferences;
use crate::error::ImportError;
use crate::models::CourseRecord;
use crate::pipeline::ImportReport;

/// Error half of every handler's `Result`.
pub type ApiError = (StatusCode, Json<Value>);

/// Body of an accepted import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub success: bool,
    pub courses: Vec<CourseRecord>,
    pub total_courses: usize,
    pub message: String,
    pub resolved_references: Vec<ResolvedReferences>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl From<ImportReport> for ImportResponse {
    fn from(report: ImportReport) -> Self {
        let total = report.courses.len();
        Self {
            success: true,
            courses: report.courses,
            total_courses: total,
            message: format!("Successfully validated {} courses. Ready for batch processing.", total),
            resolved_references: report.resolved,
            warnings: report.warnings,
        }
    }
}

/// Body of a decode-only preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    pub success: bool,
    pub courses: Vec<CourseRecord>,
    pub total_courses: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ParseResponse {
    pub fn new(courses: Vec<CourseRecord>, warnings: Vec<String>) -> Self {
        let total = courses.len();
        Self {
            success: true,
            courses,
            total_courses: total,
            message: format!("Successfully parsed {} courses. Ready for batch processing.", total),
            warnings,
        }
    }
}

/// Map a rejection to its status code and body.
pub fn rejection(err: &ImportError) -> ApiError {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
    let body = match err {
        ImportError::Validation(errors) => json!({
            "success": false,
            "errors": errors,
            "message": err.to_string(),
        }),
        other => error_response(&other.to_string()),
    };
    (status, Json(body))
}

/// Create an error body
pub fn error_response(error: &str) -> Value {
    json!({
        "success": false,
        "error": error,
    })
}
