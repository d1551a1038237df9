//! HTTP server for course imports.
//!
//! # API Endpoints
//!
//! | Method | Path                        | Description                         |
//! |--------|-----------------------------|-------------------------------------|
//! | GET    | `/health`                   | Health check                        |
//! | POST   | `/api/courses/bulk-upload`  | Decode, validate and accept a batch |
//! | POST   | `/api/courses/parse`        | Decode only (preview)               |
//! | GET    | `/api/logs`                 | SSE stream for real-time logs       |
//!
//! Both POST endpoints take a multipart form with a `file` field and need a
//! bearer token. Every response to them carries an `x-import-id` header that
//! matches the `importId` of the log entries for that request.

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{ImportLog, LOG_BROADCASTER};
use super::types::{error_response, rejection, ApiError, ImportResponse, ParseResponse};
use crate::auth::{bearer_token, IdentityVerifier, SupabaseAuth};
use crate::catalog::{CatalogSource, SupabaseCatalogs};
use crate::config::Config;
use crate::error::{FormatError, ImportError};
use crate::pipeline::{import_upload, parse_upload, ImportOptions, ImportStage, Upload};

pub const IMPORT_ID_HEADER: &str = "x-import-id";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub catalogs: Arc<dyn CatalogSource>,
    pub options: ImportOptions,
}

/// Build the router with CORS and the upload size limit.
pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    let import_id = HeaderName::from_static(IMPORT_ID_HEADER);
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_TYPE, import_id]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/courses/bulk-upload", post(bulk_upload))
        .route("/api/courses/parse", post(parse_only))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let state = AppState {
        verifier: Arc::new(SupabaseAuth::with_client(
            client.clone(),
            &config.supabase_url,
            &config.service_role_key,
        )),
        catalogs: Arc::new(SupabaseCatalogs::with_client(
            client,
            &config.supabase_url,
            &config.service_role_key,
        )),
        options: ImportOptions::from(&config),
    };

    let app = build_router(state, config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 Course import server running on http://localhost:{}", config.port);
    println!("   POST /api/courses/bulk-upload - Validate an XLSX batch");
    println!("   POST /api/courses/parse       - Decode an XLSX batch");
    println!("   GET  /api/logs                - SSE log stream");
    println!("   GET  /health                  - Health check");
    println!();
    println!(
        "📝 Up to {} courses per upload, catalogs from {}",
        config.max_courses, config.supabase_url
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "course-import",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "bulkUpload": "POST /api/courses/bulk-upload",
            "parse": "POST /api/courses/parse",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers drop entries rather than the connection
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Full import: decode, ceiling, catalogs, validation.
async fn bulk_upload(State(state): State<AppState>, request: Request) -> Response {
    let log = ImportLog::new(Uuid::new_v4().to_string());

    let result = async {
        let upload = receive(&state, request, &log).await?;
        import_upload(&upload, state.catalogs.as_ref(), &state.options, &log)
            .await
            .map(|report| Json(ImportResponse::from(report)))
            .map_err(|err| rejection(&err))
    }
    .await;

    tagged(&log, result)
}

/// Decode only, for previewing a sheet before importing it.
async fn parse_only(State(state): State<AppState>, request: Request) -> Response {
    let log = ImportLog::new(Uuid::new_v4().to_string());

    let result = async {
        let upload = receive(&state, request, &log).await?;
        parse_upload(&upload, &state.options, &log)
            .map(|decoded| Json(ParseResponse::new(decoded.courses, decoded.layout.warnings())))
            .map_err(|err| rejection(&err))
    }
    .await;

    tagged(&log, result)
}

/// Received stage: credential first, then the multipart `file` field.
///
/// The body is not read until the caller is authenticated.
async fn receive(state: &AppState, request: Request, log: &ImportLog) -> Result<Upload, ApiError> {
    // Owned token: the request must not be borrowed across the await
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .map_err(|err| rejected(log, ImportError::from(err)))?;
    let identity = state
        .verifier
        .verify(&token)
        .await
        .map_err(|err| rejected(log, ImportError::from(err)))?;
    log.info(ImportStage::Received.as_str(), format!("Authenticated user {}", identity.id));

    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| bad_request(log, format!("Multipart error: {}", e.body_text())))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(log, format!("Multipart error: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(log, format!("Read error: {}", e.body_text())))?;
        return Ok(Upload::new(file_name, bytes.to_vec()));
    }

    Err(rejected(log, FormatError::MissingFile.into()))
}

fn rejected(log: &ImportLog, err: ImportError) -> ApiError {
    log.error(ImportStage::Rejected.as_str(), err.to_string());
    rejection(&err)
}

fn bad_request(log: &ImportLog, message: String) -> ApiError {
    log.error(ImportStage::Rejected.as_str(), &message);
    (StatusCode::BAD_REQUEST, Json(error_response(&message)))
}

/// Attach the import id header to a handler result.
fn tagged<T: IntoResponse>(log: &ImportLog, result: Result<T, ApiError>) -> Response {
    (
        [(IMPORT_ID_HEADER, log.import_id().to_string())],
        result,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::error::{AuthError, AuthResult};
    use crate::models::{CatalogEntry, CatalogKind, ReferenceCatalogs};
    use crate::parser::fixture::{minimal_course, SheetBuilder};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http;
    use tower::ServiceExt;

    const BOUNDARY: &str = "course-import-test-boundary";

    struct StaticVerifier;

    #[async_trait]
    impl IdentityVerifier for StaticVerifier {
        async fn verify(&self, token: &str) -> AuthResult<Identity> {
            match token {
                "good-token" => Ok(Identity { id: "user-1".into(), email: None }),
                _ => Err(AuthError::InvalidToken),
            }
        }
    }

    fn state() -> AppState {
        let catalogs = ReferenceCatalogs::default()
            .with(CatalogKind::Categories, vec![CatalogEntry::new("c1", "Mathematics", None)])
            .with(CatalogKind::Languages, vec![CatalogEntry::new("l1", "English", None)])
            .with(CatalogKind::Levels, vec![CatalogEntry::new("v1", "Beginner", None)]);

        AppState {
            verifier: Arc::new(StaticVerifier),
            catalogs: Arc::new(catalogs),
            options: ImportOptions::default(),
        }
    }

    fn app() -> Router {
        build_router(state(), 10 * 1024 * 1024)
    }

    fn multipart_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(path: &str, token: Option<&str>, body: Vec<u8>) -> Request {
        let mut builder = http::Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn workbook(titles: &[String]) -> Vec<u8> {
        titles
            .iter()
            .fold(SheetBuilder::template(0, 0, 0), |sheet, title| {
                sheet.row(&minimal_course(title))
            })
            .build()
    }

    async fn send(request: Request) -> (StatusCode, Option<String>, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let import_id = response
            .headers()
            .get(IMPORT_ID_HEADER)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, import_id, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_upload_handler_futures_are_send() {
        fn assert_send<T: Send>(_: &T) {}

        let body = multipart_body("courses.xlsx", b"");
        let upload = bulk_upload(
            State(state()),
            upload_request("/api/courses/bulk-upload", Some("good-token"), body.clone()),
        );
        let parse = parse_only(
            State(state()),
            upload_request("/api/courses/parse", Some("good-token"), body),
        );
        assert_send(&upload);
        assert_send(&parse);
    }

    #[tokio::test]
    async fn test_health() {
        let request = http::Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, _, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_missing_auth_checked_before_body() {
        // The body is not even valid multipart
        let request = upload_request("/api/courses/bulk-upload", None, b"garbage".to_vec());
        let (status, import_id, body) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(import_id.is_some());
        assert_eq!(body, json!({ "success": false, "error": "Authorization header required" }));
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let body = multipart_body("courses.xlsx", &workbook(&["Algebra".to_string()]));
        let request = upload_request("/api/courses/bulk-upload", Some("stolen"), body);
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid authentication token");
    }

    #[tokio::test]
    async fn test_csv_rejected() {
        let body = multipart_body("courses.csv", b"Course Title,Category\nAlgebra,Mathematics\n");
        let request = upload_request("/api/courses/bulk-upload", Some("good-token"), body);
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unsupported file format. Please upload XLSX files only.");
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{BOUNDARY}--\r\n"
        );
        let request = upload_request("/api/courses/parse", Some("good-token"), body.into_bytes());
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_accepted_upload() {
        let titles = vec!["Algebra".to_string(), "Geometry".to_string()];
        let body = multipart_body("Courses.XLSX", &workbook(&titles));
        let request = upload_request("/api/courses/bulk-upload", Some("good-token"), body);
        let (status, import_id, body) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(Uuid::parse_str(&import_id.unwrap()).is_ok());
        assert_eq!(body["success"], true);
        assert_eq!(body["totalCourses"], 2);
        assert_eq!(body["courses"][1]["courseTitle"], "Geometry");
        assert_eq!(body["resolvedReferences"][0]["categoryId"], "c1");
    }

    #[tokio::test]
    async fn test_validation_failure() {
        let titles = vec!["Algebra".to_string(), "ALGEBRA".to_string()];
        let body = multipart_body("courses.xlsx", &workbook(&titles));
        let request = upload_request("/api/courses/bulk-upload", Some("good-token"), body);
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
        assert_eq!(body["errors"][0]["row"], 2);
        assert_eq!(body["errors"][1]["row"], 3);
    }

    #[tokio::test]
    async fn test_ceiling() {
        let titles: Vec<String> = (1..=101).map(|i| format!("Course {i}")).collect();
        let body = multipart_body("courses.xlsx", &workbook(&titles));
        let request = upload_request("/api/courses/bulk-upload", Some("good-token"), body);
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Maximum 100 courses allowed per upload. Found 101 courses."
        );
    }

    #[tokio::test]
    async fn test_parse_skips_catalogs() {
        // Unknown category: parse accepts what bulk-upload would reject
        let sheet = SheetBuilder::template(0, 0, 0)
            .row(&[
                ("Course Title", "Astrology"),
                ("Category", "Stars"),
                ("Language", "English"),
                ("Level", "Beginner"),
            ])
            .build();
        let request = upload_request(
            "/api/courses/parse",
            Some("good-token"),
            multipart_body("courses.xlsx", &sheet),
        );
        let (status, _, body) = send(request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCourses"], 1);
        assert!(body.get("resolvedReferences").is_none());
    }

    #[tokio::test]
    async fn test_catalog_failure_body() {
        struct Offline;

        #[async_trait]
        impl CatalogSource for Offline {
            async fn fetch(
                &self,
                kind: CatalogKind,
            ) -> crate::error::CatalogResult<Vec<CatalogEntry>> {
                Err(crate::error::CatalogLoadError::Query {
                    catalog: kind.table().to_string(),
                    message: "service unavailable".into(),
                })
            }
        }

        let app = build_router(
            AppState { catalogs: Arc::new(Offline), ..state() },
            10 * 1024 * 1024,
        );
        let body = multipart_body("courses.xlsx", &workbook(&["Algebra".to_string()]));
        let request = upload_request("/api/courses/bulk-upload", Some("good-token"), body);

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], false);
        let error = body["error"].as_str().unwrap();
        assert!(error.starts_with("Failed to load "), "unexpected error: {error}");
        assert!(body.get("errors").is_none());
    }
}
