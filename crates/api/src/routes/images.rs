//! Image upload and serving routes.

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, Path, State, multipart::Field},
    http::{StatusCode, header, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use futures::Stream;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{ImageState, middleware::compression};
use roastery_core::storage::{ImageKey, StorageError};

/// Creates the image routes.
///
/// The serving route carries the compression layer; uploads answer plain
/// JSON.
pub fn routes() -> Router<ImageState> {
    // Method-router layers wrap the handlers added before them, so the
    // compression only covers the serving path.
    Router::new()
        .route(
            "/images/{id}/{filename}",
            get(serve_image).layer(compression()).post(upload_image),
        )
        .route("/", post(upload_multipart))
}

// ============================================================================
// Response Types
// ============================================================================

/// Response for a stored image.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Product id the image belongs to.
    pub id: u64,
    /// Stored filename.
    pub filename: String,
    /// Stored size in bytes.
    pub size: u64,
}

/// One successfully stored multipart part.
#[derive(Debug, Serialize)]
pub struct UploadedPart {
    /// Form part name.
    pub part: String,
    /// Product id the image belongs to.
    pub id: u64,
    /// Stored filename.
    pub filename: String,
    /// Stored size in bytes.
    pub size: u64,
}

/// One rejected multipart part.
#[derive(Debug, Serialize)]
pub struct RejectedPart {
    /// Form part name.
    pub part: String,
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable detail.
    pub message: String,
}

/// Per-part outcome report for a multipart upload.
#[derive(Debug, Serialize)]
pub struct MultipartUploadResponse {
    /// Parts stored successfully.
    pub uploaded: Vec<UploadedPart>,
    /// Parts skipped with their reasons.
    pub rejected: Vec<RejectedPart>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Map a storage error to the JSON error envelope.
fn storage_error_response(err: &StorageError) -> Response {
    match err {
        StorageError::InvalidFilename(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_filename",
                "message": err.to_string()
            })),
        )
            .into_response(),
        StorageError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Image not found"
            })),
        )
            .into_response(),
        StorageError::FileTooLarge { .. } => (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({
                "error": "file_too_large",
                "message": err.to_string()
            })),
        )
            .into_response(),
        StorageError::Write(_) | StorageError::Init(_) | StorageError::Configuration(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "storage_error",
                "message": "Storage operation failed"
            })),
        )
            .into_response(),
    }
}

/// Machine-readable code for a per-part rejection.
fn storage_error_code(err: &StorageError) -> &'static str {
    match err {
        StorageError::InvalidFilename(_) => "invalid_filename",
        StorageError::NotFound(_) => "not_found",
        StorageError::FileTooLarge { .. } => "file_too_large",
        StorageError::Write(_) | StorageError::Init(_) | StorageError::Configuration(_) => {
            "storage_error"
        }
    }
}

/// Content type for a stored filename, by extension.
fn content_type_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Adapt a multipart field into a chunk stream for the store.
fn field_stream(field: Field<'_>) -> impl Stream<Item = Result<Bytes, axum::Error>> + '_ {
    futures::stream::try_unfold(field, |mut field| async move {
        let chunk = field.chunk().await.map_err(axum::Error::new)?;
        Ok(chunk.map(|bytes| (bytes, field)))
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/images/{id}/{filename}`
/// Store an image streamed as the raw request body.
async fn upload_image(
    State(state): State<ImageState>,
    Path((id, filename)): Path<(u64, String)>,
    body: Body,
) -> Response {
    let key = match ImageKey::new(id, &filename) {
        Ok(key) => key,
        Err(e) => {
            warn!(id, filename = %filename, "Rejected upload filename");
            return storage_error_response(&e);
        }
    };

    match state.store.save(&key, body.into_data_stream()).await {
        Ok(size) => {
            info!(id, filename = %key.filename(), size, "Image uploaded");
            (
                StatusCode::CREATED,
                Json(UploadResponse {
                    id,
                    filename: key.filename().to_string(),
                    size,
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, key = %key, "Failed to store image");
            storage_error_response(&e)
        }
    }
}

/// POST `/`
/// Store images carried in a multipart form.
///
/// A text field named `id` selects the product for the file parts that
/// follow it. Parts are validated and stored independently: failures are
/// reported per part while the remaining parts still persist
/// (skip-and-report).
async fn upload_multipart(
    State(state): State<ImageState>,
    mut multipart: Multipart,
) -> Response {
    let mut product_id: Option<u64> = None;
    let mut uploaded = Vec::new();
    let mut rejected = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed multipart request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "malformed_multipart",
                        "message": e.to_string()
                    })),
                )
                    .into_response();
            }
        };

        let part = field.name().unwrap_or_default().to_string();
        let Some(filename) = field.file_name().map(ToString::to_string) else {
            // Text field: only `id` is meaningful, the rest is ignored.
            if part == "id" {
                match read_id_field(field).await {
                    Ok(id) => product_id = Some(id),
                    Err(rejection) => rejected.push(rejection),
                }
            }
            continue;
        };

        let Some(id) = product_id else {
            rejected.push(RejectedPart {
                part,
                error: "missing_id",
                message: "no id field preceded this file part".to_string(),
            });
            continue;
        };

        let key = match ImageKey::new(id, &filename) {
            Ok(key) => key,
            Err(e) => {
                rejected.push(RejectedPart {
                    part,
                    error: storage_error_code(&e),
                    message: e.to_string(),
                });
                continue;
            }
        };

        match state.store.save(&key, field_stream(field)).await {
            Ok(size) => {
                info!(id, filename = %key.filename(), size, "Multipart image uploaded");
                uploaded.push(UploadedPart {
                    part,
                    id,
                    filename: key.filename().to_string(),
                    size,
                });
            }
            Err(e) => {
                error!(error = %e, key = %key, "Failed to store multipart image");
                rejected.push(RejectedPart {
                    part,
                    error: storage_error_code(&e),
                    message: e.to_string(),
                });
            }
        }
    }

    let status = if rejected.is_empty() {
        StatusCode::CREATED
    } else if uploaded.is_empty() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::MULTI_STATUS
    };

    (status, Json(MultipartUploadResponse { uploaded, rejected })).into_response()
}

/// Read and parse the `id` text field of a multipart form.
async fn read_id_field(field: Field<'_>) -> Result<u64, RejectedPart> {
    let text = field.text().await.map_err(|e| RejectedPart {
        part: "id".to_string(),
        error: "malformed_multipart",
        message: e.to_string(),
    })?;

    text.trim().parse::<u64>().map_err(|_| RejectedPart {
        part: "id".to_string(),
        error: "invalid_id",
        message: format!("'{}' is not a product id", text.trim()),
    })
}

/// GET `/images/{id}/{filename}`
/// Stream a stored image back to the client.
async fn serve_image(
    State(state): State<ImageState>,
    Path((id, filename)): Path<(u64, String)>,
) -> Response {
    let key = match ImageKey::new(id, &filename) {
        Ok(key) => key,
        Err(e) => {
            warn!(id, filename = %filename, "Rejected serve filename");
            return storage_error_response(&e);
        }
    };

    match state.store.open(&key).await {
        Ok(download) => {
            let headers = [
                (
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(content_type_for(key.filename())),
                ),
                (header::CONTENT_LENGTH, HeaderValue::from(download.size)),
            ];
            (StatusCode::OK, headers, Body::from_stream(download.stream)).into_response()
        }
        Err(e) => {
            if !matches!(e, StorageError::NotFound(_)) {
                error!(error = %e, key = %key, "Failed to open image");
            }
            storage_error_response(&e)
        }
    }
}


#[cfg(test)]
mod router_tests {
    use super::*;
    use crate::ImageState;
    use axum::http::Request;
    use flate2::read::GzDecoder;
    use http_body_util::BodyExt;
    use roastery_core::storage::{ImageStore, StorageConfig, StorageProvider};
    use std::io::Read;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_app(max_file_size: u64) -> (Router, TempDir) {
        let dir = TempDir::new().expect("tempdir");
        let config = StorageConfig::new(StorageProvider::local_fs(dir.path()))
            .with_max_file_size(max_file_size);
        let store = ImageStore::from_config(config).expect("should create store");
        let state = ImageState {
            store: Arc::new(store),
        };
        (routes().with_state(state), dir)
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
            .to_vec()
    }

    async fn upload(app: &Router, uri: &str, content: &[u8]) -> StatusCode {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::from(content.to_vec()))
                    .expect("request"),
            )
            .await
            .expect("response");
        response.status()
    }

    async fn fetch(app: &Router, uri: &str, accept_encoding: Option<&str>) -> Response {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(encoding) = accept_encoding {
            builder = builder.header(header::ACCEPT_ENCODING, encoding);
        }
        app.clone()
            .oneshot(builder.body(Body::empty()).expect("request"))
            .await
            .expect("response")
    }

    #[tokio::test]
    async fn test_upload_then_fetch_roundtrip() {
        let (app, _dir) = test_app(1024 * 1024);
        let content = b"definitely a png";

        let status = upload(&app, "/images/1/latte.png", content).await;
        assert_eq!(status, StatusCode::CREATED);

        let response = fetch(&app, "/images/1/latte.png", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/png"
        );
        assert!(response.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(body_bytes(response).await, content);
    }

    #[tokio::test]
    async fn test_upload_invalid_filename_no_store_write() {
        let (app, dir) = test_app(1024);

        let status = upload(&app, "/images/1/a.exe2", b"nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Nothing may reach the store for a rejected filename.
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read root")
            .collect();
        assert!(entries.is_empty(), "store root should stay empty");
    }

    #[tokio::test]
    async fn test_traversal_filename_rejected() {
        let (app, dir) = test_app(1024);

        let status = upload(&app, "/images/1/..%2F..%2Fescape.png", b"nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .expect("read root")
            .collect();
        assert!(entries.is_empty(), "store root should stay empty");
    }

    #[tokio::test]
    async fn test_fetch_missing_image_404() {
        let (app, _dir) = test_app(1024);
        let response = fetch(&app, "/images/9/ghost.png", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reupload_overwrites() {
        let (app, _dir) = test_app(1024);

        assert_eq!(
            upload(&app, "/images/2/logo.png", b"v1").await,
            StatusCode::CREATED
        );
        assert_eq!(
            upload(&app, "/images/2/logo.png", b"v2 content").await,
            StatusCode::CREATED
        );

        let response = fetch(&app, "/images/2/logo.png", None).await;
        assert_eq!(body_bytes(response).await, b"v2 content");
    }

    #[tokio::test]
    async fn test_upload_too_large_413() {
        let (app, _dir) = test_app(8);
        let status = upload(&app, "/images/1/big.png", b"way more than eight").await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let response = fetch(&app, "/images/1/big.png", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_gzip_fetch_decompresses_to_original() {
        let (app, _dir) = test_app(1024 * 1024);
        let content: Vec<u8> = (0..4096u32).map(|i| (i % 256) as u8).collect();

        assert_eq!(
            upload(&app, "/images/5/beans.png", &content).await,
            StatusCode::CREATED
        );

        let response = fetch(&app, "/images/5/beans.png", Some("gzip")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            "gzip"
        );

        let compressed = body_bytes(response).await;
        let mut decoded = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut decoded)
            .expect("gzip body should decode");
        assert_eq!(decoded, content);

        // The identity request returns the raw bytes.
        let plain = fetch(&app, "/images/5/beans.png", None).await;
        assert!(plain.headers().get(header::CONTENT_ENCODING).is_none());
        assert_eq!(body_bytes(plain).await, content);
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> (String, Vec<u8>) {
        let boundary = "roastery-test-boundary";
        let mut body = Vec::new();
        for (name, filename, content) in parts {
            body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }

    async fn post_multipart(
        app: &Router,
        parts: &[(&str, Option<&str>, &[u8])],
    ) -> (StatusCode, serde_json::Value) {
        let (content_type, body) = multipart_body(parts);
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, content_type)
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");
        let status = response.status();
        let json = serde_json::from_slice(&body_bytes(response).await).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn test_multipart_upload_stores_file() {
        let (app, _dir) = test_app(1024);

        let (status, report) = post_multipart(
            &app,
            &[
                ("id", None, b"42"),
                ("file", Some("latte.png"), b"latte bytes"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report["uploaded"].as_array().unwrap().len(), 1);
        assert_eq!(report["uploaded"][0]["id"], 42);
        assert_eq!(report["uploaded"][0]["filename"], "latte.png");
        assert!(report["rejected"].as_array().unwrap().is_empty());

        let response = fetch(&app, "/images/42/latte.png", None).await;
        assert_eq!(body_bytes(response).await, b"latte bytes");
    }

    #[tokio::test]
    async fn test_multipart_partial_failure_skip_and_report() {
        let (app, _dir) = test_app(1024);

        let (status, report) = post_multipart(
            &app,
            &[
                ("id", None, b"7"),
                ("good", Some("mocha.png"), b"good bytes"),
                ("bad", Some("../../etc/passwd"), b"bad bytes"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::MULTI_STATUS);
        assert_eq!(report["uploaded"].as_array().unwrap().len(), 1);
        assert_eq!(report["rejected"].as_array().unwrap().len(), 1);
        assert_eq!(report["rejected"][0]["part"], "bad");
        assert_eq!(report["rejected"][0]["error"], "invalid_filename");

        // The valid part persisted and is retrievable.
        let response = fetch(&app, "/images/7/mocha.png", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"good bytes");
    }

    #[tokio::test]
    async fn test_multipart_file_before_id_rejected() {
        let (app, _dir) = test_app(1024);

        let (status, report) = post_multipart(
            &app,
            &[("file", Some("latte.png"), b"orphan bytes")],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(report["uploaded"].as_array().unwrap().is_empty());
        assert_eq!(report["rejected"][0]["error"], "missing_id");
    }

    #[tokio::test]
    async fn test_multipart_non_numeric_id_rejected() {
        let (app, _dir) = test_app(1024);

        let (status, report) = post_multipart(
            &app,
            &[
                ("id", None, b"latte"),
                ("file", Some("latte.png"), b"bytes"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let rejected = report["rejected"].as_array().unwrap();
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0]["error"], "invalid_id");
        assert_eq!(rejected[1]["error"], "missing_id");
    }
}
