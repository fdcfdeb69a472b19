// src/server/mod.rs
use crate::ctc;
use crate::export::{self, ExportArtifact};
use crate::storage::StorageManager;
use crate::utils::error::AppError;
use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

// Inputs are pasted certificate text; real documents are far below this.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub file_id: Uuid,
    pub filename: String,
    pub records: usize,
    pub download_url: String,
    pub message: String,
}

/// Assembles the extraction API router.
pub fn router(storage: Arc<StorageManager>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/extract", post(extract_handler))
        .route("/api/exports/:file_id", get(download_export_handler))
        .with_state(storage)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}

/// Binds the listener and serves the extraction API until shutdown.
pub async fn run(port: u16, storage: Arc<StorageManager>) -> Result<(), AppError> {
    let app = router(storage);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Runs the extraction pipeline for one pasted document and stores the
/// resulting workbook for download. Zero matches is not an error: the
/// response reports zero records over an empty spreadsheet.
async fn extract_handler(
    State(storage): State<Arc<StorageManager>>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, (StatusCode, String)> {
    tracing::info!(
        "Extract request received ({} characters)",
        request.text.chars().count()
    );

    // A malformed amount aborts the whole document, matching the reference
    // behavior; the extractor's own pattern makes this unreachable in
    // practice.
    let records = ctc::extract_records(&request.text).map_err(|e| {
        tracing::error!("Extraction failed: {}", e);
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(
                "Ocorreu um erro ao processar os dados: {}. Verifique o formato do texto de entrada.",
                e
            ),
        )
    })?;

    let artifact = ExportArtifact::build(&records).map_err(|e| {
        internal_error(AppError::Export(e))
    })?;
    storage
        .save_export(&artifact)
        .map_err(|e| internal_error(AppError::Storage(e)))?;
    storage
        .save_export_metadata(&artifact)
        .map_err(|e| internal_error(AppError::Storage(e)))?;

    Ok(Json(ExtractResponse {
        file_id: artifact.file_id,
        filename: artifact.download_name.clone(),
        records: artifact.record_count,
        download_url: format!("/api/exports/{}", artifact.file_id),
        message: format!("{} registro(s) extraído(s).", artifact.record_count),
    }))
}

/// Serves a stored workbook as an attachment download.
async fn download_export_handler(
    State(storage): State<Arc<StorageManager>>,
    Path(file_id): Path<String>,
) -> Result<Response, StatusCode> {
    let file_id = Uuid::parse_str(&file_id).map_err(|_| {
        tracing::warn!("Invalid export id: {}", file_id);
        StatusCode::BAD_REQUEST
    })?;

    if !storage.export_exists(file_id) {
        tracing::warn!("Export not found: {}", file_id);
        return Err(StatusCode::NOT_FOUND);
    }

    let path = storage.export_path(file_id);
    let content = tokio::fs::read(&path).await.map_err(|e| {
        tracing::error!("Failed to read export {}: {}", path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("Serving export {} ({} bytes)", file_id, content.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::DOWNLOAD_NAME),
            ),
        ],
        content,
    )
        .into_response())
}

fn internal_error(err: AppError) -> (StatusCode, String) {
    tracing::error!("Request failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Falha ao gerar o arquivo de exportação.".to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> (tempfile::TempDir, Arc<StorageManager>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(StorageManager::new(dir.path()).unwrap());
        (dir, storage)
    }

    #[tokio::test]
    async fn test_extract_stores_a_downloadable_artifact() {
        let (_dir, storage) = test_storage();

        let Json(response) = extract_handler(
            State(storage.clone()),
            Json(ExtractRequest {
                text: "01/2020 732,47\n02/2020 2.258,31".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.records, 2);
        assert_eq!(response.filename, "dados_ctc.xlsx");
        assert_eq!(
            response.download_url,
            format!("/api/exports/{}", response.file_id)
        );
        assert!(storage.export_exists(response.file_id));

        let download =
            download_export_handler(State(storage), Path(response.file_id.to_string())).await;
        assert!(download.is_ok());
    }

    #[tokio::test]
    async fn test_extract_with_no_matches_reports_zero_records() {
        let (_dir, storage) = test_storage();

        let Json(response) = extract_handler(
            State(storage.clone()),
            Json(ExtractRequest {
                text: "texto sem competências".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.records, 0);
        assert!(storage.export_exists(response.file_id));
    }

    #[tokio::test]
    async fn test_download_unknown_id_is_not_found() {
        let (_dir, storage) = test_storage();

        let result =
            download_export_handler(State(storage), Path(Uuid::new_v4().to_string())).await;

        assert_eq!(result.err(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_download_malformed_id_is_bad_request() {
        let (_dir, storage) = test_storage();

        let result =
            download_export_handler(State(storage), Path("not-a-uuid".to_string())).await;

        assert_eq!(result.err(), Some(StatusCode::BAD_REQUEST));
    }
}
