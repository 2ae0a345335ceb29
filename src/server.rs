//! JSON HTTP surface over the pipeline and synthesizer.
//!
//! Every handler is a stateless call into shared, immutable [`AppState`].

use crate::error::{AnalysisError, ErrorBody, ErrorKind, SynthesisError};
use crate::imagery::{self, GeneratedImage, ImageBackend, UploadedImage};
use crate::pipeline::Pipeline;
use crate::results::{Analysis, Project};
use crate::synth::{self, Preview, Synthesizer};
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{DefaultBodyLimit, FromRequest, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// Largest accepted request body
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Collaborators shared by all requests
pub struct AppState {
    pub pipeline: Pipeline,
    pub synthesizer: Synthesizer,
    pub image_backend: Option<Arc<dyn ImageBackend>>,
}

/// Build the router with all API endpoints
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/analyze", post(analyze))
        .route("/api/preview", post(preview))
        .route("/api/generate-image", post(generate_image))
        .route("/api/export", post(export))
        .route("/api/upload-image", post(upload_image))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}

/// Serve the API until the process is stopped
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    ::log::info!("page2site listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

/// Error response carrying a structured body
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(kind: ErrorKind, body: ErrorBody) -> Self {
        let status =
            StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, body }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        Self::new(err.kind(), ErrorBody::from(&err))
    }
}

impl From<SynthesisError> for ApiError {
    fn from(err: SynthesisError) -> Self {
        Self::new(err.kind(), ErrorBody::from(&err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        invalid_request(rejection.body_text())
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        invalid_request(rejection.body_text())
    }
}

/// Request body that could not be read or decoded
fn invalid_request(message: String) -> ApiError {
    ApiError::new(
        ErrorKind::Validation,
        ErrorBody {
            error: "invalid_request".to_string(),
            message,
        },
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// `Json` extractor whose rejections are [`ApiError`]s
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    time: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        time: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    analysis: Analysis,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let url = request.url.unwrap_or_default();
    match state.pipeline.analyze(&url).await {
        Ok(analysis) => Ok(Json(AnalyzeResponse { analysis })),
        Err(e) => {
            ::log::error!("analyze error: {}", e);
            Err(e.into())
        }
    }
}

#[derive(Deserialize)]
struct PreviewRequest {
    analysis: Analysis,
}

#[derive(Serialize)]
struct PreviewResponse {
    html: String,
    #[serde(flatten)]
    preview: Preview,
}

async fn preview(
    ApiJson(request): ApiJson<PreviewRequest>,
) -> Result<Json<PreviewResponse>, ApiError> {
    let preview = synth::preview(&request.analysis);
    Ok(Json(PreviewResponse {
        html: preview.to_html(),
        preview,
    }))
}

#[derive(Deserialize)]
struct ImageRequest {
    #[serde(default)]
    prompt: String,
}

#[derive(Serialize)]
struct ImageResponse {
    success: bool,
    #[serde(flatten)]
    image: GeneratedImage,
}

async fn generate_image(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    let image = imagery::generate_image(state.image_backend.as_deref(), &request.prompt).await;
    Ok(Json(ImageResponse {
        success: true,
        image,
    }))
}

#[derive(Deserialize)]
struct ExportRequest {
    #[serde(default)]
    project: Project,
}

async fn export(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) =
        payload.map_err(|rejection| SynthesisError::InvalidProject(rejection.body_text()))?;
    let bundle = state.synthesizer.export(&request.project).map_err(|e| {
        ::log::error!("export error: {}", e);
        ApiError::from(e)
    })?;

    let disposition = format!("attachment; filename={}", bundle.filename);
    Ok((
        [
            (header::CONTENT_TYPE, bundle.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bundle.bytes,
    )
        .into_response())
}

#[derive(Serialize)]
struct UploadResponse {
    success: bool,
    #[serde(flatten)]
    image: UploadedImage,
}

async fn upload_image(
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let body = body?;
    if body.is_empty() {
        return Err(ApiError::new(
            ErrorKind::Validation,
            ErrorBody {
                error: "file_missing".to_string(),
                message: "file missing".to_string(),
            },
        ));
    }
    Ok(Json(UploadResponse {
        success: true,
        image: imagery::encode_upload(&body),
    }))
}
