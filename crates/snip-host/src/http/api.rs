use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use serde::{Deserialize, Serialize};
use snip_core::StoreError;
use utoipa::{OpenApi, ToSchema};

use crate::http::HttpState;
use crate::runner::{RunOutcome, RunnerError};

pub fn router() -> Router<HttpState> {
    Router::new()
        .route("/health", get(health))
        .route("/files/{filename}", put(save_file))
        .route("/files/{filename}", get(read_file))
        .route("/files/{filename}", patch(patch_file))
        .route("/files/{filename}", delete(delete_file))
        .route("/files/{filename}/run", post(run_file))
        .route("/run", post(run_code))
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "snipd",
        description = "Snippet file service: save, read, patch, trash and run .py/.jac files"
    ),
    paths(health, save_file, read_file, patch_file, delete_file, run_file, run_code),
    components(schemas(SavePayload, PatchPayload, RunPayload, FileReply, RunReply, ErrorReply))
)]
struct ApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[derive(Debug)]
enum ApiError {
    Store(StoreError),
    Runner(RunnerError),
    Invalid(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<RunnerError> for ApiError {
    fn from(err: RunnerError) -> Self {
        ApiError::Runner(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Store(err) => (store_status(&err), err.code(), err.to_string()),
            ApiError::Runner(err) => {
                let status = if err.is_client_error() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, err.code(), err.to_string())
            }
            ApiError::Invalid(msg) => (StatusCode::BAD_REQUEST, "invalid_input", msg),
        };
        if status.is_server_error() {
            tracing::error!(code, message, "request failed");
        }
        let body = ErrorReply {
            success: false,
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::FileNotFound { .. } => StatusCode::NOT_FOUND,
        StoreError::FileAlreadyExists { .. } => StatusCode::CONFLICT,
        StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

#[derive(Debug, Deserialize, ToSchema)]
struct SavePayload {
    /// Snippet source text.
    code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
struct PatchPayload {
    /// Sed-style command: `s<delimiter>find<delimiter>replace<delimiter>flags`.
    command: String,
}

#[derive(Debug, Deserialize, ToSchema)]
struct RunPayload {
    /// Raw code to materialize and run.
    code: String,
    /// Name whose suffix selects the interpreter (.py or .jac).
    filename: String,
}

#[derive(Debug, Serialize, ToSchema)]
struct FileReply {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
struct RunReply {
    success: bool,
    message: String,
    stdout: String,
    stderr: String,
    exit_code: i32,
    timed_out: bool,
}

#[derive(Debug, Serialize, ToSchema)]
struct ErrorReply {
    success: bool,
    code: String,
    message: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up"))
)]
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[utoipa::path(
    put,
    path = "/api/files/{filename}",
    params(("filename" = String, Path, description = "Snippet filename (.py or .jac)")),
    request_body = SavePayload,
    responses(
        (status = 201, description = "File created", body = FileReply),
        (status = 200, description = "File overwritten", body = FileReply),
        (status = 400, description = "Invalid filename or payload", body = ErrorReply),
        (status = 409, description = "File exists (create-only policy)", body = ErrorReply),
    )
)]
async fn save_file(
    State(state): State<HttpState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let payload: SavePayload = parse_body(&body)?;
    let created = state.store.save(&filename, &payload.code)?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    let verb = if created { "created" } else { "updated" };
    let reply = FileReply {
        success: true,
        message: format!("'{filename}' {verb}"),
        content: None,
    };
    Ok((status, Json(reply)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/files/{filename}",
    params(("filename" = String, Path, description = "Snippet filename (.py or .jac)")),
    responses(
        (status = 200, description = "File content", body = FileReply),
        (status = 404, description = "File not found", body = ErrorReply),
    )
)]
async fn read_file(
    State(state): State<HttpState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state.store.read(&filename)?;
    Ok(Json(FileReply {
        success: true,
        message: format!("'{filename}' read"),
        content: Some(content),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/files/{filename}",
    params(("filename" = String, Path, description = "Snippet filename (.py or .jac)")),
    request_body = PatchPayload,
    responses(
        (status = 200, description = "Patch applied; new content echoed back", body = FileReply),
        (status = 400, description = "Bad directive or no effective change", body = ErrorReply),
        (status = 404, description = "File not found", body = ErrorReply),
    )
)]
async fn patch_file(
    State(state): State<HttpState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: PatchPayload = parse_body(&body)?;
    let content = state.store.patch(&filename, &payload.command)?;
    Ok(Json(FileReply {
        success: true,
        message: format!("'{filename}' patched"),
        content: Some(content),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/files/{filename}",
    params(("filename" = String, Path, description = "Snippet filename (.py or .jac)")),
    responses(
        (status = 200, description = "File moved to trash", body = FileReply),
        (status = 404, description = "File not found", body = ErrorReply),
    )
)]
async fn delete_file(
    State(state): State<HttpState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.trash(&filename)?;
    Ok(Json(FileReply {
        success: true,
        message: format!("'{filename}' moved to trash"),
        content: None,
    }))
}

#[utoipa::path(
    post,
    path = "/api/files/{filename}/run",
    params(("filename" = String, Path, description = "Snippet filename (.py or .jac)")),
    responses(
        (status = 200, description = "Run finished (exit code in body)", body = RunReply),
        (status = 404, description = "File not found", body = ErrorReply),
        (status = 500, description = "Interpreter could not be spawned", body = ErrorReply),
    )
)]
async fn run_file(
    State(state): State<HttpState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state.store.existing_path(&filename)?;
    let outcome = state.runner.run_file(&path).await?;
    Ok(Json(run_reply(&filename, outcome)))
}

#[utoipa::path(
    post,
    path = "/api/run",
    request_body = RunPayload,
    responses(
        (status = 200, description = "Run finished (exit code in body)", body = RunReply),
        (status = 400, description = "Unsupported language or bad payload", body = ErrorReply),
        (status = 500, description = "Interpreter could not be spawned", body = ErrorReply),
    )
)]
async fn run_code(
    State(state): State<HttpState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let payload: RunPayload = parse_body(&body)?;
    let outcome = state.runner.run_code(&payload.code, &payload.filename).await?;
    Ok(Json(run_reply(&payload.filename, outcome)))
}

fn run_reply(filename: &str, outcome: RunOutcome) -> RunReply {
    let message = if outcome.timed_out {
        format!("'{filename}' timed out and was killed")
    } else {
        format!("'{filename}' exited with code {}", outcome.exit_code)
    };
    RunReply {
        success: true,
        message,
        stdout: outcome.stdout,
        stderr: outcome.stderr,
        exit_code: outcome.exit_code,
        timed_out: outcome.timed_out,
    }
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::Invalid(format!("decode json: {e}")))
}
