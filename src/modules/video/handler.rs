use super::dto::{
    ConversionStatusResponse, RenditionResponse, ReserveLocationRequest, StorageLocationResponse,
};
use super::model::VideoFile;
use super::service::VideoService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;
use uuid::Uuid;

/// Active conversions and the configured limit
#[utoipa::path(
    get,
    path = "/api/v1/conversions",
    responses(
        (
            status = 200,
            description = "Scheduler state",
            body = ApiResponse<ConversionStatusResponse>
        )
    ),
    tag = "Conversion"
)]
pub async fn conversion_status(State(state): State<AppState>) -> impl IntoResponse {
    ApiSuccess(
        ApiResponse::success(
            VideoService::conversion_status(&state),
            "Conversion status retrieved successfully",
        ),
        StatusCode::OK,
    )
}

/// Convert one video to a single quality
#[utoipa::path(
    post,
    path = "/api/v1/videos/{id}/qualities/{quality}/convert",
    params(
        ("id" = Uuid, Path, description = "Video ID"),
        ("quality" = String, Path, description = "Quality name, e.g. 720p")
    ),
    responses(
        (status = 200, description = "Rendition created", body = ApiResponse<RenditionResponse>),
        (status = 404, description = "Video or quality not found"),
        (status = 409, description = "Video is already being converted"),
        (status = 500, description = "Conversion failed")
    ),
    tag = "Conversion"
)]
pub async fn convert_quality(
    State(state): State<AppState>,
    Path((id, quality)): Path<(Uuid, String)>,
) -> impl IntoResponse {
    match VideoService::convert(&state, id, &quality).await {
        Ok(rendition) => ApiSuccess(
            ApiResponse::success(rendition, "Rendition created successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!(video_id = %id, %quality, error = %e, "Manual conversion failed");
            }
            ApiError(e.to_string(), status).into_response()
        }
    }
}

/// List the published renditions of a video
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/files",
    params(
        ("id" = Uuid, Path, description = "Video ID")
    ),
    responses(
        (status = 200, description = "Rendition records", body = ApiResponse<Vec<VideoFile>>),
        (status = 404, description = "Video not found")
    ),
    tag = "Conversion"
)]
pub async fn list_files(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match VideoService::files(&state, id).await {
        Ok(files) => ApiSuccess(
            ApiResponse::success(files, "Renditions retrieved successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}

/// Reserve the storage location for a new upload
#[utoipa::path(
    post,
    path = "/api/v1/storage/locations",
    request_body = ReserveLocationRequest,
    responses(
        (
            status = 201,
            description = "Location reserved",
            body = ApiResponse<StorageLocationResponse>
        ),
        (status = 400, description = "No usable location for this filename")
    ),
    tag = "Storage"
)]
pub async fn reserve_location(
    State(state): State<AppState>,
    Json(payload): Json<ReserveLocationRequest>,
) -> impl IntoResponse {
    match VideoService::reserve_location(&state, &payload.filename) {
        Ok(location) => ApiSuccess(
            ApiResponse::success(location, "Storage location reserved"),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => ApiError(e.to_string(), e.status_code()).into_response(),
    }
}
