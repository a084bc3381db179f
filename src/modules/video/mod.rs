use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod storage_path;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conversions", get(handler::conversion_status))
        .route(
            "/videos/{id}/qualities/{quality}/convert",
            post(handler::convert_quality),
        )
        .route("/videos/{id}/files", get(handler::list_files))
        .route("/storage/locations", post(handler::reserve_location))
}
