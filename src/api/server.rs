use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::CorsLayer;

use super::handlers::{self, ApiResponse, Params};
use crate::data::store::DatasetStore;

type SharedStore = Arc<DatasetStore>;

/// All routes, sharing one read-only store.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/available-years", get(available_years))
        .route("/api/disasters", get(disasters))
        .route("/api/geojson/:country_code", get(geojson))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

async fn available_years(
    State(store): State<SharedStore>,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResponse {
    match query {
        Ok(Query(params)) => handlers::available_years(store.as_ref(), &params),
        Err(rejection) => handlers::malformed(rejection.body_text()),
    }
}

async fn disasters(
    State(store): State<SharedStore>,
    query: Result<Query<Params>, QueryRejection>,
) -> ApiResponse {
    match query {
        Ok(Query(params)) => handlers::disasters(store.as_ref(), &params),
        Err(rejection) => handlers::malformed(rejection.body_text()),
    }
}

async fn geojson(
    State(store): State<SharedStore>,
    country_code: Result<Path<String>, PathRejection>,
) -> ApiResponse {
    match country_code {
        Ok(Path(country_code)) => handlers::geojson(store.as_ref(), &country_code),
        Err(rejection) => handlers::malformed(rejection.body_text()),
    }
}
