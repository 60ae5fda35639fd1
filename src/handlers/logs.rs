use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::envelope::{Envelope, PaginatedList};
use crate::errors::ServiceError;
use crate::handlers::common::{ok, FilterParam};
use crate::services::log::{LogModel, LogQueryFilter};
use crate::{ApiResult, AppState};

/// Log endpoints. Mounted behind the bearer-token middleware.
pub fn log_routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs))
        .route("/log/:id", get(get_log))
}

#[utoipa::path(
    get,
    path = "/api/v1/logs",
    params(FilterParam),
    responses(
        (status = 200, description = "Matching log entries", body = PaginatedList<LogModel>),
        (status = 400, description = "Malformed filter", body = Envelope<String>),
        (status = 502, description = "Search index unavailable", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Logs"
)]
pub async fn list_logs(
    State(state): State<AppState>,
    Query(param): Query<FilterParam>,
) -> Result<Json<PaginatedList<LogModel>>, ServiceError> {
    let filter: LogQueryFilter = param.parse()?;
    Ok(Json(state.services.logs.get_by_filter(filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/log/{id}",
    params(("id" = String, Path, description = "Log document id")),
    responses(
        (status = 200, description = "Log entry", body = Envelope<LogModel>),
        (status = 404, description = "Log not found", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Logs"
)]
pub async fn get_log(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<LogModel> {
    Ok(ok(state.services.logs.get_by_id(&id).await?))
}
