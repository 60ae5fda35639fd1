use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::envelope::{Envelope, PaginatedList};
use crate::errors::ServiceError;
use crate::handlers::common::{deleted, ok, FilterParam};
use crate::services::news::{
    CreateNewsRequest, NewsByCategoryResponse, NewsQueryFilter, NewsResponse, UpdateNewsRequest,
};
use crate::{ApiResult, AppState};

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/news", post(create_news).get(list_news))
        .route(
            "/news/:id",
            get(get_news).put(update_news).delete(delete_news),
        )
        .route("/news/category/:category_id", get(news_by_category))
}

/// Create a news article
#[utoipa::path(
    post,
    path = "/api/v1/news",
    request_body = CreateNewsRequest,
    responses(
        (status = 200, description = "News created", body = Envelope<NewsResponse>),
        (status = 400, description = "Title or content missing", body = Envelope<String>),
        (status = 404, description = "Category not found", body = Envelope<String>)
    ),
    tag = "News"
)]
pub async fn create_news(
    State(state): State<AppState>,
    Json(payload): Json<CreateNewsRequest>,
) -> ApiResult<NewsResponse> {
    Ok(ok(state.services.news.create(payload).await?))
}

/// Get a news article with its categories
#[utoipa::path(
    get,
    path = "/api/v1/news/{id}",
    params(("id" = Uuid, Path, description = "News id")),
    responses(
        (status = 200, description = "News found", body = Envelope<NewsResponse>),
        (status = 404, description = "News not found", body = Envelope<String>)
    ),
    tag = "News"
)]
pub async fn get_news(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<NewsResponse> {
    Ok(ok(state.services.news.get_by_id(id).await?))
}

/// Filter and page news
#[utoipa::path(
    get,
    path = "/api/v1/news",
    params(FilterParam),
    responses(
        (status = 200, description = "Matching news", body = PaginatedList<NewsResponse>),
        (status = 400, description = "Malformed filter", body = Envelope<String>)
    ),
    tag = "News"
)]
pub async fn list_news(
    State(state): State<AppState>,
    Query(param): Query<FilterParam>,
) -> Result<Json<PaginatedList<NewsResponse>>, ServiceError> {
    let filter: NewsQueryFilter = param.parse()?;
    Ok(Json(state.services.news.get_by_filter(filter).await?))
}

/// Update a news article and its categories
#[utoipa::path(
    put,
    path = "/api/v1/news/{id}",
    params(("id" = Uuid, Path, description = "News id")),
    request_body = UpdateNewsRequest,
    responses(
        (status = 200, description = "News updated", body = Envelope<NewsResponse>),
        (status = 404, description = "News not found", body = Envelope<String>)
    ),
    tag = "News"
)]
pub async fn update_news(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNewsRequest>,
) -> ApiResult<NewsResponse> {
    Ok(ok(state.services.news.update(id, payload).await?))
}

/// Delete a news article
#[utoipa::path(
    delete,
    path = "/api/v1/news/{id}",
    params(("id" = Uuid, Path, description = "News id")),
    responses(
        (status = 200, description = "News deleted", body = Envelope<String>),
        (status = 404, description = "News not found", body = Envelope<String>)
    ),
    tag = "News"
)]
pub async fn delete_news(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.news.delete(id).await?;
    Ok(deleted())
}

/// Split news by membership in a category
#[utoipa::path(
    get,
    path = "/api/v1/news/category/{category_id}",
    params(("category_id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Partitioned news", body = Envelope<NewsByCategoryResponse>),
        (status = 404, description = "Category not found", body = Envelope<String>)
    ),
    tag = "News"
)]
pub async fn news_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<Uuid>,
) -> ApiResult<NewsByCategoryResponse> {
    Ok(ok(state.services.news.get_by_category_id(category_id).await?))
}
