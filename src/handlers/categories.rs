use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::envelope::{Envelope, PaginatedList};
use crate::errors::ServiceError;
use crate::handlers::common::{deleted, ok, FilterParam};
use crate::services::category::{
    CategoriesByNewsResponse, CategoryQueryFilter, CategoryResponse, CreateCategoryRequest,
    UpdateCategoryRequest,
};
use crate::{ApiResult, AppState};

/// Category endpoints. Mounted behind the bearer-token middleware.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/category", post(create_category))
        .route(
            "/category/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
        .route("/categories", get(list_categories))
        .route("/categories/news/:news_id", get(categories_by_news))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Category created", body = Envelope<CategoryResponse>),
        (status = 400, description = "Name missing", body = Envelope<String>),
        (status = 404, description = "Parent not found", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    let category = state.services.categories.create(payload).await?;
    Ok(ok(category))
}

/// Get a category with its subtree
#[utoipa::path(
    get,
    path = "/api/v1/category/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category found", body = Envelope<CategoryResponse>),
        (status = 404, description = "Category not found", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn get_category(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<CategoryResponse> {
    let category = state.services.categories.get_by_id(id).await?;
    Ok(ok(category))
}

/// Filter and page categories
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(FilterParam),
    responses(
        (status = 200, description = "Matching categories", body = PaginatedList<CategoryResponse>),
        (status = 400, description = "Malformed filter", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(param): Query<FilterParam>,
) -> Result<Json<PaginatedList<CategoryResponse>>, ServiceError> {
    let filter: CategoryQueryFilter = param.parse()?;
    let page = state.services.categories.get_by_filter(filter).await?;
    Ok(Json(page))
}

/// Update a category and its news links
#[utoipa::path(
    put,
    path = "/api/v1/category/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = Envelope<CategoryResponse>),
        (status = 404, description = "Category or parent not found", body = Envelope<String>),
        (status = 409, description = "News already linked", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<CategoryResponse> {
    let category = state.services.categories.update(id, payload).await?;
    Ok(ok(category))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/category/{id}",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted", body = Envelope<String>),
        (status = 404, description = "Category not found", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn delete_category(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.categories.delete(id).await?;
    Ok(deleted())
}

/// Split categories by whether they hold a news article
#[utoipa::path(
    get,
    path = "/api/v1/categories/news/{news_id}",
    params(("news_id" = Uuid, Path, description = "News id")),
    responses(
        (status = 200, description = "Partitioned categories", body = Envelope<CategoriesByNewsResponse>),
        (status = 404, description = "News not found", body = Envelope<String>)
    ),
    security(("Bearer" = [])),
    tag = "Categories"
)]
pub async fn categories_by_news(
    State(state): State<AppState>,
    Path(news_id): Path<Uuid>,
) -> ApiResult<CategoriesByNewsResponse> {
    let partition = state.services.categories.get_by_news_id(news_id).await?;
    Ok(ok(partition))
}
