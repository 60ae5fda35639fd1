use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::envelope::{Envelope, PaginatedList};
use crate::errors::ServiceError;
use crate::handlers::common::{deleted, ok, ok_list, FilterParam};
use crate::services::menu::{
    CreateMenuRequest, MenuQueryFilter, MenuResponse, MenusByRoleNamesRequest,
    MenusByRoleResponse, UpdateMenuRequest, NO_MENU_ACCESSED,
};
use crate::{ApiResult, AppState};

pub fn menu_routes() -> Router<AppState> {
    Router::new()
        .route("/menu", post(create_menu))
        .route("/menu/role", post(menus_by_role_names))
        .route("/menu/role/:role_id", get(menus_by_role))
        .route(
            "/menu/:id",
            get(get_menu).put(update_menu).delete(delete_menu),
        )
        .route("/menu/:id/sub", get(sub_menus))
        .route("/menus", get(list_menus))
}

/// Create a menu
#[utoipa::path(
    post,
    path = "/api/v1/menu",
    request_body = CreateMenuRequest,
    responses(
        (status = 200, description = "Menu created", body = Envelope<MenuResponse>),
        (status = 400, description = "Name or roles missing", body = Envelope<String>),
        (status = 404, description = "Parent or role not found", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn create_menu(
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuRequest>,
) -> ApiResult<MenuResponse> {
    Ok(ok(state.services.menus.create(payload).await?))
}

/// Get a menu with its roles and subtree
#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Menu found", body = Envelope<MenuResponse>),
        (status = 404, description = "Menu not found", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn get_menu(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<MenuResponse> {
    Ok(ok(state.services.menus.get_by_id(id).await?))
}

/// Filter and page root menus
#[utoipa::path(
    get,
    path = "/api/v1/menus",
    params(FilterParam),
    responses(
        (status = 200, description = "Matching root menus", body = PaginatedList<MenuResponse>),
        (status = 400, description = "Malformed filter", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn list_menus(
    State(state): State<AppState>,
    Query(param): Query<FilterParam>,
) -> Result<Json<PaginatedList<MenuResponse>>, ServiceError> {
    let filter: MenuQueryFilter = param.parse()?;
    Ok(Json(state.services.menus.get_by_filter(filter).await?))
}

/// Update a menu and its roles
#[utoipa::path(
    put,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu id")),
    request_body = UpdateMenuRequest,
    responses(
        (status = 200, description = "Menu updated", body = Envelope<MenuResponse>),
        (status = 404, description = "Menu or parent not found", body = Envelope<String>),
        (status = 409, description = "Role already attached", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn update_menu(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuRequest>,
) -> ApiResult<MenuResponse> {
    Ok(ok(state.services.menus.update(id, payload).await?))
}

/// Delete a menu; a root also removes its direct children
#[utoipa::path(
    delete,
    path = "/api/v1/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Menu deleted", body = Envelope<String>),
        (status = 404, description = "Menu not found", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn delete_menu(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.menus.delete(id).await?;
    Ok(deleted())
}

/// Root menus visible to the named roles
#[utoipa::path(
    post,
    path = "/api/v1/menu/role",
    request_body = MenusByRoleNamesRequest,
    responses(
        (status = 200, description = "Accessible menus", body = Envelope<Vec<MenuResponse>>)
    ),
    tag = "Menus"
)]
pub async fn menus_by_role_names(
    State(state): State<AppState>,
    Json(payload): Json<MenusByRoleNamesRequest>,
) -> ApiResult<Vec<MenuResponse>> {
    match state.services.menus.get_by_role_names(payload).await? {
        Some(menus) => Ok(ok_list(menus)),
        None => Ok(Json(
            Envelope::success_with_total(Vec::new(), 0).with_message(NO_MENU_ACCESSED),
        )),
    }
}

/// Split all menus by whether a role can see them
#[utoipa::path(
    get,
    path = "/api/v1/menu/role/{role_id}",
    params(("role_id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Partitioned menus", body = Envelope<MenusByRoleResponse>),
        (status = 404, description = "Role not found", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn menus_by_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<MenusByRoleResponse> {
    Ok(ok(state.services.menus.get_by_role_id(role_id).await?))
}

/// Direct children of a menu
#[utoipa::path(
    get,
    path = "/api/v1/menu/{id}/sub",
    params(("id" = Uuid, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Sub menus", body = Envelope<Vec<MenuResponse>>),
        (status = 404, description = "Menu not found", body = Envelope<String>)
    ),
    tag = "Menus"
)]
pub async fn sub_menus(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Vec<MenuResponse>> {
    Ok(ok_list(state.services.menus.get_sub_menus(id).await?))
}
