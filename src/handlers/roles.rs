use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::envelope::{Envelope, PaginatedList};
use crate::errors::ServiceError;
use crate::handlers::common::{deleted, ok, FilterParam};
use crate::services::role::{
    CreateRoleRequest, RoleQueryFilter, RoleResponse, UpdateRoleAccountRequest,
    UpdateRoleMenuRequest, UpdateRoleRequest,
};
use crate::{ApiResult, AppState};

pub fn role_routes() -> Router<AppState> {
    Router::new()
        .route("/role", post(create_role))
        .route(
            "/role/:id",
            get(get_role).put(update_role).delete(delete_role),
        )
        .route("/role/menu/:id", put(update_role_menus))
        .route("/role/account/:id", put(update_role_accounts))
        .route("/roles", get(list_roles))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/v1/role",
    request_body = CreateRoleRequest,
    responses(
        (status = 200, description = "Role created", body = Envelope<RoleResponse>),
        (status = 400, description = "Name or description missing", body = Envelope<String>),
        (status = 409, description = "Name taken", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<RoleResponse> {
    Ok(ok(state.services.roles.create(payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/role/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role found", body = Envelope<RoleResponse>),
        (status = 404, description = "Role not found", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn get_role(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<RoleResponse> {
    Ok(ok(state.services.roles.get_by_id(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    params(FilterParam),
    responses(
        (status = 200, description = "Matching roles", body = PaginatedList<RoleResponse>),
        (status = 400, description = "Malformed filter", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    Query(param): Query<FilterParam>,
) -> Result<Json<PaginatedList<RoleResponse>>, ServiceError> {
    let filter: RoleQueryFilter = param.parse()?;
    Ok(Json(state.services.roles.get_by_filter(filter).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/role/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = Envelope<RoleResponse>),
        (status = 404, description = "Role not found", body = Envelope<String>),
        (status = 409, description = "Name taken", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<RoleResponse> {
    Ok(ok(state.services.roles.update(id, payload).await?))
}

/// Add or remove menus visible to a role
#[utoipa::path(
    put,
    path = "/api/v1/role/menu/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = UpdateRoleMenuRequest,
    responses(
        (status = 200, description = "Menus updated", body = Envelope<RoleResponse>),
        (status = 404, description = "Role not found", body = Envelope<String>),
        (status = 409, description = "Menu already in role", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn update_role_menus(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleMenuRequest>,
) -> ApiResult<RoleResponse> {
    Ok(ok(state.services.roles.update_role_menu(id, payload).await?))
}

/// Add or remove accounts holding a role
#[utoipa::path(
    put,
    path = "/api/v1/role/account/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = UpdateRoleAccountRequest,
    responses(
        (status = 200, description = "Members updated", body = Envelope<RoleResponse>),
        (status = 404, description = "Role not found", body = Envelope<String>),
        (status = 409, description = "Account already in role", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn update_role_accounts(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleAccountRequest>,
) -> ApiResult<RoleResponse> {
    Ok(ok(state.services.roles.update_role_account(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/role/{id}",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted", body = Envelope<String>),
        (status = 404, description = "Role not found", body = Envelope<String>)
    ),
    tag = "Roles"
)]
pub async fn delete_role(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.roles.delete(id).await?;
    Ok(deleted())
}
