use axum::{
    extract::{Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::envelope::{Envelope, PaginatedList};
use crate::errors::ServiceError;
use crate::handlers::common::{deleted, ok, FilterParam};
use crate::services::account::{
    AccountQueryFilter, AccountResponse, AccountsByRoleResponse, LoginRequest, RegisterRequest,
    UpdateAccountRequest,
};
use crate::{ApiResult, AppState};

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/account/:id", get(get_account).delete(delete_account))
        .route("/account/role/:role_id", get(accounts_by_role))
        .route("/accounts", get(list_accounts))
        .route("/update/:id", put(update_account))
}

/// Register an account and issue a token
#[utoipa::path(
    post,
    path = "/api/v1/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = Envelope<AccountResponse>),
        (status = 400, description = "Missing fields or weak password", body = Envelope<String>),
        (status = 409, description = "Email taken", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<AccountResponse> {
    Ok(ok(state.services.accounts.register(payload).await?))
}

/// Exchange credentials for a token
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = Envelope<AccountResponse>),
        (status = 400, description = "Wrong password", body = Envelope<String>),
        (status = 404, description = "Unknown email", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<AccountResponse> {
    Ok(ok(state.services.accounts.login(payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account found", body = Envelope<AccountResponse>),
        (status = 404, description = "Account not found", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn get_account(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<AccountResponse> {
    Ok(ok(state.services.accounts.get_by_id(id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    params(FilterParam),
    responses(
        (status = 200, description = "Matching accounts", body = PaginatedList<AccountResponse>),
        (status = 400, description = "Malformed filter", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn list_accounts(
    State(state): State<AppState>,
    Query(param): Query<FilterParam>,
) -> Result<Json<PaginatedList<AccountResponse>>, ServiceError> {
    let filter: AccountQueryFilter = param.parse()?;
    Ok(Json(state.services.accounts.get_by_filter(filter).await?))
}

/// Update profile fields, password and roles in one step
#[utoipa::path(
    put,
    path = "/api/v1/update/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = Envelope<AccountResponse>),
        (status = 400, description = "Weak password", body = Envelope<String>),
        (status = 404, description = "Account not found", body = Envelope<String>),
        (status = 409, description = "Email taken or role already held", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> ApiResult<AccountResponse> {
    Ok(ok(state.services.accounts.update(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/account/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account deleted", body = Envelope<String>),
        (status = 404, description = "Account not found", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn delete_account(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<()> {
    state.services.accounts.delete(id).await?;
    Ok(deleted())
}

/// Split accounts by membership in a role
#[utoipa::path(
    get,
    path = "/api/v1/account/role/{role_id}",
    params(("role_id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 200, description = "Partitioned accounts", body = Envelope<AccountsByRoleResponse>),
        (status = 404, description = "Role not found", body = Envelope<String>)
    ),
    tag = "Accounts"
)]
pub async fn accounts_by_role(
    State(state): State<AppState>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<AccountsByRoleResponse> {
    Ok(ok(state.services.accounts.get_by_role_id(role_id).await?))
}
