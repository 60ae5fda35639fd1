use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, CustomClaim, PasswordPolicy, TokenService};
use crate::entities::{account, account_role, role, role_claim};
use crate::envelope::{paginate, PageParams, PaginatedList};
use crate::errors::ServiceError;
use crate::services::association::{self, RemoveScope};
use crate::services::filter;
use crate::services::role::find_role_by_name;

pub const USER_NOT_FOUND: &str = "User not exists";
pub const LOGIN_FAILED: &str = "Login Failed";
pub const PASSWORD_REQUIRED: &str = "Password is not null";
pub const EMAIL_REQUIRED: &str = "Email is not null";
pub const EMAIL_TAKEN: &str = "User with this email address already exists";
pub const ROLE_ID_NOT_FOUND: &str = "No find role with id";
pub const DEFAULT_ROLE: &str = "User";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub age: i32,
    pub role: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AccountResponse {
    fn new(model: &account::Model, role: Vec<String>) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name.clone(),
            last_name: model.last_name.clone(),
            email: model.email.clone(),
            address: model.address.clone(),
            age: model.age,
            role,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub age: i32,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub age: Option<i32>,
    pub password: Option<String>,
    #[serde(default)]
    pub add_roles: Vec<String>,
    #[serde(default)]
    pub remove_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountQueryFilter {
    pub address: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    #[serde(flatten)]
    pub page: PageParams,
}

impl AccountQueryFilter {
    fn matches(&self, account: &AccountResponse) -> bool {
        filter::contains_ignore_case(&account.address, &self.address)
            && filter::equals_ignore_case(&account.email, &self.email)
            && filter::contains_ignore_case(&account.first_name, &self.first_name)
            && filter::contains_ignore_case(&account.last_name, &self.last_name)
            && filter::positive_equals(account.age, self.age)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountsByRoleResponse {
    pub members: Vec<AccountResponse>,
    pub non_members: Vec<AccountResponse>,
}

fn user_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name}{last_name}")
}

/// Case-insensitive email lookup.
async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<account::Model>, ServiceError> {
    let found = account::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(account::Column::Email))).eq(email.to_lowercase()))
        .one(db)
        .await?;
    Ok(found)
}

/// Roles held by the account, in membership order.
async fn roles_of<C: ConnectionTrait>(db: &C, account_id: Uuid) -> Result<Vec<role::Model>, ServiceError> {
    let ids = association::references_of(db, &association::account_role_link(), account_id).await?;
    let mut by_id: HashMap<Uuid, role::Model> = role::Entity::find()
        .filter(role::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r))
        .collect();

    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
    tokens: Arc<TokenService>,
    policy: PasswordPolicy,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>, tokens: Arc<TokenService>, policy: PasswordPolicy) -> Self {
        Self { db, tokens, policy }
    }

    /// Creates the account, attaches its roles and returns it with a token.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountResponse, ServiceError> {
        let mut violations = Vec::new();
        if request.password.is_empty() {
            violations.push(PASSWORD_REQUIRED.to_string());
        }
        if request.email.is_empty() {
            violations.push(EMAIL_REQUIRED.to_string());
        }
        if !violations.is_empty() {
            error!(?violations, "Rejected registration");
            return Err(ServiceError::Validation(violations));
        }

        if find_by_email(&*self.db, &request.email).await?.is_some() {
            error!("{}", EMAIL_TAKEN);
            return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }
        self.policy.validate(&request.password).map_err(|e| {
            error!("Password policy rejected registration");
            e
        })?;
        let password_hash = hash_password(&request.password)?;

        let role_names = if request.role.is_empty() {
            vec![DEFAULT_ROLE.to_string()]
        } else {
            request.role
        };

        let txn = self.db.begin().await?;
        let model = account::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_name: Set(user_name(&request.first_name, &request.last_name)),
            email: Set(request.email),
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            address: Set(request.address),
            age: Set(request.age),
            password_hash: Set(password_hash),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let link = association::account_role_link();
        for name in &role_names {
            let Some(role) = find_role_by_name(&txn, name).await? else {
                warn!(role = %name, "Skipping unknown role");
                continue;
            };
            if !association::pair_exists(&txn, &link, model.id, role.id).await? {
                association::insert_pair(&txn, &link, model.id, role.id).await?;
            }
        }
        txn.commit().await?;

        info!("Registered account: {}", model.id);
        self.with_token(&model).await
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AccountResponse, ServiceError> {
        let model = find_by_email(&*self.db, &request.email)
            .await?
            .ok_or_else(|| {
                error!("{}", USER_NOT_FOUND);
                ServiceError::NotFound(USER_NOT_FOUND.to_string())
            })?;

        if !verify_password(&request.password, &model.password_hash)? {
            error!(account_id = %model.id, "{}", LOGIN_FAILED);
            return Err(ServiceError::validation(LOGIN_FAILED));
        }

        info!("Account logged in: {}", model.id);
        self.with_token(&model).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, account_id: Uuid) -> Result<AccountResponse, ServiceError> {
        let model = self.find_in(&*self.db, account_id).await?;
        let roles = roles_of(&*self.db, account_id).await?;
        Ok(AccountResponse::new(
            &model,
            roles.into_iter().map(|r| r.name).collect(),
        ))
    }

    #[instrument(skip(self))]
    pub async fn get_by_filter(
        &self,
        filter: AccountQueryFilter,
    ) -> Result<PaginatedList<AccountResponse>, ServiceError> {
        let items = self
            .all_accounts()
            .await?
            .into_iter()
            .filter(|a| filter.matches(a))
            .collect();
        paginate(items, filter.page)
    }

    /// Stages profile changes and role deltas, committing only if every step
    /// succeeds.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        account_id: Uuid,
        request: UpdateAccountRequest,
    ) -> Result<AccountResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = self.find_in(&txn, account_id).await?;

        let mut first_name = existing.first_name.clone();
        let mut last_name = existing.last_name.clone();
        let current_email = existing.email.clone();
        let mut active: account::ActiveModel = existing.into();

        if let Some(value) = filter::non_empty(request.first_name) {
            first_name = value.clone();
            active.first_name = Set(value);
        }
        if let Some(value) = filter::non_empty(request.last_name) {
            last_name = value.clone();
            active.last_name = Set(value);
        }
        if let Some(value) = filter::non_empty(request.address) {
            active.address = Set(value);
        }
        if let Some(age) = request.age.filter(|age| *age > 0) {
            active.age = Set(age);
        }
        active.user_name = Set(user_name(&first_name, &last_name));

        if let Some(email) = filter::non_empty(request.email) {
            if !email.eq_ignore_ascii_case(&current_email) {
                if let Some(other) = find_by_email(&txn, &email).await? {
                    error!(%account_id, other = %other.id, "{}", EMAIL_TAKEN);
                    return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
                }
            }
            active.email = Set(email);
        }

        if let Some(password) = filter::non_empty(request.password) {
            if let Err(e) = self.policy.validate(&password) {
                error!(%account_id, "Password policy rejected update");
                return Err(e);
            }
            active.password_hash = Set(hash_password(&password)?);
        }

        let link = association::account_role_link();
        for name in &request.add_roles {
            let Some(role) = find_role_by_name(&txn, name).await? else {
                warn!(role = %name, "Skipping unknown role");
                continue;
            };
            if association::pair_exists(&txn, &link, account_id, role.id).await? {
                let message = format!("User already in role '{}'", role.name);
                error!(%account_id, "{}", message);
                return Err(ServiceError::Conflict(message));
            }
            association::insert_pair(&txn, &link, account_id, role.id).await?;
        }
        for name in &request.remove_roles {
            let Some(role) = find_role_by_name(&txn, name).await? else {
                warn!(role = %name, "Skipping unknown role");
                continue;
            };
            association::remove_reference(&txn, &link, account_id, role.id, RemoveScope::Pair).await?;
        }

        active.update(&txn).await?;
        txn.commit().await?;

        info!("Updated account: {}", account_id);
        self.get_by_id(account_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, account_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        self.find_in(&txn, account_id).await?;

        association::remove_owner(&txn, &association::account_role_link(), account_id).await?;
        let result = account::Entity::delete_by_id(account_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            error!(%account_id, "Error when save");
            return Err(ServiceError::Persistence("Error when save".to_string()));
        }
        txn.commit().await?;

        info!("Deleted account: {}", account_id);
        Ok(())
    }

    /// Partitions every account by membership in `role_id`.
    #[instrument(skip(self))]
    pub async fn get_by_role_id(&self, role_id: Uuid) -> Result<AccountsByRoleResponse, ServiceError> {
        if role::Entity::find_by_id(role_id).one(&*self.db).await?.is_none() {
            error!(%role_id, "{}", ROLE_ID_NOT_FOUND);
            return Err(ServiceError::NotFound(ROLE_ID_NOT_FOUND.to_string()));
        }

        let members: HashSet<Uuid> = association::references_of(
            &*self.db,
            &association::account_role_link().flipped(),
            role_id,
        )
        .await?
        .into_iter()
        .collect();

        let (members, non_members): (Vec<_>, Vec<_>) = self
            .all_accounts()
            .await?
            .into_iter()
            .partition(|a| members.contains(&a.id));

        Ok(AccountsByRoleResponse {
            members,
            non_members,
        })
    }

    async fn with_token(&self, model: &account::Model) -> Result<AccountResponse, ServiceError> {
        let roles = roles_of(&*self.db, model.id).await?;
        let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        let custom: Vec<CustomClaim> = role_claim::Entity::find()
            .filter(role_claim::Column::RoleId.is_in(role_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| CustomClaim {
                claim_type: c.claim_type,
                value: c.claim_value,
            })
            .collect();

        let names: Vec<String> = roles.into_iter().map(|r| r.name).collect();
        let token = self.tokens.generate(model.id, &model.email, &names, &custom)?;

        let mut response = AccountResponse::new(model, names);
        response.token = Some(token);
        Ok(response)
    }

    async fn all_accounts(&self) -> Result<Vec<AccountResponse>, ServiceError> {
        let accounts = account::Entity::find().all(&*self.db).await?;
        let names: HashMap<Uuid, String> = role::Entity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|r| (r.id, r.name))
            .collect();

        let mut by_account: HashMap<Uuid, Vec<String>> = HashMap::new();
        for link in account_role::Entity::find().all(&*self.db).await? {
            if let Some(name) = names.get(&link.role_id) {
                by_account
                    .entry(link.account_id)
                    .or_default()
                    .push(name.clone());
            }
        }

        Ok(accounts
            .iter()
            .map(|a| AccountResponse::new(a, by_account.remove(&a.id).unwrap_or_default()))
            .collect())
    }

    async fn find_in<C: ConnectionTrait>(&self, db: &C, account_id: Uuid) -> Result<account::Model, ServiceError> {
        account::Entity::find_by_id(account_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                error!(%account_id, "{}", USER_NOT_FOUND);
                ServiceError::NotFound(USER_NOT_FOUND.to_string())
            })
    }
}
