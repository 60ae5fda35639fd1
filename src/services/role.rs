use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{account, menu, role, role_claim};
use crate::envelope::{paginate, PageParams, PaginatedList};
use crate::errors::ServiceError;
use crate::services::association::{
    self, AssociationDelta, DeltaPolicy, OnDuplicate, RemoveScope,
};
use crate::services::filter;

pub const ROLE_NOT_FOUND: &str = "Not find role with id";
pub const NAME_REQUIRED: &str = "Name role is not null";
pub const DESCRIPTION_REQUIRED: &str = "Description is not null";
pub const NAME_TAKEN: &str = "Role name already exists";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: Uuid,
    pub role_name: String,
    pub description: String,
}

impl From<role::Model> for RoleResponse {
    fn from(model: role::Model) -> Self {
        Self {
            id: model.id,
            role_name: model.name,
            description: model.description,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub role_name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleMenuRequest {
    #[serde(default)]
    pub add_menu_ids: Vec<Uuid>,
    #[serde(default)]
    pub remove_menu_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleAccountRequest {
    #[serde(default)]
    pub add_account_ids: Vec<Uuid>,
    #[serde(default)]
    pub remove_account_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleQueryFilter {
    pub role_name: Option<String>,
    pub description: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

/// Exact, case-sensitive lookup by role name.
pub async fn find_role_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<role::Model>, ServiceError> {
    let found = role::Entity::find()
        .filter(role::Column::Name.eq(name))
        .one(db)
        .await?;
    Ok(found)
}

#[derive(Clone)]
pub struct RoleService {
    db: Arc<DatabaseConnection>,
}

impl RoleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateRoleRequest) -> Result<RoleResponse, ServiceError> {
        let mut violations = Vec::new();
        if request.role_name.is_empty() {
            violations.push(NAME_REQUIRED.to_string());
        }
        if request.description.is_empty() {
            violations.push(DESCRIPTION_REQUIRED.to_string());
        }
        if !violations.is_empty() {
            error!(?violations, "Rejected role");
            return Err(ServiceError::Validation(violations));
        }

        if find_role_by_name(&*self.db, &request.role_name).await?.is_some() {
            error!(role = %request.role_name, "{}", NAME_TAKEN);
            return Err(ServiceError::Conflict(NAME_TAKEN.to_string()));
        }

        let model = role::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.role_name),
            description: Set(request.description),
        }
        .insert(&*self.db)
        .await?;

        info!("Created role: {} ({})", model.name, model.id);
        Ok(model.into())
    }

    /// Returns the role with `name`, creating it when absent.
    #[instrument(skip(self))]
    pub async fn ensure(&self, name: &str, description: &str) -> Result<RoleResponse, ServiceError> {
        if let Some(existing) = find_role_by_name(&*self.db, name).await? {
            return Ok(existing.into());
        }
        self.create(CreateRoleRequest {
            role_name: name.to_string(),
            description: description.to_string(),
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, role_id: Uuid) -> Result<RoleResponse, ServiceError> {
        let model = role::Entity::find_by_id(role_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                error!(%role_id, "{}", ROLE_NOT_FOUND);
                ServiceError::NotFound(ROLE_NOT_FOUND.to_string())
            })?;
        Ok(model.into())
    }

    #[instrument(skip(self))]
    pub async fn get_by_filter(&self, filter: RoleQueryFilter) -> Result<PaginatedList<RoleResponse>, ServiceError> {
        let items = role::Entity::find()
            .all(&*self.db)
            .await?
            .into_iter()
            .filter(|r| {
                filter::equals(&r.name, &filter.role_name)
                    && filter::contains(&r.description, &filter.description)
            })
            .map(RoleResponse::from)
            .collect();
        paginate(items, filter.page)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, role_id: Uuid, request: UpdateRoleRequest) -> Result<RoleResponse, ServiceError> {
        let existing = role::Entity::find_by_id(role_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                error!(%role_id, "{}", ROLE_NOT_FOUND);
                ServiceError::NotFound(ROLE_NOT_FOUND.to_string())
            })?;

        let mut active: role::ActiveModel = existing.clone().into();
        if let Some(name) = filter::non_empty(request.role_name) {
            if name != existing.name {
                if let Some(other) = find_role_by_name(&*self.db, &name).await? {
                    error!(%role_id, other = %other.id, "{}", NAME_TAKEN);
                    return Err(ServiceError::Conflict(NAME_TAKEN.to_string()));
                }
            }
            active.name = Set(name);
        }
        if let Some(description) = filter::non_empty(request.description) {
            active.description = Set(description);
        }

        let model = if active.is_changed() {
            active.update(&*self.db).await?
        } else {
            existing
        };

        info!("Updated role: {}", role_id);
        Ok(model.into())
    }

    /// Applies menu additions and removals to the role in one commit.
    #[instrument(skip(self))]
    pub async fn update_role_menu(
        &self,
        role_id: Uuid,
        request: UpdateRoleMenuRequest,
    ) -> Result<RoleResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = self.find_in(&txn, role_id).await?;

        let delta = AssociationDelta {
            add: association::existing_ids::<_, menu::Entity>(&txn, &request.add_menu_ids).await?,
            remove: association::existing_ids::<_, menu::Entity>(&txn, &request.remove_menu_ids)
                .await?,
        };
        let policy = DeltaPolicy {
            on_duplicate: OnDuplicate::Conflict(format!("Menu already in role '{}'", existing.name)),
            remove_scope: RemoveScope::Pair,
        };
        let outcome = association::apply_delta(
            &txn,
            &association::menu_role_link().flipped(),
            role_id,
            &delta,
            &policy,
        )
        .await?;
        txn.commit().await?;

        info!(%role_id, added = outcome.added, removed = outcome.removed, "Updated role menus");
        Ok(existing.into())
    }

    /// Applies account membership changes to the role in one commit.
    #[instrument(skip(self))]
    pub async fn update_role_account(
        &self,
        role_id: Uuid,
        request: UpdateRoleAccountRequest,
    ) -> Result<RoleResponse, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = self.find_in(&txn, role_id).await?;

        let delta = AssociationDelta {
            add: association::existing_ids::<_, account::Entity>(&txn, &request.add_account_ids)
                .await?,
            remove: association::existing_ids::<_, account::Entity>(
                &txn,
                &request.remove_account_ids,
            )
            .await?,
        };
        let policy = DeltaPolicy {
            on_duplicate: OnDuplicate::Conflict(format!(
                "Account already in role '{}'",
                existing.name
            )),
            remove_scope: RemoveScope::Pair,
        };
        let outcome = association::apply_delta(
            &txn,
            &association::account_role_link().flipped(),
            role_id,
            &delta,
            &policy,
        )
        .await?;
        txn.commit().await?;

        info!(%role_id, added = outcome.added, removed = outcome.removed, "Updated role accounts");
        Ok(existing.into())
    }

    /// Detaches the role from accounts, menus and claims, then deletes it.
    #[instrument(skip(self))]
    pub async fn delete(&self, role_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        self.find_in(&txn, role_id).await?;

        association::remove_owner(&txn, &association::account_role_link().flipped(), role_id)
            .await?;
        association::remove_owner(&txn, &association::menu_role_link().flipped(), role_id).await?;
        role_claim::Entity::delete_many()
            .filter(role_claim::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await?;

        let result = role::Entity::delete_by_id(role_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            error!(%role_id, "Error when save");
            return Err(ServiceError::Persistence("Error when save".to_string()));
        }
        txn.commit().await?;

        info!("Deleted role: {}", role_id);
        Ok(())
    }

    async fn find_in<C: ConnectionTrait>(&self, db: &C, role_id: Uuid) -> Result<role::Model, ServiceError> {
        role::Entity::find_by_id(role_id).one(db).await?.ok_or_else(|| {
            error!(%role_id, "{}", ROLE_NOT_FOUND);
            ServiceError::NotFound(ROLE_NOT_FOUND.to_string())
        })
    }
}
