use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{menu, menu_role, role};
use crate::envelope::{paginate, PageParams, PaginatedList};
use crate::errors::ServiceError;
use crate::services::association::{
    self, AssociationDelta, DeltaPolicy, OnDuplicate, RemoveScope,
};
use crate::services::filter;
use crate::services::role::find_role_by_name;
use crate::services::tree::Forest;

pub const MENU_NOT_FOUND: &str = "Not find menu";
pub const PARENT_NOT_FOUND: &str = "Not find parent menu";
pub const ROLE_NOT_FOUND: &str = "Not find role";
pub const ROLE_ID_NOT_FOUND: &str = "No find role with id";
pub const NAME_REQUIRED: &str = "Name menu is not null";
pub const ROLE_REQUIRED: &str = "Menu have to role";
pub const ROLE_ALREADY_IN_MENU: &str = "Role already in menu";
pub const NO_MENU_ACCESSED: &str = "No menu is accessed";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuResponse {
    pub id: Uuid,
    pub menu_name: String,
    pub href: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
    pub role: Vec<String>,
    #[schema(no_recursion)]
    pub sub_menus: Option<Vec<MenuResponse>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuRequest {
    #[serde(default)]
    pub menu_name: String,
    pub href: Option<String>,
    pub icon: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub role: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuRequest {
    pub menu_name: Option<String>,
    pub href: Option<String>,
    pub icon: Option<String>,
    /// Always applied; `null` turns the menu into a root.
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub add_roles: Vec<String>,
    #[serde(default)]
    pub remove_roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuQueryFilter {
    pub menu_name: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenusByRoleNamesRequest {
    #[serde(default)]
    pub role_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenusByRoleResponse {
    pub role: Vec<MenuResponse>,
    pub no_role: Vec<MenuResponse>,
}

/// Role names attached to each menu.
type MenuRoles = HashMap<Uuid, Vec<String>>;

fn node_builder(
    roles: &MenuRoles,
) -> impl Fn(&menu::Model, Option<Vec<MenuResponse>>) -> MenuResponse + '_ {
    move |model: &menu::Model, sub_menus: Option<Vec<MenuResponse>>| MenuResponse {
        id: model.id,
        menu_name: model.menu_name.clone(),
        href: model.href.clone(),
        icon: model.icon.clone(),
        parent_id: model.parent_id,
        role: roles.get(&model.id).cloned().unwrap_or_default(),
        sub_menus,
    }
}

#[derive(Clone)]
pub struct MenuService {
    db: Arc<DatabaseConnection>,
}

impl MenuService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateMenuRequest) -> Result<MenuResponse, ServiceError> {
        let mut violations = Vec::new();
        if request.menu_name.is_empty() {
            violations.push(NAME_REQUIRED.to_string());
        }
        if request.role.is_empty() {
            violations.push(ROLE_REQUIRED.to_string());
        }
        if !violations.is_empty() {
            error!(?violations, "Rejected menu");
            return Err(ServiceError::Validation(violations));
        }

        let txn = self.db.begin().await?;

        if let Some(parent_id) = request.parent_id {
            if menu::Entity::find_by_id(parent_id).one(&txn).await?.is_none() {
                error!(%parent_id, "{}", PARENT_NOT_FOUND);
                return Err(ServiceError::NotFound(PARENT_NOT_FOUND.to_string()));
            }
        }

        let mut role_ids = Vec::with_capacity(request.role.len());
        for name in &request.role {
            match find_role_by_name(&txn, name).await? {
                Some(role) => role_ids.push(role.id),
                None => {
                    error!(role = %name, "{}", ROLE_NOT_FOUND);
                    return Err(ServiceError::NotFound(ROLE_NOT_FOUND.to_string()));
                }
            }
        }

        let model = menu::ActiveModel {
            id: Set(Uuid::new_v4()),
            menu_name: Set(request.menu_name),
            href: Set(filter::non_empty(request.href)),
            icon: Set(filter::non_empty(request.icon)),
            parent_id: Set(request.parent_id),
        }
        .insert(&txn)
        .await?;

        let delta = AssociationDelta {
            add: role_ids,
            remove: Vec::new(),
        };
        let policy = DeltaPolicy {
            on_duplicate: OnDuplicate::Skip,
            remove_scope: RemoveScope::Pair,
        };
        association::apply_delta(&txn, &association::menu_role_link(), model.id, &delta, &policy)
            .await?;
        txn.commit().await?;

        info!("Created menu: {}", model.id);
        let mut roles = MenuRoles::new();
        roles.insert(model.id, dedup(request.role));
        let build = node_builder(&roles);
        Ok(build(&model, None))
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, menu_id: Uuid) -> Result<MenuResponse, ServiceError> {
        let rows = menu::Entity::find().all(&*self.db).await?;
        let roles = role_names_by_menu(&*self.db).await?;
        let forest = Forest::new(&rows);

        let row = forest.get(menu_id).ok_or_else(|| {
            error!(%menu_id, "{}", MENU_NOT_FOUND);
            ServiceError::NotFound(MENU_NOT_FOUND.to_string())
        })?;
        let build = node_builder(&roles);
        forest.materialize(row, &build)
    }

    /// Root menus with their subtrees.
    #[instrument(skip(self))]
    pub async fn get_by_filter(&self, filter: MenuQueryFilter) -> Result<PaginatedList<MenuResponse>, ServiceError> {
        let rows = menu::Entity::find().all(&*self.db).await?;
        let roles = role_names_by_menu(&*self.db).await?;
        let forest = Forest::new(&rows);
        let build = node_builder(&roles);

        let mut items = Vec::new();
        for root in forest.children_of(None) {
            if filter::equals(&root.menu_name, &filter.menu_name) {
                items.push(forest.materialize(*root, &build)?);
            }
        }

        paginate(items, filter.page)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, menu_id: Uuid, request: UpdateMenuRequest) -> Result<MenuResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = menu::Entity::find_by_id(menu_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                error!(%menu_id, "{}", MENU_NOT_FOUND);
                ServiceError::NotFound(MENU_NOT_FOUND.to_string())
            })?;

        let mut active: menu::ActiveModel = existing.into();
        if let Some(menu_name) = filter::non_empty(request.menu_name) {
            active.menu_name = Set(menu_name);
        }
        if let Some(href) = filter::non_empty(request.href) {
            active.href = Set(Some(href));
        }
        if let Some(icon) = filter::non_empty(request.icon) {
            active.icon = Set(Some(icon));
        }

        if let Some(parent_id) = request.parent_id {
            let rows = menu::Entity::find().all(&txn).await?;
            let forest = Forest::new(&rows);
            if forest.get(parent_id).is_none() {
                error!(%parent_id, "{}", PARENT_NOT_FOUND);
                return Err(ServiceError::NotFound(PARENT_NOT_FOUND.to_string()));
            }
            if forest.is_self_or_descendant(menu_id, parent_id) {
                error!(%menu_id, %parent_id, "Rejected cyclic menu parent");
                return Err(ServiceError::validation("Menu cannot be its own ancestor"));
            }
        }
        active.parent_id = Set(request.parent_id);

        let delta = AssociationDelta {
            add: resolve_role_names(&txn, &request.add_roles).await?,
            remove: resolve_role_names(&txn, &request.remove_roles).await?,
        };
        let policy = DeltaPolicy {
            on_duplicate: OnDuplicate::Conflict(ROLE_ALREADY_IN_MENU.to_string()),
            remove_scope: RemoveScope::Pair,
        };
        association::apply_delta(&txn, &association::menu_role_link(), menu_id, &delta, &policy)
            .await?;

        if active.is_changed() {
            active.update(&txn).await?;
        }
        txn.commit().await?;

        info!("Updated menu: {}", menu_id);
        self.get_by_id(menu_id).await
    }

    /// Deletes a menu. A root also takes its direct children with it; deeper
    /// descendants are left in place.
    #[instrument(skip(self))]
    pub async fn delete(&self, menu_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = menu::Entity::find_by_id(menu_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                error!(%menu_id, "{}", MENU_NOT_FOUND);
                ServiceError::NotFound(MENU_NOT_FOUND.to_string())
            })?;

        let link = association::menu_role_link();
        if existing.parent_id.is_none() {
            let children = menu::Entity::find()
                .filter(menu::Column::ParentId.eq(menu_id))
                .all(&txn)
                .await?;
            for child in &children {
                association::remove_owner(&txn, &link, child.id).await?;
            }
            menu::Entity::delete_many()
                .filter(menu::Column::ParentId.eq(menu_id))
                .exec(&txn)
                .await?;
            if !children.is_empty() {
                warn!(%menu_id, count = children.len(), "Deleted direct children of root menu");
            }
        }

        association::remove_owner(&txn, &link, menu_id).await?;
        let result = menu::Entity::delete_by_id(menu_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            error!(%menu_id, "Error when save");
            return Err(ServiceError::Persistence("Error when save".to_string()));
        }
        txn.commit().await?;

        info!("Deleted menu: {}", menu_id);
        Ok(())
    }

    /// Root menus reachable from the named roles, following the order of the
    /// requested names.
    ///
    /// `None` means none of the roles has any menu at all. A menu appears once
    /// per listed role that holds it, repeats in the request included.
    #[instrument(skip(self))]
    pub async fn get_by_role_names(
        &self,
        request: MenusByRoleNamesRequest,
    ) -> Result<Option<Vec<MenuResponse>>, ServiceError> {
        let role_ids: Vec<Uuid> = resolve_role_names(&*self.db, &request.role_names).await?;
        let by_role = association::menu_role_link().flipped();
        let mut menu_ids = Vec::new();
        for role_id in role_ids {
            menu_ids.extend(association::references_of(&*self.db, &by_role, role_id).await?);
        }
        if menu_ids.is_empty() {
            info!("{}", NO_MENU_ACCESSED);
            return Ok(None);
        }

        let rows = menu::Entity::find().all(&*self.db).await?;
        let roles = role_names_by_menu(&*self.db).await?;
        let forest = Forest::new(&rows);
        let build = node_builder(&roles);

        let mut menus = Vec::new();
        for menu_id in menu_ids {
            if let Some(row) = forest.get(menu_id).filter(|m| m.parent_id.is_none()) {
                menus.push(forest.materialize(row, &build)?);
            }
        }
        Ok(Some(menus))
    }

    /// Partitions every menu by whether it is linked to `role_id`.
    #[instrument(skip(self))]
    pub async fn get_by_role_id(&self, role_id: Uuid) -> Result<MenusByRoleResponse, ServiceError> {
        if role::Entity::find_by_id(role_id).one(&*self.db).await?.is_none() {
            error!(%role_id, "{}", ROLE_ID_NOT_FOUND);
            return Err(ServiceError::NotFound(ROLE_ID_NOT_FOUND.to_string()));
        }

        let linked: HashSet<Uuid> = association::references_of(
            &*self.db,
            &association::menu_role_link().flipped(),
            role_id,
        )
        .await?
        .into_iter()
        .collect();

        let rows = menu::Entity::find().all(&*self.db).await?;
        let roles = role_names_by_menu(&*self.db).await?;
        let forest = Forest::new(&rows);
        let build = node_builder(&roles);

        let mut response = MenusByRoleResponse {
            role: Vec::new(),
            no_role: Vec::new(),
        };
        for row in &rows {
            let node = forest.materialize(row, &build)?;
            if linked.contains(&row.id) {
                response.role.push(node);
            } else {
                response.no_role.push(node);
            }
        }
        Ok(response)
    }

    /// Direct children of `menu_id`, each with its own subtree.
    #[instrument(skip(self))]
    pub async fn get_sub_menus(&self, menu_id: Uuid) -> Result<Vec<MenuResponse>, ServiceError> {
        let rows = menu::Entity::find().all(&*self.db).await?;
        let forest = Forest::new(&rows);
        if forest.get(menu_id).is_none() {
            error!(%menu_id, "{}", MENU_NOT_FOUND);
            return Err(ServiceError::NotFound(MENU_NOT_FOUND.to_string()));
        }

        let roles = role_names_by_menu(&*self.db).await?;
        let subtree = forest.resolve_subtree(Some(menu_id), &node_builder(&roles))?;
        Ok(subtree.unwrap_or_default())
    }
}

/// Ids of the named roles; unknown names are dropped.
async fn resolve_role_names<C: ConnectionTrait>(db: &C, names: &[String]) -> Result<Vec<Uuid>, ServiceError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        match find_role_by_name(db, name).await? {
            Some(role) => ids.push(role.id),
            None => warn!(role = %name, "Skipping unknown role"),
        }
    }
    Ok(ids)
}

async fn role_names_by_menu<C: ConnectionTrait>(db: &C) -> Result<MenuRoles, ServiceError> {
    let names: HashMap<Uuid, String> = role::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect();

    let mut by_menu = MenuRoles::new();
    for link in menu_role::Entity::find().all(db).await? {
        if let Some(name) = names.get(&link.role_id) {
            let entry = by_menu.entry(link.menu_id).or_default();
            if !entry.contains(name) {
                entry.push(name.clone());
            }
        }
    }
    Ok(by_menu)
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}
