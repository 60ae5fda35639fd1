use std::collections::HashSet;
use std::sync::Arc;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{category, news};
use crate::envelope::{paginate, PageParams, PaginatedList};
use crate::errors::ServiceError;
use crate::services::association::{
    self, AssociationDelta, DeltaPolicy, OnDuplicate, RemoveScope,
};
use crate::services::filter;
use crate::services::tree::Forest;

pub const CATEGORY_NOT_FOUND: &str = "Not find category with id";
pub const PARENT_NOT_FOUND: &str = "Not find parent category";
pub const NAME_REQUIRED: &str = "Name category is null";
pub const NEWS_NOT_FOUND: &str = "No find news with id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub parent_id: Option<Uuid>,
    #[schema(no_recursion)]
    pub sub_categories: Option<Vec<CategoryResponse>>,
}

impl CategoryResponse {
    /// Category without its subtree
    pub fn flat(model: &category::Model) -> Self {
        build_node(model, None)
    }
}

fn build_node(model: &category::Model, sub_categories: Option<Vec<CategoryResponse>>) -> CategoryResponse {
    CategoryResponse {
        id: model.id,
        name: model.name.clone(),
        parent_id: model.parent_id,
        sub_categories,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub add_news_ids: Vec<Uuid>,
    #[serde(default)]
    pub remove_news_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQueryFilter {
    pub name: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(flatten)]
    pub page: PageParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoriesByNewsResponse {
    pub category_have_news: Vec<CategoryResponse>,
    pub category_no_have_news: Vec<CategoryResponse>,
}

/// Category service: hierarchy reads and category-news associations
#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateCategoryRequest) -> Result<CategoryResponse, ServiceError> {
        if request.name.is_empty() {
            error!("{}", NAME_REQUIRED);
            return Err(ServiceError::validation(NAME_REQUIRED));
        }

        if let Some(parent_id) = request.parent_id {
            if category::Entity::find_by_id(parent_id)
                .one(&*self.db)
                .await?
                .is_none()
            {
                error!(%parent_id, "{}", PARENT_NOT_FOUND);
                return Err(ServiceError::NotFound(PARENT_NOT_FOUND.to_string()));
            }
        }

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            parent_id: Set(request.parent_id),
        }
        .insert(&*self.db)
        .await?;

        info!("Created category: {}", model.id);
        Ok(CategoryResponse::flat(&model))
    }

    /// Category with its full subtree
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, category_id: Uuid) -> Result<CategoryResponse, ServiceError> {
        let rows = category::Entity::find().all(&*self.db).await?;
        let forest = Forest::new(&rows);
        let row = forest.get(category_id).ok_or_else(|| {
            error!(%category_id, "{}", CATEGORY_NOT_FOUND);
            ServiceError::NotFound(CATEGORY_NOT_FOUND.to_string())
        })?;
        forest.materialize(row, &build_node)
    }

    /// Every category (roots and children alike) with its subtree
    #[instrument(skip(self))]
    pub async fn get_by_filter(
        &self,
        filter: CategoryQueryFilter,
    ) -> Result<PaginatedList<CategoryResponse>, ServiceError> {
        let rows = category::Entity::find().all(&*self.db).await?;
        let forest = Forest::new(&rows);

        let mut items = Vec::new();
        for row in &rows {
            if !filter::contains(&row.name, &filter.name) {
                continue;
            }
            if filter.parent_id.is_some() && row.parent_id != filter.parent_id {
                continue;
            }
            items.push(forest.materialize(row, &build_node)?);
        }

        paginate(items, filter.page)
    }

    /// Partial update plus news association delta, committed once.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                error!(%category_id, "{}", CATEGORY_NOT_FOUND);
                ServiceError::NotFound(CATEGORY_NOT_FOUND.to_string())
            })?;

        let mut current_name = existing.name.clone();
        let mut active: category::ActiveModel = existing.into();

        if let Some(name) = filter::non_empty(request.name) {
            current_name = name.clone();
            active.name = Set(name);
        }

        if let Some(parent_id) = request.parent_id {
            let rows = category::Entity::find().all(&txn).await?;
            let forest = Forest::new(&rows);
            if forest.get(parent_id).is_none() {
                error!(%parent_id, "{}", PARENT_NOT_FOUND);
                return Err(ServiceError::NotFound(PARENT_NOT_FOUND.to_string()));
            }
            if forest.is_self_or_descendant(category_id, parent_id) {
                error!(%category_id, %parent_id, "Rejected cyclic category parent");
                return Err(ServiceError::validation(
                    "Category cannot be its own ancestor",
                ));
            }
            active.parent_id = Set(Some(parent_id));
        }

        let delta = AssociationDelta {
            add: association::existing_ids::<_, news::Entity>(&txn, &request.add_news_ids).await?,
            remove: association::existing_ids::<_, news::Entity>(&txn, &request.remove_news_ids)
                .await?,
        };
        let policy = DeltaPolicy {
            on_duplicate: OnDuplicate::Conflict(format!("News already in '{}'", current_name)),
            remove_scope: RemoveScope::AnyOwner,
        };
        association::apply_delta(
            &txn,
            &association::category_news_link(),
            category_id,
            &delta,
            &policy,
        )
        .await?;

        if active.is_changed() {
            active.update(&txn).await?;
        }
        txn.commit().await?;

        info!("Updated category: {}", category_id);
        self.get_by_id(category_id).await
    }

    /// Removes the category and its news links. Children keep their now
    /// dangling parent id.
    #[instrument(skip(self))]
    pub async fn delete(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        if category::Entity::find_by_id(category_id)
            .one(&txn)
            .await?
            .is_none()
        {
            error!(%category_id, "{}", CATEGORY_NOT_FOUND);
            return Err(ServiceError::NotFound(CATEGORY_NOT_FOUND.to_string()));
        }

        association::remove_owner(&txn, &association::category_news_link(), category_id).await?;
        let result = category::Entity::delete_by_id(category_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            error!(%category_id, "Error when save");
            return Err(ServiceError::Persistence("Error when save".to_string()));
        }
        txn.commit().await?;

        info!("Deleted category: {}", category_id);
        Ok(())
    }

    /// Partitions all categories by whether they hold `news_id`. Each entry
    /// carries its own subtree.
    #[instrument(skip(self))]
    pub async fn get_by_news_id(&self, news_id: Uuid) -> Result<CategoriesByNewsResponse, ServiceError> {
        if news::Entity::find_by_id(news_id).one(&*self.db).await?.is_none() {
            error!(%news_id, "{}", NEWS_NOT_FOUND);
            return Err(ServiceError::NotFound(NEWS_NOT_FOUND.to_string()));
        }

        let linked: HashSet<Uuid> = association::references_of(
            &*self.db,
            &association::category_news_link().flipped(),
            news_id,
        )
        .await?
        .into_iter()
        .collect();

        let rows = category::Entity::find().all(&*self.db).await?;
        let forest = Forest::new(&rows);
        let mut have = Vec::new();
        let mut no_have = Vec::new();
        for row in &rows {
            let node = forest.materialize(row, &build_node)?;
            if linked.contains(&row.id) {
                have.push(node);
            } else {
                no_have.push(node);
            }
        }

        Ok(CategoriesByNewsResponse {
            category_have_news: have,
            category_no_have_news: no_have,
        })
    }
}
