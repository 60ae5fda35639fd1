use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{category, category_news, news};
use crate::envelope::{paginate, PageParams, PaginatedList};
use crate::errors::ServiceError;
use crate::services::association::{
    self, AssociationDelta, DeltaPolicy, OnDuplicate, RemoveScope,
};
use crate::services::category::CategoryResponse;
use crate::services::filter;

pub const NEWS_NOT_FOUND: &str = "Not find news with id";
pub const CATEGORY_NOT_FOUND: &str = "Not find category";
pub const CATEGORY_ID_NOT_FOUND: &str = "No find category with id";
pub const TITLE_OR_CONTENT_REQUIRED: &str = "Title or content is not null";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub url_image: Option<String>,
    pub create_time: DateTime<Utc>,
    pub update_time: Option<DateTime<Utc>>,
    pub categories: Vec<CategoryResponse>,
}

impl NewsResponse {
    fn from_model(model: &news::Model, categories: Vec<CategoryResponse>) -> Self {
        Self {
            id: model.id,
            title: model.title.clone(),
            content: model.content.clone(),
            url_image: model.url_image.clone(),
            create_time: model.create_time,
            update_time: model.update_time,
            categories,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNewsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub url_image: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNewsRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub url_image: Option<String>,
    #[serde(default)]
    pub add_category_ids: Vec<Uuid>,
    #[serde(default)]
    pub remove_category_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsQueryFilter {
    pub title: Option<String>,
    pub content: Option<String>,
    /// Matches news linked to any of these categories
    #[serde(default)]
    pub category_ids: Vec<Uuid>,
    pub create_from_date: Option<DateTime<Utc>>,
    pub create_to_date: Option<DateTime<Utc>>,
    pub update_from_date: Option<DateTime<Utc>>,
    pub update_to_date: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub page: PageParams,
}

impl NewsQueryFilter {
    fn matches(&self, news: &NewsResponse) -> bool {
        if !filter::contains(&news.title, &self.title)
            || !filter::contains(&news.content, &self.content)
        {
            return false;
        }
        if !self.category_ids.is_empty()
            && !news
                .categories
                .iter()
                .any(|c| self.category_ids.contains(&c.id))
        {
            return false;
        }
        if !within(Some(news.create_time), self.create_from_date, self.create_to_date) {
            return false;
        }
        within(news.update_time, self.update_from_date, self.update_to_date)
    }
}

/// Inclusive range check; an unset bound is open.
fn within(value: Option<DateTime<Utc>>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    match value {
        Some(v) => from.map_or(true, |f| v >= f) && to.map_or(true, |t| v <= t),
        None => false,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewsByCategoryResponse {
    pub news_belong_categories: Vec<NewsResponse>,
    pub news_no_belong_categories: Vec<NewsResponse>,
}

/// Start of the current UTC day
fn today() -> DateTime<Utc> {
    Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[derive(Clone)]
pub struct NewsService {
    db: Arc<DatabaseConnection>,
}

impl NewsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, request: CreateNewsRequest) -> Result<NewsResponse, ServiceError> {
        if request.title.is_empty() || request.content.is_empty() {
            error!("{}", TITLE_OR_CONTENT_REQUIRED);
            return Err(ServiceError::validation(TITLE_OR_CONTENT_REQUIRED));
        }

        let txn = self.db.begin().await?;
        let now = today();
        let model = news::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title),
            content: Set(request.content),
            url_image: Set(filter::non_empty(request.url_image)),
            create_time: Set(now),
            update_time: Set(Some(now)),
        }
        .insert(&txn)
        .await?;

        for category_id in &request.category_ids {
            if category::Entity::find_by_id(*category_id)
                .one(&txn)
                .await?
                .is_none()
            {
                error!(%category_id, "{}", CATEGORY_NOT_FOUND);
                return Err(ServiceError::NotFound(CATEGORY_NOT_FOUND.to_string()));
            }
        }

        let delta = AssociationDelta {
            add: request.category_ids,
            remove: Vec::new(),
        };
        association::apply_delta(&txn, &news_link(), model.id, &delta, &skip_duplicates()).await?;
        txn.commit().await?;

        info!("Created news: {}", model.id);
        self.get_by_id(model.id).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, news_id: Uuid) -> Result<NewsResponse, ServiceError> {
        let model = news::Entity::find_by_id(news_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                error!(%news_id, "{}", NEWS_NOT_FOUND);
                ServiceError::NotFound(NEWS_NOT_FOUND.to_string())
            })?;

        let category_ids = association::references_of(&*self.db, &news_link(), news_id).await?;
        let categories = category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids.clone()))
            .all(&*self.db)
            .await?;
        let by_id: HashMap<Uuid, &category::Model> = categories.iter().map(|c| (c.id, c)).collect();
        let categories = category_ids
            .iter()
            .filter_map(|id| by_id.get(id).map(|c| CategoryResponse::flat(c)))
            .collect();

        Ok(NewsResponse::from_model(&model, categories))
    }

    #[instrument(skip(self))]
    pub async fn get_by_filter(
        &self,
        filter: NewsQueryFilter,
    ) -> Result<PaginatedList<NewsResponse>, ServiceError> {
        let items: Vec<NewsResponse> = self
            .all_news(&*self.db)
            .await?
            .into_iter()
            .filter(|n| filter.matches(n))
            .collect();
        paginate(items, filter.page)
    }

    /// Partial update plus category association delta, committed once.
    #[instrument(skip(self))]
    pub async fn update(&self, news_id: Uuid, request: UpdateNewsRequest) -> Result<NewsResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = news::Entity::find_by_id(news_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                error!(%news_id, "{}", NEWS_NOT_FOUND);
                ServiceError::NotFound(NEWS_NOT_FOUND.to_string())
            })?;

        let mut active: news::ActiveModel = existing.into();
        if let Some(title) = filter::non_empty(request.title) {
            active.title = Set(title);
        }
        if let Some(content) = filter::non_empty(request.content) {
            active.content = Set(content);
        }
        if let Some(url_image) = filter::non_empty(request.url_image) {
            active.url_image = Set(Some(url_image));
        }
        active.update_time = Set(Some(Utc::now()));

        let delta = AssociationDelta {
            add: association::existing_ids::<_, category::Entity>(&txn, &request.add_category_ids)
                .await?,
            remove: association::existing_ids::<_, category::Entity>(
                &txn,
                &request.remove_category_ids,
            )
            .await?,
        };
        association::apply_delta(&txn, &news_link(), news_id, &delta, &skip_duplicates()).await?;

        active.update(&txn).await?;
        txn.commit().await?;

        info!("Updated news: {}", news_id);
        self.get_by_id(news_id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, news_id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        if news::Entity::find_by_id(news_id).one(&txn).await?.is_none() {
            error!(%news_id, "{}", NEWS_NOT_FOUND);
            return Err(ServiceError::NotFound(NEWS_NOT_FOUND.to_string()));
        }

        association::remove_owner(&txn, &news_link(), news_id).await?;
        let result = news::Entity::delete_by_id(news_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            error!(%news_id, "Error when save");
            return Err(ServiceError::Persistence("Error when save".to_string()));
        }
        txn.commit().await?;

        info!("Deleted news: {}", news_id);
        Ok(())
    }

    /// Partitions all news by membership in `category_id`.
    #[instrument(skip(self))]
    pub async fn get_by_category_id(&self, category_id: Uuid) -> Result<NewsByCategoryResponse, ServiceError> {
        if category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            error!(%category_id, "{}", CATEGORY_ID_NOT_FOUND);
            return Err(ServiceError::NotFound(CATEGORY_ID_NOT_FOUND.to_string()));
        }

        let (belong, no_belong): (Vec<_>, Vec<_>) = self
            .all_news(&*self.db)
            .await?
            .into_iter()
            .partition(|n| n.categories.iter().any(|c| c.id == category_id));

        Ok(NewsByCategoryResponse {
            news_belong_categories: belong,
            news_no_belong_categories: no_belong,
        })
    }

    /// Every news article with its flat category list, built from one read of
    /// each table.
    async fn all_news<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<NewsResponse>, ServiceError> {
        let articles = news::Entity::find().all(db).await?;
        let links = category_news::Entity::find().all(db).await?;
        let categories: HashMap<Uuid, category::Model> = category::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut by_news: HashMap<Uuid, Vec<CategoryResponse>> = HashMap::new();
        let mut seen = HashSet::new();
        for link in &links {
            if !seen.insert((link.news_id, link.category_id)) {
                continue;
            }
            if let Some(c) = categories.get(&link.category_id) {
                by_news
                    .entry(link.news_id)
                    .or_default()
                    .push(CategoryResponse::flat(c));
            }
        }

        Ok(articles
            .iter()
            .map(|n| NewsResponse::from_model(n, by_news.remove(&n.id).unwrap_or_default()))
            .collect())
    }
}

/// news -> category view of the category_news table
fn news_link() -> association::Link<category_news::Entity> {
    association::category_news_link().flipped()
}

/// Adding a category a news article already has is silently ignored; removal
/// clears the category from every article.
fn skip_duplicates() -> DeltaPolicy {
    DeltaPolicy {
        on_duplicate: OnDuplicate::Skip,
        remove_scope: RemoveScope::AnyOwner,
    }
}
