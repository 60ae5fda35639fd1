//! Read-only access to application logs kept in a search index.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

use crate::config::SearchConfig;
use crate::envelope::{paginate, PageParams, PaginatedList};
use crate::errors::ServiceError;
use crate::services::filter;

pub const LOG_NOT_FOUND: &str = "Not find log with id";

/// Upper bound on documents fetched by a single `_search`.
pub const SEARCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogModel {
    pub id: String,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogQueryFilter {
    pub level: Option<String>,
    pub message: Option<String>,
    #[serde(flatten)]
    pub page: PageParams,
}

/// Backend holding the log documents.
#[async_trait]
pub trait LogSearch: Send + Sync {
    async fn all(&self) -> Result<Vec<LogModel>, ServiceError>;

    async fn by_id(&self, id: &str) -> Result<Option<LogModel>, ServiceError>;
}

#[derive(Debug, Default, Deserialize)]
struct LogSource {
    #[serde(default, alias = "Level")]
    level: String,
    #[serde(default, alias = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: LogSource,
}

impl From<Hit> for LogModel {
    fn from(hit: Hit) -> Self {
        Self {
            id: hit.id,
            level: hit.source.level,
            message: hit.source.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct DocResponse {
    #[serde(default)]
    found: bool,
    #[serde(flatten)]
    hit: Hit,
}

/// Elasticsearch over its HTTP API.
#[derive(Clone)]
pub struct ElasticLogSearch {
    client: Client,
    base_url: String,
    index: String,
}

impl ElasticLogSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            index: config.default_index.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.index, path)
    }
}

#[async_trait]
impl LogSearch for ElasticLogSearch {
    async fn all(&self) -> Result<Vec<LogModel>, ServiceError> {
        let response = self
            .client
            .post(self.url("_search"))
            .json(&json!({ "size": SEARCH_SIZE, "query": { "match_all": {} } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, index = %self.index, "Log search failed");
            return Err(ServiceError::Search(format!("search returned {status}")));
        }

        let body: SearchResponse = response.json().await?;
        debug!(count = body.hits.hits.len(), "Fetched log documents");
        Ok(body.hits.hits.into_iter().map(LogModel::from).collect())
    }

    async fn by_id(&self, id: &str) -> Result<Option<LogModel>, ServiceError> {
        let response = self
            .client
            .get(self.url(&format!("_doc/{id}")))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            error!(%status, %id, "Log lookup failed");
            return Err(ServiceError::Search(format!("document lookup returned {status}")));
        }

        let doc: DocResponse = response.json().await?;
        Ok(doc.found.then(|| doc.hit.into()))
    }
}

/// Fixed set of documents, used when the search index is disabled and in
/// tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogSearch {
    logs: Vec<LogModel>,
}

impl InMemoryLogSearch {
    pub fn new(logs: Vec<LogModel>) -> Self {
        Self { logs }
    }
}

#[async_trait]
impl LogSearch for InMemoryLogSearch {
    async fn all(&self) -> Result<Vec<LogModel>, ServiceError> {
        Ok(self.logs.clone())
    }

    async fn by_id(&self, id: &str) -> Result<Option<LogModel>, ServiceError> {
        Ok(self.logs.iter().find(|l| l.id == id).cloned())
    }
}

#[derive(Clone)]
pub struct LogService {
    search: Arc<dyn LogSearch>,
}

impl LogService {
    pub fn new(search: Arc<dyn LogSearch>) -> Self {
        Self { search }
    }

    #[instrument(skip(self))]
    pub async fn get_by_filter(&self, filter: LogQueryFilter) -> Result<PaginatedList<LogModel>, ServiceError> {
        let items = self
            .search
            .all()
            .await?
            .into_iter()
            .filter(|l| {
                filter::equals(&l.level, &filter.level) && filter::contains(&l.message, &filter.message)
            })
            .collect();
        paginate(items, filter.page)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<LogModel, ServiceError> {
        self.search.by_id(id).await?.ok_or_else(|| {
            error!(%id, "{}", LOG_NOT_FOUND);
            ServiceError::NotFound(LOG_NOT_FOUND.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn log(id: &str, level: &str, message: &str) -> LogModel {
        LogModel {
            id: id.into(),
            level: level.into(),
            message: message.into(),
        }
    }

    async fn elastic(server: &MockServer) -> ElasticLogSearch {
        ElasticLogSearch::new(&SearchConfig {
            enabled: true,
            url: server.uri(),
            default_index: "news-logging".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn filters_in_memory_logs() {
        let service = LogService::new(Arc::new(InMemoryLogSearch::new(vec![
            log("1", "Error", "db timeout"),
            log("2", "Information", "started"),
            log("3", "Error", "disk full"),
        ])));

        let page = service
            .get_by_filter(LogQueryFilter {
                level: Some("Error".into()),
                message: Some("timeout".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.data, vec![log("1", "Error", "db timeout")]);
    }

    #[tokio::test]
    async fn missing_log_is_not_found() {
        let service = LogService::new(Arc::new(InMemoryLogSearch::default()));
        assert_matches!(
            service.get_by_id("nope").await,
            Err(ServiceError::NotFound(msg)) if msg == LOG_NOT_FOUND
        );
    }

    #[tokio::test]
    async fn elastic_search_reads_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/news-logging/_search"))
            .and(body_partial_json(json!({ "size": SEARCH_SIZE })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "hits": { "hits": [
                    { "_id": "a1", "_source": { "level": "Warning", "message": "slow query" } }
                ] }
            })))
            .mount(&server)
            .await;

        let logs = elastic(&server).await.all().await.unwrap();
        assert_eq!(logs, vec![log("a1", "Warning", "slow query")]);
    }

    #[tokio::test]
    async fn elastic_missing_doc_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news-logging/_doc/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "_id": "gone", "found": false
            })))
            .mount(&server)
            .await;

        assert_eq!(elastic(&server).await.by_id("gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn elastic_server_error_is_search_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/news-logging/_search"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert_matches!(elastic(&server).await.all().await, Err(ServiceError::Search(_)));
    }
}
