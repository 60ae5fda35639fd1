mod common;

use axum::http::{Method, StatusCode};
use common::{filter_query, in_memory_logs, TestApp};
use news_cms_api::services::log::LogModel;
use news_cms_api::services::news::CreateNewsRequest;
use serde_json::{json, Value};

async fn seed_news(app: &TestApp, count: usize) {
    for i in 1..=count {
        app.state
            .services
            .news
            .create(CreateNewsRequest {
                title: format!("news-{i:02}"),
                content: "body".into(),
                url_image: None,
                category_ids: vec![],
            })
            .await
            .unwrap();
    }
}

fn titles(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn category_routes_require_bearer_token() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(Method::POST, "/api/v1/category", Some(json!({ "name": "Tech" })), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "Error");
    assert_eq!(body["data"], Value::Null);

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/category",
            Some(json!({ "name": "Tech" })),
            Some("not-a-jwt"),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn category_create_and_fetch_over_http() {
    let app = TestApp::new().await;

    let (status, created) = app
        .authed(Method::POST, "/api/v1/category", Some(json!({ "name": "Tech" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["status"], "Sucess");
    assert_eq!(created["totalData"], 1);
    let tech = created["data"]["id"].as_str().unwrap().to_string();

    app.authed(
        Method::POST,
        "/api/v1/category",
        Some(json!({ "name": "Gadgets", "parentId": tech })),
    )
    .await;

    let (status, found) = app
        .authed(Method::GET, &format!("/api/v1/category/{tech}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let subs = found["data"]["subCategories"].as_array().unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0]["name"], "Gadgets");
    assert_eq!(subs[0]["subCategories"], Value::Null);
}

#[tokio::test]
async fn missing_category_name_is_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app
        .authed(Method::POST, "/api/v1/category", Some(json!({ "name": "" })))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!(["Name category is null"]));
}

#[tokio::test]
async fn news_list_pages_through_results() {
    let app = TestApp::new().await;
    seed_news(&app, 25).await;

    let filter = filter_query(&json!({ "pageNumber": 2, "pageSize": 10 }));
    let (status, page) = app
        .request(Method::GET, &format!("/api/v1/news?filter={filter}"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pageIndex"], 2);
    assert_eq!(page["totalPage"], 3);
    assert_eq!(page["totalData"], 25);
    let expected: Vec<String> = (11..=20).map(|i| format!("news-{i:02}")).collect();
    assert_eq!(titles(&page), expected);
}

#[tokio::test]
async fn news_list_without_paging_returns_everything() {
    let app = TestApp::new().await;
    seed_news(&app, 12).await;

    let filter = filter_query(&json!({ "pageNumber": null, "pageSize": null }));
    let (status, page) = app
        .request(Method::GET, &format!("/api/v1/news?filter={filter}"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pageIndex"], Value::Null);
    assert_eq!(page["totalPage"], Value::Null);
    assert_eq!(page["totalData"], 12);
    assert_eq!(page["data"].as_array().unwrap().len(), 12);
}

#[tokio::test]
async fn absent_filter_uses_first_page() {
    let app = TestApp::new().await;
    seed_news(&app, 12).await;

    let (status, page) = app.request(Method::GET, "/api/v1/news", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["pageIndex"], 1);
    assert_eq!(page["data"].as_array().unwrap().len(), 10);
    assert_eq!(page["hasNextPage"], true);
}

#[tokio::test]
async fn partial_or_malformed_filter_is_rejected() {
    let app = TestApp::new().await;

    let partial = filter_query(&json!({ "pageNumber": 2, "pageSize": null }));
    let (status, body) = app
        .request(Method::GET, &format!("/api/v1/news?filter={partial}"), None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "Error");

    let (status, _) = app
        .request(Method::GET, "/api/v1/roles?filter=%7Bnot-json", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_news_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::GET,
            "/api/v1/news/00000000-0000-0000-0000-000000000001",
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!(["Not find news with id"]));
}

#[tokio::test]
async fn menus_by_role_names_without_links_reports_message() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/menu/role",
            Some(json!({ "roleNames": ["User"] })),
            None,
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Sucess");
    assert_eq!(body["message"], json!(["No menu is accessed"]));
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn register_then_login_over_http() {
    let app = TestApp::new().await;
    let account = json!({
        "firstName": "Grace",
        "lastName": "Hopper",
        "email": "grace@example.com",
        "address": "Arlington",
        "age": 40,
        "password": "Passw0rd!",
        "role": []
    });

    let (status, registered) = app
        .request(Method::POST, "/api/v1/register", Some(account), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registered["data"]["role"], json!(["User"]));
    assert!(registered["data"]["token"].is_string());

    let (status, body) = app
        .request(
            Method::POST,
            "/api/v1/login",
            Some(json!({ "email": "grace@example.com", "password": "nope" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "Error");
    assert_eq!(body["message"], json!(["Login Failed"]));

    let (status, _) = app
        .request(
            Method::POST,
            "/api/v1/login",
            Some(json!({ "email": "nobody@example.com", "password": "Passw0rd!" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_returns_empty_success_envelope() {
    let app = TestApp::new().await;
    let (_, created) = app
        .request(
            Method::POST,
            "/api/v1/role",
            Some(json!({ "roleName": "Editor", "description": "Writes news" })),
            None,
        )
        .await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(Method::DELETE, &format!("/api/v1/role/{id}"), None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Sucess");
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["totalData"], 0);
}

#[tokio::test]
async fn logs_are_filtered_behind_auth() {
    let app = TestApp::with_log_search(Some(in_memory_logs(vec![
        LogModel {
            id: "a1".into(),
            level: "Error".into(),
            message: "db timeout".into(),
        },
        LogModel {
            id: "a2".into(),
            level: "Information".into(),
            message: "started".into(),
        },
    ])))
    .await;

    let (status, _) = app.request(Method::GET, "/api/v1/logs", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let filter = filter_query(&json!({ "level": "Error" }));
    let (status, page) = app
        .authed(Method::GET, &format!("/api/v1/logs?filter={filter}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalData"], 1);
    assert_eq!(page["data"][0]["id"], "a1");

    let (status, body) = app.authed(Method::GET, "/api/v1/log/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!(["Not find log with id"]));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new().await;

    let (status, doc) = app
        .request(Method::GET, "/api-docs/openapi.json", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/v1/category/{id}"].is_object());
    assert!(doc["components"]["securitySchemes"]["Bearer"].is_object());
}
