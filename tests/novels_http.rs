//! End-to-end tests of the novels routes over the in-memory store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use novelshelf::{build_registry, AppState};
use shelf_db::{MemoryStore, Novel, NovelId, NovelStore, ANONYMOUS};
use shelf_kernel::settings::Settings;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = build_registry(AppState::new(store.clone()));
        let router = shelf_http::build_router(&registry, &Settings::default());
        Self { router, store }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_form(&self, uri: &str, form: &str, user: Option<(&str, &str)>) -> Response {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some((id, name)) = user {
            request = request.header("x-user-id", id).header("x-user-name", name);
        }
        self.send(request.body(Body::from(form.to_string())).unwrap())
            .await
    }
}

fn location(response: &Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_redirects_to_new_record() {
    let app = TestApp::new();

    let response = app
        .post_form(
            "/novels",
            "title=Dune&author=Frank+Herbert&publishedDate=1965",
            Some(("u-1", "Ada")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/novels/1");

    let response = app.get("/novels/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let novel = json_body(response).await;
    assert_eq!(novel["id"], "1");
    assert_eq!(novel["title"], "Dune");
    assert_eq!(novel["author"], "Frank Herbert");
    assert_eq!(novel["createdBy"], "Ada");
    assert_eq!(novel["createdByID"], "u-1");
}

#[tokio::test]
async fn test_anonymous_create_is_attributed_to_anonymous() {
    let app = TestApp::new();

    let response = app.post_form("/novels", "title=Emma", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let stored = app.store.get(&NovelId::from(1)).await.unwrap();
    assert_eq!(stored.created_by_id, ANONYMOUS);
}

#[tokio::test]
async fn test_list_is_ordered_by_title() {
    let app = TestApp::new();
    for title in ["Zorba", "Anna Karenina", "Middlemarch"] {
        app.store.add(&mut Novel::titled(title)).await.unwrap();
    }

    let response = app.get("/novels").await;
    assert_eq!(response.status(), StatusCode::OK);
    let titles: Vec<String> = json_body(response)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Anna Karenina", "Middlemarch", "Zorba"]);
}

#[tokio::test]
async fn test_update_replaces_record() {
    let app = TestApp::new();
    app.store.add(&mut Novel::titled("Draft")).await.unwrap();

    let response = app
        .post_form("/novels/1", "title=Final&createdByID=u-2", None)
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/novels/1");

    let stored = app.store.get(&NovelId::from(1)).await.unwrap();
    assert_eq!(stored.title, "Final");
    assert_eq!(stored.created_by_id, "u-2");
}

#[tokio::test]
async fn test_update_of_unknown_id_is_not_found() {
    let app = TestApp::new();

    let response = app.post_form("/novels/42", "title=Ghost", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_id_aliases_are_not_found() {
    let app = TestApp::new();
    app.store.add(&mut Novel::titled("Dune")).await.unwrap();

    let response = app.post_form("/novels/01", "title=Alias", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.get("/novels/+1").await.status(), StatusCode::NOT_FOUND);

    let response = app.get("/novels/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let novel = json_body(response).await;
    assert_eq!(novel["id"], "1");
    assert_eq!(novel["title"], "Dune");
}

#[tokio::test]
async fn test_update_of_unset_id_is_bad_request() {
    let app = TestApp::new();

    let response = app.post_form("/novels/0", "title=Zero", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_novel_is_not_found() {
    let app = TestApp::new();
    assert_eq!(app.get("/novels/7").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mine_without_identity_redirects_to_login() {
    let app = TestApp::new();

    let response = app.get("/novels/mine").await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/login?redirect=%2Fnovels%2Fmine");
}

#[tokio::test]
async fn test_mine_lists_only_callers_novels() {
    let app = TestApp::new();
    app.post_form("/novels", "title=Mine", Some(("u-1", "Ada")))
        .await;
    app.post_form("/novels", "title=Theirs", Some(("u-2", "Bob")))
        .await;

    let request = Request::get("/novels/mine")
        .header("x-user-id", "u-1")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let novels = body.as_array().unwrap();
    assert_eq!(novels.len(), 1);
    assert_eq!(novels[0]["title"], "Mine");
}

#[tokio::test]
async fn test_delete_via_form_and_method() {
    let app = TestApp::new();
    app.store.add(&mut Novel::titled("One")).await.unwrap();
    app.store.add(&mut Novel::titled("Two")).await.unwrap();

    let response = app.post_form("/novels/1/delete", "", None).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/novels");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/novels/2")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::FOUND);

    assert!(app.store.list().await.unwrap().is_empty());

    let response = app.post_form("/novels/1/delete", "", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_closed_store_is_unavailable() {
    let app = TestApp::new();
    app.store.close().await.unwrap();

    assert_eq!(
        app.get("/novels").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[tokio::test]
async fn test_openapi_documents_novel_routes() {
    let app = TestApp::new();

    let response = app.get("/docs/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);

    let spec = json_body(response).await;
    assert!(spec["paths"]["/novels"]["post"].is_object());
    assert!(spec["paths"]["/novels/{id}"]["delete"].is_object());
    assert!(spec["paths"]["/novels/mine"]["get"].is_object());
    assert!(spec["components"]["schemas"]["Novel"].is_object());
}
