//! HTTP-level tests: the composed router driven in-process against the memory store.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::get,
    Router,
};
use mango_api::{
    handlers::fallback::panic_response, router, AppState, DocumentStore, Environment, HttpOptions, MemoryStore,
    ResourceRegistry,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

async fn app() -> (Router, Arc<MemoryStore>) {
    app_with(&HttpOptions::default()).await
}

async fn app_with(options: &HttpOptions) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let registry = ResourceRegistry::with_defaults().unwrap();
    let state = AppState::new(store.clone(), registry.clone(), Environment::Test);
    state.ensure_collections().await.unwrap();
    (router(&registry, options).with_state(state), store)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn haden() -> Value {
    json!({
        "name": "Haden",
        "variety": "A",
        "unit": "KG",
        "price": 10,
        "stock": 5,
        "season": "Summer"
    })
}

#[tokio::test]
async fn mango_lifecycle() {
    let (app, _) = app().await;

    let (status, created) = send(&app, Method::POST, "/mango", Some(haden())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], json!(true));
    assert_eq!(created["message"], json!("Mango created successfully"));
    assert_eq!(created["data"]["origin"], json!("Unknown"));
    let id = created["data"]["id"].as_str().expect("id assigned").to_string();

    let (status, fetched) = send(&app, Method::GET, &format!("/mango/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);

    let (status, deleted) = send(&app, Method::DELETE, &format!("/mango/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["id"], json!(id));

    let (status, missing) = send(&app, Method::GET, &format!("/mango/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["success"], json!(false));
    assert_eq!(missing["data"], Value::Null);
    assert_eq!(missing["error"]["code"], json!("not_found"));

    let (status, _) = send(&app, Method::DELETE, &format!("/mango/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn root_is_a_liveness_envelope() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["message"].as_str().unwrap().starts_with("Welcome"));

    let (status, body) = send(&app, Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], json!("mango-api"));
    assert_eq!(body["data"]["environment"], json!("test"));
}

#[tokio::test]
async fn list_starts_empty() {
    let (app, _) = app().await;
    for prefix in ["/mango", "/orders", "/users"] {
        let (status, body) = send(&app, Method::GET, prefix, None).await;
        assert_eq!(status, StatusCode::OK, "{prefix}");
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"], json!([]));
    }
}

#[tokio::test]
async fn malformed_id_is_bad_request_not_missing() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/mango/12345", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], json!("invalid_identifier"));

    let unknown = uuid::Uuid::new_v4();
    let (status, _) = send(&app, Method::PATCH, &format!("/mango/{unknown}"), Some(json!({ "price": 1 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_create_is_rejected_and_not_stored() {
    let (app, store) = app().await;
    let mut input = haden();
    input.as_object_mut().unwrap().remove("name");
    input["unit"] = json!("TON");

    let (status, body) = send(&app, Method::POST, "/mango", Some(input)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"]["code"], json!("validation_error"));
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "unit"]);
    assert_eq!(store.count("mangoes").await, 0);
}

#[tokio::test]
async fn malformed_bodies_get_envelopes() {
    let (app, _) = app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/mango")
        .header("content-type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], json!("bad_request"));

    let (status, body) = send(&app, Method::POST, "/mango", Some(json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("bad request: body must be a JSON object"));
}

#[tokio::test]
async fn patch_merges_and_revalidates() {
    let (app, _) = app().await;
    let (_, created) = send(&app, Method::POST, "/mango", Some(haden())).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();
    let uri = format!("/mango/{id}");

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "stock": 12, "origin": "Florida" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stock"], json!(12));
    assert_eq!(body["data"]["origin"], json!("Florida"));
    assert_eq!(body["data"]["name"], json!("Haden"));
    assert_eq!(body["data"]["id"], json!(id));

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "season": "Monsoon" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["constraint"], json!("enum"));

    let (_, after) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(after["data"]["season"], json!("Summer"));
}

#[tokio::test]
async fn other_resources_are_mounted() {
    let (app, _) = app().await;
    let (status, user) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "Asha", "email": " Asha@Orchard.Example " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["data"]["email"], json!("asha@orchard.example"));
    assert_eq!(user["data"]["role"], json!("customer"));
    assert_eq!(user["data"]["active"], json!(true));

    let (_, mango) = send(&app, Method::POST, "/mango", Some(haden())).await;
    let (status, order) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({
            "customer": "Asha",
            "mango_id": mango["data"]["id"],
            "quantity": 3,
            "unit_price": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["data"]["status"], json!("pending"));
    assert_eq!(order["message"], json!("Order created successfully"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({ "customer": "Asha", "mango_id": "nope", "quantity": 0, "unit_price": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/orders",
        Some(json!({
            "customer": "Asha",
            "mango_id": mango["data"]["id"],
            "quantity": 20000,
            "unit_price": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"][0]["field"], json!("quantity"));
    assert_eq!(body["error"]["details"][0]["constraint"], json!("maximum"));
}

#[tokio::test]
async fn unknown_route_is_enveloped() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/bananas", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn unbound_methods_are_enveloped() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::PUT, "/mango", Some(haden())).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"]["code"], json!("method_not_allowed"));

    let id = uuid::Uuid::new_v4();
    let (status, body) = send(&app, Method::POST, &format!("/orders/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], json!("method_not_allowed"));
}

#[tokio::test]
async fn oversized_body_is_enveloped() {
    let options = HttpOptions {
        body_limit_bytes: 16,
        ..HttpOptions::default()
    };
    let (app, store) = app_with(&options).await;
    let payload = haden().to_string();
    assert!(payload.len() > 16);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/mango")
        .header("content-type", "application/json")
        .header("content-length", payload.len())
        .body(Body::from(payload))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("payload_too_large"));
    assert_eq!(store.count("mangoes").await, 0);
}

#[tokio::test]
async fn readiness_follows_store() {
    let (app, store) = app().await;
    let (status, _) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    store.close().await;
    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], json!(false));

    let (status, body) = send(&app, Method::GET, "/mango", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("internal server error"));
}

#[tokio::test]
async fn cors_headers_are_sent() {
    let (app, _) = app().await;
    let request = Request::builder()
        .uri("/mango")
        .header("origin", "http://shop.example")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

async fn explode() -> &'static str {
    panic!("boom")
}

#[tokio::test]
async fn handler_panic_becomes_500_envelope() {
    let app: Router = Router::new()
        .route("/boom", get(explode))
        .layer(CatchPanicLayer::custom(panic_response));
    let (status, body) = send(&app, Method::GET, "/boom", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"]["code"], json!("internal_error"));
}
