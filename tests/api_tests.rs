mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::spawn_app;

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref());
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_jane(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "fullName": "Jane Doe",
                "email": "jane@x.com",
                "username": "janedoe",
                "password": "secret1"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_and_me() {
    let (app, _) = spawn_app().await;
    let token = register_jane(&app).await;

    let (status, body) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["account"]["username"], "janedoe");
    assert_eq!(body["data"]["account"]["email"], "jane@x.com");
    assert_eq!(body["data"]["account"]["role"], "user");
    assert!(body["data"]["account"]["cart"].is_array());
    assert!(body["data"]["account"].get("passwordHash").is_none());
    assert!(body["data"]["account"].get("loginAttempts").is_none());
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (app, _) = spawn_app().await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({ "fullName": "J", "email": "nope", "username": "janedoe", "password": "123" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["fullName", "email", "password"]);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, _) = spawn_app().await;
    register_jane(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "fullName": "Jane Again",
                "email": "JANE@x.com",
                "username": "janeagain",
                "password": "secret1"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_with_username_or_email() {
    let (app, _) = spawn_app().await;
    register_jane(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "username": "janedoe", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].is_string());

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "identifier": "Jane@X.com", "password": "secret1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_lockout_over_http() {
    let (app, _) = spawn_app().await;
    register_jane(&app).await;

    let login = |password: &str| {
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "identifier": "janedoe", "password": password }),
        )
    };

    let (status, unknown_body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            &json!({ "identifier": "ghost", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    for _ in 0..4 {
        let (status, body) = send(&app, login("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, unknown_body);
    }

    let (status, body) = send(&app, login("wrong")).await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, login("secret1")).await;
    assert_eq!(status, StatusCode::LOCKED);
}

#[tokio::test]
async fn test_protected_routes_need_token() {
    let (app, _) = spawn_app().await;

    let (status, body) = send(&app, get("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, get("/api/cart", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_and_password_change() {
    let (app, _) = spawn_app().await;
    let token = register_jane(&app).await;

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/auth/profile",
            Some(&token),
            &json!({ "fullName": "Jane Q. Doe", "profile": { "city": "Lagos" } }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account"]["fullName"], "Jane Q. Doe");
    assert_eq!(body["data"]["account"]["profile"]["city"], "Lagos");
    assert_eq!(body["data"]["account"]["username"], "janedoe");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/auth/password",
            Some(&token),
            &json!({ "currentPassword": "wrong1", "newPassword": "newsecret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "currentPassword");

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/auth/password",
            Some(&token),
            &json!({ "currentPassword": "secret1", "newPassword": "newsecret" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cart_flow() {
    let (app, _) = spawn_app().await;
    let token = register_jane(&app).await;

    let shoe = json!({
        "productId": "p-1",
        "category": "shoes",
        "name": "Runner",
        "price": 49.5
    });

    send(&app, json_request("POST", "/api/cart", Some(&token), &shoe)).await;
    let (status, body) = send(&app, json_request("POST", "/api/cart", Some(&token), &shoe)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cart"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["cart"][0]["quantity"], 2);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/cart/p-1/shoes",
            Some(&token),
            &json!({ "quantity": 7 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cart"][0]["quantity"], 7);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/cart/p-404/shoes",
            Some(&token),
            &json!({ "quantity": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/api/cart")
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());

    let (_, body) = send(&app, get("/api/cart", Some(&token))).await;
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_rejects_keys_it_could_not_address() {
    let (app, _) = spawn_app().await;
    let token = register_jane(&app).await;

    let long_id = "p".repeat(150);
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/cart",
            Some(&token),
            &json!({ "productId": long_id, "category": "shoes", "name": "Runner", "price": 1.0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "productId");

    let (_, body) = send(&app, get("/api/cart", Some(&token))).await;
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());

    let longest_id = "p".repeat(100);
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/cart",
            Some(&token),
            &json!({ "productId": longest_id, "category": "shoes", "name": "Runner", "price": 1.0 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/cart/{longest_id}/shoes"))
            .header("Authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["cart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (app, shared) = spawn_app().await;
    let token = register_jane(&app).await;

    let (status, _) = send(&app, get("/api/admin/accounts", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, get("/api/admin/accounts", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    shared.auth_service.promote("janedoe").await.unwrap();

    // Role is read from the store, so the same token now passes.
    let (status, body) = send(&app, get("/api/admin/accounts", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accounts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_admin_can_deactivate_account() {
    let (app, shared) = spawn_app().await;
    let admin_token = register_jane(&app).await;
    shared.auth_service.promote("janedoe").await.unwrap();

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            &json!({
                "fullName": "John Roe",
                "email": "john@x.com",
                "username": "johnroe",
                "password": "secret1"
            }),
        ),
    )
    .await;
    let john_token = body["data"]["token"].as_str().unwrap().to_string();
    let john_id = body["data"]["account"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/admin/accounts/{john_id}/active"),
            Some(&admin_token),
            &json!({ "active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account"]["isActive"], false);

    let (status, _) = send(&app, get("/api/auth/me", Some(&john_token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/admin/accounts/9999/active",
            Some(&admin_token),
            &json!({ "active": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_security_headers() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/health", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let (app, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(get("/api/metrics", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
