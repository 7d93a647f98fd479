mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bgd_manager::auth::session::SESSION_COOKIE;
use bgd_state_storage::ActiveVersion;
use common::{BLUE, FakeRuntime, GREEN, body_json, test_app, test_config};
use serial_test::serial;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

async fn log_storage() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/log"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello\nworld\n"))
        .mount(&server)
        .await;
    server
}

async fn login(app: &Router, username: &str, password: &str) -> Result<axum::response::Response> {
    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "username={}&password={}",
            username, password
        )))?;
    Ok(app.clone().oneshot(request).await?)
}

/// Logs in as admin and returns the `name=value` cookie pair.
async fn session_cookie(app: &Router) -> Result<String> {
    let response = login(app, "admin", "admin").await?;
    let set_cookie = response.headers()[header::SET_COOKIE].to_str()?;
    Ok(set_cookie.split(';').next().unwrap_or_default().to_string())
}

fn admin_request(method: &str, uri: &str, cookie: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())?)
}

fn location(response: &axum::response::Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap_or_default()
}

#[tokio::test]
#[serial]
async fn health_endpoint() -> Result<()> {
    let (_, app) = test_app(&test_config(&[]), Arc::new(FakeRuntime::default())).await?;
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await?;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "bgd-manager");
    assert!(health["timestamp"].is_string());
    Ok(())
}

#[tokio::test]
#[serial]
async fn admin_pages_redirect_to_login_without_session() -> Result<()> {
    let (state, app) =
        test_app(&test_config(&[]), Arc::new(FakeRuntime::default())).await?;

    for (method, uri) in [
        ("GET", "/"),
        ("POST", "/switch_version"),
        ("POST", "/discard_old"),
        ("POST", "/reset_log"),
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty())?)
            .await?;
        assert!(response.status().is_redirection(), "{} {}", method, uri);
        assert_eq!(location(&response), "/login");
    }
    assert_eq!(state.versions.current_active().await?, ActiveVersion::Blue);
    Ok(())
}

#[tokio::test]
#[serial]
async fn login_sets_session_cookie_or_rejects() -> Result<()> {
    let config = test_config(&[("ADMIN_PASSWORD", "s3cret")]);
    let (_, app) = test_app(&config, Arc::new(FakeRuntime::default())).await?;

    let response = login(&app, "admin", "wrong").await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = login(&app, "admin", "s3cret").await?;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
    let cookie = response.headers()[header::SET_COOKIE].to_str()?;
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
    assert!(cookie.contains("HttpOnly"));

    let response = app
        .oneshot(Request::builder().uri("/login").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
#[serial]
async fn logout_clears_the_cookie() -> Result<()> {
    let (_, app) = test_app(&test_config(&[]), Arc::new(FakeRuntime::default())).await?;
    let response = app
        .oneshot(Request::builder().uri("/logout").body(Body::empty())?)
        .await?;
    assert_eq!(location(&response), "/login");
    let cookie = response.headers()[header::SET_COOKIE].to_str()?;
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}

#[tokio::test]
#[serial]
async fn switch_version_toggles_active_slot() -> Result<()> {
    let (state, app) =
        test_app(&test_config(&[]), Arc::new(FakeRuntime::default())).await?;
    let cookie = session_cookie(&app).await?;

    let response = app
        .clone()
        .oneshot(admin_request("POST", "/switch_version", &cookie)?)
        .await?;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
    assert_eq!(state.versions.current_active().await?, ActiveVersion::Green);

    app.oneshot(admin_request("POST", "/switch_version", &cookie)?)
        .await?;
    assert_eq!(state.versions.current_active().await?, ActiveVersion::Blue);
    Ok(())
}

#[tokio::test]
#[serial]
async fn discard_old_stops_the_inactive_instance() -> Result<()> {
    let runtime = Arc::new(FakeRuntime::with_running(&[BLUE, GREEN]));
    let (_, app) = test_app(&test_config(&[]), runtime.clone()).await?;
    let cookie = session_cookie(&app).await?;

    let response = app
        .clone()
        .oneshot(admin_request("POST", "/discard_old", &cookie)?)
        .await?;
    assert!(response.status().is_redirection());
    assert!(runtime.is_running(BLUE));
    assert!(!runtime.is_running(GREEN));

    // already gone is still a success
    let response = app
        .oneshot(admin_request("POST", "/discard_old", &cookie)?)
        .await?;
    assert!(response.status().is_redirection());
    Ok(())
}

#[tokio::test]
#[serial]
async fn discard_old_reports_runtime_failure() -> Result<()> {
    let runtime = Arc::new(FakeRuntime::with_running(&[BLUE, GREEN]));
    runtime.fail_on(GREEN);
    let (_, app) = test_app(&test_config(&[]), runtime).await?;
    let cookie = session_cookie(&app).await?;

    let response = app
        .oneshot(admin_request("POST", "/discard_old", &cookie)?)
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    Ok(())
}

#[tokio::test]
#[serial]
async fn reset_log_calls_storage_and_redirects() -> Result<()> {
    let storage = log_storage().await;
    Mock::given(method("POST"))
        .and(path("/reset"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&storage)
        .await;
    let uri = storage.uri();
    let (_, app) = test_app(
        &test_config(&[("STORAGE_URL", uri.as_str())]),
        Arc::new(FakeRuntime::default()),
    )
    .await?;
    let cookie = session_cookie(&app).await?;

    let response = app
        .oneshot(admin_request("POST", "/reset_log", &cookie)?)
        .await?;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");
    Ok(())
}

#[tokio::test]
#[serial]
async fn dashboard_composes_all_sources() -> Result<()> {
    let storage = log_storage().await;
    let uri = storage.uri();
    let config = test_config(&[
        ("STORAGE_URL", uri.as_str()),
        ("MONITORED_CONTAINERS", "storage, service1-blue"),
    ]);
    let (state, app) =
        test_app(&config, Arc::new(FakeRuntime::with_running(&[BLUE]))).await?;
    state.telemetry.record_latency("status", 12.0);
    state.telemetry.mark_alive_now(BLUE);
    let cookie = session_cookie(&app).await?;

    let response = app.oneshot(admin_request("GET", "/", &cookie)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await?;

    assert_eq!(dashboard["active_version"], "blue");
    assert_eq!(dashboard["logs"], "hello\nworld\n");

    let instances = dashboard["instances"].as_array().cloned().unwrap_or_default();
    let names: Vec<_> = instances.iter().map(|i| i["name"].clone()).collect();
    assert_eq!(names, vec![BLUE, GREEN, "storage"]);
    assert_eq!(instances[0]["slot"], "blue");
    assert_eq!(instances[0]["cpu_percent"], 12.5);
    assert_eq!(instances[0]["uptime"], "1m 30s");
    assert!(instances[1]["error"].is_string());
    assert!(instances[2]["slot"].is_null());

    assert_eq!(dashboard["latency"]["status"]["samples"], 1);
    assert_eq!(dashboard["latency"]["status"]["avg"], 12.0);
    assert_eq!(dashboard["latency"]["log"], serde_json::json!({ "samples": 0 }));
    assert_eq!(dashboard["liveness"][BLUE], "Living");
    assert_eq!(dashboard["liveness"][GREEN], "Never");
    Ok(())
}

#[tokio::test]
#[serial]
async fn dashboard_survives_log_storage_outage() -> Result<()> {
    let config = test_config(&[("STORAGE_URL", "http://127.0.0.1:1")]);
    let (_, app) = test_app(&config, Arc::new(FakeRuntime::default())).await?;
    let cookie = session_cookie(&app).await?;

    let response = app.oneshot(admin_request("GET", "/", &cookie)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard = body_json(response).await?;
    let logs = dashboard["logs"].as_str().unwrap_or_default();
    assert!(logs.starts_with("Error contacting storage"), "{}", logs);
    Ok(())
}

#[tokio::test]
#[serial]
async fn get_token_requires_session_and_issues_data_token() -> Result<()> {
    let config = test_config(&[("TOKEN_TTL", "120")]);
    let (state, app) = test_app(&config, Arc::new(FakeRuntime::default())).await?;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/get_token").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await?["error"],
        "admin session required: missing admin session"
    );

    let cookie = session_cookie(&app).await?;
    let response = app
        .clone()
        .oneshot(admin_request("GET", "/get_token", &cookie)?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 120);
    let token = body["token"].as_str().unwrap_or_default().to_string();
    assert_eq!(state.tokens.verify(&token)?.sub, "admin");

    // a bearer token does not open the admin console
    let forged = format!("{}={}", SESSION_COOKIE, token);
    let response = app.oneshot(admin_request("GET", "/", &forged)?).await?;
    assert!(response.status().is_redirection());
    Ok(())
}
