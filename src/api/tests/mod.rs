use super::*;
use crate::depot::test_helpers::ScriptedProvider;
use crate::provider::MediaProvider;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


/// Helper to create a test MediaDepot instance wrapped in Arc
async fn create_test_depot(
    provider: Arc<dyn MediaProvider>,
) -> (Arc<MediaDepot>, Arc<Config>, TempDir) {
    let (depot, temp_dir) = crate::depot::test_helpers::create_test_depot(provider).await;
    let config = depot.get_config();
    (Arc::new(depot), config, temp_dir)
}

/// Provider scripted to succeed with a small payload
fn scripted_provider() -> Arc<ScriptedProvider> {
    Arc::new(ScriptedProvider::with_payload(
        "episode.mkv",
        b"scripted media payload",
    ))
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (depot, config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Use a random available port for testing
    let mut config = (*config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    // Spawn the API server
    let api_handle = tokio::spawn({
        let depot = depot.clone();
        let config = config.clone();
        async move { start_api_server(depot, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Abort the server task (tests shut the depot down separately)
    api_handle.abort();

    // The test passes if we got here without panicking
}

#[tokio::test]
async fn test_cors_enabled() {
    let (depot, config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Config with CORS enabled (default)
    let mut config = (*config).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    // Create router with CORS enabled
    let app = create_router(depot, config);

    // Make a request with Origin header
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    // Check that response has CORS headers
    assert_eq!(response.status(), StatusCode::OK);

    // The CORS middleware should add access-control-allow-origin header
    let headers = response.headers();
    assert!(
        headers.contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (depot, _config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Use the spawn_api_server method
    let api_handle = depot.spawn_api_server();

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Abort the server task
    api_handle.abort();

    // Test passes if we got here
}

#[tokio::test]
async fn test_server_starts_and_responds_to_health() {
    let (depot, config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Bind to a random available port (port 0)
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server_depot = depot.clone();
    let server_config = config.clone();
    let server_handle = tokio::spawn(async move {
        let app = create_router(server_depot, server_config);
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Make an HTTP request to /health using reqwest
    let client = reqwest::Client::new();
    let url = format!("http://{}/health", addr);
    let response = client.get(url).send().await.unwrap();

    // Verify response status
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // Verify response body
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["user"], "Scripted (7700000)");

    // Shutdown the server
    server_handle.abort();
}

#[tokio::test]
async fn test_openapi_json_endpoint() {
    let (depot, config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Create the router
    let app = create_router(depot, config);

    // Make a request to /openapi.json
    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Check that we got a 200 OK
    assert_eq!(response.status(), StatusCode::OK);

    // Check the response body contains valid OpenAPI spec
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value =
        serde_json::from_slice(&body).expect("Response should be valid JSON");

    // Verify it has the required OpenAPI fields
    assert!(json.get("openapi").is_some(), "Should have 'openapi' field");
    assert!(json.get("info").is_some(), "Should have 'info' field");
    assert!(json.get("paths").is_some(), "Should have 'paths' field");

    // Verify OpenAPI version
    let openapi_version = json["openapi"].as_str().unwrap();
    assert!(openapi_version.starts_with("3."), "Should be OpenAPI 3.x");

    // Verify title
    assert_eq!(json["info"]["title"], "media-depot REST API");

    // Verify key operations are documented
    let paths = json["paths"].as_object().unwrap();
    assert!(paths.len() >= 8, "Expected at least 8 documented paths");
    assert!(
        json["paths"]["/download/request"]["post"].is_object(),
        "POST /download/request should be documented"
    );
    assert!(
        json["paths"]["/download/fetch/{task_id}"]["get"].is_object(),
        "GET /download/fetch/{{task_id}} should be documented"
    );
    assert!(
        json["paths"]["/health"]["get"].is_object(),
        "GET /health should be documented"
    );
}

#[tokio::test]
async fn test_swagger_ui_enabled() {
    let (depot, config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Config with Swagger UI enabled (default)
    let mut config = (*config).clone();
    config.api.swagger_ui = true;
    let config = Arc::new(config);

    // Create the router with Swagger UI enabled
    let app = create_router(depot, config);

    // Make a request to /swagger-ui (should redirect or serve HTML)
    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Swagger UI should return 200 OK (serving HTML)
    assert_eq!(
        response.status(),
        StatusCode::OK,
        "Swagger UI should be accessible when enabled"
    );

    // Check that the response body contains HTML (Swagger UI page)
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_str = String::from_utf8(body.to_vec()).unwrap();

    // Verify it's HTML content (Swagger UI page)
    assert!(
        body_str.contains("<!DOCTYPE html>") || body_str.contains("<html"),
        "Response should contain HTML"
    );
    assert!(
        body_str.contains("swagger") || body_str.contains("Swagger"),
        "Response should contain Swagger-related content"
    );
}

#[tokio::test]
async fn test_swagger_ui_disabled() {
    let (depot, config, _temp_dir) = create_test_depot(scripted_provider()).await;

    // Config with Swagger UI disabled
    let mut config = (*config).clone();
    config.api.swagger_ui = false;
    let config = Arc::new(config);

    // Create the router with Swagger UI disabled
    let app = create_router(depot, config);

    // Make a request to /swagger-ui (should return 404)
    let response = app
        .oneshot(
            Request::builder()
                .uri("/swagger-ui/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Should return 404 when Swagger UI is disabled
    assert_eq!(
        response.status(),
        StatusCode::NOT_FOUND,
        "Swagger UI should not be accessible when disabled"
    );
}
