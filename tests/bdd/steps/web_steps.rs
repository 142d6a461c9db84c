use cucumber::{given, then, when};
use reqwest::Method;
use serde_json::Value;

use crate::RetreatWorld;

/// Start an in-process axum server on a random free port, backed by the
/// scenario database.
pub async fn start_test_server(world: &mut RetreatWorld) -> u16 {
    let db = crate::steps::common_steps::open_db(world);
    db.migrate().expect("migrate scenario database");
    let app = retreat::web::create_router(retreat::web::AppState::new(db, 12));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind to ephemeral port");
    let port = listener
        .local_addr()
        .expect("failed to get local addr")
        .port();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("web server error in test");
    });

    world.server_port = Some(port);
    world.server_handle = Some(handle);

    for _ in 0..20 {
        if world
            .http_client
            .get(format!("http://127.0.0.1:{port}/"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    }

    port
}

/// Send a request to the test server with the current session token, if
/// any, and store status, content type and body on the world.
pub async fn http_request(
    world: &mut RetreatWorld,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (u16, String) {
    let port = world
        .server_port
        .expect("server not started - add 'Given the web server is running'");
    let url = format!("http://127.0.0.1:{port}{}", world.expand(path));
    let mut req = world.http_client.request(method.clone(), &url);
    if let Some(token) = &world.token {
        req = req.bearer_auth(token);
    }
    if let Some(body) = body {
        req = req.json(&body);
    }
    let resp = req
        .send()
        .await
        .unwrap_or_else(|e| panic!("{method} {url} failed: {e}"));
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let text = resp
        .text()
        .await
        .unwrap_or_else(|e| panic!("failed to read response body: {e}"));
    world.last_response_status = Some(status);
    world.last_response_content_type = content_type;
    world.last_response_body = Some(text.clone());
    (status, text)
}

pub async fn http_get(world: &mut RetreatWorld, path: &str) -> (u16, String) {
    http_request(world, Method::GET, path, None).await
}

#[given("the web server is running")]
async fn the_web_server_is_running(world: &mut RetreatWorld) {
    start_test_server(world).await;
}

#[when(expr = "I GET {string}")]
async fn i_get_path(world: &mut RetreatWorld, path: String) {
    http_get(world, &path).await;
}

#[then(expr = "the response status is {int}")]
async fn the_response_status_is(world: &mut RetreatWorld, expected: u16) {
    let actual = world
        .last_response_status
        .expect("no HTTP response recorded");
    assert_eq!(
        actual,
        expected,
        "body was:\n{}",
        world.last_response_body.as_deref().unwrap_or("")
    );
}

#[then(expr = "the response body contains {string}")]
async fn the_response_body_contains(world: &mut RetreatWorld, expected: String) {
    let expected = world.expand(&expected);
    let body = world
        .last_response_body
        .as_deref()
        .expect("no HTTP response recorded");
    assert!(
        body.contains(&expected),
        "expected body to contain {expected:?}, but it was:\n{body}"
    );
}

#[then(expr = "the response content type starts with {string}")]
async fn the_content_type_starts_with(world: &mut RetreatWorld, expected: String) {
    let actual = world
        .last_response_content_type
        .as_deref()
        .expect("response had no content type");
    assert!(actual.starts_with(&expected), "content type was {actual}");
}
