use civic_chat::config::{Config, Mode};
use civic_chat::routes::create_router;
use civic_chat::routes::profile::UserProfile;
use civic_chat::state::AppState;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use tower::util::ServiceExt;
use url::Url;

const FLOW_PATH: &str = "/lf/org/api/v1/run/flow";

/// Stand-in for the hosted runner: echoes what it received inside the
/// expected reply shape.
async fn echo_runner(uri: Uri, headers: HeaderMap, body: Bytes) -> Json<Value> {
    let raw = String::from_utf8_lossy(&body).to_string();
    let input: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    Json(json!({
        "outputs": [{ "outputs": [{ "results": { "message": { "data": {
            "text": format!("echo: {}", input["input_value"].as_str().unwrap_or(""))
        } } } }] }],
        "seen": {
            "path": uri.path(),
            "query": uri.query(),
            "authorization": headers.get("authorization").and_then(|v| v.to_str().ok()),
            "content_type": headers.get("content-type").and_then(|v| v.to_str().ok()),
            "raw": raw,
        }
    }))
}

async fn spawn_runner() -> SocketAddr {
    let app = Router::new()
        .route(FLOW_PATH, post(echo_runner))
        .route("/broken", post(|| async { "definitely not json" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn config_for(base: &str, flow_path: &str, mode: Mode) -> Config {
    Config {
        app_host: "127.0.0.1".to_string(),
        app_port: 0,
        mode,
        api_key: "test-token".to_string(),
        runner_base_url: Url::parse(base).unwrap(),
        runner_flow_path: flow_path.to_string(),
    }
}

fn app(cfg: Config) -> Router {
    let mode = cfg.mode;
    create_router(mode).with_state(Arc::new(AppState::new(cfg)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

#[tokio::test]
async fn test_proxy_rejects_get() {
    let app = app(config_for("http://127.0.0.1:9", FLOW_PATH, Mode::Production));

    let response = app
        .oneshot(Request::builder().method("GET").uri("/api/chat").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn test_proxy_rejects_put_and_delete() {
    let app = app(config_for("http://127.0.0.1:9", FLOW_PATH, Mode::Production));

    for method in ["PUT", "DELETE", "PATCH"] {
        let response = app
            .clone()
            .oneshot(Request::builder().method(method).uri("/api/chat").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
    }
}

#[tokio::test]
async fn test_proxy_forwards_body_with_credential() {
    let runner = spawn_runner().await;
    let app = app(config_for(&format!("http://{runner}"), FLOW_PATH, Mode::Production));

    // Unusual spacing and an extra field: the proxy must not re-encode.
    let raw = r#"{"input_value":"Where is the nearest shelter?",  "output_type":"chat","input_type":"chat","extra":1}"#;
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header("content-type", "application/json")
                .body(Body::from(raw))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;

    assert_eq!(
        data["outputs"][0]["outputs"][0]["results"]["message"]["data"]["text"],
        "echo: Where is the nearest shelter?"
    );
    assert_eq!(data["seen"]["path"], FLOW_PATH);
    assert_eq!(data["seen"]["query"], "stream=false");
    assert_eq!(data["seen"]["authorization"], "Bearer test-token");
    assert_eq!(data["seen"]["content_type"], "application/json");
    assert_eq!(data["seen"]["raw"], raw);
}

#[tokio::test]
async fn test_proxy_downstream_unreachable_is_500() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let app = app(config_for(&format!("http://{dead}"), FLOW_PATH, Mode::Production));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .body(Body::from(r#"{"input_value":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_proxy_non_json_reply_is_500() {
    let runner = spawn_runner().await;
    let app = app(config_for(&format!("http://{runner}"), "/broken", Mode::Production));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .body(Body::from(r#"{"input_value":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn test_proxy_unsendable_credential_is_500() {
    let runner = spawn_runner().await;
    let mut cfg = config_for(&format!("http://{runner}"), FLOW_PATH, Mode::Production);
    cfg.api_key = "tok\r\n".to_string();
    let app = app(cfg);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .body(Body::from(r#"{"input_value":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    // Never forwarded without the credential.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await, json!({ "error": "Internal server error" }));
}

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_proxy_error_is_logged_with_request_id() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let app = app(config_for(&format!("http://{dead}"), FLOW_PATH, Mode::Production));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .body(Body::from(r#"{"input_value":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let output = logs.contents();
    let line = output
        .lines()
        .find(|l| l.contains("proxy error"))
        .unwrap_or_else(|| panic!("no proxy error line in:\n{output}"));
    assert!(line.contains("chat_proxy"), "{line}");
    assert!(line.contains("request_id="), "{line}");
}

#[tokio::test]
async fn test_dev_rewrite_strips_prefix_and_keeps_caller_auth() {
    let runner = spawn_runner().await;
    let app = app(config_for(&format!("http://{runner}"), FLOW_PATH, Mode::Development));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/chatapi{FLOW_PATH}?stream=false"))
                .header("authorization", "Bearer client-token")
                .body(Body::from(r#"{"input_value":"dev","output_type":"chat","input_type":"chat"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await;
    assert_eq!(data["seen"]["path"], FLOW_PATH);
    assert_eq!(data["seen"]["query"], "stream=false");
    assert_eq!(data["seen"]["authorization"], "Bearer client-token");
}

#[tokio::test]
async fn test_dev_rewrite_not_mounted_in_production() {
    let app = app(config_for("http://127.0.0.1:9", FLOW_PATH, Mode::Production));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/chatapi{FLOW_PATH}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_profile_endpoint() {
    let app = app(config_for("http://127.0.0.1:9", FLOW_PATH, Mode::Production));

    let response = app
        .clone()
        .oneshot(Request::builder().method("GET").uri("/api/user-profile").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile: UserProfile = serde_json::from_value(body_json(response).await).unwrap();
    assert_eq!(profile, UserProfile::demo());
    assert_eq!(profile.points, 1200);

    let response = app
        .oneshot(Request::builder().method("POST").uri("/api/user-profile").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_json(response).await, json!({ "error": "Method Not Allowed" }));
}

#[tokio::test]
async fn test_health() {
    let app = app(config_for("http://127.0.0.1:9", FLOW_PATH, Mode::Production));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
