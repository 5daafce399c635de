//! GuardME Server - HTTP API and single-page interface.
//!
//! ## Endpoints
//!
//! - `GET /` - Render the interface
//! - `POST /analyze` - Form submission, redirects to `/`
//! - `POST /clear` - Form clear, redirects to `/`
//! - `GET /api/session` - Session snapshot with category distribution
//! - `PUT /api/input` - Replace the input text
//! - `POST /api/analyze` - Classify the given or current input text
//! - `POST /api/clear` - Reset input, verdict and error
//! - `GET /api/stats` - Aggregated session statistics
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use guardme_core::{ClientConfig, GeminiClassifier};
//! use guardme_server::{AppState, Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let classifier = GeminiClassifier::new(ClientConfig::from_env().unwrap()).unwrap();
//!     let state = AppState::with_classifier(Arc::new(classifier));
//!     let server = Server::new(ServerConfig::default(), state).unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod error;
mod handlers;
pub mod models;
pub mod render;
pub mod state;

use std::net::SocketAddr;

use axum::routing::{get, post, put};
use axum::Router;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::info;

pub use error::{ApiError, Result};
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 48780;

/// Default server host (localhost only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Largest accepted submission, in bytes.
pub const MAX_INPUT_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to (default: 48780).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// Builds the router for the given state.
///
/// Same-origin only; no CORS headers are sent.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze_form))
        .route("/clear", post(handlers::clear_form))
        .route("/api/session", get(handlers::get_session))
        .route("/api/input", put(handlers::put_input))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/clear", post(handlers::clear))
        .route("/api/stats", get(handlers::get_stats))
        .with_state(state)
}

/// The HTTP server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a server for the given state.
    pub fn new(config: ServerConfig, state: AppState) -> std::result::Result<Self, ServerError> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Runtime(format!("invalid address: {}", e)))?;

        Ok(Self {
            router: app(state),
            addr,
        })
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server until shutdown.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        info!("Starting GuardME server on http://{}", self.addr);

        let domain = if self.addr.is_ipv6() {
            Domain::IPV6
        } else {
            Domain::IPV4
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Allow quick restarts while old sockets linger in TIME_WAIT
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        axum::serve(listener, self.router)
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use guardme_core::classifier::{
        Action, Category, ClassificationResult, ClassifyError, ContentClassifier, RiskScore,
    };
    use guardme_core::ANALYSIS_FAILED_MESSAGE;
    use serde_json::{json, Value};
    use tokio::sync::Notify;
    use tower::ServiceExt;

    /// Blocks anything mentioning "worthless", fails on "offline",
    /// allows the rest.
    struct KeywordStub;

    #[async_trait]
    impl ContentClassifier for KeywordStub {
        async fn classify(
            &self,
            text: &str,
        ) -> std::result::Result<ClassificationResult, ClassifyError> {
            if text.trim().is_empty() {
                Err(ClassifyError::EmptyInput)
            } else if text.contains("offline") {
                Err(ClassifyError::Service("network unreachable".to_string()))
            } else if text.contains("worthless") {
                Ok(ClassificationResult::flagged(
                    Category::Harassment,
                    RiskScore::new(9).unwrap(),
                    Action::Block,
                    "targeted insult",
                ))
            } else {
                Ok(ClassificationResult::safe("neutral"))
            }
        }

        fn name(&self) -> &'static str {
            "keyword-stub"
        }
    }

    struct GatedStub {
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl ContentClassifier for GatedStub {
        async fn classify(
            &self,
            _text: &str,
        ) -> std::result::Result<ClassificationResult, ClassifyError> {
            self.gate.notified().await;
            Ok(ClassificationResult::safe("neutral"))
        }

        fn name(&self) -> &'static str {
            "gated-stub"
        }
    }

    fn test_state() -> AppState {
        AppState::with_classifier(Arc::new(KeywordStub))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn body_text(response: axum::response::Response) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_harmful_text() {
        let app = app(test_state());

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/analyze",
                json!({"text": "You are worthless and should disappear"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["outcome"], "classified");
        assert_eq!(json["entry"]["action"], "BLOCK");
        assert_eq!(json["session"]["current_result"]["action"], "BLOCK");
        assert_eq!(json["session"]["history"][0]["primary_category"], "Harassment");
        assert_eq!(json["session"]["distribution"]["Harassment"], 1);
        assert_eq!(json["session"]["is_loading"], false);
    }

    #[tokio::test]
    async fn test_analyze_failure_sets_error() {
        let state = test_state();
        let app = app(state.clone());

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/analyze",
                json!({"text": "we are offline"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["outcome"], "failed");
        assert!(json.get("entry").is_none());
        assert_eq!(json["session"]["current_error"], ANALYSIS_FAILED_MESSAGE);
        assert!(json["session"]["history"].as_array().unwrap().is_empty());
        assert!(!state.session.is_loading());
    }

    #[tokio::test]
    async fn test_analyze_blank_is_skipped() {
        let app = app(test_state());

        let response = app
            .oneshot(json_request("POST", "/api/analyze", json!({"text": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["outcome"], "skipped");
        assert!(json["session"]["current_result"].is_null());
    }

    #[tokio::test]
    async fn test_analyze_uses_current_input() {
        let state = test_state();

        let response = app(state.clone())
            .oneshot(json_request(
                "PUT",
                "/api/input",
                json!({"text": "hello world"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["input_text"], "hello world");

        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/analyze", json!({})))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["outcome"], "classified");
        assert_eq!(json["entry"]["excerpt"], "hello world");
        assert_eq!(json["entry"]["action"], "ALLOW");
    }

    #[tokio::test]
    async fn test_oversized_input_rejected() {
        let state = test_state();
        let text = "x".repeat(MAX_INPUT_BYTES + 1);

        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/analyze", json!({ "text": text })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "bad_request");
        assert!(state.session.snapshot().input_text.is_empty());
    }

    #[tokio::test]
    async fn test_clear_keeps_history() {
        let state = test_state();
        app(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/analyze",
                json!({"text": "You are worthless"}),
            ))
            .await
            .unwrap();

        let response = app(state.clone())
            .oneshot(empty_request("POST", "/api/clear"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["input_text"], "");
        assert!(json["current_result"].is_null());
        assert!(json["current_error"].is_null());
        assert_eq!(json["history"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_stats() {
        let state = test_state();
        for text in ["You are worthless", "nice day", "worthless again"] {
            app(state.clone())
                .oneshot(json_request("POST", "/api/analyze", json!({ "text": text })))
                .await
                .unwrap();
        }

        let response = app(state)
            .oneshot(empty_request("GET", "/api/stats"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["total_scans"], 3);
        assert_eq!(json["blocked_count"], 2);
        assert_eq!(json["allowed_count"], 1);
        assert_eq!(json["warned_count"], 0);
        assert_eq!(json["category_counts"], json!({"Harassment": 2, "Safe": 1}));
    }

    #[tokio::test]
    async fn test_get_session_empty() {
        let response = app(test_state())
            .oneshot(empty_request("GET", "/api/session"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["is_loading"], false);
        assert!(json["history"].as_array().unwrap().is_empty());
        assert_eq!(json["distribution"], json!({}));
    }

    #[tokio::test]
    async fn test_concurrent_analyze_is_busy() {
        let gate = Arc::new(Notify::new());
        let state = AppState::with_classifier(Arc::new(GatedStub { gate: gate.clone() }));

        let first = {
            let router = app(state.clone());
            tokio::spawn(async move {
                router
                    .oneshot(json_request("POST", "/api/analyze", json!({"text": "first"})))
                    .await
                    .unwrap()
            })
        };

        while !state.session.is_loading() {
            tokio::task::yield_now().await;
        }

        let response = app(state.clone())
            .oneshot(json_request("POST", "/api/analyze", json!({"text": "second"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "busy");

        gate.notify_one();
        let response = first.await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let snapshot = state.session.snapshot();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].excerpt, "first");
        assert_eq!(snapshot.input_text, "first");
    }

    #[tokio::test]
    async fn test_form_analyze_while_busy_is_rejected() {
        let gate = Arc::new(Notify::new());
        let state = AppState::with_classifier(Arc::new(GatedStub { gate: gate.clone() }));

        let first = {
            let router = app(state.clone());
            tokio::spawn(async move {
                router
                    .oneshot(json_request("POST", "/api/analyze", json!({"text": "first"})))
                    .await
                    .unwrap()
            })
        };

        while !state.session.is_loading() {
            tokio::task::yield_now().await;
        }

        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("text=second"))
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["code"], "busy");
        assert_eq!(state.session.snapshot().input_text, "first");

        gate.notify_one();
        assert_eq!(first.await.unwrap().status(), StatusCode::OK);

        let snapshot = state.session.snapshot();
        assert_eq!(snapshot.input_text, "first");
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.history[0].excerpt, "first");
    }

    #[tokio::test]
    async fn test_cross_origin_requests_get_no_cors_grant() {
        let request = Request::builder()
            .method("GET")
            .uri("/api/session")
            .header(header::ORIGIN, "https://other.example")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());

        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/api/analyze")
            .header(header::ORIGIN, "https://other.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(preflight).await.unwrap();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_index_renders_page() {
        let response = app(test_state())
            .oneshot(empty_request("GET", "/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let html = body_text(response).await;
        assert!(html.contains("GuardME"));
        assert!(html.contains("No history yet."));
        assert!(html.contains("No analysis history yet"));
    }

    #[tokio::test]
    async fn test_form_analyze_redirects_and_renders_result() {
        let state = test_state();

        let request = Request::builder()
            .method("POST")
            .uri("/analyze")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("text=You+are+worthless"))
            .unwrap();
        let response = app(state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let html = body_text(
            app(state)
                .oneshot(empty_request("GET", "/"))
                .await
                .unwrap(),
        )
        .await;
        assert!(html.contains("BLOCKED"));
        assert!(html.contains("Found: Harassment"));
        assert!(html.contains("Content Blocked"));
    }

    #[tokio::test]
    async fn test_form_clear_redirects() {
        let state = test_state();
        state.session.set_input_text("draft");

        let response = app(state.clone())
            .oneshot(empty_request("POST", "/clear"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(state.session.snapshot().input_text.is_empty());
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_server_config_with_port() {
        let config = ServerConfig::default().with_port(9000).with_host("0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_server_addr_from_config() {
        let config = ServerConfig::default().with_port(9000);
        let server = Server::new(config, test_state()).unwrap();
        assert_eq!(server.addr(), "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_server_rejects_bad_host() {
        let config = ServerConfig::default().with_host("not a host");
        assert!(matches!(
            Server::new(config, test_state()),
            Err(ServerError::Runtime(_))
        ));
    }
}
