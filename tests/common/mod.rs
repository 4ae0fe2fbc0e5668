//! Shared fixtures for gateway integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use edge_gateway::auth::{AccessToken, AuthError, AuthGate, Session, TokenProvider};
use edge_gateway::config::GatewayConfig;
use edge_gateway::lifecycle::Shutdown;
use edge_gateway::{Dispatcher, HttpServer, RouteTable};

/// One request as observed by a mock origin.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path_and_query: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

/// Requests recorded by a mock origin, shared with the test body.
#[derive(Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<SeenRequest>>>);

impl Recorded {
    pub fn hits(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn last(&self) -> SeenRequest {
        self.0
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("origin saw no requests")
    }

    fn push(&self, seen: SeenRequest) {
        self.0.lock().unwrap().push(seen);
    }
}

#[derive(Clone)]
struct OriginBehavior {
    recorded: Recorded,
    status: StatusCode,
    marker: &'static str,
    delay: Duration,
}

/// Start a mock origin answering every path with a fixed status, a
/// marker header, and the marker as body, recording what it saw.
/// Returns its origin URL.
pub async fn start_origin(status: StatusCode, marker: &'static str) -> (String, Recorded) {
    start_origin_with_delay(status, marker, Duration::ZERO).await
}

/// Same as [`start_origin`] but sleeps before answering.
pub async fn start_origin_with_delay(
    status: StatusCode,
    marker: &'static str,
    delay: Duration,
) -> (String, Recorded) {
    let recorded = Recorded::default();
    let behavior = OriginBehavior {
        recorded: recorded.clone(),
        status,
        marker,
        delay,
    };

    let app = Router::new().fallback(origin_handler).with_state(behavior);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), recorded)
}

async fn origin_handler(State(behavior): State<OriginBehavior>, request: Request) -> Response {
    let method = request.method().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_default();
    let authorization = header_string(&request, "authorization");
    let request_id = header_string(&request, "x-request-id");
    let bytes = axum::body::to_bytes(request.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default();

    behavior.recorded.push(SeenRequest {
        method,
        path_and_query,
        authorization,
        request_id,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    });

    if !behavior.delay.is_zero() {
        tokio::time::sleep(behavior.delay).await;
    }

    (behavior.status, [("x-origin", behavior.marker)], behavior.marker).into_response()
}

fn header_string(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// In-process token provider accepting exactly one credential.
pub struct StaticTokenProvider {
    credential: &'static str,
    relay: &'static str,
    pub relay_calls: AtomicUsize,
}

impl StaticTokenProvider {
    pub fn new(credential: &'static str, relay: &'static str) -> Arc<Self> {
        Arc::new(Self {
            credential,
            relay,
            relay_calls: AtomicUsize::new(0),
        })
    }

    pub fn relay_calls(&self) -> usize {
        self.relay_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn authenticate(&self, credential: &str) -> Result<Session, AuthError> {
        if credential == self.credential {
            Ok(Session {
                id: "sess-1".into(),
                subject: "josh".into(),
            })
        } else {
            Err(AuthError::InvalidCredential)
        }
    }

    async fn relay_token(&self, _session: &Session) -> Result<AccessToken, AuthError> {
        self.relay_calls.fetch_add(1, Ordering::SeqCst);
        Ok(AccessToken::bearer(self.relay))
    }
}

#[derive(Deserialize)]
struct IntrospectBody {
    credential: String,
}

#[derive(Deserialize)]
struct TokenBody {
    #[allow(unused)]
    session: String,
}

/// Mock identity service speaking the HTTP provider's two JSON
/// endpoints. Returns its base URL.
pub async fn start_identity_service(
    valid_credential: &'static str,
    relay_token: &'static str,
) -> String {
    let app = Router::new()
        .route(
            "/introspect",
            post(move |Json(body): Json<IntrospectBody>| async move {
                if body.credential == valid_credential {
                    Json(json!({ "active": true, "subject": "josh", "session": "sess-1" }))
                } else {
                    Json(json!({ "active": false }))
                }
            }),
        )
        .route(
            "/token",
            post(move |Json(_body): Json<TokenBody>| async move {
                Json(json!({ "access_token": relay_token, "expires_in_secs": 3600 }))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

/// Default config pointed at the given origins, listening on an
/// ephemeral port.
pub fn gateway_config(api_origin: &str, content_origin: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstreams.api_origin = api_origin.to_string();
    config.upstreams.content_origin = content_origin.to_string();
    config
}

/// Boot a gateway with the standard route table. Returns its base URL
/// and the shutdown handle keeping it alive.
pub async fn start_gateway(
    config: GatewayConfig,
    provider: Arc<dyn TokenProvider>,
) -> (String, Shutdown) {
    let table = RouteTable::standard(
        &config.upstreams.api_origin,
        &config.upstreams.content_origin,
    )
    .unwrap();
    start_gateway_with_table(config, table, provider).await
}

/// Boot a gateway around an explicit route table.
pub async fn start_gateway_with_table(
    config: GatewayConfig,
    table: RouteTable,
    provider: Arc<dyn TokenProvider>,
) -> (String, Shutdown) {
    let dispatcher = Dispatcher::new(&table, &config.timeouts);
    let gate = AuthGate::new(provider);
    let server = HttpServer::new(&config, table, gate, dispatcher);

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    (format!("http://{addr}"), shutdown)
}

/// HTTP client that talks to the local gateway directly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
