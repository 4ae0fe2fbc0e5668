//! Failure injection tests for the gateway.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use edge_gateway::auth::HttpTokenProvider;
use tokio::net::TcpListener;

use common::{client, gateway_config, start_gateway, start_origin, start_origin_with_delay, StaticTokenProvider};

/// Reserve a port, then free it so connections to it are refused.
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

#[tokio::test]
async fn unreachable_origin_maps_to_502() {
    let (api_origin, _) = start_origin(StatusCode::OK, "api").await;
    let dead_origin = format!("http://{}", dead_address().await);
    let provider = StaticTokenProvider::new("cred", "relay");
    let (base, _shutdown) =
        start_gateway(gateway_config(&api_origin, &dead_origin), provider).await;

    let response = client().get(format!("{base}/page")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn slow_origin_maps_to_504_at_the_deadline() {
    let (api_origin, _) = start_origin(StatusCode::OK, "api").await;
    let (slow_origin, _) =
        start_origin_with_delay(StatusCode::OK, "slow", Duration::from_secs(5)).await;
    let provider = StaticTokenProvider::new("cred", "relay");
    let mut config = gateway_config(&api_origin, &slow_origin);
    config.timeouts.upstream_secs = 1;
    let (base, _shutdown) = start_gateway(config, provider).await;

    let started = Instant::now();
    let response = client().get(format!("{base}/page")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "the deadline should cut the wait, took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn slow_api_does_not_stall_content_requests() {
    let (slow_api, _) = start_origin_with_delay(StatusCode::OK, "api", Duration::from_secs(4)).await;
    let (content_origin, content_seen) = start_origin(StatusCode::OK, "content").await;
    let provider = StaticTokenProvider::new("cred", "relay");
    let mut config = gateway_config(&slow_api, &content_origin);
    config.timeouts.upstream_secs = 2;
    let (base, _shutdown) = start_gateway(config, provider).await;

    let gateway = client();
    let api_url = format!("{base}/api/slow");
    let api_client = gateway.clone();
    let api_task = tokio::spawn(async move {
        api_client
            .get(api_url)
            .header("authorization", "Bearer cred")
            .send()
            .await
            .unwrap()
    });

    // Let the slow request get in flight first.
    tokio::time::sleep(Duration::from_millis(100)).await;

    for _ in 0..5 {
        let started = Instant::now();
        let response = gateway.get(format!("{base}/fast")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "content request stalled behind the slow API call"
        );
    }
    assert_eq!(content_seen.hits(), 5);

    let api_response = api_task.await.unwrap();
    assert_eq!(api_response.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn identity_outage_fails_closed() {
    let (api_origin, api_seen) = start_origin(StatusCode::OK, "api").await;
    let (content_origin, _) = start_origin(StatusCode::OK, "content").await;
    let dead = dead_address().await;

    let mut config = gateway_config(&api_origin, &content_origin);
    config.auth.introspect_url = format!("http://{dead}/introspect");
    config.auth.token_url = format!("http://{dead}/token");
    config.auth.request_timeout_secs = 1;

    let provider = Arc::new(HttpTokenProvider::new(&config.auth).unwrap());
    let (base, _shutdown) = start_gateway(config, provider).await;

    let response = client()
        .get(format!("{base}/api/bookmarks"))
        .header("authorization", "Bearer cred")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(api_seen.hits(), 0);

    // Open routes keep working through the outage.
    let content = client().get(format!("{base}/page")).send().await.unwrap();
    assert_eq!(content.status(), StatusCode::OK);
}

#[tokio::test]
async fn origin_error_statuses_pass_through_verbatim() {
    // A 500 from the origin is a completed proxy exchange, not a
    // gateway failure; it must not be rewritten to 502.
    let (api_origin, _) = start_origin(StatusCode::OK, "api").await;
    let (content_origin, _) = start_origin(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let provider = StaticTokenProvider::new("cred", "relay");
    let (base, _shutdown) =
        start_gateway(gateway_config(&api_origin, &content_origin), provider).await;

    let response = client().get(format!("{base}/page")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text().await.unwrap(), "boom");
}
