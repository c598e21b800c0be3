//! Orchestration behavior end-to-end against a scripted transport.
//!
//! Time-sensitive tests run on tokio's paused clock.

mod common;

use common::{json, ok_json, FakeTransport};
use serde::Deserialize;
use serde_json::json as j;
use speedcast::transport::TransportError;
use speedcast::{ApiClient, ApiClientBuilder, Error, Method, RequestConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const BASE: &str = "https://api.test.com";

fn builder(transport: &Arc<FakeTransport>) -> ApiClientBuilder {
    ApiClient::builder().base_url(BASE).transport(transport.clone())
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: u64,
    name: String,
}

#[tokio::test(start_paused = true)]
async fn cached_get_is_served_until_ttl_expires() {
    let transport = FakeTransport::always(ok_json(j!({"data": "test"}))).shared();
    let client = builder(&transport)
        .cache(true)
        .cache_ttl(Duration::from_millis(1000))
        .build()
        .unwrap();

    let first = client.get::<serde_json::Value>("/test", None).await.unwrap();
    assert_eq!(first.data, j!({"data": "test"}));
    assert_eq!(transport.calls(), 1);

    tokio::time::advance(Duration::from_millis(500)).await;
    let second = client.get::<serde_json::Value>("/test", None).await.unwrap();
    assert_eq!(second.data, first.data);
    assert_eq!(transport.calls(), 1);

    tokio::time::advance(Duration::from_millis(600)).await;
    client.get::<serde_json::Value>("/test", None).await.unwrap();
    assert_eq!(transport.calls(), 2);

    let stats = client.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.sets, 2);
}

#[tokio::test(start_paused = true)]
async fn per_call_cache_flag_enables_caching() {
    let transport = FakeTransport::always(ok_json(j!([]))).shared();
    let client = builder(&transport).build().unwrap();
    let cached = || Some(RequestConfig::new().with_cache(true));

    client.get::<serde_json::Value>("/items", cached()).await.unwrap();
    client.get::<serde_json::Value>("/items", cached()).await.unwrap();
    assert_eq!(transport.calls(), 1);

    // caching disabled for this call: goes to the transport
    client.get::<serde_json::Value>("/items", None).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn clear_cache_forces_refetch() {
    let transport = FakeTransport::always(ok_json(j!({"ok": true}))).shared();
    let client = builder(&transport).cache(true).build().unwrap();

    client.get::<serde_json::Value>("/a", None).await.unwrap();
    client.get::<serde_json::Value>("/a", None).await.unwrap();
    assert_eq!(transport.calls(), 1);

    client.clear_cache();
    client.get::<serde_json::Value>("/a", None).await.unwrap();
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn post_with_cache_flag_always_reaches_transport() {
    let transport = FakeTransport::always(json(201, "Created", j!({"id": 1}))).shared();
    let client = builder(&transport).cache(true).build().unwrap();
    let body = j!({"name": "John"});

    for _ in 0..2 {
        let resp = client
            .post::<serde_json::Value, _>("/users", &body, Some(RequestConfig::new().with_cache(true)))
            .await
            .unwrap();
        assert_eq!(resp.status, 201);
    }
    assert_eq!(transport.calls(), 2);
    assert_eq!(client.cache_stats().sets, 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_identical_gets_share_one_call() {
    let transport = FakeTransport::always(ok_json(j!({"data": "shared"})))
        .with_delay(Duration::from_millis(100))
        .shared();
    let client = builder(&transport).build().unwrap();

    let (a, b, c) = tokio::join!(
        client.get::<serde_json::Value>("/dedupe", None),
        client.get::<serde_json::Value>("/dedupe", None),
        client.get::<serde_json::Value>("/dedupe", None),
    );

    assert_eq!(transport.calls(), 1);
    for resp in [a, b, c] {
        assert_eq!(resp.unwrap().data, j!({"data": "shared"}));
    }
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn deduplicated_callers_share_the_failure() {
    let transport = FakeTransport::scripted(vec![Ok(json(404, "Not Found", j!({})))])
        .with_delay(Duration::from_millis(50))
        .shared();
    let client = builder(&transport).build().unwrap();

    let (a, b) = tokio::join!(
        client.get::<serde_json::Value>("/gone", None),
        client.get::<serde_json::Value>("/gone", None),
    );

    assert_eq!(transport.calls(), 1);
    assert_eq!(a.unwrap_err().status(), Some(404));
    assert_eq!(b.unwrap_err().status(), Some(404));
}

#[tokio::test(start_paused = true)]
async fn deduplicated_callers_share_the_timeout() {
    let transport = FakeTransport::always(ok_json(j!({})))
        .with_delay(Duration::from_secs(5))
        .shared();
    let client = builder(&transport).build().unwrap();
    let short = || Some(RequestConfig::new().with_timeout(Duration::from_millis(200)));

    let (a, b) = tokio::join!(
        client.get::<serde_json::Value>("/stalled", short()),
        client.get::<serde_json::Value>("/stalled", short()),
    );

    assert_eq!(transport.calls(), 1);
    assert!(matches!(a.unwrap_err(), Error::Timeout { timeout_ms: 200 }));
    assert!(matches!(b.unwrap_err(), Error::Timeout { timeout_ms: 200 }));
    assert_eq!(client.in_flight(), 0);
}

#[tokio::test(start_paused = true)]
async fn dedupe_can_be_disabled_per_call() {
    let transport = FakeTransport::always(ok_json(j!({})))
        .with_delay(Duration::from_millis(100))
        .shared();
    let client = builder(&transport).build().unwrap();
    let no_dedupe = || Some(RequestConfig::new().with_dedupe(false));

    let (a, b, c) = tokio::join!(
        client.get::<serde_json::Value>("/solo", no_dedupe()),
        client.get::<serde_json::Value>("/solo", no_dedupe()),
        client.get::<serde_json::Value>("/solo", no_dedupe()),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(transport.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn different_bodies_are_not_deduplicated() {
    let transport = FakeTransport::always(ok_json(j!({})))
        .with_delay(Duration::from_millis(100))
        .shared();
    let client = builder(&transport).build().unwrap();
    let (qa, qb) = (j!({"q": "a"}), j!({"q": "b"}));

    let (a, b) = tokio::join!(
        client.post::<serde_json::Value, _>("/search", &qa, None),
        client.post::<serde_json::Value, _>("/search", &qb, None),
    );
    assert!(a.is_ok() && b.is_ok());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_delays_third_request() {
    let transport = FakeTransport::always(ok_json(j!({}))).shared();
    let client = builder(&transport)
        .rate_limit(2, Duration::from_millis(1000))
        .build()
        .unwrap();

    let start = Instant::now();
    for path in ["/r1", "/r2", "/r3"] {
        client.get::<serde_json::Value>(path, None).await.unwrap();
    }
    let elapsed = start.elapsed();

    assert_eq!(transport.calls(), 3);
    assert!(elapsed >= Duration::from_millis(900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1100), "elapsed {:?}", elapsed);

    let times = transport.call_times();
    assert!(times[1] - times[0] < Duration::from_millis(10));
    assert!(times[2] - times[0] >= Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn rate_limiter_snapshot_reflects_window() {
    let transport = FakeTransport::always(ok_json(j!({}))).shared();
    let client = builder(&transport)
        .rate_limit(2, Duration::from_millis(1000))
        .build()
        .unwrap();
    let unlimited = builder(&transport).build().unwrap();
    assert!(unlimited.rate_limiter_snapshot().await.is_none());

    client.get::<serde_json::Value>("/s1", None).await.unwrap();
    client.get::<serde_json::Value>("/s2", None).await.unwrap();

    let snapshot = client.rate_limiter_snapshot().await.unwrap();
    assert_eq!(snapshot.requests, 2);
    assert_eq!(snapshot.in_window, 2);
    assert_eq!(snapshot.estimated_wait_ms, Some(1000));
}

#[tokio::test(start_paused = true)]
async fn server_errors_are_retried_with_backoff() {
    let transport = FakeTransport::scripted(vec![
        Ok(json(500, "Internal Server Error", j!({}))),
        Ok(json(500, "Internal Server Error", j!({}))),
        Ok(ok_json(j!({"success": true}))),
    ])
    .shared();
    let client = builder(&transport).build().unwrap();

    let resp = client
        .get::<serde_json::Value>("/retry", Some(RequestConfig::new().with_retries(2)))
        .await
        .unwrap();

    assert_eq!(resp.data, j!({"success": true}));
    assert_eq!(transport.calls(), 3);

    let times = transport.call_times();
    let first_gap = times[1] - times[0];
    let second_gap = times[2] - times[1];
    assert!(first_gap >= Duration::from_millis(1000) && first_gap < Duration::from_millis(1100));
    assert!(second_gap >= Duration::from_millis(2000) && second_gap < Duration::from_millis(2100));
}

#[tokio::test(start_paused = true)]
async fn transport_failures_are_retried() {
    let transport = FakeTransport::scripted(vec![
        Err(TransportError::Other("connection refused".into())),
        Ok(ok_json(j!({"ok": true}))),
    ])
    .shared();
    let client = builder(&transport).build().unwrap();

    let resp = client.get::<serde_json::Value>("/flaky", None).await.unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn not_found_is_not_retried() {
    let transport = FakeTransport::always(json(404, "Not Found", j!({}))).shared();
    let client = builder(&transport).build().unwrap();

    let err = client
        .get::<serde_json::Value>("/404", Some(RequestConfig::new().with_retries(2)))
        .await
        .unwrap_err();

    assert_eq!(transport.calls(), 1);
    assert!(err.to_string().contains("404"), "{}", err);
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_surface_last_status() {
    let transport = FakeTransport::always(json(503, "Service Unavailable", j!({}))).shared();
    let client = builder(&transport).retries(1).build().unwrap();

    let err = client.get::<serde_json::Value>("/down", None).await.unwrap_err();
    assert_eq!(transport.calls(), 2);
    assert!(matches!(err, Error::Status { status: 503, .. }));
}

#[tokio::test(start_paused = true)]
async fn slow_response_times_out_without_retry() {
    let transport = FakeTransport::always(ok_json(j!({})))
        .with_delay(Duration::from_secs(5))
        .shared();
    let client = builder(&transport).build().unwrap();

    let start = Instant::now();
    let err = client
        .get::<serde_json::Value>(
            "/slow",
            Some(RequestConfig::new().with_timeout(Duration::from_millis(1000))),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout { timeout_ms: 1000 }));
    assert!(start.elapsed() < Duration::from_millis(1100));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn request_carries_merged_headers_and_body() {
    let transport = FakeTransport::always(json(201, "Created", j!({"id": 7, "name": "Jane"}))).shared();
    let client = builder(&transport)
        .default_header("Authorization", "Bearer default")
        .build()
        .unwrap();

    let resp = client
        .post::<User, _>(
            "/users",
            &j!({"name": "Jane"}),
            Some(RequestConfig::new().with_header("authorization", "Bearer call")),
        )
        .await
        .unwrap();
    assert_eq!(resp.data, User { id: 7, name: "Jane".into() });

    let sent = transport.last_request().unwrap();
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.url, "https://api.test.com/users");
    assert_eq!(sent.body.as_deref(), Some(r#"{"name":"Jane"}"#));

    let auth: Vec<_> = sent
        .headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
        .collect();
    assert_eq!(auth.len(), 1);
    assert_eq!(auth[0].1, "Bearer call");
    assert!(sent
        .headers
        .iter()
        .any(|(k, v)| k.eq_ignore_ascii_case("content-type") && v == "application/json"));
}

#[tokio::test(start_paused = true)]
async fn management_changes_apply_to_later_calls() {
    let transport = FakeTransport::always(ok_json(j!({}))).shared();
    let client = builder(&transport).build().unwrap();

    client.set_base_url("https://other.test.com/v2/");
    client.set_default_headers(HashMap::from([("X-Trace".to_string(), "on".to_string())]));
    assert_eq!(client.base_url().as_deref(), Some("https://other.test.com/v2/"));
    assert_eq!(client.default_headers().len(), 2);

    client.get::<serde_json::Value>("/ping", None).await.unwrap();
    let sent = transport.last_request().unwrap();
    assert_eq!(sent.url, "https://other.test.com/v2/ping");
    assert!(sent.headers.iter().any(|(k, v)| k == "X-Trace" && v == "on"));
    assert!(sent.headers.iter().any(|(k, _)| k == "Content-Type"));

    // clones share defaults
    let cloned = client.clone();
    cloned.set_base_url(BASE);
    assert_eq!(client.base_url().as_deref(), Some(BASE));
}

#[tokio::test(start_paused = true)]
async fn relative_url_without_base_is_rejected() {
    let transport = FakeTransport::always(ok_json(j!({}))).shared();
    let client = ApiClient::builder().transport(transport.clone()).build().unwrap();

    let err = client.get::<serde_json::Value>("/users", None).await.unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert_eq!(transport.calls(), 0);

    client
        .get::<serde_json::Value>("https://api.test.com/users", None)
        .await
        .unwrap();
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn typed_conversion_failure_is_reported() {
    let transport = FakeTransport::always(ok_json(j!({"unexpected": true}))).shared();
    let client = builder(&transport).build().unwrap();

    let err = client.get::<User>("/users/1", None).await.unwrap_err();
    assert!(matches!(err, Error::Serialization(_)));
}
