//! Basic usage example
//!
//! Demonstrates caching, deduplication and the typed helpers against a public
//! JSON API.
//!
//! Usage:
//!   cargo run --example basic_usage
//!   RUST_LOG=speedcast=debug cargo run --example basic_usage

use serde::Deserialize;
use speedcast::{ApiClient, RequestConfig};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Todo {
    id: u64,
    title: String,
    completed: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = ApiClient::builder()
        .base_url(
            std::env::var("SPEEDCAST_BASE_URL")
                .unwrap_or_else(|_| "https://jsonplaceholder.typicode.com".to_string()),
        )
        .cache(true)
        .cache_ttl(Duration::from_secs(30))
        .rate_limit(5, Duration::from_secs(1))
        .build()?;

    // Three concurrent identical calls share one execution.
    let (a, b, c) = tokio::join!(
        client.get::<Todo>("/todos/1", None),
        client.get::<Todo>("/todos/1", None),
        client.get::<Todo>("/todos/1", None),
    );
    let todo = a?.data;
    println!("todo #{}: {} (completed: {})", todo.id, todo.title, todo.completed);
    assert_eq!(b?.data.id, c?.data.id);

    // Served from cache.
    let again = client.get::<Todo>("/todos/1", None).await?;
    println!("cached: {}", again.data.title);
    println!("cache stats: {:?}", client.cache_stats());

    let created = client
        .post::<serde_json::Value, _>(
            "/todos",
            &serde_json::json!({ "title": "write docs", "completed": false }),
            Some(RequestConfig::new().with_retries(0)),
        )
        .await?;
    println!("created ({}): {}", created.status, created.data);

    if let Some(snapshot) = client.rate_limiter_snapshot().await {
        println!("rate window: {}/{}", snapshot.in_window, snapshot.requests);
    }
    Ok(())
}
