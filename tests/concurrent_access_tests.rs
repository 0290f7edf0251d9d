/// Concurrent access tests
///
/// Many requests in flight at once must never see each other's pin state.
/// Run with: cargo test --test concurrent_access_tests

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    routing::get,
};
use multidb_pinning::{
    CacheChannel, MemoryStore, PinState, PinningConfig, PinningLayer, SessionKey, read_target,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tower::ServiceExt;

// Yields between consulting and answering so concurrent requests interleave.
async fn slow_target(pin: PinState) -> String {
    let before = read_target(&pin);
    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(before, read_target(&pin), "pin state changed mid-request");
    before.to_string()
}

fn app_with(layer: PinningLayer) -> Router {
    Router::new()
        .route("/items", get(slow_target).post(slow_target))
        .layer(layer)
}

async fn target_of(app: &Router, request: Request<Body>) -> String {
    let response = app.clone().oneshot(request).await.unwrap();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reads_and_writes_are_isolated() {
    let app = app_with(PinningLayer::from_config(&PinningConfig::default()).unwrap());

    let mut handles = vec![];
    let num_tasks = 10;
    let barrier = Arc::new(Barrier::new(num_tasks));

    for task_id in 0..num_tasks {
        let app = app.clone();
        let barrier_clone = Arc::clone(&barrier);

        let handle = tokio::spawn(async move {
            barrier_clone.wait().await;

            for i in 0..20 {
                let writes = (task_id + i) % 2 == 0;
                let method = if writes { "POST" } else { "GET" };
                let request = Request::builder()
                    .method(method)
                    .uri("/items")
                    .body(Body::empty())
                    .unwrap();

                let expected = if writes { "primary" } else { "replica" };
                assert_eq!(
                    target_of(&app, request).await,
                    expected,
                    "Task {} request {} routed incorrectly",
                    task_id,
                    i
                );
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sessions_share_store_independently() {
    let store = MemoryStore::default();
    let channel = Arc::new(CacheChannel::new(store.clone()));
    let app = app_with(PinningLayer::new(channel, &PinningConfig::default()));

    let mut handles = vec![];
    let num_sessions = 8;
    let barrier = Arc::new(Barrier::new(num_sessions));

    for session in 0..num_sessions {
        let app = app.clone();
        let barrier_clone = Arc::clone(&barrier);

        let handle = tokio::spawn(async move {
            let key = format!("session-{session}");
            barrier_clone.wait().await;

            // Odd sessions write first; even sessions only ever read.
            if session % 2 == 1 {
                let request = Request::builder()
                    .method("POST")
                    .uri("/items")
                    .extension(SessionKey::new(key.clone()))
                    .body(Body::empty())
                    .unwrap();
                assert_eq!(target_of(&app, request).await, "primary");
            }

            let request = Request::builder()
                .method("GET")
                .uri("/items")
                .extension(SessionKey::new(key))
                .body(Body::empty())
                .unwrap();
            let expected = if session % 2 == 1 { "primary" } else { "replica" };
            assert_eq!(target_of(&app, request).await, expected, "session {}", session);
        });

        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.snapshot().unwrap().len(), num_sessions / 2);
}

#[tokio::test]
async fn test_cookie_clients_are_independent() {
    let app = app_with(PinningLayer::from_config(&PinningConfig::default()).unwrap());

    let pinned = Request::builder()
        .method("GET")
        .uri("/items")
        .header(header::COOKIE, "multidb_pin_writes=y")
        .body(Body::empty())
        .unwrap();
    let fresh = Request::builder()
        .method("GET")
        .uri("/items")
        .body(Body::empty())
        .unwrap();

    let (pinned, fresh) = tokio::join!(target_of(&app, pinned), target_of(&app, fresh));
    assert_eq!(pinned, "primary");
    assert_eq!(fresh, "replica");
}
