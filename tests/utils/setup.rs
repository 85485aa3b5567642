use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

use siterace::{build_router, AppConfig, AppState, InMemoryStore, KeyValueStore, ScoreFetcher};

use super::mocks::StaticScoreFetcher;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

pub struct TestAppBuilder {
    store: Arc<dyn KeyValueStore>,
    memory: Arc<InMemoryStore>,
    score_fetcher: Arc<dyn ScoreFetcher>,
    config: AppConfig,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        let memory = Arc::new(InMemoryStore::new());
        Self {
            store: memory.clone(),
            memory,
            score_fetcher: Arc::new(StaticScoreFetcher::new(&[])),
            config: AppConfig::default(),
        }
    }

    /// Routes requests through `store`; `memory` is what tests inspect afterwards
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>, memory: Arc<InMemoryStore>) -> Self {
        self.store = store;
        self.memory = memory;
        self
    }

    pub fn with_scores(mut self, scores: &[(&str, f64)]) -> Self {
        self.score_fetcher = Arc::new(StaticScoreFetcher::new(scores));
        self
    }

    pub fn with_admin_token(mut self, token: &str) -> Self {
        self.config.admin_token = Some(token.to_string());
        self
    }

    pub fn with_scan_limits(mut self, leaderboard: usize, share: usize) -> Self {
        self.config.leaderboard_scan_limit = leaderboard;
        self.config.share_scan_limit = share;
        self
    }

    pub fn build(self) -> TestApp {
        let state = AppState::new(self.store, self.score_fetcher, self.config);
        TestApp {
            router: build_router(state),
            store: self.memory,
        }
    }
}

impl TestApp {
    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Submits a race and returns the response body
    pub async fn submit_race(&self, urls: &[&str], scores: &[f64], winner_index: i64) -> (StatusCode, Value) {
        self.post_json(
            "/api/results",
            serde_json::json!({
                "urls": urls,
                "scores": scores,
                "winnerIndex": winner_index,
            }),
        )
        .await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, json)
    }
}
