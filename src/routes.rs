use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::fetcher::FeedAggregator;
use crate::normalize::NewsItem;

pub struct AppState {
    pub aggregator: Arc<FeedAggregator>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewsResponse {
    pub items: Vec<NewsItem>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/news", get(news))
        .route("/api/news/refresh", post(refresh))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// Route handlers

/// Always 200: with every feed down the ticker gets `{"items": []}`.
pub async fn news(State(state): State<Arc<AppState>>) -> Json<NewsResponse> {
    let items = state.aggregator.aggregate().await;
    Json(NewsResponse { items })
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<NewsResponse> {
    let items = state.aggregator.refresh().await;
    Json(NewsResponse { items })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
