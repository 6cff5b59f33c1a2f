use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use designdex_core::{CategoryHit, CategorySearch, SearchOptions};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer, AllowOrigin};
use tower_http::trace::TraceLayer;

const MAX_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub category: Option<String>,
    pub stack: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub min_score: f32,
}
fn default_limit() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<CategoryHit>,
}

#[derive(Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub count: usize,
}

/// The index is built once at startup and only read afterwards.
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<CategorySearch>,
}

pub fn build_app(search: CategorySearch) -> Router {
    let app_state = AppState { search: Arc::new(search) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/categories", get(categories_handler))
        .route("/categories/:name", get(category_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let options = SearchOptions {
        category: params.category.filter(|c| !c.trim().is_empty()),
        stack: params.stack.filter(|s| !s.trim().is_empty()),
        limit: params.limit.clamp(1, MAX_LIMIT),
        min_score: params.min_score,
    };
    let results = state.search.search(&params.q, &options);
    let elapsed = start.elapsed();
    tracing::debug!(query = %params.q, hits = results.len(), took_s = elapsed.as_secs_f64(), "search");
    Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results })
}

pub async fn categories_handler(State(state): State<AppState>) -> Json<Vec<CategorySummary>> {
    let summaries = state
        .search
        .get_categories()
        .into_iter()
        .map(|name| CategorySummary {
            name: name.to_string(),
            count: state.search.get_category_data(name).map_or(0, |rows| rows.len()),
        })
        .collect();
    Json(summaries)
}

pub async fn category_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.search.get_category_data(&name) {
        Some(rows) => Ok(Json(serde_json::json!({ "name": name, "count": rows.len(), "data": rows }))),
        None => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
    }
}
