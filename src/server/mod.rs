// src/server/mod.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tracing::{info, warn};
use warp::{
    http::StatusCode,
    reply::{self, Reply, Response},
    Filter, Rejection,
};

use crate::aggregate::{self, FormattedMetrics, Metrics};
use crate::cache::{CacheEntry, RefreshCache};
use crate::error::{DashboardError, FETCH_HINT};
use crate::fetch::TableSource;
use crate::table::Table;

const PAGE: &str = include_str!("page.html");

/// Everything a request needs: the shared cache and the URL it serves.
pub struct AppState<S> {
    cache: RefreshCache<S>,
    source_url: String,
}

impl<S: TableSource> AppState<S> {
    pub fn new(source: S, source_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache: RefreshCache::new(source, ttl),
            source_url: source_url.into(),
        }
    }

    async fn load(&self) -> Result<CacheEntry, DashboardError> {
        self.cache
            .get(&self.source_url)
            .await
            .map_err(DashboardError::Fetch)
    }
}

#[derive(Deserialize)]
struct MetricsQuery {
    product: String,
}

#[derive(Serialize)]
struct ProductsResponse {
    source_url: String,
    products: Vec<String>,
    row_count: usize,
    columns: Vec<String>,
    fetched_at: DateTime<Utc>,
    ttl_secs: u64,
}

#[derive(Serialize)]
struct MetricsResponse {
    product: String,
    #[serde(flatten)]
    metrics: Metrics,
    formatted: FormattedMetrics,
    table: Table,
}

#[derive(Serialize)]
struct ErrorResponse {
    kind: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available_columns: Option<Vec<String>>,
}

fn error_reply(err: DashboardError) -> Response {
    warn!(kind = err.kind(), error = %err, "render failed");
    let (status, hint, available_columns) = match &err {
        DashboardError::Fetch(_) => (StatusCode::BAD_GATEWAY, Some(FETCH_HINT), None),
        DashboardError::MissingColumn { available, .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            None,
            Some(available.clone()),
        ),
    };
    let body = ErrorResponse {
        kind: err.kind(),
        error: err.to_string(),
        hint,
        available_columns,
    };
    reply::with_status(reply::json(&body), status).into_response()
}

async fn get_products<S: TableSource>(state: Arc<AppState<S>>) -> Result<Response, Infallible> {
    let entry = match state.load().await {
        Ok(e) => e,
        Err(e) => return Ok(error_reply(e)),
    };
    let products = match aggregate::product_options(&entry.table) {
        Ok(p) => p,
        Err(e) => return Ok(error_reply(e)),
    };
    Ok(reply::json(&ProductsResponse {
        source_url: entry.url.clone(),
        products,
        row_count: entry.table.len(),
        columns: entry.table.columns.clone(),
        fetched_at: entry.fetched_at,
        ttl_secs: state.cache.ttl().as_secs(),
    })
    .into_response())
}

async fn get_metrics<S: TableSource>(
    query: MetricsQuery,
    state: Arc<AppState<S>>,
) -> Result<Response, Infallible> {
    let entry = match state.load().await {
        Ok(e) => e,
        Err(e) => return Ok(error_reply(e)),
    };
    let (table, metrics) = match aggregate::aggregate(&entry.table, &query.product) {
        Ok(r) => r,
        Err(e) => return Ok(error_reply(e)),
    };
    Ok(reply::json(&MetricsResponse {
        formatted: metrics.formatted(),
        product: query.product,
        metrics,
        table,
    })
    .into_response())
}

async fn post_refresh<S: TableSource>(state: Arc<AppState<S>>) -> Result<Response, Infallible> {
    state.cache.invalidate(&state.source_url).await;
    info!(url = %state.source_url, "refresh requested");
    Ok(reply::with_status(reply::reply(), StatusCode::NO_CONTENT).into_response())
}

fn with_state<S: TableSource>(
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (Arc<AppState<S>>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&state))
}

/// All dashboard routes: the page, its JSON API, and a health check.
pub fn routes<S: TableSource>(
    state: Arc<AppState<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let page = warp::path::end()
        .and(warp::get())
        .map(|| reply::html(PAGE));

    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        reply::json(&serde_json::json!({
            "status": "healthy",
            "service": "sheetdash"
        }))
    });

    let products = warp::path("products")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(get_products::<S>);

    let metrics = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<MetricsQuery>())
        .and(with_state(state.clone()))
        .and_then(get_metrics::<S>);

    let refresh = warp::path("refresh")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_state(state))
        .and_then(post_refresh::<S>);

    page.or(health)
        .or(products)
        .or(metrics)
        .or(refresh)
        .with(warp::trace::request())
}
