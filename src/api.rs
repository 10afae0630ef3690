//! HTTP surface: `POST /scrape` and `GET /healthz`

use crate::extract::is_http_url;
use crate::model::{timestamp, Phase, ScraperError, ScraperResult};
use crate::orchestrator::{Outcome, Scraper};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const INVALID_SCHEME: &str = "URL must start with http:// or https://";

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub result: ScraperResult,
}

pub fn router(scraper: Arc<Scraper>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/scrape", post(scrape))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(scraper)
}

/// Serve until Ctrl-C
pub async fn serve(addr: SocketAddr, scraper: Arc<Scraper>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(scraper))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": timestamp(),
    }))
}

async fn scrape(
    State(scraper): State<Arc<Scraper>>,
    Json(request): Json<ScrapeRequest>,
) -> Response {
    if !is_http_url(&request.url) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": INVALID_SCHEME })),
        )
            .into_response();
    }

    let url = request.url;
    let task = {
        let url = url.clone();
        tokio::spawn(async move { scraper.scrape_with_deadline(&url).await })
    };

    let (status, result) = match task.await {
        Ok(Outcome::Completed(result)) => (StatusCode::OK, result),
        Ok(Outcome::TimedOut(result)) => (StatusCode::REQUEST_TIMEOUT, result),
        // Panics inside the pipeline are already `unknown` errors on a 200;
        // this only sees a task that was cancelled or panicked outside it.
        Err(e) => {
            tracing::error!(url = %url, error = %e, "scrape task failed");
            let error = ScraperError::new(Phase::Unknown, format!("Scraping failed: {}", e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ScraperResult::minimal(&url, error),
            )
        }
    };
    (status, Json(ScrapeResponse { result })).into_response()
}
