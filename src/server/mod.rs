use crate::core::aggregator::Aggregator;
use crate::domain::ports::FeedFetcher;
use crate::utils::error::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const LISTINGS_PATH: &str = "/api/listings";

pub struct AppState<F: FeedFetcher> {
    aggregator: Arc<Aggregator<F>>,
}

impl<F: FeedFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            aggregator: Arc::clone(&self.aggregator),
        }
    }
}

impl<F: FeedFetcher> AppState<F> {
    pub fn new(aggregator: Aggregator<F>) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
        }
    }
}

pub fn build_router<F: FeedFetcher + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
        .route(LISTINGS_PATH, get(listings_handler::<F>))
        .fallback(not_found_handler)
        .layer(from_fn(cors_middleware))
        .with_state(state)
}

async fn listings_handler<F: FeedFetcher + 'static>(
    State(state): State<AppState<F>>,
) -> Result<Response> {
    let response = state.aggregator.collect().await;
    tracing::info!("--- Done: {} total listings ---", response.total_listings);

    let body = serde_json::to_string_pretty(&response)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response())
}

async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "listing-proxy",
        "endpoints": { "listings": LISTINGS_PATH },
    }))
}

async fn healthz_handler() -> &'static str {
    "ok"
}

async fn not_found_handler() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

fn put_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
}

/// Answers every preflight directly and stamps CORS headers on all other responses.
async fn cors_middleware(req: Request<Body>, next: Next) -> Response {
    let mut resp = if req.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(req).await
    };
    put_cors_headers(resp.headers_mut());
    resp
}

pub async fn serve<S>(listener: TcpListener, router: Router, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listing proxy running at http://{}", addr);
        tracing::info!("API endpoint: http://{}{}", addr, LISTINGS_PATH);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}
