use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use axum::{
    body::Body,
    http::{Request, Response},
    routing::get,
    Router,
};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    cors::CorsLayer,
    trace::{DefaultOnRequest, TraceLayer},
};
use tracing::Span;
use crate::state::AppState;
use crate::{posts, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(users::router())
        .merge(posts::router())
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(request_tracing())
}

type RequestTracing = TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    fn(&Request<Body>) -> Span,
    DefaultOnRequest,
    fn(&Response<Body>, Duration, &Span),
>;

/// One span per request; the response is logged inside it with its status
/// and latency, at `error` for 5xx and `warn` for 4xx.
fn request_tracing() -> RequestTracing {
    fn span_for(req: &Request<Body>) -> Span {
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            path = %req.uri().path(),
            status = tracing::field::Empty,
        )
    }

    fn log_response(res: &Response<Body>, latency: Duration, span: &Span) {
        let status = res.status();
        let latency_ms = latency.as_millis() as u64;
        span.record("status", status.as_u16());
        if status.is_server_error() {
            tracing::error!(%status, latency_ms, "response");
        } else if status.is_client_error() {
            tracing::warn!(%status, latency_ms, "response");
        } else {
            tracing::info!(%status, latency_ms, "response");
        }
    }

    TraceLayer::new_for_http()
        .make_span_with(span_for as fn(&Request<Body>) -> Span)
        .on_response(log_response as fn(&Response<Body>, Duration, &Span))
}

pub async fn serve(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "postboard listening");
    axum::serve(listener, app).await.context("http server")
}
