use std::net::SocketAddr;

use axum::{
    extract::{FromRequestParts, Request, State},
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    middleware::{self, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{instrument, warn};

use crate::{
    auth::{self, handlers::AUTH_PAGE},
    session::{self, extractors::AuthSession},
    state::AppState,
    traits,
};

/// Files under the static dir that only a logged-in player may load.
const GATED_PAGES: [&str; 2] = ["phaser.html", "dashboard.html"];

pub fn build_app(state: AppState) -> Router {
    let static_files: Router = Router::new()
        .fallback_service(
            ServeDir::new(&state.config.static_dir).not_found_service(not_found.into_service()),
        )
        .layer(middleware::from_fn_with_state(state.clone(), guard_gated_files))
        .with_state(state.clone());

    Router::new()
        .merge(auth::router())
        .merge(session::router())
        .merge(traits::router())
        .route("/phaser.html", get(game_page))
        .route("/dashboard.html", get(dashboard_page))
        .route("/health", get(|| async { "ok" }))
        .fallback_service(static_files)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "3000".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

/// Session-gated page: anonymous visitors are bounced to the login page.
async fn gated_page(state: &AppState, session: Option<AuthSession>, file: &str) -> Response {
    if session.is_none() {
        return Redirect::to(AUTH_PAGE).into_response();
    }
    let path = state.config.static_dir.join(file);
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "page missing");
            not_found().await
        }
    }
}

/// The gated page a static request would resolve to, after the same
/// decoding and dot-segment handling the file server applies.
fn gated_file(path: &str) -> Option<&'static str> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    let mut segments: Vec<&str> = Vec::new();
    for seg in decoded.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    match segments.as_slice() {
        [name] => GATED_PAGES.iter().copied().find(|page| page == name),
        _ => None,
    }
}

/// Keeps the file server from handing out gated pages under an alternate
/// spelling of their path.
async fn guard_gated_files(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(file) = gated_file(req.uri().path()) else {
        return next.run(req).await;
    };
    let (mut parts, _) = req.into_parts();
    let session = AuthSession::from_request_parts(&mut parts, &state).await.ok();
    gated_page(&state, session, file).await
}

#[instrument(skip_all)]
async fn game_page(State(state): State<AppState>, session: Option<AuthSession>) -> Response {
    gated_page(&state, session, "phaser.html").await
}

#[instrument(skip_all)]
async fn dashboard_page(State(state): State<AppState>, session: Option<AuthSession>) -> Response {
    gated_page(&state, session, "dashboard.html").await
}
