//! HTTP handlers: the shell page and the `/_shell` JSON endpoints.

use axum::{
    extract::{RawQuery, State},
    http::{header, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use framedash_core::{Outcome, Request, ValidationIssue};
use std::sync::Arc;
use tracing::debug;

use crate::error::{WebError, WebResult};
use crate::render::{render_shell, ShellView};
use crate::store::DocumentStore;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

/// Endpoints nested under `/_shell`.
pub fn shell_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
        .route("/config", get(config_json))
        .route("/validate", get(validate_json))
        .route("/resolve", get(resolve_json))
        .route("/reload", post(reload))
}

/// Split a raw query string into decoded pairs.
pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .into_owned()
            .collect()
    })
    .unwrap_or_default()
}

/// Status code for a planned outcome.
pub fn outcome_status(outcome: &Outcome) -> StatusCode {
    match outcome {
        Outcome::Frame { .. } | Outcome::External { .. } => StatusCode::OK,
        Outcome::Redirect { .. } => StatusCode::FOUND,
        Outcome::Blocked { .. } => StatusCode::FORBIDDEN,
        Outcome::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

/// Render the shell for any path outside `/_shell`.
pub async fn shell_page(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> WebResult<Response> {
    if method != Method::GET && method != Method::HEAD {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let dashboard = state.store.current().await;
    let query = parse_query(uri.query());
    let plan = dashboard.plan(&Request {
        path: uri.path(),
        query: &query,
        hash: None,
    })?;
    debug!("{} -> {}", uri, outcome_status(&plan.outcome));

    if let Outcome::Redirect { location } = &plan.outcome {
        let mut target = location.clone();
        if let Some(q) = uri.query().filter(|q| !q.is_empty()) {
            target.push('?');
            target.push_str(q);
        }
        return Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response());
    }

    let html = render_shell(&ShellView {
        document: dashboard.document(),
        plan: &plan,
    });
    Ok((outcome_status(&plan.outcome), Html(html)).into_response())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "buildTimestamp": env!("FRAMEDASH_BUILD_TIMESTAMP"),
        "gitCommit": option_env!("FRAMEDASH_GIT_COMMIT"),
    }))
}

async fn config_json(State(state): State<AppState>) -> Json<framedash_core::DashboardDocument> {
    let dashboard = state.store.current().await;
    Json(dashboard.document().clone())
}

async fn validate_json(State(state): State<AppState>) -> Json<Vec<ValidationIssue>> {
    let dashboard = state.store.current().await;
    Json(dashboard.document().validate())
}

/// `GET /_shell/resolve?path=/x&hash=y&<address-bar params>`
async fn resolve_json(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> WebResult<Response> {
    let mut path = None;
    let mut hash = None;
    let mut query = Vec::new();
    for (key, value) in parse_query(raw.as_deref()) {
        match key.as_str() {
            "path" if path.is_none() => path = Some(value),
            "hash" if hash.is_none() => hash = Some(value),
            _ => query.push((key, value)),
        }
    }
    let path = path.ok_or_else(|| WebError::InvalidRequest("missing path".to_string()))?;

    let dashboard = state.store.current().await;
    let plan = dashboard.plan(&Request {
        path: &path,
        query: &query,
        hash: hash.as_deref(),
    })?;
    Ok(Json(plan).into_response())
}

async fn reload(State(state): State<AppState>) -> WebResult<Json<serde_json::Value>> {
    state.store.reload().await?;
    let dashboard = state.store.current().await;
    Ok(Json(serde_json::json!({
        "ok": true,
        "title": dashboard.document().title,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_query_decodes_pairs() {
        assert_eq!(
            parse_query(Some("a=1&theme.primary=%23fff&b=x+y")),
            vec![
                ("a".to_string(), "1".to_string()),
                ("theme.primary".to_string(), "#fff".to_string()),
                ("b".to_string(), "x y".to_string()),
            ]
        );
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn outcome_status_mapping() {
        assert_eq!(
            outcome_status(&Outcome::Blocked {
                target: String::new(),
                reason: String::new()
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            outcome_status(&Outcome::NotFound {
                path: "/x".to_string()
            }),
            StatusCode::NOT_FOUND
        );
    }
}
