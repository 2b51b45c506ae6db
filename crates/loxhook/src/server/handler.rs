use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, info};

use loxhook_api::MiniserverResponse;
use loxhook_core::{Category, Control, DviAction, authorize, translate};

use super::error::ProxyError;
use super::state::AppState;
use crate::logging::ACCESS_TARGET;

/// Query string of a virtual input request.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DviQuery {
    /// Presented credential secret.
    pub key: Option<String>,
    /// Dry run: `simulate` present with any value.
    pub simulate: bool,
}

impl DviQuery {
    /// The first `t` wins when the key is repeated.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (name, value) in pairs {
            match name.as_str() {
                "t" if query.key.is_none() => query.key = Some(value),
                "simulate" => query.simulate = true,
                _ => {}
            }
        }
        query
    }
}

/// `GET|POST /dvi/{control}/{command}`
pub async fn dvi(
    State(state): State<AppState>,
    Path((control, command)): Path<(String, String)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, ProxyError> {
    let query = DviQuery::from_pairs(pairs);
    if !state.limiter().try_acquire() {
        return Err(ProxyError::RateLimited);
    }

    let action = DviAction::parse(&command)?;

    let registry = state.registry();
    let ctl = registry
        .control(&control)
        .filter(|c| c.category == Category::Dvi)
        .ok_or_else(|| ProxyError::UnknownControl { name: control.clone() })?;

    let secret = query.key.as_deref().ok_or(ProxyError::MissingKey)?;
    authorize(ctl, registry.credentials(), secret, &command)?;

    let path = translate(ctl.id, action);
    if query.simulate {
        debug!(control = %ctl.name, %path, "simulated request");
        return Ok(simulate_report(ctl, action, &path).into_response());
    }

    let resp = state.miniserver().send_command(&path).await?;
    Ok(forward(resp))
}

fn simulate_report(ctl: &Control, action: DviAction, path: &str) -> String {
    let mut out = String::from("SIMULATE\n");
    let _ = writeln!(out, "Control:       {}", ctl.name);
    let _ = writeln!(out, "Virtual Input: {}", ctl.id);
    let _ = writeln!(out, "Command:       {action}");
    let _ = writeln!(out, "Path:          {path}");
    out
}

/// Pass the Miniserver's status, content type and body through unchanged.
fn forward(resp: MiniserverResponse) -> Response {
    let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, resp.body).into_response();
    let headers = response.headers_mut();
    match resp.content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
        Some(ct) => {
            headers.insert(CONTENT_TYPE, ct);
        }
        None => {
            headers.remove(CONTENT_TYPE);
        }
    }
    response
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}

/// One access log line per request. The query string carries the secret
/// and is never logged.
pub async fn access_log(
    connect: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Response {
    let remote = connect.map_or_else(|| "-".to_owned(), |ConnectInfo(addr)| addr.to_string());
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    info!(
        target: ACCESS_TARGET,
        %remote,
        %method,
        %path,
        status = response.status().as_u16(),
        "request"
    );
    response
}
