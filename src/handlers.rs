use crate::app::AppState;
use crate::chat::{ChatRequest, UpstreamChatPayload};
use crate::error::{AppError, AppResult};
use crate::oauth;
use crate::sessions::{self, SESSION_COOKIE, Session};
use crate::stream::{DeltaEvent, LineOutcome};
use crate::upstream::{self, UpstreamCallError};
use axum::Json;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::sse::Event;
use axum::response::{Html, IntoResponse, Redirect, Response, Sse};
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use tokio::sync::mpsc;
use uuid::Uuid;

const STATE_COOKIE: &str = "chatgate_oauth_state";

const INDEX_HTML: &str = concat!(
    "<!doctype html><html><head><title>chatgate</title></head>",
    "<body><h1>chatgate</h1>",
    "<p>Authenticated. POST /chat to talk to the configured models; ",
    "GET /models lists them.</p></body></html>",
);

fn current_session(headers: &HeaderMap, state: &AppState) -> Option<Session> {
    sessions::cookie_value(headers, SESSION_COOKIE).and_then(|id| state.sessions.get(&id))
}

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if current_session(&headers, &state).is_none() {
        return Redirect::to("/login").into_response();
    }
    Html(INDEX_HTML).into_response()
}

pub async fn login(State(state): State<AppState>) -> Response {
    let oauth_state = Uuid::new_v4().to_string();
    let url = oauth::authorize_redirect_url(&state.runtime.oauth, &oauth_state);
    redirect_with_cookie(
        &url,
        &format!("{STATE_COOKIE}={oauth_state}; Path=/; HttpOnly; Max-Age=600"),
    )
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> AppResult<Response> {
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| {
            AppError::new(
                StatusCode::BAD_REQUEST,
                "missing_code",
                "no authorization code received",
            )
        })?;
    let expected_state = sessions::cookie_value(&headers, STATE_COOKIE);
    if expected_state.is_none() || expected_state.as_deref() != query.state.as_deref() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "state_mismatch",
            "oauth state parameter did not match",
        ));
    }
    let access_token = oauth::exchange_code(&state.http, &state.runtime.oauth, code).await?;
    let user = oauth::fetch_profile(&state.http, &state.runtime.oauth, &access_token).await?;
    tracing::info!(username = %user.username, "oauth login succeeded");
    let session = state.sessions.create(access_token, user);
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, "/")
        .header(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}={}; Path=/; HttpOnly", session.id),
        )
        .header(
            header::SET_COOKIE,
            format!("{STATE_COOKIE}=; Path=/; HttpOnly; Max-Age=0"),
        )
        .body(Body::empty())
        .map_err(|err| {
            AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "response_build_failed",
                err.to_string(),
            )
        })
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = sessions::cookie_value(&headers, SESSION_COOKIE) {
        state.sessions.remove(&id);
    }
    redirect_with_cookie(
        "/login",
        &format!("{SESSION_COOKIE}=; Path=/; HttpOnly; Max-Age=0"),
    )
}

pub async fn check_auth(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    match current_session(&headers, &state) {
        Some(session) => Json(json!({ "authenticated": true, "user": session.user })),
        None => Json(json!({ "authenticated": false })),
    }
}

pub async fn get_billing_info() -> Json<Value> {
    Json(json!({
        "plan": "Standard",
        "usage": {
            "inference": {
                "used": 0,
                "limit": 1000
            }
        }
    }))
}

pub async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let default_key = state.model_registry.default_descriptor().key.clone();
    let data: Vec<Value> = state
        .model_registry
        .all()
        .into_iter()
        .map(|descriptor| {
            json!({
                "key": descriptor.key,
                "display_name": descriptor.display_name,
                "pricing": descriptor.pricing,
                "default": descriptor.key == default_key,
            })
        })
        .collect();
    Json(json!({ "models": data }))
}

/// One chat turn end-to-end: auth gate, model resolution, upstream dispatch,
/// then SSE passthrough of the parsed delta stream. Once streaming starts
/// the HTTP status is committed, so upstream failures surface as a single
/// error frame rather than a status code.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> AppResult<Response> {
    let session = current_session(&headers, &state).ok_or_else(AppError::unauthenticated)?;
    if body.message.trim().is_empty() {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "empty_message",
            "message must not be empty",
        ));
    }
    let descriptor = state.model_registry.lookup(body.model.as_deref());
    let payload = UpstreamChatPayload::build(
        descriptor.upstream_id.clone(),
        &body.history,
        &body.message,
        state.runtime.max_tokens,
        state.runtime.temperature,
    );
    tracing::debug!(
        model = %descriptor.key,
        turns = payload.messages.len(),
        "dispatching chat request upstream"
    );
    match upstream::call_chat_stream(
        &state.http,
        &state.runtime.upstream_url,
        &session.access_token,
        &payload,
        state.runtime.request_timeout_ms,
    )
    .await
    {
        Ok(upstream_resp) => {
            let (tx, rx) = mpsc::channel::<Event>(64);
            tokio::spawn(pump_upstream(upstream_resp, tx));
            Ok(Sse::new(
                tokio_stream::wrappers::ReceiverStream::new(rx).map(Ok::<_, Infallible>),
            )
            .into_response())
        }
        Err(err) => {
            tracing::warn!("upstream chat call failed: {}", err.client_message());
            Ok(Sse::new(error_sse_stream(&err)).into_response())
        }
    }
}

/// Reads the upstream event stream to completion, forwarding recognized
/// content deltas in arrival order. Per-event decode problems are skipped;
/// a transport failure emits one terminal error frame, reported as a
/// timeout when the request deadline caused it. A failed send means
/// the client went away, which aborts the upstream read by dropping the
/// response.
async fn pump_upstream(upstream_resp: reqwest::Response, tx: mpsc::Sender<Event>) {
    let mut events = upstream_resp.bytes_stream().eventsource();
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(EventStreamError::Transport(err)) => {
                let frame = if upstream::is_stream_timeout(&err) {
                    DeltaEvent::Error(format!("Upstream timeout: {err}"))
                } else {
                    DeltaEvent::Error(format!("Upstream connection failed: {err}"))
                };
                let _ = tx.send(Event::default().data(frame.to_frame())).await;
                break;
            }
            Err(_) => continue,
        };
        match crate::stream::parse_payload(event.data.trim()) {
            LineOutcome::Done => break,
            LineOutcome::Skip => continue,
            LineOutcome::Delta(text) => {
                let frame = DeltaEvent::Content(text);
                if tx
                    .send(Event::default().data(frame.to_frame()))
                    .await
                    .is_err()
                {
                    tracing::debug!("client disconnected, dropping upstream stream");
                    break;
                }
            }
        }
    }
}

fn error_sse_stream(
    err: &UpstreamCallError,
) -> impl futures_util::Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let frame = DeltaEvent::Error(err.client_message());
    futures_util::stream::iter(vec![Ok(Event::default().data(frame.to_frame()))])
}

fn redirect_with_cookie(location: &str, cookie: &str) -> Response {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, location)
        .header(header::SET_COOKIE, cookie)
        .body(Body::empty())
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
