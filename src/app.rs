use crate::config::ModelCatalogConfig;
use crate::error::{AppError, AppResult};
use crate::model_registry::ModelRegistry;
use crate::oauth::OauthConfig;
use crate::sessions::SessionStore;
use axum::Router;
use axum::routing::{get, post};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<RuntimeConfig>,
    pub model_registry: ModelRegistry,
    pub sessions: SessionStore,
    pub http: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub listen: String,
    pub upstream_url: String,
    pub default_model: Option<String>,
    pub request_timeout_ms: u64,
    pub max_tokens: u64,
    pub temperature: f64,
    pub session_ttl_seconds: i64,
    pub models_file: Option<PathBuf>,
    pub oauth: OauthConfig,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let oauth = OauthConfig {
            client_id: env_string("HF_CLIENT_ID", ""),
            client_secret: env_string("HF_CLIENT_SECRET", ""),
            redirect_uri: env_string("HF_REDIRECT_URI", "http://127.0.0.1:5000/callback"),
            authorize_url: env_string(
                "CHATGATE_AUTHORIZE_URL",
                "https://huggingface.co/oauth/authorize",
            ),
            token_url: env_string("CHATGATE_TOKEN_URL", "https://huggingface.co/oauth/token"),
            user_url: env_string("CHATGATE_USER_URL", "https://huggingface.co/api/whoami-v2"),
            scope: env_string("CHATGATE_OAUTH_SCOPE", "openid profile inference-api"),
        };
        Self {
            listen: env_string("CHATGATE_LISTEN", "0.0.0.0:5000"),
            upstream_url: env_string(
                "CHATGATE_UPSTREAM_URL",
                "https://router.huggingface.co/v1/chat/completions",
            ),
            default_model: std::env::var("CHATGATE_DEFAULT_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            request_timeout_ms: env_parsed("CHATGATE_REQUEST_TIMEOUT_MS", 60_000),
            max_tokens: env_parsed("CHATGATE_MAX_TOKENS", 2_000),
            temperature: env_parsed("CHATGATE_TEMPERATURE", 0.7),
            session_ttl_seconds: env_parsed("CHATGATE_SESSION_TTL_SECONDS", 7 * 24 * 3600),
            models_file: std::env::var("CHATGATE_MODELS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            oauth,
        }
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub async fn load_state() -> AppResult<AppState> {
    load_state_with_runtime(RuntimeConfig::from_env()).await
}

pub async fn load_state_with_runtime(runtime: RuntimeConfig) -> AppResult<AppState> {
    let http = reqwest::Client::builder()
        .user_agent("chatgate/0.1")
        .build()
        .map_err(|err| {
            AppError::new(
                axum::http::StatusCode::BAD_REQUEST,
                "http_client_init_failed",
                err.to_string(),
            )
        })?;

    let mut catalog = match runtime.models_file.as_deref() {
        Some(path) => ModelCatalogConfig::load(path).map_err(|err| {
            AppError::new(
                axum::http::StatusCode::BAD_REQUEST,
                "model_catalog_load_failed",
                err,
            )
        })?,
        None => ModelCatalogConfig::builtin(),
    };
    if let Some(default_model) = runtime.default_model.as_deref() {
        catalog.default_model = default_model.to_string();
    }
    let model_registry = ModelRegistry::from_config(catalog).map_err(|err| {
        AppError::new(
            axum::http::StatusCode::BAD_REQUEST,
            "model_catalog_invalid",
            err,
        )
    })?;

    let sessions = SessionStore::new(runtime.session_ttl_seconds);

    Ok(AppState {
        runtime: Arc::new(runtime),
        model_registry,
        sessions,
        http,
    })
}

pub fn build_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .route("/", get(crate::handlers::index))
        .route("/login", get(crate::handlers::login))
        .route("/callback", get(crate::handlers::callback))
        .route("/logout", get(crate::handlers::logout))
        .route("/check-auth", get(crate::handlers::check_auth))
        .route("/get-billing-info", get(crate::handlers::get_billing_info))
        .route("/models", get(crate::handlers::list_models))
        .route("/chat", post(crate::handlers::chat))
        .with_state(state)
        .layer(SetRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(
            axum::http::header::HeaderName::from_static("x-request-id"),
        ))
        .layer(TraceLayer::new_for_http())
}
