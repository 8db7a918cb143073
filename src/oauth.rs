use crate::error::{AppError, AppResult};
use crate::sessions::UserProfile;
use axum::http::StatusCode;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;

/// OAuth2 authorization-code collaborator. The core only needs the bearer
/// token this flow produces; everything here is the one-shot exchange.
#[derive(Debug, Clone)]
pub struct OauthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub user_url: String,
    pub scope: String,
}

pub fn authorize_redirect_url(config: &OauthConfig, state: &str) -> String {
    let params = [
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", config.scope.as_str()),
        ("state", state),
    ];
    let query = params
        .iter()
        .map(|(key, value)| {
            format!("{}={}", key, utf8_percent_encode(value, NON_ALPHANUMERIC))
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", config.authorize_url, query)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

pub async fn exchange_code(
    client: &reqwest::Client,
    config: &OauthConfig,
    code: &str,
) -> AppResult<String> {
    let form = [
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];
    let resp = client
        .post(&config.token_url)
        .form(&form)
        .send()
        .await
        .map_err(|err| {
            AppError::new(StatusCode::BAD_GATEWAY, "token_exchange_failed", err.to_string())
        })?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::new(
            StatusCode::BAD_GATEWAY,
            "token_exchange_failed",
            format!("token endpoint returned {}: {}", status, body),
        ));
    }
    let token: TokenResponse = resp.json().await.map_err(|err| {
        AppError::new(StatusCode::BAD_GATEWAY, "token_exchange_failed", err.to_string())
    })?;
    token.access_token.filter(|t| !t.is_empty()).ok_or_else(|| {
        AppError::new(
            StatusCode::BAD_GATEWAY,
            "token_exchange_failed",
            "token endpoint response had no access_token",
        )
    })
}

#[derive(Debug, Deserialize)]
struct WhoamiResponse {
    name: Option<String>,
    fullname: Option<String>,
    #[serde(rename = "avatarUrl")]
    avatar_url: Option<String>,
}

pub async fn fetch_profile(
    client: &reqwest::Client,
    config: &OauthConfig,
    access_token: &str,
) -> AppResult<UserProfile> {
    let resp = client
        .get(&config.user_url)
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|err| {
            AppError::new(StatusCode::BAD_GATEWAY, "profile_fetch_failed", err.to_string())
        })?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(AppError::new(
            StatusCode::BAD_GATEWAY,
            "profile_fetch_failed",
            format!("user endpoint returned {}: {}", status, body),
        ));
    }
    let whoami: WhoamiResponse = resp.json().await.map_err(|err| {
        AppError::new(StatusCode::BAD_GATEWAY, "profile_fetch_failed", err.to_string())
    })?;
    let username = whoami.name.clone().unwrap_or_else(|| "user".to_string());
    Ok(UserProfile {
        name: whoami.fullname.unwrap_or_else(|| username.clone()),
        username,
        avatar: whoami.avatar_url.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OauthConfig {
        OauthConfig {
            client_id: "cid".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://127.0.0.1:5000/callback".to_string(),
            authorize_url: "https://huggingface.co/oauth/authorize".to_string(),
            token_url: "https://huggingface.co/oauth/token".to_string(),
            user_url: "https://huggingface.co/api/whoami-v2".to_string(),
            scope: "openid profile inference-api".to_string(),
        }
    }

    #[test]
    fn authorize_url_encodes_every_parameter() {
        let url = authorize_redirect_url(&config(), "state-123");
        assert!(url.starts_with("https://huggingface.co/oauth/authorize?"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("redirect_uri=http%3A%2F%2F127%2E0%2E0%2E1%3A5000%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20profile%20inference%2Dapi"));
        assert!(url.contains("state=state%2D123"));
    }
}
