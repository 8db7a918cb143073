use crate::chat::UpstreamChatPayload;
use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    Network,
    Timeout,
    Http,
}

#[derive(Debug, Clone)]
pub struct UpstreamCallError {
    pub kind: UpstreamErrorKind,
    pub status: Option<StatusCode>,
    pub message: String,
}

impl UpstreamCallError {
    pub fn new(kind: UpstreamErrorKind, status: Option<StatusCode>, message: String) -> Self {
        Self {
            kind,
            status,
            message,
        }
    }

    /// Message carried by the single terminal error frame sent to the
    /// client.
    pub fn client_message(&self) -> String {
        match self.kind {
            UpstreamErrorKind::Http => {
                let status = self
                    .status
                    .map(|s| s.as_u16().to_string())
                    .unwrap_or_default();
                format!("API Error {}: {}", status, self.message)
            }
            UpstreamErrorKind::Timeout => format!("Upstream timeout: {}", self.message),
            UpstreamErrorKind::Network => {
                format!("Upstream connection failed: {}", self.message)
            }
        }
    }
}

/// Issues the streaming chat-completion call. Returns the raw response for
/// the caller to consume as an event stream; any non-success status or send
/// failure is classified here and never retried.
pub async fn call_chat_stream(
    client: &reqwest::Client,
    url: &str,
    bearer_token: &str,
    body: &UpstreamChatPayload,
    timeout_ms: u64,
) -> Result<reqwest::Response, UpstreamCallError> {
    let resp = client
        .post(url)
        .timeout(std::time::Duration::from_millis(timeout_ms))
        .bearer_auth(bearer_token)
        .json(body)
        .send()
        .await
        .map_err(|err| {
            let kind = if err.is_timeout() {
                UpstreamErrorKind::Timeout
            } else {
                UpstreamErrorKind::Network
            };
            UpstreamCallError::new(kind, None, err.to_string())
        })?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(UpstreamCallError::new(
            UpstreamErrorKind::Http,
            Some(status),
            text,
        ));
    }
    Ok(resp)
}

/// True when a body-read failure was ultimately caused by the per-request
/// deadline. reqwest reports a mid-stream deadline hit as a decode error
/// wrapping the timeout, so the source chain is inspected as well as the
/// top-level error.
pub fn is_stream_timeout(err: &reqwest::Error) -> bool {
    if err.is_timeout() {
        return true;
    }
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<std::io::Error>() {
            if io_err.kind() == std::io::ErrorKind::TimedOut {
                return true;
            }
        }
        if let Some(req_err) = inner.downcast_ref::<reqwest::Error>() {
            if req_err.is_timeout() {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_carry_status_and_body() {
        let err = UpstreamCallError::new(
            UpstreamErrorKind::Http,
            Some(StatusCode::SERVICE_UNAVAILABLE),
            "overloaded".to_string(),
        );
        assert_eq!(err.client_message(), "API Error 503: overloaded");
    }

    #[test]
    fn timeout_and_network_failures_are_classified() {
        let timeout =
            UpstreamCallError::new(UpstreamErrorKind::Timeout, None, "deadline".to_string());
        assert!(timeout.client_message().starts_with("Upstream timeout:"));
        let network =
            UpstreamCallError::new(UpstreamErrorKind::Network, None, "reset".to_string());
        assert!(
            network
                .client_message()
                .starts_with("Upstream connection failed:")
        );
    }
}
