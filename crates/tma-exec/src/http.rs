use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tma_core::config::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 5_000,
            request_timeout_ms: 60_000,
        }
    }
}

impl HttpConfig {
    pub fn from_model(model: &ModelConfig) -> Self {
        Self {
            connect_timeout_ms: model.connect_timeout_ms,
            request_timeout_ms: model.request_timeout_ms,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Connection,
    Timeout,
    RateLimit,
    Unauthorized,
    Client,
    Server,
    Parse,
    Other,
}

/// A failed completion call, with whatever structure the provider gave us.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider {kind:?} error: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub http_status: Option<u16>,
    /// `error.code` from the response body, or `error.type` when no code is set.
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            http_status: None,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

pub fn classify_status(status: u16) -> ProviderErrorKind {
    match status {
        429 => ProviderErrorKind::RateLimit,
        401 | 403 => ProviderErrorKind::Unauthorized,
        400..=499 => ProviderErrorKind::Client,
        500..=599 => ProviderErrorKind::Server,
        _ => ProviderErrorKind::Other,
    }
}

pub fn classify_reqwest_error(err: &reqwest::Error) -> ProviderErrorKind {
    if err.is_timeout() {
        return ProviderErrorKind::Timeout;
    }
    if err.is_connect() {
        return ProviderErrorKind::Connection;
    }
    if let Some(status) = err.status() {
        return classify_status(status.as_u16());
    }
    if err.is_decode() {
        return ProviderErrorKind::Parse;
    }
    ProviderErrorKind::Other
}

/// Single line, at most `max` characters.
pub fn message_short(s: &str, max: usize) -> String {
    let single_line: String = s
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    single_line.trim().chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(classify_status(429), ProviderErrorKind::RateLimit);
        assert_eq!(classify_status(401), ProviderErrorKind::Unauthorized);
        assert_eq!(classify_status(403), ProviderErrorKind::Unauthorized);
        assert_eq!(classify_status(404), ProviderErrorKind::Client);
        assert_eq!(classify_status(503), ProviderErrorKind::Server);
        assert_eq!(classify_status(302), ProviderErrorKind::Other);
    }

    #[test]
    fn timeouts_come_from_model_config() {
        let model = ModelConfig {
            connect_timeout_ms: 250,
            request_timeout_ms: 9_000,
            ..ModelConfig::default()
        };
        let http = HttpConfig::from_model(&model);
        assert_eq!(http.connect_timeout(), Duration::from_millis(250));
        assert_eq!(http.request_timeout(), Duration::from_secs(9));
    }

    #[test]
    fn short_message_is_single_line_and_bounded() {
        assert_eq!(message_short("  a\nb\r\nc  ", 200), "a b  c");
        assert_eq!(message_short(&"x".repeat(300), 200).len(), 200);
    }
}
