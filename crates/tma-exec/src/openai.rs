use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::adapters::AnalysisProvider;
use crate::contracts::CompletionRequest;
use crate::http::classify_reqwest_error;
use crate::http::classify_status;
use crate::http::message_short;
use crate::http::HttpConfig;
use crate::http::ProviderError;
use crate::http::ProviderErrorKind;

/// Blocking client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        http: HttpConfig,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout())
            .timeout(http.request_timeout())
            .build()
            .map_err(|err| {
                ProviderError::new(
                    ProviderErrorKind::Other,
                    format!("failed to build HTTP client: {err}"),
                )
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl AnalysisProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .map_err(|err| {
                ProviderError::new(
                    classify_reqwest_error(&err),
                    format!("failed to call chat completions endpoint: {err}"),
                )
            })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|err| {
            ProviderError::new(
                classify_reqwest_error(&err),
                format!("failed to read response body: {err}"),
            )
            .with_status(status)
        })?;

        if !(200..300).contains(&status) {
            return Err(parse_error_body(status, &body));
        }
        parse_completion(&body).map_err(|err| err.with_status(status))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<Value>,
}

/// Extracts `choices[0].message.content`.
pub fn parse_completion(body: &str) -> Result<String, ProviderError> {
    let parsed: CompletionResponse = serde_json::from_str(body).map_err(|err| {
        ProviderError::new(
            ProviderErrorKind::Parse,
            format!("invalid completion response: {err}"),
        )
    })?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::Parse,
                "completion response has no message content",
            )
        })
}

/// Builds an error from a non-2xx response. Structured `{error:{...}}` bodies
/// keep their code and message; anything else keeps a short copy of the body.
pub fn parse_error_body(status: u16, body: &str) -> ProviderError {
    let kind = classify_status(status);
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .code
                .and_then(|value| match value {
                    Value::String(code) => Some(code),
                    Value::Number(code) => Some(code.to_string()),
                    _ => None,
                })
                .or(envelope.error.error_type);
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {status}"));
            let mut err = ProviderError::new(kind, message).with_status(status);
            err.code = code;
            err
        }
        Err(_) => ProviderError::new(
            kind,
            format!("HTTP {status}: {}", message_short(body, 200)),
        )
        .with_status(status),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tma_core::config::ModelConfig;

    use super::*;

    #[test]
    fn payload_matches_chat_completions_shape() {
        let request = CompletionRequest::new(&ModelConfig::default(), "sys", "usr");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-4",
                "messages": [
                    {"role": "system", "content": "sys"},
                    {"role": "user", "content": "usr"}
                ],
                "temperature": 0.7_f32,
                "max_tokens": 1000
            })
        );
    }

    #[test]
    fn completion_content_is_returned_verbatim() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Risk: high\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "  Risk: high\n");
    }

    #[test]
    fn completion_without_choices_is_a_parse_error() {
        let err = parse_completion(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Parse);
        let err = parse_completion("not json").unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::Parse);
    }

    #[test]
    fn structured_error_body_keeps_code_and_message() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        let err = parse_error_body(429, body);
        assert_eq!(err.kind, ProviderErrorKind::RateLimit);
        assert_eq!(err.http_status, Some(429));
        assert_eq!(err.code.as_deref(), Some("insufficient_quota"));
        assert_eq!(err.message, "You exceeded your current quota");
    }

    #[test]
    fn error_type_is_used_when_code_is_null() {
        let body = r#"{"error":{"message":"slow down","type":"rate_limit_exceeded","code":null}}"#;
        let err = parse_error_body(429, body);
        assert_eq!(err.code.as_deref(), Some("rate_limit_exceeded"));
    }

    #[test]
    fn unstructured_error_body_is_kept_short() {
        let err = parse_error_body(502, "<html>\nBad gateway\n</html>");
        assert_eq!(err.kind, ProviderErrorKind::Server);
        assert_eq!(err.code, None);
        assert_eq!(err.message, "HTTP 502: <html> Bad gateway </html>");
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let provider =
            OpenAiProvider::new("http://localhost:9/v1/", "sk-test", HttpConfig::default())
                .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:9/v1/chat/completions");
    }
}
