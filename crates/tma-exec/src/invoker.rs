use std::time::Instant;

use tma_core::config::ModelConfig;
use tma_core::AnalysisError;
use tma_core::AnalysisRequest;

use crate::adapters::AnalysisProvider;
use crate::adapters::SimulatedProvider;
use crate::contracts::CompletionRequest;
use crate::http::HttpConfig;
use crate::http::ProviderError;
use crate::openai::OpenAiProvider;

/// Runs one analysis against the configured provider and maps failures onto
/// the user-facing taxonomy. There is no retry.
pub struct AnalysisInvoker {
    provider: Option<Box<dyn AnalysisProvider>>,
    model: ModelConfig,
}

impl AnalysisInvoker {
    pub fn new(provider: Option<Box<dyn AnalysisProvider>>, model: ModelConfig) -> Self {
        Self { provider, model }
    }

    /// Picks the provider for a session: the simulated one when `offline`,
    /// the HTTP one when a key is present, otherwise none.
    pub fn from_settings(
        model: &ModelConfig,
        api_key: Option<String>,
        offline: bool,
    ) -> Result<Self, ProviderError> {
        let provider: Option<Box<dyn AnalysisProvider>> = if offline {
            Some(Box::new(SimulatedProvider))
        } else {
            match api_key {
                Some(key) => Some(Box::new(OpenAiProvider::new(
                    &model.base_url,
                    key,
                    HttpConfig::from_model(model),
                )?)),
                None => None,
            }
        };
        Ok(Self::new(provider, model.clone()))
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn provider_name(&self) -> Option<&'static str> {
        self.provider.as_ref().map(|p| p.name())
    }

    pub fn invoke(&self, instruction: &str, user_text: &str) -> Result<String, AnalysisError> {
        let Some(provider) = &self.provider else {
            return Err(AnalysisError::ConfigurationMissing);
        };
        let request = CompletionRequest::new(&self.model, instruction, user_text);
        let started = Instant::now();
        match provider.complete(&request) {
            Ok(text) => {
                tracing::info!(
                    provider = provider.name(),
                    model = %self.model.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    output_chars = text.chars().count(),
                    "analysis completed"
                );
                Ok(text)
            }
            Err(err) => {
                let classified = classify_failure(&err);
                tracing::warn!(
                    provider = provider.name(),
                    kind = ?err.kind,
                    status = ?err.http_status,
                    code = ?err.code,
                    classified = classified.label(),
                    "analysis failed"
                );
                Err(classified)
            }
        }
    }

    /// Checks preconditions in the same order as the session does, then calls
    /// the provider with the composed text.
    pub fn run(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        if !self.is_configured() {
            return Err(AnalysisError::ConfigurationMissing);
        }
        if request.input_text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        self.invoke(request.instruction, &request.user_text)
    }
}

/// Maps a provider failure onto [`AnalysisError`]. The body's code and the
/// HTTP status win; message substrings are only a fallback.
pub fn classify_failure(err: &ProviderError) -> AnalysisError {
    if let Some(code) = err.code.as_deref().map(str::to_ascii_lowercase) {
        if code.contains("insufficient_quota") {
            return AnalysisError::QuotaExceeded;
        }
        if code.contains("rate_limit") {
            return AnalysisError::RateLimited;
        }
        if code.contains("invalid_api_key") {
            return AnalysisError::InvalidCredential;
        }
    }
    match err.http_status {
        Some(429) => return AnalysisError::RateLimited,
        Some(401) => return AnalysisError::InvalidCredential,
        _ => {}
    }

    let message = err.message.to_lowercase();
    if message.contains("rate_limit") {
        AnalysisError::RateLimited
    } else if message.contains("insufficient_quota") {
        AnalysisError::QuotaExceeded
    } else if message.contains("invalid_api_key") {
        AnalysisError::InvalidCredential
    } else {
        AnalysisError::Unknown(err.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tma_core::prompts::instruction_for;
    use tma_core::AnalysisType;

    use super::*;
    use crate::http::ProviderErrorKind;

    /// Replays queued outcomes and records every request it sees.
    struct ScriptedProvider {
        outcomes: Mutex<Vec<Result<String, ProviderError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(mut outcomes: Vec<Result<String, ProviderError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl AnalysisProvider for Arc<ScriptedProvider> {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
            self.seen.lock().unwrap().push(request.clone());
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(ProviderError::new(ProviderErrorKind::Other, "script exhausted")))
        }
    }

    fn scripted(outcomes: Vec<Result<String, ProviderError>>) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::new(outcomes))
    }

    fn invoker(provider: &Arc<ScriptedProvider>) -> AnalysisInvoker {
        AnalysisInvoker::new(Some(Box::new(Arc::clone(provider))), ModelConfig::default())
    }

    fn request(input: &str) -> AnalysisRequest {
        AnalysisRequest {
            request_id: 1,
            analysis_type: AnalysisType::Recommendations,
            input_text: input.to_string(),
            user_text: format!("{input}\n\nUrgency level: High"),
            instruction: instruction_for(AnalysisType::Recommendations),
        }
    }

    #[test]
    fn success_returns_text_verbatim_after_one_call() {
        let provider = scripted(vec![Ok("  Plan A\n".to_string())]);
        let out = invoker(&provider).run(&request("Go-live slipping")).unwrap();
        assert_eq!(out, "  Plan A\n");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].instruction(),
            Some(instruction_for(AnalysisType::Recommendations))
        );
        assert_eq!(seen[0].user_text(), Some("Go-live slipping\n\nUrgency level: High"));
    }

    #[test]
    fn missing_provider_short_circuits() {
        let invoker = AnalysisInvoker::new(None, ModelConfig::default());
        assert!(!invoker.is_configured());
        assert_eq!(
            invoker.invoke("sys", "text"),
            Err(AnalysisError::ConfigurationMissing)
        );
        assert_eq!(invoker.run(&request("")), Err(AnalysisError::ConfigurationMissing));
    }

    #[test]
    fn blank_input_never_reaches_the_provider() {
        let provider = scripted(vec![Ok("unused".to_string())]);
        assert_eq!(
            invoker(&provider).run(&request("  \n")),
            Err(AnalysisError::EmptyInput)
        );
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn failures_are_not_retried() {
        let provider = scripted(vec![
            Err(ProviderError::new(ProviderErrorKind::Server, "boom").with_status(500)),
            Ok("should not be reached".to_string()),
        ]);
        let result = invoker(&provider).run(&request("x"));
        assert_eq!(result, Err(AnalysisError::Unknown("boom".to_string())));
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn structured_code_wins_over_status() {
        let quota = ProviderError::new(ProviderErrorKind::RateLimit, "You exceeded your current quota")
            .with_status(429)
            .with_code("insufficient_quota");
        assert_eq!(classify_failure(&quota), AnalysisError::QuotaExceeded);

        let key = ProviderError::new(ProviderErrorKind::Unauthorized, "Incorrect API key provided")
            .with_status(401)
            .with_code("invalid_api_key");
        assert_eq!(classify_failure(&key), AnalysisError::InvalidCredential);
    }

    #[test]
    fn status_is_used_when_no_code_is_present() {
        let limited = ProviderError::new(ProviderErrorKind::RateLimit, "slow down").with_status(429);
        assert_eq!(classify_failure(&limited), AnalysisError::RateLimited);
        let denied = ProviderError::new(ProviderErrorKind::Unauthorized, "nope").with_status(401);
        assert_eq!(classify_failure(&denied), AnalysisError::InvalidCredential);
    }

    #[test]
    fn message_substrings_are_the_fallback() {
        let cases = [
            ("Error code: rate_limit_exceeded", AnalysisError::RateLimited),
            ("insufficient_quota for org", AnalysisError::QuotaExceeded),
            ("INVALID_API_KEY supplied", AnalysisError::InvalidCredential),
        ];
        for (message, expected) in cases {
            let err = ProviderError::new(ProviderErrorKind::Other, message);
            assert_eq!(classify_failure(&err), expected, "{message}");
        }
    }

    #[test]
    fn unrecognised_failure_keeps_its_message() {
        let err = ProviderError::new(ProviderErrorKind::Connection, "connection refused");
        let classified = classify_failure(&err);
        assert_eq!(classified, AnalysisError::Unknown("connection refused".to_string()));
        assert!(classified.user_message().contains("connection refused"));
    }

    #[test]
    fn offline_settings_use_the_simulated_provider() {
        let invoker = AnalysisInvoker::from_settings(&ModelConfig::default(), None, true).unwrap();
        assert_eq!(invoker.provider_name(), Some("simulated"));
        let missing = AnalysisInvoker::from_settings(&ModelConfig::default(), None, false).unwrap();
        assert!(!missing.is_configured());
    }
}
