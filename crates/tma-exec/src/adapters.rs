use crate::contracts::CompletionRequest;
use crate::http::ProviderError;

/// A backend able to answer one chat completion request.
pub trait AnalysisProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Offline stand-in used for demos. Answers every request with canned text
/// derived from the request, without any network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedProvider;

impl AnalysisProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let role = request
            .instruction()
            .and_then(|text| text.split('.').next())
            .unwrap_or("Analysis")
            .trim();
        let input = request.user_text().unwrap_or_default();
        let words = input.split_whitespace().count();
        let first_line = input.lines().find(|l| !l.trim().is_empty()).unwrap_or("");

        Ok(format!(
            "[offline] {role}.\n\n\
Summary of the {words}-word input starting with \"{first}\":\n\
1. Confirm sponsors and owners for each open item.\n\
2. Check in with affected teams within the week.\n\
3. Re-run this analysis with live model access for specific guidance.",
            first = crate::http::message_short(first_line, 60),
        ))
    }
}

#[cfg(test)]
mod tests {
    use tma_core::config::ModelConfig;

    use super::*;

    #[test]
    fn simulated_provider_is_deterministic() {
        let request = CompletionRequest::new(
            &ModelConfig::default(),
            "You are a coach. Be specific.",
            "Team morale dropped\nafter reorg",
        );
        let first = SimulatedProvider.complete(&request).unwrap();
        let second = SimulatedProvider.complete(&request).unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with("[offline] You are a coach."));
        assert!(first.contains("5-word input"));
        assert!(first.contains("\"Team morale dropped\""));
    }
}
