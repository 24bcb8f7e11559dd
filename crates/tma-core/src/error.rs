use thiserror::Error;

/// Everything that can stop an analysis from producing model output.
///
/// Every variant is recoverable. The `Display` text is the message shown to
/// the user, and for service failures it becomes the record's output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Please configure your OpenAI API key (OPENAI_API_KEY) before running an analysis.")]
    ConfigurationMissing,
    #[error("Please provide input for analysis.")]
    EmptyInput,
    #[error("Rate limit exceeded. Please wait a moment and try again.")]
    RateLimited,
    #[error("Insufficient API credits. Please check your OpenAI account balance.")]
    QuotaExceeded,
    #[error("Invalid API key. Please check your OpenAI API key configuration.")]
    InvalidCredential,
    #[error("Error: {0}\n\nPlease check your API key and ensure you have sufficient credits.")]
    Unknown(String),
}

impl AnalysisError {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration-missing",
            Self::EmptyInput => "empty-input",
            Self::RateLimited => "rate-limited",
            Self::QuotaExceeded => "quota-exceeded",
            Self::InvalidCredential => "invalid-credential",
            Self::Unknown(_) => "unknown-service-error",
        }
    }

    /// Failures raised before the service is contacted. These never become
    /// part of the session history.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::ConfigurationMissing | Self::EmptyInput)
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
