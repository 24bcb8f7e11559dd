use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::auth::StaticCredentials;
use crate::error::ConfigError;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub auth: AuthConfig,
    pub history: HistoryConfig,
}

impl Config {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid {
                field: "model.temperature",
                reason: format!("{} is outside 0.0..=2.0", self.model.temperature),
            });
        }
        if self.model.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "model.max_tokens",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.history.recent_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "history.recent_limit",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "model.model",
                reason: "must not be empty".to_string(),
            });
        }
        for (user, digest) in &self.auth.users {
            let digest = digest.trim();
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::Invalid {
                    field: "auth.users",
                    reason: format!("entry for {user:?} is not a sha256 hex digest"),
                });
            }
        }
        Ok(())
    }

    pub fn credentials(&self) -> StaticCredentials {
        StaticCredentials::from_digests(self.auth.users.iter())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            base_url: "https://api.openai.com/v1".to_string(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// username -> sha256 hex of the password. Empty means the demo accounts.
    pub users: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub recent_limit: usize,
    pub preview_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            preview_chars: 200,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct SecretsFile {
    #[serde(rename = "OPENAI_API_KEY")]
    openai_api_key: Option<String>,
}

/// Picks the API key from the environment first, then from a `secrets.toml`
/// body. Blank values count as missing.
pub fn resolve_api_key(env_value: Option<String>, secrets_toml: Option<&str>) -> Option<String> {
    let non_blank = |value: String| {
        let trimmed = value.trim().to_string();
        (!trimmed.is_empty()).then_some(trimmed)
    };
    if let Some(key) = env_value.and_then(non_blank) {
        return Some(key);
    }
    let secrets = match secrets_toml.map(toml::from_str::<SecretsFile>) {
        Some(Ok(parsed)) => parsed,
        Some(Err(err)) => {
            tracing::warn!(error = %err, "ignoring unreadable secrets file");
            return None;
        }
        None => return None,
    };
    secrets.openai_api_key.and_then(non_blank)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::auth::hash_password;
    use crate::auth::CredentialVerifier;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.model.model, "gpt-4");
        assert_eq!(config.model.max_tokens, 1000);
        assert!((config.model.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.history.recent_limit, 5);
        assert_eq!(config.history.preview_chars, 200);
        assert!(config.auth.users.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [model]
            model = "gpt-4o-mini"

            [history]
            recent_limit = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.base_url, "https://api.openai.com/v1");
        assert_eq!(config.history.recent_limit, 10);
        assert_eq!(config.history.preview_chars, 200);
    }

    #[test]
    fn configured_users_drive_credentials() {
        let raw = format!("[auth.users]\nlead = \"{}\"\n", hash_password("pw"));
        let config = Config::from_toml_str(&raw).unwrap();
        let creds = config.credentials();
        assert!(creds.verify("lead", "pw"));
        assert!(!creds.verify("admin", "transform2024"));
    }

    #[test]
    fn rejects_malformed_digest_and_bad_temperature() {
        let err = Config::from_toml_str("[auth.users]\nlead = \"plaintext\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "auth.users", .. }));

        let err = Config::from_toml_str("[model]\ntemperature = 3.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "model.temperature", .. }));

        let err = Config::from_toml_str("[model\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_zero_recent_limit() {
        let err = Config::from_toml_str("[history]\nrecent_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "history.recent_limit", .. }));
        assert!(Config::from_toml_str("[history]\nrecent_limit = 1\n").is_ok());
    }

    #[test]
    fn env_key_wins_over_secrets_file() {
        let secrets = "OPENAI_API_KEY = \"sk-file\"";
        assert_eq!(
            resolve_api_key(Some("sk-env".to_string()), Some(secrets)),
            Some("sk-env".to_string())
        );
        assert_eq!(
            resolve_api_key(Some("   ".to_string()), Some(secrets)),
            Some("sk-file".to_string())
        );
    }

    #[test]
    fn missing_or_blank_key_is_not_configured() {
        assert_eq!(resolve_api_key(None, None), None);
        assert_eq!(resolve_api_key(None, Some("OPENAI_API_KEY = \"\"")), None);
        assert_eq!(resolve_api_key(None, Some("OTHER = 1")), None);
        assert_eq!(resolve_api_key(None, Some("not toml at all [")), None);
    }
}
