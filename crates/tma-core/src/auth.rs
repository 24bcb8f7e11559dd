//! Login gate for the terminal session.
//!
//! This is a placeholder check against a table of SHA-256 password digests.
//! It has no lockout, no rate limiting and no constant-time comparison, so it
//! must not be treated as a security boundary.

use std::collections::BTreeMap;

use sha2::Digest;
use sha2::Sha256;

pub trait CredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> bool;
}

const DEMO_USERS: [(&str, &str); 2] = [("admin", "transform2024"), ("manager", "change2024")];

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

#[derive(Debug, Clone)]
pub struct StaticCredentials {
    digests: BTreeMap<String, String>,
}

impl StaticCredentials {
    /// The compiled-in demo accounts.
    pub fn demo() -> Self {
        Self {
            digests: DEMO_USERS
                .iter()
                .map(|(user, password)| (user.to_string(), hash_password(password)))
                .collect(),
        }
    }

    /// Builds a table from `username -> sha256 hex` entries. Falls back to the
    /// demo accounts when no entries are given.
    pub fn from_digests<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let digests: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(user, digest)| (user.into(), digest.as_ref().trim().to_ascii_lowercase()))
            .collect();
        if digests.is_empty() {
            return Self::demo();
        }
        Self { digests }
    }

    pub fn usernames(&self) -> impl Iterator<Item = &str> {
        self.digests.keys().map(String::as_str)
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.digests
            .get(username)
            .is_some_and(|digest| *digest == hash_password(password))
    }
}

/// Checks a pair against the demo table.
pub fn authenticate(username: &str, password: &str) -> bool {
    StaticCredentials::demo().verify(username, password)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn demo_credentials_accept_known_pairs() {
        assert!(authenticate("admin", "transform2024"));
        assert!(authenticate("manager", "change2024"));
    }

    #[test]
    fn wrong_password_and_unknown_user_are_rejected() {
        assert!(!authenticate("admin", "wrong"));
        assert!(!authenticate("nouser", "anything"));
        assert!(!authenticate("", ""));
        assert!(!authenticate("admin", "change2024"));
    }

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn configured_digests_replace_demo_accounts() {
        let creds = StaticCredentials::from_digests([(
            "lead",
            hash_password("s3cret").to_ascii_uppercase(),
        )]);
        assert!(creds.verify("lead", "s3cret"));
        assert!(!creds.verify("admin", "transform2024"));
        assert_eq!(creds.usernames().collect::<Vec<_>>(), vec!["lead"]);
    }

    #[test]
    fn empty_digest_table_falls_back_to_demo() {
        let creds = StaticCredentials::from_digests(Vec::<(String, String)>::new());
        assert!(creds.verify("admin", "transform2024"));
    }
}
