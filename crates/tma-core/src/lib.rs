pub mod actions;
pub mod analytics;
pub mod auth;
pub mod config;
pub mod error;
pub mod prompts;
pub mod reducer;
pub mod state;

pub use actions::*;
pub use error::*;
pub use reducer::*;
pub use state::*;

pub use auth::CredentialVerifier;
pub use auth::StaticCredentials;
pub use config::Config;
