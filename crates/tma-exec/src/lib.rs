pub mod adapters;
pub mod contracts;
pub mod http;
pub mod invoker;
pub mod openai;

pub use adapters::*;
pub use contracts::*;
pub use http::ProviderError;
pub use http::ProviderErrorKind;
pub use invoker::*;
pub use openai::OpenAiProvider;
