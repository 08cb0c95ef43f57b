//! Concrete model backends for scout

pub mod openai;
pub mod types;

pub use openai::OpenAIBackend;
pub use types::*;
