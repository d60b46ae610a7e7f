//! LLM backend implementations for Palaver.
//!
//! All backends implement the `palaver_core::Backend` trait. The resolver
//! selects and parameterizes one backend from runtime settings.

pub mod anthropic;
pub mod openai_compat;
pub mod resolver;
mod wire;

pub use anthropic::AnthropicBackend;
pub use openai_compat::OpenAiCompatBackend;
pub use resolver::resolve;
