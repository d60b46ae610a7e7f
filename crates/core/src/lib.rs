//! Core domain types and traits for the Palaver gateway.
//!
//! Everything that crosses a crate boundary lives here: the conversation
//! model, the `Backend` trait the provider clients implement, the
//! `ContextStore` trait the persistence layer implements, tool data types,
//! and the error taxonomy.

pub mod backend;
pub mod context;
pub mod error;
pub mod store;
pub mod tool;

pub use backend::{
    Backend, BackendConfig, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, NormalizedResponse, Provider,
};
pub use context::{
    ChatMessage, ConversationContext, ConversationTurn, HISTORY_WINDOW, Role, unix_now,
};
pub use error::{BackendError, ConfigError, Error, Result, StoreError};
pub use store::ContextStore;
pub use tool::{ToolDescriptor, ToolExecutionResult, ToolParameter};
