//! Built-in tool catalog and dispatcher for Palaver.
//!
//! Tools are named side-effect operations executed by name with a parameter
//! bag, independent of any backend. The shipped implementations are
//! deterministic placeholders; real integrations plug in behind the same
//! `Tool` trait.

pub mod builtin;
pub mod dispatcher;

pub use dispatcher::{Tool, ToolDispatcher};
