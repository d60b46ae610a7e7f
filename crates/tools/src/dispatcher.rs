//! Tool dispatcher — executes catalog tools by name.
//!
//! The catalog is fixed at construction; there is no dynamic registration.
//! Unknown names and tool failures come back as structured results with
//! `success = false`, never as errors.

use async_trait::async_trait;
use palaver_core::{ToolDescriptor, ToolExecutionResult};
use std::collections::HashMap;
use tracing::debug;

use crate::builtin;

pub type ToolParams = serde_json::Map<String, serde_json::Value>;

/// One executable tool behind a static descriptor.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    /// Run the tool over its declared parameters. `Err` carries a message
    /// that the dispatcher folds into a failed result.
    async fn run(&self, parameters: &ToolParams) -> Result<serde_json::Value, String>;
}

pub struct ToolDispatcher {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolDispatcher {
    /// Build the dispatcher with the built-in catalog:
    /// web_search, weather, time, reminder.
    pub fn new() -> Self {
        let mut tools: HashMap<String, Box<dyn Tool>> = HashMap::new();
        for tool in builtin::catalog() {
            tools.insert(tool.descriptor().name.clone(), tool);
        }
        Self { tools }
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, parameters: ToolParams) -> ToolExecutionResult {
        debug!(tool = name, "executing tool");
        let Some(tool) = self.tools.get(name) else {
            return ToolExecutionResult::failed(
                name,
                parameters,
                format!("Tool '{name}' not found"),
            );
        };

        match tool.run(&parameters).await {
            Ok(output) => ToolExecutionResult::ok(name, parameters, output),
            Err(error) => ToolExecutionResult::failed(name, parameters, error),
        }
    }

    /// The static catalog, unmodified.
    pub fn list_available(&self) -> Vec<ToolDescriptor> {
        let mut descriptors: Vec<ToolDescriptor> =
            self.tools.values().map(|t| t.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
