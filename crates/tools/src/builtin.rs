//! The built-in tool catalog.
//!
//! Deterministic placeholders: each tool is a pure computation over its
//! declared parameters describing the side effect a production integration
//! would perform.

use async_trait::async_trait;
use chrono::Local;
use palaver_core::{ToolDescriptor, ToolParameter};

use crate::dispatcher::{Tool, ToolParams};

/// Build the full catalog.
pub fn catalog() -> Vec<Box<dyn Tool>> {
    vec![
        Box::new(WebSearchTool),
        Box::new(WeatherTool),
        Box::new(TimeTool),
        Box::new(ReminderTool),
    ]
}

fn str_param<'a>(parameters: &'a ToolParams, name: &str) -> &'a str {
    parameters.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

struct WebSearchTool;

#[async_trait]
impl Tool for WebSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "web_search".into(),
            description: "Search the web for information".into(),
            parameters: vec![ToolParameter::string("query", "Search query", true)],
        }
    }

    async fn run(&self, parameters: &ToolParams) -> Result<serde_json::Value, String> {
        let query = str_param(parameters, "query");
        Ok(format!("Search results for: {query}").into())
    }
}

struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "weather".into(),
            description: "Get weather information for a location".into(),
            parameters: vec![
                ToolParameter::string("location", "Location to check weather for", true),
                ToolParameter::string("units", "Temperature units (metric/imperial)", false),
            ],
        }
    }

    async fn run(&self, parameters: &ToolParams) -> Result<serde_json::Value, String> {
        let location = str_param(parameters, "location");
        Ok(format!("Weather information for: {location}").into())
    }
}

struct TimeTool;

#[async_trait]
impl Tool for TimeTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "time".into(),
            description: "Get current time information".into(),
            parameters: vec![ToolParameter::string("timezone", "Timezone to check", false)],
        }
    }

    async fn run(&self, _parameters: &ToolParams) -> Result<serde_json::Value, String> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        Ok(format!("Current time: {now}").into())
    }
}

struct ReminderTool;

#[async_trait]
impl Tool for ReminderTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "reminder".into(),
            description: "Set a reminder".into(),
            parameters: vec![
                ToolParameter::string("message", "Reminder message", true),
                ToolParameter::string("time", "When to remind", true),
            ],
        }
    }

    async fn run(&self, parameters: &ToolParams) -> Result<serde_json::Value, String> {
        let message = str_param(parameters, "message");
        let time = str_param(parameters, "time");
        Ok(format!("Reminder set: {message} at {time}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::ToolDispatcher;
    use chrono::NaiveDateTime;

    fn params(pairs: &[(&str, &str)]) -> ToolParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[tokio::test]
    async fn time_tool_formats_a_timestamp() {
        let dispatcher = ToolDispatcher::new();
        let result = dispatcher.execute("time", ToolParams::new()).await;
        assert!(result.success);

        let output = result.output.as_str().unwrap();
        let stamp = output.strip_prefix("Current time: ").unwrap();
        // Must match the YYYY-MM-DD HH:MM:SS shape exactly.
        assert!(NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[tokio::test]
    async fn web_search_echoes_the_query() {
        let dispatcher = ToolDispatcher::new();
        let result = dispatcher
            .execute("web_search", params(&[("query", "rustls")]))
            .await;
        assert!(result.success);
        assert_eq!(result.output, "Search results for: rustls");
    }

    #[tokio::test]
    async fn weather_reports_the_location() {
        let dispatcher = ToolDispatcher::new();
        let result = dispatcher
            .execute("weather", params(&[("location", "Lisbon")]))
            .await;
        assert!(result.success);
        assert_eq!(result.output, "Weather information for: Lisbon");
    }

    #[tokio::test]
    async fn reminder_confirms_message_and_time() {
        let dispatcher = ToolDispatcher::new();
        let result = dispatcher
            .execute(
                "reminder",
                params(&[("message", "standup"), ("time", "09:00")]),
            )
            .await;
        assert!(result.success);
        assert_eq!(result.output, "Reminder set: standup at 09:00");
    }

    #[test]
    fn descriptors_declare_required_parameters() {
        let search = WebSearchTool.descriptor();
        assert!(search.parameters[0].required);

        let weather = WeatherTool.descriptor();
        assert!(weather.parameters.iter().any(|p| !p.required));
    }
}
