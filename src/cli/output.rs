//! CLI Output Formatting.
//!
//! Handles output for text and JSON formats.

use console::style;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMAT
// ═══════════════════════════════════════════════════════════════════════════════

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// Pretty JSON format
    JsonPretty,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "jsonpretty" => Ok(OutputFormat::JsonPretty),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::JsonPretty => "json-pretty",
        };
        write!(f, "{}", s)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT FORMATTER
// ═══════════════════════════════════════════════════════════════════════════════

/// Output formatter for CLI
#[derive(Debug, Clone, Default)]
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create new formatter
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Get format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json | OutputFormat::JsonPretty)
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.is_json() {
            self.print_json(&serde_json::json!({ "status": "success", "message": message }));
        } else {
            println!("{} {}", style("✓").green(), message);
        }
    }

    /// Print section header
    pub fn section(&self, title: &str) {
        if !self.is_json() {
            println!("{}", style(format!("=== {} ===", title)).cyan().bold());
        }
    }

    /// Print a key-value pair (text mode only; JSON callers use [`Self::data`])
    pub fn kv(&self, key: &str, value: impl std::fmt::Display) {
        if !self.is_json() {
            println!("  {}: {}", style(key).bold(), value);
        }
    }

    /// Print serializable data
    pub fn data<T: Serialize>(&self, data: &T) {
        if self.is_json() {
            self.print_json(data);
        } else if let Ok(text) = serde_json::to_string_pretty(data) {
            println!("{}", text);
        }
    }

    /// Render an error line for stderr
    pub fn render_error(&self, message: &str) -> String {
        if self.is_json() {
            serde_json::json!({ "status": "error", "message": message }).to_string()
        } else {
            format!("{} {}", style("Error:").red().bold(), message)
        }
    }

    fn print_json<T: Serialize>(&self, data: &T) {
        let output = if self.format == OutputFormat::JsonPretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        };

        if let Ok(json) = output {
            println!("{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("json-pretty".parse::<OutputFormat>().unwrap(), OutputFormat::JsonPretty);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_format_display_roundtrip() {
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::JsonPretty] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_json_error_rendering() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let rendered = formatter.render_error("admin only");
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "admin only");
    }
}
