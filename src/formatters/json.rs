use serde::Serialize;
use std::fs;
use std::path::Path;

use super::FormatError;
use crate::core::DependencyOutput;
use crate::parsers::Symbol;

/// JSON output for dependency trees, lists and symbol listings
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    pub fn format(&self, output: &DependencyOutput) -> Result<String, FormatError> {
        self.render(output)
    }

    pub fn format_symbols(&self, symbols: &[Symbol]) -> Result<String, FormatError> {
        self.render(&symbols)
    }

    pub fn format_to_file(&self, output: &DependencyOutput, output_path: &Path) -> Result<(), FormatError> {
        let json_content = self.format(output)?;
        fs::write(output_path, json_content)?;
        Ok(())
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, FormatError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(text)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}
