use crate::formats::FormatParser;
use crate::types::RuleFile;
use crate::{LoadError, RuleSet};

/// A parser implementation for JSON rule files.
///
/// Edge forms are externally tagged, e.g. `{"Uniform": 0}` or
/// `{"Axis": {"horizontal": 1, "vertical": 0}}`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatParser;

impl JsonFormatParser {
    pub const fn new() -> Self {
        Self
    }
}

impl FormatParser for JsonFormatParser {
    fn format_name(&self) -> &'static str {
        "JSON"
    }

    fn parse(&self, json_content: &str) -> Result<RuleSet, LoadError> {
        let rule_file: RuleFile = serde_json::from_str(json_content)
            .map_err(|e| LoadError::ParseError(format!("JSON deserialization failed: {e}")))?;
        rule_file.into_rule_set()
    }
}
