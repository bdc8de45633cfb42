use crate::formats::FormatParser;
use crate::types::RuleFile;
use crate::{LoadError, RuleSet};

/// A parser implementation for RON (Rusty Object Notation) rule files.
#[derive(Debug, Default, Clone, Copy)]
pub struct RonFormatParser;

impl RonFormatParser {
    /// Creates a new RON format parser
    pub const fn new() -> Self {
        Self
    }
}

impl FormatParser for RonFormatParser {
    fn format_name(&self) -> &'static str {
        "Rusty Object Notation (RON)"
    }

    fn parse(&self, ron_content: &str) -> Result<RuleSet, LoadError> {
        let rule_file: RuleFile = ron::from_str(ron_content)
            .map_err(|e| LoadError::ParseError(format!("RON deserialization failed: {e}")))?;
        rule_file.into_rule_set()
    }
}

/// Parses rules defined in a RON string.
///
/// # Errors
///
/// See [`FormatParser::parse`].
pub fn parse_ron_rules(ron_content: &str) -> Result<RuleSet, LoadError> {
    RonFormatParser::new().parse(ron_content)
}
