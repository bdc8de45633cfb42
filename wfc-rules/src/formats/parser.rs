use crate::{LoadError, RuleSet};

/// Trait defining the interface for format-specific rule parsers.
///
/// Implementors deserialize a [`RuleFile`](crate::RuleFile) from their
/// format; validation and conversion to core types are shared.
pub trait FormatParser {
    /// Parses rule content into a validated [`RuleSet`].
    ///
    /// # Errors
    ///
    /// * `LoadError::ParseError` if the content is not valid for this format.
    /// * `LoadError::InvalidData` or `LoadError::TileSet` if the rules are
    ///   well-formed but inconsistent.
    fn parse(&self, content: &str) -> Result<RuleSet, LoadError>;

    /// Returns a descriptive name for this parser format.
    ///
    /// Used in logs and user-facing error messages.
    fn format_name(&self) -> &'static str;
}
