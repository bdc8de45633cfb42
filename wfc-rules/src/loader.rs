use crate::formats::{FormatParser, JsonFormatParser, RonFormatParser};
use crate::{LoadError, RuleSet};
use log::{debug, info};
use std::fs;
use std::path::Path;

/// Picks a parser from the file extension (case-insensitive).
///
/// # Errors
///
/// Returns `LoadError::UnsupportedFormat` for unknown or missing extensions.
pub fn parser_for_path(path: &Path) -> Result<Box<dyn FormatParser>, LoadError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("ron") => Ok(Box::new(RonFormatParser::new())),
        Some("json") => Ok(Box::new(JsonFormatParser::new())),
        Some(other) => Err(LoadError::UnsupportedFormat(format!(".{other}"))),
        None => Err(LoadError::UnsupportedFormat(format!(
            "no extension on {}",
            path.display()
        ))),
    }
}

/// Loads a rule set from a specified file.
///
/// # Arguments
///
/// * `path` - The path to the rule definition file (`.ron` or `.json`).
///
/// # Returns
///
/// The validated [`RuleSet`] on success, or a `LoadError` on failure.
///
/// # Errors
///
/// Any I/O, format, parse or validation error.
pub fn load_from_file(path: &Path) -> Result<RuleSet, LoadError> {
    let parser = parser_for_path(path)?;
    debug!("Reading {} rules from {}", parser.format_name(), path.display());
    let content = fs::read_to_string(path)?;
    let rules = parser.parse(&content)?;
    info!(
        "Loaded {} tiles from {}",
        rules.tile_count(),
        path.display()
    );
    Ok(rules)
}
