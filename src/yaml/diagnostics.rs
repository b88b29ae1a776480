//! YAML error diagnostics pointing into the offending source

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Error in a YAML document, with the span it refers to
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(masterdesk::yaml::syntax))]
pub struct YamlSyntaxError {
    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    span: SourceSpan,

    #[help]
    help: Option<String>,

    message: String,
}

impl YamlSyntaxError {
    /// Wrap a serde_yml parse error
    pub fn from_serde_error(err: &serde_yml::Error, source: &str, filename: &str) -> Self {
        let offset = err
            .location()
            .map(|loc| line_col_to_offset(source, loc.line(), loc.column()))
            .unwrap_or(0);
        let message = err.to_string();
        let help = generate_help(&message);
        Self::new(message, source, filename, offset, help)
    }

    /// Error anchored at the first occurrence of `needle` (start of file if absent)
    pub fn at_text(
        message: impl Into<String>,
        source: &str,
        filename: &str,
        needle: &str,
        help: Option<String>,
    ) -> Self {
        let offset = source.find(needle).unwrap_or(0);
        Self::new(message.into(), source, filename, offset, help)
    }

    fn new(message: String, source: &str, filename: &str, offset: usize, help: Option<String>) -> Self {
        let len = if offset < source.len() { 1 } else { 0 };
        Self {
            src: NamedSource::new(filename, source.to_string()),
            span: SourceSpan::from(offset..offset + len),
            help,
            message,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Byte offset of a 1-based line/column, clamped to the end of the source
fn line_col_to_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum::<usize>();
    let rest = &source[line_start.min(source.len())..];
    let within = rest
        .char_indices()
        .take_while(|(_, c)| *c != '\n')
        .nth(column.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or_else(|| rest.find('\n').unwrap_or(rest.len()));
    (line_start + within).min(source.len())
}

/// Suggestion for common YAML mistakes
fn generate_help(message: &str) -> Option<String> {
    let msg = message.to_lowercase();

    if msg.contains("tab") {
        return Some("YAML indentation uses spaces, not tabs".to_string());
    }
    if msg.contains("duplicate") {
        return Some("Each key may appear only once per mapping".to_string());
    }
    if msg.contains("mapping values are not allowed") {
        return Some("Add a space after ':' or quote values that contain colons".to_string());
    }
    if msg.contains("missing field") {
        return Some("Every resource needs at least key, path, route, label and code_field".to_string());
    }
    if msg.contains("unknown variant") {
        return Some("Field kinds are text, integer, decimal, boolean and reference".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_to_offset() {
        let source = "alpha\nbeta\ngamma";
        assert_eq!(line_col_to_offset(source, 1, 1), 0);
        assert_eq!(line_col_to_offset(source, 2, 1), 6);
        assert_eq!(line_col_to_offset(source, 3, 3), 13);
        assert_eq!(line_col_to_offset(source, 9, 1), source.len());
    }

    #[test]
    fn test_help_generation() {
        assert!(generate_help("found a tab character").is_some());
        assert!(generate_help("resources[0]: missing field `key`").is_some());
        assert!(generate_help("something else").is_none());
    }

    #[test]
    fn test_serde_error_is_wrapped() {
        let source = "resources:\n  - key: [unclosed\n";
        let err = serde_yml::from_str::<serde_yml::Value>(source).unwrap_err();
        let diag = YamlSyntaxError::from_serde_error(&err, source, "resources.yaml");
        assert!(!diag.message().is_empty());
    }
}
