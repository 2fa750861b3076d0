//! The diagnostic model shared by the tokenizer and the parser.

use serde::Serialize;

/// Severity attached to a diagnostic.
///
/// A diagnostic without a severity uses the implementation-default (hard)
/// severity; that absence is distinct from an explicit [`Severity::Warning`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found while validating a filter expression.
///
/// `from`/`to` are byte offsets into the source text. When this error is the
/// primary result of a parse, `warnings` carries the other diagnostics
/// recorded during the same parse, in recording order. Exactly one
/// `ParseError` is produced per failed analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub from: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ParseError>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, from: usize, to: Option<usize>) -> Self {
        ParseError {
            message: message.into(),
            from,
            to,
            severity: None,
            warnings: Vec::new(),
        }
    }

    /// Error raised by the tokenizer. Lexical errors are always fatal and
    /// never carry secondary diagnostics.
    pub(crate) fn lexical(message: impl Into<String>, from: usize, to: Option<usize>) -> Self {
        ParseError::new(message, from, to)
    }

    pub(crate) fn with_severity(mut self, severity: Option<Severity>) -> Self {
        self.severity = severity;
        self
    }

    /// True when this diagnostic and everything attached to it is advisory,
    /// i.e. explicitly tagged with warning severity.
    pub fn is_advisory(&self) -> bool {
        self.severity == Some(Severity::Warning)
            && self
                .warnings
                .iter()
                .all(|warning| warning.severity == Some(Severity::Warning))
    }

    /// Serialize to JSON for tooling output. All fields are present, with
    /// `null` standing in for the absent ones.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::json!({
            "message":  self.message,
            "from":     self.from,
            "to":       self.to,
            "severity": self.severity,
            "warnings": self.warnings.iter().map(ParseError::to_json_value).collect::<Vec<_>>(),
        })
    }
}
