//! Input error types with source diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors reading characteristic or measurement files
#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    #[diagnostic(code(spc::input::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] InputSyntaxError),

    #[error("Unsupported input file '{0}'")]
    #[diagnostic(
        code(spc::input::format),
        help("Use a .csv measurement file or a .yaml/.yml characteristic file")
    )]
    UnsupportedFormat(String),
}

/// A parse failure pointing into the offending file
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(spc::input::syntax))]
pub struct InputSyntaxError {
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,

    #[help]
    pub help: Option<String>,
}

impl InputSyntaxError {
    /// Build from a YAML deserialization error
    pub fn from_yaml_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        let span = err
            .location()
            .map(|loc| span_at(content, loc.index()));
        Self {
            message: format!("Invalid YAML in {}: {}", filename, err),
            src: NamedSource::new(filename, content.to_string()),
            span,
            help: Some("Check field names and value types against the characteristic format".to_string()),
        }
    }

    /// Build from a CSV read/deserialization error
    pub fn from_csv_error(err: &csv::Error, content: &str, filename: &str) -> Self {
        let span = err
            .position()
            .map(|pos| span_at(content, pos.byte() as usize));
        Self {
            message: format!("Invalid CSV in {}: {}", filename, err),
            src: NamedSource::new(filename, content.to_string()),
            span,
            help: Some(
                "Expected header `value,timestamp,subgroup,id` with RFC 3339 timestamps".to_string(),
            ),
        }
    }

    /// A semantic problem at a known line (1-based)
    pub fn at_line(message: String, content: &str, filename: &str, line: usize) -> Self {
        let offset: usize = content
            .lines()
            .take(line.saturating_sub(1))
            .map(|l| l.len() + 1)
            .sum();
        Self {
            message,
            src: NamedSource::new(filename, content.to_string()),
            span: Some(span_at(content, offset)),
            help: None,
        }
    }
}

/// Span covering the rest of the line starting at `offset`
fn span_at(content: &str, offset: usize) -> SourceSpan {
    let offset = offset.min(content.len());
    let offset = if content.is_char_boundary(offset) { offset } else { 0 };
    let len = content[offset..]
        .find('\n')
        .unwrap_or(content.len() - offset)
        .max(1)
        .min(content.len() - offset);
    (offset, len).into()
}
