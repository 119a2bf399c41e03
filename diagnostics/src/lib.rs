//! Diagnostics library for name-resolution reporting
//!
//! This library provides Rust-style diagnostics with:
//! - Multiple severity levels (Error, Warning, Info, Hint)
//! - Primary and secondary labels
//! - Suppressed diagnostics that are recorded but not shown by default
//! - A `DiagnosticSink` seam so producers do not depend on the collection type
//! - Plain or colored terminal output

use serde::Serialize;
use std::fmt;

// Re-export source mapping types from the source_map crate
pub use source_map::{FileId, SourceFile, SourceMap, SourcePosition, SourceSpan};

/// Severity level for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Info => write!(f, "info"),
            DiagnosticSeverity::Hint => write!(f, "hint"),
        }
    }
}

/// Style for diagnostic labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LabelStyle {
    Primary,
    Secondary,
}

/// A label that points to a span of code
#[derive(Debug, Clone, Serialize)]
pub struct Label {
    pub span: SourceSpan,
    pub message: String,
    pub style: LabelStyle,
}

impl Label {
    pub fn primary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Primary,
        }
    }

    pub fn secondary(span: SourceSpan, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            style: LabelStyle::Secondary,
        }
    }
}

/// A suggested replacement for the primary span
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub message: String,
    pub span: SourceSpan,
    pub replacement: String,
}

/// A diagnostic message with severity, labels, and suggestions
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub code: Option<String>,
    pub message: String,
    pub span: SourceSpan,
    pub labels: Vec<Label>,
    pub suggestions: Vec<Suggestion>,
    pub notes: Vec<String>,
    pub help: Vec<String>,
    /// Follow-on diagnostics caused by an earlier one
    pub suppressed: bool,
}

/// Anything that accepts diagnostics while a unit is being analysed
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collection of diagnostics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.reportable()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Diagnostics that are not suppressed follow-ons
    pub fn reportable(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.suppressed)
    }

    pub fn suppressed(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.suppressed)
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.code.as_deref() == Some(code))
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Builder for creating diagnostics
pub struct DiagnosticBuilder {
    diagnostic: Diagnostic,
}

impl DiagnosticBuilder {
    fn with_severity(severity: DiagnosticSeverity, message: String, span: SourceSpan) -> Self {
        Self {
            diagnostic: Diagnostic {
                severity,
                code: None,
                message,
                span,
                labels: vec![],
                suggestions: vec![],
                notes: vec![],
                help: vec![],
                suppressed: false,
            },
        }
    }

    pub fn error(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::with_severity(DiagnosticSeverity::Error, message.into(), span)
    }

    pub fn warning(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::with_severity(DiagnosticSeverity::Warning, message.into(), span)
    }

    pub fn hint(message: impl Into<String>, span: SourceSpan) -> Self {
        Self::with_severity(DiagnosticSeverity::Hint, message.into(), span)
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.diagnostic.code = Some(code.into());
        self
    }

    pub fn label(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.diagnostic.labels.push(Label::primary(span, message));
        self
    }

    pub fn secondary_label(mut self, span: SourceSpan, message: impl Into<String>) -> Self {
        self.diagnostic.labels.push(Label::secondary(span, message));
        self
    }

    pub fn suggestion(
        mut self,
        message: impl Into<String>,
        span: SourceSpan,
        replacement: impl Into<String>,
    ) -> Self {
        self.diagnostic.suggestions.push(Suggestion {
            message: message.into(),
            span,
            replacement: replacement.into(),
        });
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.diagnostic.notes.push(note.into());
        self
    }

    pub fn help(mut self, help_msg: impl Into<String>) -> Self {
        self.diagnostic.help.push(help_msg.into());
        self
    }

    pub fn suppressed(mut self) -> Self {
        self.diagnostic.suppressed = true;
        self
    }

    pub fn build(self) -> Diagnostic {
        self.diagnostic
    }
}

/// Formatter for displaying diagnostics
#[derive(Default)]
pub struct ErrorFormatter {
    use_colors: bool,
    show_suppressed: bool,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_colors() -> Self {
        Self {
            use_colors: true,
            ..Self::default()
        }
    }

    pub fn show_suppressed(mut self, show: bool) -> Self {
        self.show_suppressed = show;
        self
    }

    pub fn format_diagnostics(&self, diagnostics: &Diagnostics, source_map: &SourceMap) -> String {
        diagnostics
            .iter()
            .filter(|d| self.show_suppressed || !d.suppressed)
            .map(|d| self.format_diagnostic(d, source_map))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_diagnostic(&self, diagnostic: &Diagnostic, source_map: &SourceMap) -> String {
        let mut output = String::new();

        let color = match diagnostic.severity {
            DiagnosticSeverity::Error => "\x1b[31m",
            DiagnosticSeverity::Warning => "\x1b[33m",
            DiagnosticSeverity::Info => "\x1b[36m",
            DiagnosticSeverity::Hint => "\x1b[32m",
        };
        let mut header = diagnostic.severity.to_string();
        if let Some(code) = &diagnostic.code {
            header.push_str(&format!("[{}]", code));
        }
        output.push_str(&self.paint(color, &header));
        output.push_str(": ");
        output.push_str(&self.paint("\x1b[1;97m", &diagnostic.message));
        output.push('\n');

        let span = &diagnostic.span;
        let file = source_map.get_file(span.file_id);
        let location = match file {
            Some(file) if span.start.is_mapped() => {
                format!("{}:{}:{}", file.name, span.start.line, span.start.column)
            }
            Some(file) => format!("{}@{}", file.name, span.start.byte_offset),
            None => format!("{}@{}", span.file_id, span.start.byte_offset),
        };
        output.push_str(&format!("  {} {}\n", self.paint("\x1b[96m", "-->"), location));

        if let Some(line) = file.and_then(|f| f.get_line(span.start.line)) {
            let gutter = span.start.line.to_string();
            let pad = " ".repeat(gutter.len());
            let underline_len = if span.start.line == span.end.line {
                span.end.column.saturating_sub(span.start.column).max(1)
            } else {
                line.len().saturating_sub(span.start.column - 1).max(1)
            };

            output.push_str(&format!("{} |\n", pad));
            output.push_str(&format!("{} | {}\n", gutter, line));
            output.push_str(&format!(
                "{} | {}{}",
                pad,
                " ".repeat(span.start.column - 1),
                self.paint(color, &"^".repeat(underline_len))
            ));
            if let Some(label) = diagnostic
                .labels
                .iter()
                .find(|l| l.style == LabelStyle::Primary)
            {
                output.push(' ');
                output.push_str(&self.paint(color, &label.message));
            }
            output.push('\n');
        }

        for label in diagnostic
            .labels
            .iter()
            .filter(|l| l.style == LabelStyle::Secondary)
        {
            output.push_str(&format!(
                "  {} {}: {}\n",
                self.paint("\x1b[96m", "-->"),
                label.span.start,
                label.message
            ));
        }

        for suggestion in &diagnostic.suggestions {
            output.push_str(&format!(
                "{}: {}\n",
                self.paint("\x1b[38;5;208m", "suggestion"),
                suggestion.message
            ));
        }

        for help_msg in &diagnostic.help {
            output.push_str(&format!("     {}: {}\n", self.paint("\x1b[32m", "help"), help_msg));
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("{}: {}\n", self.paint("\x1b[34m", "note"), note));
        }

        output
    }
}

// Name-resolution diagnostics
pub mod resolve;
