use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// Byte range within the linted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn offset(self, by: usize) -> Self {
        Self::new(self.start + by, self.end + by)
    }

    /// One-based line and column of the span start.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let prefix = &source[..self.start.min(source.len())];
        let line = prefix.matches('\n').count() + 1;
        let column = prefix
            .rsplit('\n')
            .next()
            .map_or(0, |last| last.chars().count())
            + 1;
        (line, column)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Replace `span` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    pub span: Span,
    pub new_text: String,
}

impl TextEdit {
    /// The smallest edit turning `before` into `after`, or `None` when the
    /// two are equal.
    pub fn between(before: &str, after: &str) -> Option<Self> {
        if before == after {
            return None;
        }

        let mut prefix = before
            .bytes()
            .zip(after.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        while !before.is_char_boundary(prefix) || !after.is_char_boundary(prefix) {
            prefix -= 1;
        }

        let max_suffix = before.len().min(after.len()) - prefix;
        let mut suffix = before
            .bytes()
            .rev()
            .zip(after.bytes().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();
        while !before.is_char_boundary(before.len() - suffix)
            || !after.is_char_boundary(after.len() - suffix)
        {
            suffix -= 1;
        }

        Some(Self {
            span: Span::new(prefix, before.len() - suffix),
            new_text: after[prefix..after.len() - suffix].to_string(),
        })
    }

    pub fn offset(mut self, by: usize) -> Self {
        self.span = self.span.offset(by);
        self
    }

    pub fn apply(&self, text: &str) -> String {
        let mut output = text.to_string();
        output.replace_range(self.span.start..self.span.end, &self.new_text);
        output
    }
}

/// A diagnostic message from the linter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level
    pub level: DiagnosticLevel,

    /// The rule that generated this diagnostic
    pub rule: String,

    /// Human-readable message
    pub message: String,

    /// Where the offending class first appears
    pub span: Span,

    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,

    /// Edit that applies the suggestion, when it can be applied safely
    pub fix: Option<TextEdit>,
}

impl Diagnostic {
    pub fn new(
        level: DiagnosticLevel,
        rule: impl Into<String>,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            level,
            rule: rule.into(),
            message: message.into(),
            span,
            suggestion: None,
            fix: None,
        }
    }

    pub fn error(rule: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticLevel::Error, rule, message, span)
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>, span: Span) -> Self {
        Self::new(DiagnosticLevel::Warning, rule, message, span)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_fix(mut self, fix: Option<TextEdit>) -> Self {
        self.fix = fix;
        self
    }

    /// Shift the span and fix from fragment offsets to document offsets.
    pub fn offset(mut self, by: usize) -> Self {
        self.span = self.span.offset(by);
        self.fix = self.fix.map(|fix| fix.offset(by));
        self
    }
}
