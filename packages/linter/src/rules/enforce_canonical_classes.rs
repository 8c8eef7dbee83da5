use crate::canonical::{
    merge, style_attribute_name, suggest, CanonicalSuggestion, SuggestionScope, SuggestionSource,
};
use crate::diagnostic::{Diagnostic, DiagnosticLevel, Span, TextEdit};
use crate::extract::locate;
use crate::fix::{apply, Edit};
use crate::linter::Fragment;
use crate::rules::LintRule;

pub const NAME: &str = "enforce-canonical-classes";

/// Lint rule that reports classes with a shorter or current spelling
pub struct EnforceCanonicalClassesRule {
    level: DiagnosticLevel,
}

impl EnforceCanonicalClassesRule {
    pub fn new() -> Self {
        Self {
            level: DiagnosticLevel::Warning,
        }
    }

    pub fn with_level(mut self, level: DiagnosticLevel) -> Self {
        self.level = level;
        self
    }

    fn diagnose(&self, fragment: &Fragment<'_>, suggestion: &CanonicalSuggestion) -> Option<Diagnostic> {
        let first_class = suggestion.original.split_whitespace().next()?;
        let span = match suggestion.scope {
            SuggestionScope::InlineStyle => style_attribute_name(fragment.text)
                .map(Span::from)
                .unwrap_or_default(),
            _ => match locate(fragment.text, first_class) {
                Some(range) => Span::from(range),
                // Suggestions from a whole-document source may belong to another element.
                None if suggestion.source == SuggestionSource::Bridge => return None,
                None => Span::default(),
            },
        };

        let message = format!(
            "`{}` can be written as `{}`: {}",
            suggestion.original, suggestion.canonical, suggestion.reason
        );
        let fix = apply(fragment.text, Edit::Canonicalize(suggestion))
            .into_text()
            .and_then(|fixed| TextEdit::between(fragment.text, &fixed));

        Some(
            Diagnostic::new(self.level, NAME, message, span)
                .with_suggestion(format!(
                    "Replace `{}` with `{}`",
                    suggestion.original, suggestion.canonical
                ))
                .with_fix(fix),
        )
    }
}

impl Default for EnforceCanonicalClassesRule {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRule for EnforceCanonicalClassesRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Prefer the canonical spelling of utility classes"
    }

    fn check(&self, fragment: &Fragment<'_>) -> Vec<Diagnostic> {
        let suggestions = merge(
            fragment.external_suggestions.to_vec(),
            suggest(fragment.text, fragment.path),
        );

        suggestions
            .iter()
            .filter_map(|suggestion| self.diagnose(fragment, suggestion))
            .collect()
    }
}
