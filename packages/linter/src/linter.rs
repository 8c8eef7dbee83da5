use crate::canonical::CanonicalSuggestion;
use crate::diagnostic::Diagnostic;
use crate::extract::{class_helper_literals, element_fragments};
use crate::rules::RuleRegistry;
use tracing::{debug, instrument};

/// A piece of markup to lint, usually one opening tag.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    pub text: &'a str,
    pub path: &'a str,
    /// Suggestions from an outside source, preferred over local ones.
    pub external_suggestions: &'a [CanonicalSuggestion],
}

impl<'a> Fragment<'a> {
    pub fn new(text: &'a str, path: &'a str) -> Self {
        Self {
            text,
            path,
            external_suggestions: &[],
        }
    }

    pub fn with_external_suggestions(mut self, suggestions: &'a [CanonicalSuggestion]) -> Self {
        self.external_suggestions = suggestions;
        self
    }
}

/// Options for configuring the linter
#[derive(Debug, Default)]
pub struct LintOptions {
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,
}

/// Lint a single fragment and return diagnostics
pub fn lint_fragment(fragment: &Fragment<'_>, options: &LintOptions) -> Vec<Diagnostic> {
    let default_registry;
    let registry = match &options.registry {
        Some(registry) => registry,
        None => {
            default_registry = RuleRegistry::new();
            &default_registry
        }
    };

    registry
        .rules()
        .iter()
        .flat_map(|rule| rule.check(fragment))
        .collect()
}

/// Lint every element of a document, and every string literal passed to a
/// class helper. Spans and fixes are document offsets.
#[instrument(skip(source, external_suggestions, options), fields(suggestions = external_suggestions.len()))]
pub fn lint_document(
    source: &str,
    path: &str,
    external_suggestions: &[CanonicalSuggestion],
    options: &LintOptions,
) -> Vec<Diagnostic> {
    let mut fragments = element_fragments(source);
    let elements = fragments.len();
    fragments.extend(class_helper_literals(source));
    fragments.sort_by_key(|range| range.start);
    debug!(elements, literals = fragments.len() - elements, "Linting document");

    fragments
        .into_iter()
        .flat_map(|range| {
            let fragment = Fragment::new(&source[range.clone()], path)
                .with_external_suggestions(external_suggestions);
            lint_fragment(&fragment, options)
                .into_iter()
                .map(move |diagnostic| diagnostic.offset(range.start))
        })
        .collect()
}
