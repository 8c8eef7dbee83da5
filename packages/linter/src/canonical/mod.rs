//! Canonical spelling suggestions for utility classes.

mod fragment;
mod rules;

pub use fragment::style_attribute_name;
pub use rules::{snap_to_scale, TokenRule, SPACING_SCALE, TOKEN_RULES};

use crate::extract::extract_tokens;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, instrument};

/// What a suggestion's `original` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionScope {
    /// A single class.
    Token,
    /// Several space-separated classes that collapse into one.
    ClassGroup,
    /// An inline style declaration; reported, never rewritten.
    InlineStyle,
    /// Classes competing for one property where the one to keep is a
    /// design decision; reported, never rewritten.
    StackedClasses,
}

impl SuggestionScope {
    /// Whether the fix applicator may rewrite suggestions of this scope.
    pub fn is_rewritable(self) -> bool {
        matches!(self, SuggestionScope::Token | SuggestionScope::ClassGroup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionSource {
    Local,
    Bridge,
}

/// A single rewrite recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalSuggestion {
    pub original: String,
    pub canonical: String,
    pub reason: String,
    pub scope: SuggestionScope,
    pub source: SuggestionSource,
}

impl CanonicalSuggestion {
    pub fn token(
        original: impl Into<String>,
        canonical: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            canonical: canonical.into(),
            reason: reason.into(),
            scope: SuggestionScope::Token,
            source: SuggestionSource::Local,
        }
    }

    pub fn with_scope(mut self, scope: SuggestionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_source(mut self, source: SuggestionSource) -> Self {
        self.source = source;
        self
    }
}

/// Suggest canonical replacements for the classes in `fragment`: one per
/// token from the first matching token rule, then the fragment-level
/// findings.
#[instrument(skip(fragment))]
pub fn suggest(fragment: &str, source_path: &str) -> Vec<CanonicalSuggestion> {
    let tokens = extract_tokens(fragment);

    let mut suggestions: Vec<_> = tokens
        .iter()
        .filter_map(|token| {
            TOKEN_RULES.iter().find_map(|rule| {
                (rule.rewrite)(token).map(|(canonical, reason)| {
                    debug!(rule = rule.name, original = token.raw(), %canonical, "Token rule matched");
                    CanonicalSuggestion::token(token.raw(), canonical, reason)
                })
            })
        })
        .collect();

    suggestions.extend(fragment::class_group_suggestions(&tokens));
    suggestions.extend(fragment::inline_style_suggestions(fragment));

    dedup_by_original(suggestions)
}

/// Merge suggestions from an external oracle ahead of local ones. A local
/// suggestion is dropped when the oracle already covered its original.
pub fn merge(
    primary: Vec<CanonicalSuggestion>,
    local: Vec<CanonicalSuggestion>,
) -> Vec<CanonicalSuggestion> {
    dedup_by_original(primary.into_iter().chain(local).collect())
}

fn dedup_by_original(suggestions: Vec<CanonicalSuggestion>) -> Vec<CanonicalSuggestion> {
    let mut seen = HashSet::new();
    suggestions
        .into_iter()
        .filter(|suggestion| seen.insert(suggestion.original.clone()))
        .collect()
}
