//! Server diagnostics → canonical suggestions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use windlint_linter::{CanonicalSuggestion, SuggestionScope, SuggestionSource};

/// Diagnostic code the server uses for "this class has a canonical form".
pub const CANONICAL_CLASSES_CODE: &str = "suggestCanonicalClasses";

/// The first two backtick-quoted spans: the class as written, then its
/// canonical form.
static QUOTED_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`]+)`[^`]*`([^`]+)`").expect("quoted pair regex is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerDiagnostic {
    #[serde(default)]
    pub code: Option<Value>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishDiagnosticsParams {
    pub uri: String,
    #[serde(default)]
    pub diagnostics: Vec<ServerDiagnostic>,
}

impl ServerDiagnostic {
    pub fn is_canonical_classes(&self) -> bool {
        self.code.as_ref().and_then(Value::as_str) == Some(CANONICAL_CLASSES_CODE)
    }
}

pub fn suggestions_from_diagnostics(diagnostics: &[ServerDiagnostic]) -> Vec<CanonicalSuggestion> {
    diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.is_canonical_classes())
        .filter_map(|diagnostic| {
            let captures = QUOTED_PAIR.captures(&diagnostic.message)?;
            let original = captures[1].trim();
            let canonical = captures[2].trim();
            if original.is_empty() || canonical.is_empty() || original == canonical {
                return None;
            }

            let scope = if original.contains(char::is_whitespace) {
                SuggestionScope::ClassGroup
            } else {
                SuggestionScope::Token
            };
            Some(
                CanonicalSuggestion::token(original, canonical, diagnostic.message.clone())
                    .with_scope(scope)
                    .with_source(SuggestionSource::Bridge),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn diagnostic(code: Value, message: &str) -> ServerDiagnostic {
        serde_json::from_value(json!({ "code": code, "message": message })).unwrap()
    }

    #[test]
    fn test_reads_canonical_diagnostics() {
        let suggestions = suggestions_from_diagnostics(&[
            diagnostic(json!("suggestCanonicalClasses"), "The class `flex-grow` can be written as `grow`"),
            diagnostic(json!("cssConflict"), "`mt-4` conflicts with `mt-6`"),
            diagnostic(json!(12), "`a-1` → `b-1`"),
        ]);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].original, "flex-grow");
        assert_eq!(suggestions[0].canonical, "grow");
        assert_eq!(suggestions[0].source, SuggestionSource::Bridge);
    }

    #[test]
    fn test_skips_messages_without_two_quoted_classes() {
        let suggestions = suggestions_from_diagnostics(&[
            diagnostic(json!("suggestCanonicalClasses"), "Use `grow` instead"),
            diagnostic(json!("suggestCanonicalClasses"), "`p-2` is already `p-2`"),
        ]);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_multi_class_original_is_a_group() {
        let suggestions = suggestions_from_diagnostics(&[diagnostic(
            json!("suggestCanonicalClasses"),
            "`mt-4 mb-4` can be shortened to `my-4`",
        )]);
        assert_eq!(suggestions[0].scope, SuggestionScope::ClassGroup);
    }
}
