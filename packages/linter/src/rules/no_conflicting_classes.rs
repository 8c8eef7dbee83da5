use crate::conflict::{detect, detect_with_lookup};
use crate::diagnostic::{Diagnostic, DiagnosticLevel, Span, TextEdit};
use crate::extract::locate;
use crate::fix::{apply, Edit};
use crate::linter::Fragment;
use crate::lookup::PropertyLookup;
use crate::rules::LintRule;
use std::sync::Arc;

pub const NAME: &str = "no-conflicting-classes";

/// Lint rule that reports classes overriding each other on one element
pub struct NoConflictingClassesRule {
    level: DiagnosticLevel,
    lookup: Option<Arc<dyn PropertyLookup + Send + Sync>>,
}

impl NoConflictingClassesRule {
    pub fn new() -> Self {
        Self {
            level: DiagnosticLevel::Error,
            lookup: None,
        }
    }

    pub fn with_level(mut self, level: DiagnosticLevel) -> Self {
        self.level = level;
        self
    }

    /// Corroborate the pattern verdicts with declared properties.
    pub fn with_lookup(mut self, lookup: Arc<dyn PropertyLookup + Send + Sync>) -> Self {
        self.lookup = Some(lookup);
        self
    }
}

impl Default for NoConflictingClassesRule {
    fn default() -> Self {
        Self::new()
    }
}

impl LintRule for NoConflictingClassesRule {
    fn name(&self) -> &'static str {
        NAME
    }

    fn description(&self) -> &'static str {
        "Disallow classes that set the same property in the same variant scope"
    }

    fn check(&self, fragment: &Fragment<'_>) -> Vec<Diagnostic> {
        let conflicts = match &self.lookup {
            Some(lookup) => detect_with_lookup(fragment.text, fragment.path, lookup.as_ref()),
            None => detect(fragment.text, fragment.path),
        };

        conflicts
            .iter()
            .map(|conflict| {
                let span = locate(fragment.text, &conflict.classes[0])
                    .map(Span::from)
                    .unwrap_or_default();
                let diagnostic = Diagnostic::new(self.level, NAME, &conflict.reason, span);

                match &conflict.suggested_fix {
                    Some(fix) => diagnostic.with_suggestion(&fix.message).with_fix(
                        apply(fragment.text, Edit::ResolveConflict(conflict))
                            .into_text()
                            .and_then(|fixed| TextEdit::between(fragment.text, &fixed)),
                    ),
                    None => diagnostic.with_suggestion(format!(
                        "Remove either `{}` or `{}`",
                        conflict.classes[0], conflict.classes[1]
                    )),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::PropertyTable;

    #[test]
    fn test_reports_conflict_with_fix() {
        let text = r#"<div class="mt-4 flex mt-6">"#;
        let diagnostics = NoConflictingClassesRule::new().check(&Fragment::new(text, "a.html"));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Error);
        assert_eq!(&text[diagnostics[0].span.start..diagnostics[0].span.end], "mt-4");
        let fixed = diagnostics[0].fix.as_ref().unwrap().apply(text);
        assert_eq!(fixed, r#"<div class="mt-6 flex">"#);
    }

    #[test]
    fn test_unfixable_conflict_has_no_fix() {
        let diagnostics = NoConflictingClassesRule::new()
            .with_level(DiagnosticLevel::Warning)
            .check(&Fragment::new(r#"<p class="text-red-500 text-blue-500">"#, "a.html"));

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].level, DiagnosticLevel::Warning);
        assert!(diagnostics[0].fix.is_none());
        assert!(diagnostics[0].suggestion.is_some());
    }

    #[test]
    fn test_allows_breakpoint_siblings() {
        let diagnostics = NoConflictingClassesRule::new()
            .check(&Fragment::new(r#"<p class="mt-4 md:mt-6 lg:mt-8">"#, "a.html"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_lookup_overrules_patterns() {
        let mut table = PropertyTable::new();
        table.insert("shadow-sm", vec!["box-shadow".to_string()]);
        table.insert("shadow-lg", vec!["box-shadow".to_string()]);
        let rule = NoConflictingClassesRule::new().with_lookup(Arc::new(table));

        let diagnostics = rule.check(&Fragment::new("shadow-sm shadow-lg", "a.html"));
        assert_eq!(diagnostics.len(), 1);
    }
}
