//! Static analysis for utility-first class lists: extraction, conflict
//! detection, canonical spelling suggestions and scoped fixes.

pub mod canonical;
pub mod conflict;
mod diagnostic;
mod error;
pub mod extract;
pub mod family;
pub mod fix;
mod linter;
pub mod lookup;
mod rules;
pub mod token;

pub use canonical::{merge, suggest, CanonicalSuggestion, SuggestionScope, SuggestionSource};
pub use conflict::{detect, detect_with_lookup, Conflict, ConflictFix};
pub use diagnostic::{Diagnostic, DiagnosticLevel, Span, TextEdit};
pub use error::{LintError, LintResult};
pub use extract::{extract, extract_tokens};
pub use fix::{apply, apply_to_node, Edit, FixOutcome, SourceNode};
pub use linter::{lint_document, lint_fragment, Fragment, LintOptions};
pub use lookup::{PropertyLookup, PropertyTable};
pub use rules::{EnforceCanonicalClassesRule, LintRule, NoConflictingClassesRule, RuleRegistry};
pub use token::{ClassToken, ImportantMarker};
