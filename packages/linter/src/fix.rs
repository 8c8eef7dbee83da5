//! Scoped text edits that apply conflict fixes and canonical suggestions.
//!
//! Edits only ever touch the content of class attribute values (or the
//! bare class list when the fragment has no attribute), and only whole
//! tokens within them.

use crate::canonical::CanonicalSuggestion;
use crate::conflict::Conflict;
use crate::extract::{class_regions, token_runs};
use serde::Serialize;
use tracing::debug;

/// What to change in a fragment.
#[derive(Debug, Clone, Copy)]
pub enum Edit<'a> {
    /// Replace the conflicting pair with the conflict's suggested class.
    ResolveConflict(&'a Conflict),
    /// Drop every class the conflict names.
    RemoveConflicting(&'a Conflict),
    /// Rewrite the suggestion's original spelling to its canonical one.
    Canonicalize(&'a CanonicalSuggestion),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "camelCase")]
pub enum FixOutcome {
    Applied(String),
    NoOp,
}

impl FixOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FixOutcome::Applied(_))
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            FixOutcome::Applied(text) => Some(text),
            FixOutcome::NoOp => None,
        }
    }
}

/// Host-side node the fix is applied to. The core only needs to read the
/// node's source text and to replace it.
pub trait SourceNode {
    fn text(&self) -> &str;
    fn replace(&mut self, text: String);
}

impl SourceNode for String {
    fn text(&self) -> &str {
        self
    }

    fn replace(&mut self, text: String) {
        *self = text;
    }
}

/// Compute the edited fragment, or `NoOp` when the edit is unsafe or
/// changes nothing.
pub fn apply(fragment: &str, edit: Edit<'_>) -> FixOutcome {
    let (remove, insert): (Vec<&str>, Option<&str>) = match edit {
        Edit::ResolveConflict(conflict) => {
            let Some(fix) = &conflict.suggested_fix else {
                return FixOutcome::NoOp;
            };
            (conflict.classes.iter().map(String::as_str).collect(), Some(fix.replacement.as_str()))
        }
        Edit::RemoveConflicting(conflict) => {
            (conflict.classes.iter().map(String::as_str).collect(), None)
        }
        Edit::Canonicalize(suggestion) => {
            if !suggestion.scope.is_rewritable() {
                return FixOutcome::NoOp;
            }
            (suggestion.original.split_whitespace().collect(), Some(suggestion.canonical.as_str()))
        }
    };

    if remove.is_empty() {
        return FixOutcome::NoOp;
    }
    if let Some(insert) = insert {
        if !is_single_token(insert) {
            debug!(replacement = insert, "Refusing fix with a multi-word replacement");
            return FixOutcome::NoOp;
        }
    }

    let mut output = fragment.to_string();
    for region in class_regions(fragment).into_iter().rev() {
        let value = &fragment[region.range.clone()];
        if let Some(rewritten) = replace_tokens(value, region.bare, &remove, insert) {
            output.replace_range(region.range, &rewritten);
        }
    }

    if output == fragment {
        FixOutcome::NoOp
    } else {
        FixOutcome::Applied(output)
    }
}

/// Apply `edit` to a host node in place. Returns whether the node changed.
pub fn apply_to_node(node: &mut dyn SourceNode, edit: Edit<'_>) -> bool {
    match apply(node.text(), edit) {
        FixOutcome::Applied(text) => {
            node.replace(text);
            true
        }
        FixOutcome::NoOp => false,
    }
}

fn is_single_token(text: &str) -> bool {
    !text.is_empty() && !text.chars().any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '<' | '>'))
}

/// Remove every token of `remove` from the class list and put `insert` where
/// the first removed token was, unless the remaining list already has it.
/// Separators around surviving tokens are kept as they were.
fn replace_tokens(value: &str, bare: bool, remove: &[&str], insert: Option<&str>) -> Option<String> {
    let runs = token_runs(value, bare);
    if !runs.iter().any(|run| remove.contains(&&value[run.clone()])) {
        return None;
    }

    let survivors_have_insert = insert.is_some_and(|insert| {
        runs.iter()
            .map(|run| &value[run.clone()])
            .any(|token| token == insert && !remove.contains(&token))
    });
    let mut pending_insert = insert.filter(|_| !survivors_have_insert);

    // Each surviving token with the separator text that preceded it.
    let mut kept: Vec<(&str, &str)> = Vec::new();
    let mut previous_end = 0;
    let leading = runs.first().map_or(value, |run| &value[..run.start]);

    for run in &runs {
        let separator = if previous_end == 0 { "" } else { &value[previous_end..run.start] };
        previous_end = run.end;
        let token = &value[run.clone()];

        if remove.contains(&token) {
            if let Some(insert) = pending_insert.take() {
                kept.push((separator, insert));
            }
            continue;
        }
        kept.push((separator, token));
    }

    let trailing = runs.last().map_or("", |run| &value[run.end..]);
    let mut output = String::with_capacity(value.len());
    output.push_str(leading);
    for (index, (separator, token)) in kept.iter().enumerate() {
        if index > 0 {
            output.push_str(if separator.is_empty() { " " } else { separator });
        }
        output.push_str(token);
    }
    if !kept.is_empty() {
        output.push_str(trailing);
    }
    Some(output)
}
