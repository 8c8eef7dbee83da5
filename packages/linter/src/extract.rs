//! Class-token extraction from source fragments.

use crate::token::ClassToken;
use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::LazyLock;

/// `class="…"`, `class='…'`, `className="…"` and JSX containers holding a
/// single string or template literal. Bound forms (`:class`, `@class`) and
/// longer names (`data-class`) are not class lists.
static CLASS_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:^|[^\w:@.-])(?:class|className)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{\s*(?:"([^"]*)"|'([^']*)'|`([^`]*)`)\s*\})"#,
    )
    .expect("class attribute regex is valid")
});

/// Calls to class-joining helpers whose string arguments are class lists.
static CLASS_HELPER_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w$.])(?:clsx|classnames|classNames|cn|cx|cva|twMerge|twJoin)\s*\(")
        .expect("class helper regex is valid")
});

/// Plain words that are utilities on their own, without a hyphen.
const STANDALONE_UTILITIES: &[&str] = &[
    "block", "inline", "flex", "grid", "hidden", "contents", "table", "static", "fixed",
    "absolute", "relative", "sticky", "grow", "shrink", "italic", "underline", "overline",
    "uppercase", "lowercase", "capitalize", "truncate", "container", "border", "rounded",
    "shadow", "ring", "outline", "visible", "invisible", "collapse", "isolate", "antialiased",
    "transform", "transition", "filter", "blur", "grayscale", "invert", "sepia", "resize",
];

/// A span of the fragment whose content is a class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRegion {
    pub range: Range<usize>,
    /// The region is the whole fragment, not an attribute value.
    pub bare: bool,
}

/// Extract the ordered, de-duplicated class tokens of a fragment.
///
/// When the fragment holds class attributes only their values are read;
/// otherwise class-shaped words are picked out of the text and prose is
/// dropped.
pub fn extract(fragment: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();

    for region in class_regions(fragment) {
        let text = &fragment[region.range.clone()];
        for run in token_runs(text, region.bare) {
            let candidate = &text[run];
            if region.bare && !is_class_like(candidate) {
                continue;
            }
            if seen.insert(candidate) {
                tokens.push(candidate.to_string());
            }
        }
    }

    tokens
}

/// Extract and decompose; malformed tokens are left out.
pub fn extract_tokens(fragment: &str) -> Vec<ClassToken> {
    extract(fragment)
        .iter()
        .filter_map(|raw| ClassToken::parse(raw))
        .collect()
}

pub fn has_class_attribute(fragment: &str) -> bool {
    CLASS_ATTRIBUTE.is_match(fragment)
}

/// Byte ranges of every class attribute value in the fragment.
pub fn class_attribute_values(fragment: &str) -> Vec<Range<usize>> {
    CLASS_ATTRIBUTE
        .captures_iter(fragment)
        .filter_map(|captures| {
            captures
                .iter()
                .skip(1)
                .flatten()
                .next()
                .map(|value| value.range())
        })
        .collect()
}

/// Split a whole document into element fragments: every opening tag that
/// carries a class attribute, from its `<` to the closing `>`. Attributes
/// outside any tag yield just the attribute text.
pub fn element_fragments(document: &str) -> Vec<Range<usize>> {
    let mut fragments: Vec<Range<usize>> = Vec::new();

    for attribute in CLASS_ATTRIBUTE.find_iter(document) {
        let before = &document[..attribute.start()];
        let start = match before.rfind('<') {
            Some(open) if !before[open..].contains('>') => open,
            _ => attribute.start(),
        };
        let end = document[attribute.end()..]
            .find('>')
            .map_or(attribute.end(), |close| attribute.end() + close + 1);

        match fragments.last_mut() {
            Some(last) if last.end > start => last.end = last.end.max(end),
            _ => fragments.push(start..end),
        }
    }

    fragments
}

/// Contents of the plain string literals passed to class helpers such as
/// `clsx("mt-4", active && "font-bold")`. Literals with escapes or
/// template substitutions are skipped.
pub fn class_helper_literals(document: &str) -> Vec<Range<usize>> {
    let mut literals = Vec::new();

    for call in CLASS_HELPER_CALL.find_iter(document) {
        let base = call.end();
        let mut depth = 1usize;
        let mut open: Option<(char, usize, bool)> = None;
        let mut escaped = false;

        for (offset, c) in document[base..].char_indices() {
            if let Some((quote, start, plain)) = open {
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                    open = Some((quote, start, false));
                } else if c == quote {
                    if plain && offset > start {
                        literals.push(base + start..base + offset);
                    }
                    open = None;
                } else if quote == '`' && c == '$' {
                    open = Some((quote, start, false));
                }
                continue;
            }

            match c {
                '"' | '\'' | '`' => open = Some((c, offset + 1, true)),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    literals.sort_by_key(|range| range.start);
    literals.dedup();
    literals
}

/// The regions edits and lookups are confined to: the class attribute
/// values, or the whole fragment when it has none.
pub fn class_regions(fragment: &str) -> Vec<ClassRegion> {
    let values = class_attribute_values(fragment);
    if values.is_empty() {
        return vec![ClassRegion {
            range: 0..fragment.len(),
            bare: true,
        }];
    }
    values
        .into_iter()
        .map(|range| ClassRegion { range, bare: false })
        .collect()
}

/// Ranges of the whitespace-separated runs in `text`. Bare text also breaks
/// on quotes and on punctuation outside brackets.
pub fn token_runs(text: &str, bare: bool) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    let mut depth = 0usize;

    for (index, ch) in text.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.saturating_sub(1),
            _ => {}
        }

        let separates = ch.is_whitespace()
            || (bare && matches!(ch, '"' | '\'' | '`'))
            || (bare && depth == 0 && matches!(ch, ',' | ';' | '{' | '}' | '<' | '>' | '='));

        match (separates, start) {
            (true, Some(begin)) => {
                runs.push(begin..index);
                start = None;
                depth = 0;
            }
            (true, None) => depth = 0,
            (false, None) => start = Some(index),
            (false, Some(_)) => {}
        }
    }

    if let Some(begin) = start {
        runs.push(begin..text.len());
    }
    runs
}

/// First whole-token occurrence of `class` inside the fragment's class
/// regions.
pub fn locate(fragment: &str, class: &str) -> Option<Range<usize>> {
    class_regions(fragment).into_iter().find_map(|region| {
        let text = &fragment[region.range.clone()];
        token_runs(text, region.bare)
            .into_iter()
            .find(|run| &text[run.clone()] == class)
            .map(|run| region.range.start + run.start..region.range.start + run.end)
    })
}

fn is_class_like(candidate: &str) -> bool {
    let Some(token) = ClassToken::parse(candidate) else {
        return false;
    };
    token.base().contains('-')
        || !token.variants().is_empty()
        || token.is_arbitrary()
        || token.is_important()
        || STANDALONE_UTILITIES.contains(&token.base())
}
