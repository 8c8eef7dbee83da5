//! Findings that need the whole fragment rather than a single token.

use super::{CanonicalSuggestion, SuggestionScope};
use crate::family::{spacing_parts, PropertyFamily, Side, SpacingProperty};
use crate::token::{ClassToken, VariantScope};
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

static STYLE_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|[^\w:@.-])(?P<name>style)\s*=\s*(?:"(?P<double>[^"]*)"|'(?P<single>[^']*)')"#)
        .expect("style attribute regex is valid")
});

/// Inline declarations with an exact utility equivalent.
const INLINE_STYLE_UTILITIES: &[(&str, &str, &str)] = &[
    ("display", "flex", "flex"),
    ("display", "block", "block"),
    ("display", "inline-block", "inline-block"),
    ("display", "grid", "grid"),
    ("display", "none", "hidden"),
    ("position", "absolute", "absolute"),
    ("position", "relative", "relative"),
    ("position", "fixed", "fixed"),
    ("position", "sticky", "sticky"),
    ("flex-direction", "column", "flex-col"),
    ("flex-direction", "row", "flex-row"),
    ("flex-wrap", "wrap", "flex-wrap"),
    ("justify-content", "center", "justify-center"),
    ("justify-content", "space-between", "justify-between"),
    ("align-items", "center", "items-center"),
    ("text-align", "center", "text-center"),
    ("text-align", "left", "text-left"),
    ("text-align", "right", "text-right"),
    ("font-weight", "bold", "font-bold"),
    ("font-weight", "700", "font-bold"),
    ("font-weight", "600", "font-semibold"),
    ("font-weight", "500", "font-medium"),
    ("font-style", "italic", "italic"),
    ("text-decoration", "underline", "underline"),
    ("text-transform", "uppercase", "uppercase"),
    ("cursor", "pointer", "cursor-pointer"),
    ("overflow", "hidden", "overflow-hidden"),
    ("overflow", "auto", "overflow-auto"),
    ("width", "100%", "w-full"),
    ("height", "100%", "h-full"),
    ("margin", "0", "m-0"),
    ("margin", "auto", "m-auto"),
    ("padding", "0", "p-0"),
    ("opacity", "0", "opacity-0"),
    ("opacity", "1", "opacity-100"),
];

struct SideEntry<'a> {
    index: usize,
    token: &'a ClassToken,
    value: String,
}

/// Direction classes that share a value and collapse into an axis or
/// all-sides class (`mt-4 mb-4` → `my-4`), and font sizes stacked in one
/// scope.
pub(super) fn class_group_suggestions(tokens: &[ClassToken]) -> Vec<CanonicalSuggestion> {
    let mut suggestions = collapsible_sides(tokens);
    suggestions.extend(stacked_font_sizes(tokens));
    suggestions
}

fn collapsible_sides(tokens: &[ClassToken]) -> Vec<CanonicalSuggestion> {
    let mut groups: Vec<((String, SpacingProperty), HashMap<Side, SideEntry<'_>>)> = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        if token.is_important() {
            continue;
        }
        let Some((property, side, value)) = spacing_parts(token.unsigned_base()) else {
            continue;
        };
        if matches!(side, Side::All | Side::Start | Side::End) {
            continue;
        }

        let key = (token.variant_prefix(), property);
        let value = if token.is_negative() {
            format!("-{value}")
        } else {
            value.to_string()
        };
        let entry = SideEntry {
            index,
            token,
            value,
        };

        match groups.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, sides)) => {
                sides.insert(side, entry);
            }
            None => groups.push((key, HashMap::from([(side, entry)]))),
        }
    }

    let mut suggestions = Vec::new();
    for ((prefix, property), sides) in &groups {
        let all_four = [Side::Top, Side::Right, Side::Bottom, Side::Left];
        if let Some(suggestion) = collapse(prefix, *property, sides, &all_four, Side::All) {
            suggestions.push(suggestion);
            continue;
        }
        if let Some(suggestion) = collapse(prefix, *property, sides, &[Side::X, Side::Y], Side::All)
        {
            suggestions.push(suggestion);
            continue;
        }
        suggestions.extend(collapse(prefix, *property, sides, &[Side::Top, Side::Bottom], Side::Y));
        suggestions.extend(collapse(prefix, *property, sides, &[Side::Left, Side::Right], Side::X));
    }
    suggestions
}

fn collapse(
    prefix: &str,
    property: SpacingProperty,
    sides: &HashMap<Side, SideEntry<'_>>,
    members: &[Side],
    into: Side,
) -> Option<CanonicalSuggestion> {
    let mut entries = members
        .iter()
        .map(|side| sides.get(side))
        .collect::<Option<Vec<_>>>()?;
    let value = &entries[0].value;
    if entries.iter().any(|entry| &entry.value != value) {
        return None;
    }
    entries.sort_by_key(|entry| entry.index);

    let (sign, magnitude) = match value.strip_prefix('-') {
        Some(magnitude) => ("-", magnitude),
        None => ("", value.as_str()),
    };
    let canonical = format!(
        "{prefix}{sign}{}{}-{magnitude}",
        property.abbreviation(),
        into.suffix()
    );
    let original = entries
        .iter()
        .map(|entry| entry.token.raw())
        .collect::<Vec<_>>()
        .join(" ");

    let reason = format!("`{original}` set the same value on every side of `{canonical}`");
    Some(CanonicalSuggestion::token(original, canonical, reason).with_scope(SuggestionScope::ClassGroup))
}

fn stacked_font_sizes(tokens: &[ClassToken]) -> Vec<CanonicalSuggestion> {
    let mut groups: Vec<(VariantScope<'_>, Vec<&ClassToken>)> = Vec::new();

    for token in tokens {
        if token.family() != Some(PropertyFamily::FontSize) {
            continue;
        }
        let scope = token.scope();
        match groups.iter_mut().find(|(existing, _)| *existing == scope) {
            Some((_, members)) => members.push(token),
            None => groups.push((scope, vec![token])),
        }
    }

    groups
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .filter_map(|(_, members)| {
            let last = members.last()?;
            let original = members
                .iter()
                .map(|token| token.raw())
                .collect::<Vec<_>>()
                .join(" ");
            let reason = format!(
                "Only one font size applies per scope; `{original}` stack {} sizes",
                members.len()
            );
            Some(
                CanonicalSuggestion::token(original, last.raw(), reason)
                    .with_scope(SuggestionScope::StackedClasses),
            )
        })
        .collect()
}

/// Byte range of the first `style` attribute name in `fragment`.
pub fn style_attribute_name(fragment: &str) -> Option<Range<usize>> {
    STYLE_ATTRIBUTE
        .captures(fragment)
        .and_then(|captures| captures.name("name"))
        .map(|name| name.range())
}

/// Inline `style` declarations with an exact utility equivalent.
pub(super) fn inline_style_suggestions(fragment: &str) -> Vec<CanonicalSuggestion> {
    STYLE_ATTRIBUTE
        .captures_iter(fragment)
        .filter_map(|captures| captures.name("double").or_else(|| captures.name("single")))
        .flat_map(|value| value.as_str().split(';'))
        .filter_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().to_ascii_lowercase();
            let &(_, _, utility) = INLINE_STYLE_UTILITIES
                .iter()
                .find(|(p, v, _)| *p == property && *v == value)?;

            let original = format!("{property}: {value}");
            let reason = format!("Inline `{original}` is the utility `{utility}`");
            Some(
                CanonicalSuggestion::token(original, utility, reason)
                    .with_scope(SuggestionScope::InlineStyle),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_tokens;

    fn groups(fragment: &str) -> Vec<(String, String)> {
        class_group_suggestions(&extract_tokens(fragment))
            .into_iter()
            .map(|s| (s.original, s.canonical))
            .collect()
    }

    #[test]
    fn test_collapses_vertical_pair() {
        assert_eq!(groups("mt-4 flex mb-4"), [("mt-4 mb-4".to_string(), "my-4".to_string())]);
    }

    #[test]
    fn test_collapses_all_sides() {
        assert_eq!(
            groups("pl-2 pt-2 pr-2 pb-2"),
            [("pl-2 pt-2 pr-2 pb-2".to_string(), "p-2".to_string())]
        );
        assert_eq!(groups("mx-auto my-auto"), [("mx-auto my-auto".to_string(), "m-auto".to_string())]);
    }

    #[test]
    fn test_keeps_variants_and_sign() {
        assert_eq!(
            groups("md:-ml-1 md:-mr-1"),
            [("md:-ml-1 md:-mr-1".to_string(), "md:-mx-1".to_string())]
        );
    }

    #[test]
    fn test_does_not_collapse_mixed_values_or_scopes() {
        assert!(groups("mt-4 mb-2").is_empty());
        assert!(groups("mt-4 md:mb-4").is_empty());
        assert!(groups("mt-4 pb-4").is_empty());
    }

    #[test]
    fn test_flags_stacked_font_sizes() {
        let found = groups("text-sm text-red-500 text-lg md:text-xl");
        assert_eq!(found, [("text-sm text-lg".to_string(), "text-lg".to_string())]);

        let scopes: Vec<_> = class_group_suggestions(&extract_tokens("text-sm text-lg"))
            .into_iter()
            .map(|s| s.scope)
            .collect();
        assert_eq!(scopes, [SuggestionScope::StackedClasses]);
    }

    #[test]
    fn test_style_attribute_name() {
        let fragment = r#"<ul data-style="x" class="list-style-none" style='display: flex'>"#;
        let range = style_attribute_name(fragment).unwrap();
        assert_eq!(&fragment[range.clone()], "style");
        assert_eq!(range.start, fragment.rfind("style").unwrap());
        assert!(style_attribute_name(r#"<ul class="list-style-none">"#).is_none());
    }

    #[test]
    fn test_inline_styles() {
        let fragment = r#"<div style="display: flex; Justify-Content:center; color: red" class="p-2">"#;
        let found: Vec<_> = inline_style_suggestions(fragment)
            .into_iter()
            .map(|s| (s.original, s.canonical, s.scope))
            .collect();
        assert_eq!(
            found,
            [
                ("display: flex".to_string(), "flex".to_string(), SuggestionScope::InlineStyle),
                (
                    "justify-content: center".to_string(),
                    "justify-center".to_string(),
                    SuggestionScope::InlineStyle
                ),
            ]
        );
    }
}
