//! Decomposition of a single utility-class occurrence into variant prefixes,
//! base utility and "important" marker.

use crate::family::{classify, PropertyFamily};
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Responsive breakpoint variants, smallest first.
pub const BREAKPOINTS: &[&str] = &["sm", "md", "lg", "xl", "2xl"];

/// Shape of a base utility: an optional negation, then either a fully
/// bracketed property (`[mask-type:alpha]`) or a lowercase stem with an
/// optional bracketed value and an optional `/modifier`.
static BASE_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^-?(?:\[[^\s\[\]]+\]|[a-z](?:[a-z0-9.-]*[a-z0-9])?(?:-\[[^\s]+\])?(?:/(?:[a-z0-9.%]+|\[[^\s\]]+\]))?)$",
    )
    .expect("base grammar regex is valid")
});

/// Where the `!` marker sits relative to the base utility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportantMarker {
    /// `!mt-4`, `md:!mt-4`
    Leading,
    /// `mt-4!`, `md:mt-4!`
    Trailing,
}

/// Immutable view of one utility-class occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassToken {
    raw: String,
    variants: Vec<String>,
    base: String,
    family: Option<PropertyFamily>,
    arbitrary: bool,
    important: Option<ImportantMarker>,
}

/// The scope a token applies in: its breakpoint plus every other variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VariantScope<'a> {
    pub breakpoint: Option<&'a str>,
    pub states: BTreeSet<&'a str>,
}

impl ClassToken {
    /// Decompose `raw`. Returns `None` for anything that is not a
    /// well-formed utility class.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return None;
        }

        let mut segments = split_top_level(raw, ':')?;
        let utility = segments.pop()?;
        if segments.iter().any(|variant| variant.is_empty()) {
            return None;
        }

        let (base, important) = match (utility.strip_prefix('!'), utility.strip_suffix('!')) {
            (Some(_), Some(_)) => return None,
            (Some(rest), None) => (rest, Some(ImportantMarker::Leading)),
            (None, Some(rest)) => (rest, Some(ImportantMarker::Trailing)),
            (None, None) => (utility, None),
        };

        if !BASE_GRAMMAR.is_match(base) {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            variants: segments.into_iter().map(str::to_string).collect(),
            base: base.to_string(),
            family: classify(base),
            arbitrary: base.contains('['),
            important,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Base utility without its leading negation.
    pub fn unsigned_base(&self) -> &str {
        self.base.strip_prefix('-').unwrap_or(&self.base)
    }

    pub fn is_negative(&self) -> bool {
        self.base.starts_with('-')
    }

    pub fn family(&self) -> Option<PropertyFamily> {
        self.family
    }

    pub fn is_arbitrary(&self) -> bool {
        self.arbitrary
    }

    pub fn is_important(&self) -> bool {
        self.important.is_some()
    }

    pub fn important_marker(&self) -> Option<ImportantMarker> {
        self.important
    }

    /// The responsive breakpoint this token is scoped to, if any.
    pub fn breakpoint(&self) -> Option<&str> {
        self.variants
            .iter()
            .map(String::as_str)
            .find(|variant| BREAKPOINTS.contains(variant))
    }

    pub fn scope(&self) -> VariantScope<'_> {
        let breakpoint = self.breakpoint();
        VariantScope {
            breakpoint,
            states: self
                .variants
                .iter()
                .map(String::as_str)
                .filter(|variant| Some(*variant) != breakpoint)
                .collect(),
        }
    }

    /// Variant prefixes including the trailing separator, e.g. `md:hover:`.
    pub fn variant_prefix(&self) -> String {
        self.variants.iter().map(|v| format!("{v}:")).collect()
    }

    /// Rebuild this occurrence with a different base, keeping variants and
    /// the marker where they were.
    pub fn with_base(&self, base: &str) -> String {
        self.assemble(base, self.important)
    }

    /// Rebuild this occurrence with the marker moved (or removed).
    pub fn with_marker(&self, marker: Option<ImportantMarker>) -> String {
        self.assemble(&self.base, marker)
    }

    fn assemble(&self, base: &str, marker: Option<ImportantMarker>) -> String {
        let mut out = self.variant_prefix();
        if marker == Some(ImportantMarker::Leading) {
            out.push('!');
        }
        out.push_str(base);
        if marker == Some(ImportantMarker::Trailing) {
            out.push('!');
        }
        out
    }
}

impl fmt::Display for ClassToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split on `separator` outside of `[...]` and `(...)`. Returns `None` when
/// brackets are unbalanced.
fn split_top_level(input: &str, separator: char) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (index, ch) in input.char_indices() {
        match ch {
            '[' | '(' => depth += 1,
            ']' | ')' => depth = depth.checked_sub(1)?,
            c if c == separator && depth == 0 => {
                segments.push(&input[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    segments.push(&input[start..]);
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reassemble(token: &ClassToken) -> String {
        token.with_marker(token.important_marker())
    }

    #[test]
    fn test_parses_plain_utility() {
        let token = ClassToken::parse("p-4").unwrap();
        assert_eq!(token.base(), "p-4");
        assert!(token.variants().is_empty());
        assert!(!token.is_arbitrary());
        assert!(!token.is_important());
        assert!(token.family().is_some());
    }

    #[test]
    fn test_parses_variants_and_markers() {
        let token = ClassToken::parse("md:hover:!mt-4").unwrap();
        assert_eq!(token.variants(), ["md", "hover"]);
        assert_eq!(token.base(), "mt-4");
        assert_eq!(token.important_marker(), Some(ImportantMarker::Leading));
        assert_eq!(token.breakpoint(), Some("md"));

        let token = ClassToken::parse("dark:bg-white!").unwrap();
        assert_eq!(token.important_marker(), Some(ImportantMarker::Trailing));
        assert_eq!(token.base(), "bg-white");
    }

    #[test]
    fn test_colon_inside_brackets_does_not_split() {
        let token = ClassToken::parse("lg:text-[color:var(--brand)]").unwrap();
        assert_eq!(token.variants(), ["lg"]);
        assert_eq!(token.base(), "text-[color:var(--brand)]");
        assert!(token.is_arbitrary());

        let token = ClassToken::parse("[&>*]:p-2").unwrap();
        assert_eq!(token.variants(), ["[&>*]"]);
    }

    #[test]
    fn test_raw_reconstructs_exactly() {
        for raw in [
            "flex",
            "-mt-4",
            "!mb-0",
            "mb-0!",
            "sm:focus:!w-1/2",
            "before:top-[-2px]",
            "bg-red-500/50",
            "[mask-type:luminance]",
            "text-sm/6",
            "p-0.5",
        ] {
            let token = ClassToken::parse(raw).unwrap_or_else(|| panic!("{raw} should parse"));
            assert_eq!(reassemble(&token), raw);
            assert_eq!(token.to_string(), raw);
        }
    }

    #[test]
    fn test_rejects_malformed() {
        for raw in ["", "md:", ":flex", "!mt-4!", "mt-[2px", "foo bar", "Hello", "mt-", "e.g."] {
            assert!(ClassToken::parse(raw).is_none(), "{raw} should be rejected");
        }
    }

    #[test]
    fn test_scope_separates_breakpoint_from_states() {
        let token = ClassToken::parse("hover:md:dark:mt-2").unwrap();
        let scope = token.scope();
        assert_eq!(scope.breakpoint, Some("md"));
        assert_eq!(scope.states.into_iter().collect::<Vec<_>>(), ["dark", "hover"]);
    }

    #[test]
    fn test_with_base_keeps_prefix_and_marker() {
        let token = ClassToken::parse("md:flex-grow!").unwrap();
        assert_eq!(token.with_base("grow"), "md:grow!");
        assert_eq!(token.variant_prefix(), "md:");
    }

    #[test]
    fn test_negative_base() {
        let token = ClassToken::parse("-translate-x-1/2").unwrap();
        assert!(token.is_negative());
        assert_eq!(token.unsigned_base(), "translate-x-1/2");
    }
}
