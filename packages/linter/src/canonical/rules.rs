use crate::family::DISPLAY_UTILITIES;
use crate::token::{ClassToken, ImportantMarker};
use regex::Regex;
use std::sync::LazyLock;

/// Spacing scale steps, in units of 0.25rem (4px).
pub const SPACING_SCALE: &[f64] = &[
    0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 14.0,
    16.0, 20.0, 24.0, 28.0, 32.0, 36.0, 40.0, 44.0, 48.0, 52.0, 56.0, 60.0, 64.0, 72.0, 80.0, 96.0,
];

/// Utilities whose value is a spacing-scale step, longest stem first so
/// `space-x` wins over `p`.
const SPACING_STEMS: &[&str] = &[
    "space-x", "space-y", "inset-x", "inset-y", "gap-x", "gap-y", "inset", "bottom", "right",
    "start", "left", "gap", "top", "end", "mx", "my", "mt", "mr", "mb", "ml", "ms", "me", "px",
    "py", "pt", "pr", "pb", "pl", "ps", "pe", "m", "p",
];

const BRITISH_SPELLINGS: &[(&str, &str)] = &[
    ("grey", "gray"),
    ("colour", "color"),
    ("centre", "center"),
    ("capitalise", "capitalize"),
    ("behaviour", "behavior"),
];

const LEGACY_UTILITIES: &[(&str, &str)] = &[
    ("flex-grow", "grow"),
    ("flex-grow-0", "grow-0"),
    ("flex-shrink", "shrink"),
    ("flex-shrink-0", "shrink-0"),
    ("break-words", "wrap-break-word"),
    ("overflow-ellipsis", "text-ellipsis"),
    ("decoration-slice", "box-decoration-slice"),
    ("decoration-clone", "box-decoration-clone"),
    ("text-regular", "font-normal"),
    ("text-normal", "font-normal"),
    ("font-regular", "font-normal"),
    ("font-standard", "font-normal"),
];

const LEGACY_DIRECTIONS: &[(&str, &str)] = &[
    ("top", "t"),
    ("right", "r"),
    ("bottom", "b"),
    ("left", "l"),
    ("x", "x"),
    ("y", "y"),
    ("start", "s"),
    ("end", "e"),
];

static PIXEL_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(-?)(\d+(?:\.\d+)?)px\]$").expect("pixel value regex is valid")
});

static Z_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^z-\[(-?)(\d+)\]$").expect("z-index regex is valid"));

/// One row of the canonical rewrite table. `rewrite` returns the canonical
/// spelling of the whole occurrence and the justification.
pub struct TokenRule {
    pub name: &'static str,
    pub description: &'static str,
    pub rewrite: fn(&ClassToken) -> Option<(String, String)>,
}

/// Tried in order; the first rule that rewrites a token wins.
pub static TOKEN_RULES: &[TokenRule] = &[
    TokenRule {
        name: "decimal-spacing",
        description: "Snap decimal spacing values onto the spacing scale",
        rewrite: decimal_spacing,
    },
    TokenRule {
        name: "american-spelling",
        description: "Use American spellings of utility names",
        rewrite: american_spelling,
    },
    TokenRule {
        name: "important-position",
        description: "Write the important modifier at the end of the class",
        rewrite: important_position,
    },
    TokenRule {
        name: "legacy-utility",
        description: "Replace verbose or legacy utility names with their current form",
        rewrite: legacy_utility,
    },
    TokenRule {
        name: "pixels-to-scale",
        description: "Replace bracketed pixel spacing with spacing scale steps",
        rewrite: pixels_to_scale,
    },
    TokenRule {
        name: "z-index-arbitrary",
        description: "Unwrap bracketed integer z-index values",
        rewrite: z_index_arbitrary,
    },
];

/// Nearest step of the spacing scale; ties go to the lower step.
pub fn snap_to_scale(value: f64) -> f64 {
    SPACING_SCALE
        .iter()
        .copied()
        .fold(SPACING_SCALE[0], |best, step| {
            if (step - value).abs() < (best - value).abs() {
                step
            } else {
                best
            }
        })
}

fn format_step(step: f64) -> String {
    if step.fract() == 0.0 {
        format!("{}", step as i64)
    } else {
        format!("{step}")
    }
}

fn split_spacing(base: &str) -> Option<(&'static str, &str)> {
    SPACING_STEMS.iter().find_map(|stem| {
        let value = base.strip_prefix(stem)?.strip_prefix('-')?;
        (!value.is_empty()).then_some((*stem, value))
    })
}

fn decimal_spacing(token: &ClassToken) -> Option<(String, String)> {
    if token.is_arbitrary() {
        return None;
    }
    let (stem, value) = split_spacing(token.unsigned_base())?;
    if !value.contains('.') {
        return None;
    }
    let number: f64 = value.parse().ok()?;
    if SPACING_SCALE.contains(&number) {
        return None;
    }

    let step = format_step(snap_to_scale(number));
    let sign = if token.is_negative() && step != "0" { "-" } else { "" };
    Some((
        token.with_base(&format!("{sign}{stem}-{step}")),
        format!("`{value}` is not a spacing scale step; the nearest step is `{step}`"),
    ))
}

fn american_spelling(token: &ClassToken) -> Option<(String, String)> {
    let mut replaced = Vec::new();
    let base = token
        .base()
        .split('-')
        .map(|segment| {
            match BRITISH_SPELLINGS.iter().find(|(british, _)| *british == segment) {
                Some(&(british, american)) => {
                    replaced.push(format!("`{british}` → `{american}`"));
                    american
                }
                None => segment,
            }
        })
        .collect::<Vec<_>>()
        .join("-");

    if replaced.is_empty() {
        return None;
    }
    Some((
        token.with_base(&base),
        format!("Utility names use American spelling ({})", replaced.join(", ")),
    ))
}

fn important_position(token: &ClassToken) -> Option<(String, String)> {
    if token.important_marker() != Some(ImportantMarker::Leading) {
        return None;
    }
    let canonical = token.with_marker(Some(ImportantMarker::Trailing));
    let reason = format!("The important modifier goes at the end of the class: `{canonical}`");
    Some((canonical, reason))
}

fn legacy_utility(token: &ClassToken) -> Option<(String, String)> {
    let base = token.unsigned_base();
    let modern = legacy_replacement(base)?;
    let signed = if token.is_negative() {
        format!("-{modern}")
    } else {
        modern.clone()
    };
    Some((
        token.with_base(&signed),
        format!("`{base}` is a legacy spelling of `{modern}`"),
    ))
}

fn legacy_replacement(base: &str) -> Option<String> {
    if let Some(&(_, modern)) = LEGACY_UTILITIES.iter().find(|(legacy, _)| *legacy == base) {
        return Some(modern.to_string());
    }

    if let Some(value) = base.strip_prefix("display-") {
        return match value {
            "none" => Some("hidden".to_string()),
            v if DISPLAY_UTILITIES.contains(&v) => Some(v.to_string()),
            _ => None,
        };
    }

    for (long, short) in [("width", "w"), ("height", "h")] {
        if let Some(value) = base.strip_prefix(long).and_then(|r| r.strip_prefix('-')) {
            return (!value.is_empty()).then(|| format!("{short}-{value}"));
        }
    }

    for (long, short) in [("margin", "m"), ("padding", "p")] {
        let Some(rest) = base.strip_prefix(long).and_then(|r| r.strip_prefix('-')) else {
            continue;
        };
        for (direction, suffix) in LEGACY_DIRECTIONS {
            if let Some(value) = rest.strip_prefix(direction).and_then(|r| r.strip_prefix('-')) {
                if !value.is_empty() {
                    return Some(format!("{short}{suffix}-{value}"));
                }
            }
        }
        return (!rest.is_empty()).then(|| format!("{short}-{rest}"));
    }

    None
}

fn pixels_to_scale(token: &ClassToken) -> Option<(String, String)> {
    let (stem, value) = split_spacing(token.unsigned_base())?;
    let captures = PIXEL_VALUE.captures(value)?;
    let pixels: f64 = captures[2].parse().ok()?;
    let negative = token.is_negative() != !captures[1].is_empty();

    let units = pixels / 4.0;
    let step = if pixels == 1.0 {
        "px".to_string()
    } else {
        format_step(snap_to_scale(units))
    };
    let sign = if negative && step != "0" { "-" } else { "" };
    let canonical = token.with_base(&format!("{sign}{stem}-{step}"));

    let reason = if step == "px" || snap_to_scale(units) == units {
        format!("`{value}` is the spacing scale step `{step}` ({pixels}px ÷ 4)")
    } else {
        format!("`{value}` is closest to the spacing scale step `{step}` ({pixels}px ÷ 4 = {units})")
    };
    Some((canonical, reason))
}

fn z_index_arbitrary(token: &ClassToken) -> Option<(String, String)> {
    let captures = Z_INDEX.captures(token.unsigned_base())?;
    let level: u32 = captures[2].parse().ok()?;
    let negative = token.is_negative() != !captures[1].is_empty();
    let sign = if negative && level != 0 { "-" } else { "" };

    let canonical = token.with_base(&format!("{sign}z-{level}"));
    Some((
        canonical,
        format!("Integer z-index values need no brackets: `{sign}z-{level}`"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(raw: &str) -> Option<(&'static str, String)> {
        let token = ClassToken::parse(raw)?;
        TOKEN_RULES
            .iter()
            .find_map(|rule| (rule.rewrite)(&token).map(|(canonical, _)| (rule.name, canonical)))
    }

    fn canonical(raw: &str) -> Option<String> {
        rewrite(raw).map(|(_, canonical)| canonical)
    }

    #[test]
    fn test_snap_prefers_lower_on_ties() {
        assert_eq!(snap_to_scale(0.25), 0.0);
        assert_eq!(snap_to_scale(0.75), 0.5);
        assert_eq!(snap_to_scale(13.0), 12.0);
        assert_eq!(snap_to_scale(15.0), 14.0);
        assert_eq!(snap_to_scale(3.3), 3.5);
        assert_eq!(snap_to_scale(500.0), 96.0);
    }

    #[test]
    fn test_decimal_spacing() {
        assert_eq!(canonical("p-1.3").as_deref(), Some("p-1.5"));
        assert_eq!(canonical("-mt-2.2").as_deref(), Some("-mt-2"));
        assert_eq!(canonical("gap-x-0.2").as_deref(), Some("gap-x-0"));
        assert_eq!(canonical("p-2.5"), None);
        assert_eq!(canonical("p-4"), None);
    }

    #[test]
    fn test_american_spelling() {
        assert_eq!(canonical("bg-grey-500").as_deref(), Some("bg-gray-500"));
        assert_eq!(canonical("md:text-centre").as_deref(), Some("md:text-center"));
        assert_eq!(canonical("capitalise").as_deref(), Some("capitalize"));
    }

    #[test]
    fn test_important_position() {
        assert_eq!(canonical("!mb-0").as_deref(), Some("mb-0!"));
        assert_eq!(canonical("hover:!underline").as_deref(), Some("hover:underline!"));
        assert_eq!(canonical("mb-0!"), None);
    }

    #[test]
    fn test_legacy_utilities() {
        assert_eq!(canonical("flex-grow").as_deref(), Some("grow"));
        assert_eq!(canonical("flex-shrink-0").as_deref(), Some("shrink-0"));
        assert_eq!(canonical("display-none").as_deref(), Some("hidden"));
        assert_eq!(canonical("display-inline-flex").as_deref(), Some("inline-flex"));
        assert_eq!(canonical("display-table-cell"), None);
        assert_eq!(canonical("width-full").as_deref(), Some("w-full"));
        assert_eq!(canonical("height-8").as_deref(), Some("h-8"));
        assert_eq!(canonical("margin-4").as_deref(), Some("m-4"));
        assert_eq!(canonical("-margin-top-2").as_deref(), Some("-mt-2"));
        assert_eq!(canonical("padding-x-3").as_deref(), Some("px-3"));
        assert_eq!(canonical("break-words").as_deref(), Some("wrap-break-word"));
        assert_eq!(canonical("text-regular").as_deref(), Some("font-normal"));
        assert_eq!(canonical("font-standard").as_deref(), Some("font-normal"));
        assert_eq!(canonical("sm:flex-grow!").as_deref(), Some("sm:grow!"));
    }

    #[test]
    fn test_pixels_to_scale() {
        assert_eq!(canonical("mt-[2px]").as_deref(), Some("mt-0.5"));
        assert_eq!(canonical("mt-[-20px]").as_deref(), Some("-mt-5"));
        assert_eq!(canonical("-mt-[20px]").as_deref(), Some("-mt-5"));
        assert_eq!(canonical("-mt-[-8px]").as_deref(), Some("mt-2"));
        assert_eq!(canonical("before:top-[-4px]").as_deref(), Some("before:-top-1"));
        assert_eq!(canonical("space-x-[16px]").as_deref(), Some("space-x-4"));
        assert_eq!(canonical("inset-x-[0px]").as_deref(), Some("inset-x-0"));
        assert_eq!(canonical("p-[1px]").as_deref(), Some("p-px"));
        assert_eq!(canonical("p-[13px]").as_deref(), Some("p-3"));
        assert_eq!(canonical("mt-[2rem]"), None);
        assert_eq!(canonical("w-[2px]"), None);
    }

    #[test]
    fn test_z_index() {
        assert_eq!(canonical("z-[10]").as_deref(), Some("z-10"));
        assert_eq!(canonical("z-[-1]").as_deref(), Some("-z-1"));
        assert_eq!(canonical("md:z-[999]").as_deref(), Some("md:z-999"));
        assert_eq!(canonical("z-[calc(1+1)]"), None);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        assert_eq!(rewrite("!flex-grow").map(|(name, _)| name), Some("important-position"));
        assert_eq!(rewrite("bg-grey-500").map(|(name, _)| name), Some("american-spelling"));
    }
}
