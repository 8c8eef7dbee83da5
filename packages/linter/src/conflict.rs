//! Pairwise conflict detection between utility classes.

use crate::extract::extract_tokens;
use crate::family::{is_text_size, FamilyCategory, PropertyFamily};
use crate::lookup::PropertyLookup;
use crate::token::ClassToken;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

/// Two classes that write the same property in the same scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub classes: [String; 2],
    pub reason: String,
    pub fixable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_fix: Option<ConflictFix>,
}

/// Resolution for a fixable conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictFix {
    /// Human-readable recommendation naming both classes.
    pub message: String,
    /// The single class to keep in place of the pair.
    pub replacement: String,
}

impl Conflict {
    fn new(a: &ClassToken, b: &ClassToken, reason: String, fixable: bool) -> Self {
        let suggested_fix = fixable.then(|| ConflictFix {
            message: format!("Keep `{}` and remove `{}`", b.raw(), a.raw()),
            replacement: b.raw().to_string(),
        });
        Self {
            classes: [a.raw().to_string(), b.raw().to_string()],
            reason,
            fixable,
            suggested_fix,
        }
    }

    pub fn involves(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// One row of the conflict table. Rows are tried in order and the first
/// match decides the verdict for a pair.
struct ConflictRule {
    name: &'static str,
    fixable: bool,
    matches: fn(&ClassToken, &ClassToken) -> bool,
}

static CONFLICT_RULES: &[ConflictRule] = &[
    ConflictRule {
        name: "spacing",
        fixable: true,
        matches: same_spacing,
    },
    ConflictRule {
        name: "sizing",
        fixable: true,
        matches: same_sizing,
    },
    ConflictRule {
        name: "typography",
        fixable: false,
        matches: same_typography,
    },
    ConflictRule {
        name: "color",
        fixable: false,
        matches: same_color,
    },
    ConflictRule {
        name: "layout",
        fixable: false,
        matches: same_layout,
    },
];

fn same_family_in(a: &ClassToken, b: &ClassToken, category: FamilyCategory) -> bool {
    match (a.family(), b.family()) {
        (Some(fa), Some(fb)) => fa == fb && fa.category() == category,
        _ => false,
    }
}

fn same_spacing(a: &ClassToken, b: &ClassToken) -> bool {
    same_family_in(a, b, FamilyCategory::Spacing)
}

fn same_sizing(a: &ClassToken, b: &ClassToken) -> bool {
    same_family_in(a, b, FamilyCategory::Sizing)
}

fn same_typography(a: &ClassToken, b: &ClassToken) -> bool {
    same_family_in(a, b, FamilyCategory::Typography)
}

fn same_color(a: &ClassToken, b: &ClassToken) -> bool {
    !is_text_size(a.unsigned_base())
        && !is_text_size(b.unsigned_base())
        && same_family_in(a, b, FamilyCategory::Color)
}

fn same_layout(a: &ClassToken, b: &ClassToken) -> bool {
    matches!(
        (a.family(), b.family()),
        (Some(PropertyFamily::Display), Some(PropertyFamily::Display))
            | (Some(PropertyFamily::Position), Some(PropertyFamily::Position))
    )
}

/// Same property family, different scope: `mt-4` and `md:mt-6` apply at
/// different breakpoints and never fight.
pub fn are_variant_siblings(a: &ClassToken, b: &ClassToken) -> bool {
    a.family().is_some() && a.family() == b.family() && a.scope() != b.scope()
}

/// Detect conflicting class pairs using the pattern rules alone.
pub fn detect(fragment: &str, source_path: &str) -> Vec<Conflict> {
    detect_pairs(fragment, source_path, None)
}

/// Detect conflicting class pairs, letting `lookup` overrule the pattern
/// rules wherever it knows the declared properties of both classes.
pub fn detect_with_lookup(
    fragment: &str,
    source_path: &str,
    lookup: &dyn PropertyLookup,
) -> Vec<Conflict> {
    detect_pairs(fragment, source_path, Some(lookup))
}

#[instrument(skip(fragment, lookup))]
fn detect_pairs(
    fragment: &str,
    source_path: &str,
    lookup: Option<&dyn PropertyLookup>,
) -> Vec<Conflict> {
    let tokens = extract_tokens(fragment);
    if tokens.len() < 2 {
        return Vec::new();
    }

    let mut conflicts = Vec::new();
    for (index, a) in tokens.iter().enumerate() {
        for b in &tokens[index + 1..] {
            if are_variant_siblings(a, b) {
                trace!(a = a.raw(), b = b.raw(), "Skipping variant siblings");
                continue;
            }

            let local = classify_pair(a, b);
            let verdict = match lookup {
                Some(lookup) => corroborate(lookup, a, b, local),
                None => local,
            };
            conflicts.extend(verdict);
        }
    }

    debug!(tokens = tokens.len(), conflicts = conflicts.len(), "Conflict detection complete");
    conflicts
}

fn classify_pair(a: &ClassToken, b: &ClassToken) -> Option<Conflict> {
    let rule = CONFLICT_RULES.iter().find(|rule| (rule.matches)(a, b))?;
    let family = a.family()?;
    trace!(rule = rule.name, a = a.raw(), b = b.raw(), "Conflict rule matched");

    let reason = if rule.fixable {
        format!("`{}` and `{}` both set {}", a.raw(), b.raw(), family)
    } else {
        format!(
            "`{}` and `{}` both set {}; keep the one that matches the intended design",
            a.raw(),
            b.raw(),
            family
        )
    };
    Some(Conflict::new(a, b, reason, rule.fixable))
}

fn corroborate(
    lookup: &dyn PropertyLookup,
    a: &ClassToken,
    b: &ClassToken,
    local: Option<Conflict>,
) -> Option<Conflict> {
    if a.scope() != b.scope() {
        return local;
    }

    let declared = lookup
        .declared_properties(a.base())
        .and_then(|pa| lookup.declared_properties(b.base()).map(|pb| (pa, pb)));
    let (pa, pb) = match declared {
        Ok((pa, pb)) if !pa.is_empty() && !pb.is_empty() => (pa, pb),
        Ok(_) => return local,
        Err(error) => {
            debug!(%error, "Property lookup failed, using pattern rules");
            return local;
        }
    };

    let pa: BTreeSet<_> = pa.iter().map(String::as_str).collect();
    let pb: BTreeSet<_> = pb.iter().map(String::as_str).collect();
    if pa != pb {
        return None;
    }

    local.or_else(|| {
        let properties = pa.into_iter().collect::<Vec<_>>().join(", ");
        Some(Conflict::new(
            a,
            b,
            format!("`{}` and `{}` both declare {}", a.raw(), b.raw(), properties),
            false,
        ))
    })
}
