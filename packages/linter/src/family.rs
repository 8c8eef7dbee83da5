//! Property-family classification of base utilities.
//!
//! A family names the visual property a utility ultimately writes. Two
//! utilities in the same family and the same variant scope fight over one
//! property; that is what the conflict engine looks for.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

pub const DISPLAY_UTILITIES: &[&str] = &[
    "block",
    "inline",
    "inline-block",
    "flex",
    "inline-flex",
    "grid",
    "inline-grid",
    "flow-root",
    "hidden",
];

pub const POSITION_UTILITIES: &[&str] = &["static", "fixed", "absolute", "relative", "sticky"];

pub const TEXT_ALIGN_VALUES: &[&str] = &["left", "center", "right", "justify", "start", "end"];

pub const FONT_WEIGHT_VALUES: &[&str] = &[
    "thin",
    "extralight",
    "light",
    "normal",
    "medium",
    "semibold",
    "bold",
    "extrabold",
    "black",
];

const PALETTE: &[&str] = &[
    "slate", "gray", "zinc", "neutral", "stone", "red", "orange", "amber", "yellow", "lime",
    "green", "emerald", "teal", "cyan", "sky", "blue", "indigo", "violet", "purple", "fuchsia",
    "pink", "rose",
];

const KEYWORD_COLORS: &[&str] = &["black", "white", "transparent", "current", "inherit"];

static SPACING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(m|p)([xytrblse]?)-(.+)$").expect("spacing regex is valid")
});

static SIZING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(min-w|max-w|min-h|max-h|size|w|h)-(.+)$").expect("sizing regex is valid")
});

static NAMED_TEXT_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:xs|sm|base|lg|xl|[2-9]xl)$").expect("text size regex is valid")
});

static LENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?\d*\.?\d+(?:px|rem|em|%|vw|vh|vmin|vmax|pt|pc|ch|ex|lh|rlh|cqw|cqh|svh|lvh|dvh)?$")
        .expect("length regex is valid")
});

static PALETTE_SHADE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-z]+)-(50|[1-9]00|950)$").expect("palette regex is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpacingProperty {
    Margin,
    Padding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    All,
    X,
    Y,
    Top,
    Right,
    Bottom,
    Left,
    Start,
    End,
}

impl Side {
    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "" => Side::All,
            "x" => Side::X,
            "y" => Side::Y,
            "t" => Side::Top,
            "r" => Side::Right,
            "b" => Side::Bottom,
            "l" => Side::Left,
            "s" => Side::Start,
            "e" => Side::End,
            _ => return None,
        })
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Side::All => "",
            Side::X => "x",
            Side::Y => "y",
            Side::Top => "t",
            Side::Right => "r",
            Side::Bottom => "b",
            Side::Left => "l",
            Side::Start => "s",
            Side::End => "e",
        }
    }

    fn css_suffix(self) -> &'static str {
        match self {
            Side::All => "",
            Side::X => "-inline",
            Side::Y => "-block",
            Side::Top => "-top",
            Side::Right => "-right",
            Side::Bottom => "-bottom",
            Side::Left => "-left",
            Side::Start => "-inline-start",
            Side::End => "-inline-end",
        }
    }
}

impl SpacingProperty {
    pub fn abbreviation(self) -> &'static str {
        match self {
            SpacingProperty::Margin => "m",
            SpacingProperty::Padding => "p",
        }
    }

    fn css_name(self) -> &'static str {
        match self {
            SpacingProperty::Margin => "margin",
            SpacingProperty::Padding => "padding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKeyword {
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    Size,
}

impl SizeKeyword {
    fn from_prefix(prefix: &str) -> Option<Self> {
        Some(match prefix {
            "w" => SizeKeyword::Width,
            "h" => SizeKeyword::Height,
            "min-w" => SizeKeyword::MinWidth,
            "max-w" => SizeKeyword::MaxWidth,
            "min-h" => SizeKeyword::MinHeight,
            "max-h" => SizeKeyword::MaxHeight,
            "size" => SizeKeyword::Size,
            _ => return None,
        })
    }

    fn css_name(self) -> &'static str {
        match self {
            SizeKeyword::Width => "width",
            SizeKeyword::Height => "height",
            SizeKeyword::MinWidth => "min-width",
            SizeKeyword::MaxWidth => "max-width",
            SizeKeyword::MinHeight => "min-height",
            SizeKeyword::MaxHeight => "max-height",
            SizeKeyword::Size => "width and height",
        }
    }
}

/// Which visual property a utility controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyFamily {
    Spacing {
        property: SpacingProperty,
        side: Side,
    },
    Sizing(SizeKeyword),
    FontSize,
    FontWeight,
    LineHeight,
    LetterSpacing,
    TextAlign,
    TextColor,
    BackgroundColor,
    BorderColor,
    Display,
    Position,
}

/// Coarse grouping used to order conflict rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FamilyCategory {
    Spacing,
    Sizing,
    Typography,
    Color,
    Layout,
}

impl PropertyFamily {
    pub fn category(self) -> FamilyCategory {
        match self {
            PropertyFamily::Spacing { .. } => FamilyCategory::Spacing,
            PropertyFamily::Sizing(_) => FamilyCategory::Sizing,
            PropertyFamily::FontSize
            | PropertyFamily::FontWeight
            | PropertyFamily::LineHeight
            | PropertyFamily::LetterSpacing
            | PropertyFamily::TextAlign => FamilyCategory::Typography,
            PropertyFamily::TextColor
            | PropertyFamily::BackgroundColor
            | PropertyFamily::BorderColor => FamilyCategory::Color,
            PropertyFamily::Display | PropertyFamily::Position => FamilyCategory::Layout,
        }
    }
}

impl fmt::Display for PropertyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyFamily::Spacing { property, side } => {
                write!(f, "{}{}", property.css_name(), side.css_suffix())
            }
            PropertyFamily::Sizing(keyword) => f.write_str(keyword.css_name()),
            PropertyFamily::FontSize => f.write_str("font-size"),
            PropertyFamily::FontWeight => f.write_str("font-weight"),
            PropertyFamily::LineHeight => f.write_str("line-height"),
            PropertyFamily::LetterSpacing => f.write_str("letter-spacing"),
            PropertyFamily::TextAlign => f.write_str("text-align"),
            PropertyFamily::TextColor => f.write_str("text color"),
            PropertyFamily::BackgroundColor => f.write_str("background color"),
            PropertyFamily::BorderColor => f.write_str("border color"),
            PropertyFamily::Display => f.write_str("display"),
            PropertyFamily::Position => f.write_str("position"),
        }
    }
}

/// Classify a base utility (variants and markers already stripped).
pub fn classify(base: &str) -> Option<PropertyFamily> {
    let base = base.strip_prefix('-').unwrap_or(base);

    if DISPLAY_UTILITIES.contains(&base) {
        return Some(PropertyFamily::Display);
    }
    if POSITION_UTILITIES.contains(&base) {
        return Some(PropertyFamily::Position);
    }

    if let Some((property, side, _)) = spacing_parts(base) {
        return Some(PropertyFamily::Spacing { property, side });
    }

    if let Some(captures) = SIZING.captures(base) {
        return SizeKeyword::from_prefix(&captures[1]).map(PropertyFamily::Sizing);
    }

    if let Some(value) = base.strip_prefix("text-") {
        if is_text_size_value(value) {
            return Some(PropertyFamily::FontSize);
        }
        if TEXT_ALIGN_VALUES.contains(&value) {
            return Some(PropertyFamily::TextAlign);
        }
        if is_color_value(value) {
            return Some(PropertyFamily::TextColor);
        }
        return None;
    }

    if let Some(value) = base.strip_prefix("font-") {
        let is_weight = FONT_WEIGHT_VALUES.contains(&value)
            || bracketed(value).is_some_and(|inner| inner.parse::<u16>().is_ok());
        return is_weight.then_some(PropertyFamily::FontWeight);
    }

    if base.strip_prefix("leading-").is_some_and(|v| !v.is_empty()) {
        return Some(PropertyFamily::LineHeight);
    }
    if base.strip_prefix("tracking-").is_some_and(|v| !v.is_empty()) {
        return Some(PropertyFamily::LetterSpacing);
    }

    if let Some(value) = base.strip_prefix("bg-") {
        return is_color_value(value).then_some(PropertyFamily::BackgroundColor);
    }
    if let Some(value) = base.strip_prefix("border-") {
        return is_color_value(value).then_some(PropertyFamily::BorderColor);
    }

    None
}

/// Split a margin/padding utility into its property, side and value.
pub fn spacing_parts(base: &str) -> Option<(SpacingProperty, Side, &str)> {
    let captures = SPACING.captures(base)?;
    let property = match &captures[1] {
        "m" => SpacingProperty::Margin,
        _ => SpacingProperty::Padding,
    };
    let side = Side::from_suffix(&captures[2])?;
    let value = captures.get(3)?.as_str();
    Some((property, side, value))
}

/// True for `text-*` utilities that set a font size rather than a color.
/// `text-sm`, `text-2xl/7` and `text-[14px]` are sizes; `text-sky-400` and
/// `text-[red]` are not.
pub fn is_text_size(base: &str) -> bool {
    base.strip_prefix("text-").is_some_and(is_text_size_value)
}

fn is_text_size_value(value: &str) -> bool {
    if let Some(inner) = bracketed(value) {
        return is_length_literal(inner);
    }
    let value = value.split_once('/').map_or(value, |(size, _)| size);
    NAMED_TEXT_SIZE.is_match(value)
}

fn is_length_literal(inner: &str) -> bool {
    if let Some(rest) = inner.strip_prefix("length:") {
        return !rest.is_empty();
    }
    LENGTH.is_match(inner)
        || ["calc(", "clamp(", "min(", "max("]
            .iter()
            .any(|function| inner.starts_with(function))
}

fn is_color_value(value: &str) -> bool {
    let value = strip_opacity(value);

    if let Some(inner) = bracketed(value) {
        if let Some((hint, _)) = inner.split_once(':') {
            return hint == "color";
        }
        return !is_length_literal(inner) && !inner.starts_with("url(");
    }

    if KEYWORD_COLORS.contains(&value) {
        return true;
    }

    PALETTE_SHADE
        .captures(value)
        .is_some_and(|captures| PALETTE.contains(&&captures[1]))
}

fn strip_opacity(value: &str) -> &str {
    if value.starts_with('[') {
        return value.find(']').map_or(value, |end| &value[..=end]);
    }
    value.split_once('/').map_or(value, |(color, _)| color)
}

fn bracketed(value: &str) -> Option<&str> {
    value.strip_prefix('[')?.strip_suffix(']')
}
