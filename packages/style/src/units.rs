//! CSS length and flex shorthand parsing for style inputs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static LENGTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d*\.?\d+)(px|%|em|rem|vw|vh)?$").expect("valid regex"));

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d*\.?\d+$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CssUnit {
    #[serde(rename = "px")]
    Px,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "rem")]
    Rem,
    #[serde(rename = "vw")]
    Vw,
    #[serde(rename = "vh")]
    Vh,
    #[serde(rename = "auto")]
    Auto,
    /// No unit / not a length
    #[serde(rename = "-")]
    None,
}

impl CssUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            CssUnit::Px => "px",
            CssUnit::Percent => "%",
            CssUnit::Em => "em",
            CssUnit::Rem => "rem",
            CssUnit::Vw => "vw",
            CssUnit::Vh => "vh",
            CssUnit::Auto => "auto",
            CssUnit::None => "-",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "px" => Some(CssUnit::Px),
            "%" => Some(CssUnit::Percent),
            "em" => Some(CssUnit::Em),
            "rem" => Some(CssUnit::Rem),
            "vw" => Some(CssUnit::Vw),
            "vh" => Some(CssUnit::Vh),
            "auto" => Some(CssUnit::Auto),
            "-" => Some(CssUnit::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssValue {
    pub value: String,
    pub unit: CssUnit,
}

impl CssValue {
    fn unparsed() -> Self {
        Self {
            value: String::new(),
            unit: CssUnit::None,
        }
    }

    /// Back to CSS text; None when there is nothing to write
    pub fn to_css(&self) -> Option<String> {
        match self.unit {
            CssUnit::Auto => Some("auto".to_string()),
            _ if self.value.is_empty() => None,
            CssUnit::None => Some(self.value.clone()),
            unit => Some(format!("{}{}", self.value, unit.as_str())),
        }
    }
}

/// Split a CSS length into number and unit.
///
/// `"0"` is unit-agnostic and takes `default_unit`. Other bare numbers keep
/// their value with unit `-`. Anything else is unparseable: empty value, unit `-`.
pub fn parse_css_value(value: Option<&str>, default_unit: CssUnit) -> CssValue {
    let Some(value) = value.map(str::trim) else {
        return CssValue::unparsed();
    };

    if value == "0" {
        return CssValue {
            value: "0".to_string(),
            unit: default_unit,
        };
    }
    if value == "auto" {
        return CssValue {
            value: String::new(),
            unit: CssUnit::Auto,
        };
    }

    match LENGTH_RE.captures(value) {
        Some(caps) => CssValue {
            value: caps[1].to_string(),
            unit: caps
                .get(2)
                .and_then(|m| CssUnit::parse(m.as_str()))
                .unwrap_or(CssUnit::None),
        },
        None => CssValue::unparsed(),
    }
}

pub fn is_number(token: &str) -> bool {
    NUMBER_RE.is_match(token)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexValue {
    pub grow: String,
    pub shrink: String,
    pub basis: String,
}

impl Default for FlexValue {
    fn default() -> Self {
        Self {
            grow: "1".to_string(),
            shrink: "1".to_string(),
            basis: "0".to_string(),
        }
    }
}

impl FlexValue {
    pub fn to_css(&self) -> String {
        format!("{} {} {}", self.grow, self.shrink, self.basis)
    }

    pub fn basis_value(&self) -> CssValue {
        parse_css_value(Some(&self.basis), CssUnit::Px)
    }
}

/// Parse the `flex` shorthand into grow/shrink/basis.
///
/// One token is `grow` when numeric, otherwise `basis`. Two tokens are
/// `grow shrink` when the second is numeric, otherwise `grow basis`. Three
/// tokens are positional. Missing parts keep the defaults `1 1 0`.
pub fn parse_flex(value: Option<&str>) -> FlexValue {
    let mut flex = FlexValue::default();
    let Some(value) = value else {
        return flex;
    };

    match value.trim() {
        "none" => {
            return FlexValue {
                grow: "0".to_string(),
                shrink: "0".to_string(),
                basis: "auto".to_string(),
            }
        }
        "initial" => {
            return FlexValue {
                grow: "0".to_string(),
                shrink: "1".to_string(),
                basis: "auto".to_string(),
            }
        }
        _ => {}
    }

    let tokens: Vec<&str> = value.split_whitespace().collect();
    match tokens.as_slice() {
        [] => {}
        [single] => {
            if is_number(single) {
                flex.grow = single.to_string();
            } else {
                flex.basis = single.to_string();
            }
        }
        [grow, second] => {
            flex.grow = grow.to_string();
            if is_number(second) {
                flex.shrink = second.to_string();
            } else {
                flex.basis = second.to_string();
            }
        }
        [grow, shrink, basis, ..] => {
            flex.grow = grow.to_string();
            flex.shrink = shrink.to_string();
            flex.basis = basis.to_string();
        }
    }
    flex
}
