use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Responsive width bucket. No bounds at all marks the catch-all breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakpoint {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u32>,
}

impl Breakpoint {
    pub fn is_default(&self) -> bool {
        self.min_width.is_none() && self.max_width.is_none()
    }

    /// Width used for ordering; an open upper bound counts as the largest
    pub fn effective_width(&self) -> u32 {
        self.max_width.unwrap_or(u32::MAX)
    }

    /// Media query text, or None for the catch-all breakpoint
    pub fn media_query(&self) -> Option<String> {
        match (self.min_width, self.max_width) {
            (None, None) => None,
            (Some(min), None) => Some(format!("@media (min-width: {}px)", min)),
            (None, Some(max)) => Some(format!("@media (max-width: {}px)", max)),
            (Some(min), Some(max)) => Some(format!(
                "@media (min-width: {}px) and (max-width: {}px)",
                min, max
            )),
        }
    }
}

/// Ascending by max width, unbounded breakpoints last
pub fn compare_breakpoints(a: &Breakpoint, b: &Breakpoint) -> Ordering {
    a.effective_width()
        .cmp(&b.effective_width())
        .then_with(|| a.min_width.unwrap_or(0).cmp(&b.min_width.unwrap_or(0)))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sorted_breakpoints(breakpoints: &BTreeMap<String, Breakpoint>) -> Vec<&Breakpoint> {
    let mut sorted: Vec<&Breakpoint> = breakpoints.values().collect();
    sorted.sort_by(|a, b| compare_breakpoints(a, b));
    sorted
}

/// The catch-all breakpoint, falling back to the widest one
pub fn default_breakpoint(breakpoints: &BTreeMap<String, Breakpoint>) -> Option<&Breakpoint> {
    breakpoints
        .values()
        .find(|bp| bp.is_default())
        .or_else(|| sorted_breakpoints(breakpoints).pop())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bp(id: &str, min: Option<u32>, max: Option<u32>) -> Breakpoint {
        Breakpoint {
            id: id.to_string(),
            name: id.to_string(),
            min_width: min,
            max_width: max,
        }
    }

    #[test]
    fn test_unbounded_sorts_last() {
        let mut map = BTreeMap::new();
        for b in [
            bp("a-default", None, None),
            bp("b-mobile", None, Some(480)),
            bp("c-tablet", Some(481), Some(900)),
        ] {
            map.insert(b.id.clone(), b);
        }

        let order: Vec<_> = sorted_breakpoints(&map).iter().map(|b| b.id.as_str()).collect();
        assert_eq!(order, vec!["b-mobile", "c-tablet", "a-default"]);
        assert_eq!(default_breakpoint(&map).unwrap().id, "a-default");
    }

    #[test]
    fn test_media_query() {
        assert_eq!(bp("d", None, None).media_query(), None);
        assert_eq!(
            bp("m", None, Some(480)).media_query().unwrap(),
            "@media (max-width: 480px)"
        );
        assert_eq!(
            bp("t", Some(481), Some(900)).media_query().unwrap(),
            "@media (min-width: 481px) and (max-width: 900px)"
        );
    }
}
