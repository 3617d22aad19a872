use regex::Regex;
use sitebuilder_model::Theme;
use std::sync::LazyLock;
use tracing::warn;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid regex"));

/// Replace `${name}` placeholders with theme variables.
///
/// Returns None if any placeholder names a missing variable.
pub fn substitute_theme_variables(value: &str, theme: &Theme) -> Option<String> {
    if !value.contains("${") {
        return Some(value.to_string());
    }

    let mut missing = None;
    let substituted = PLACEHOLDER_RE.replace_all(value, |caps: &regex::Captures| {
        let name = caps[1].trim();
        match theme.variables.get(name) {
            Some(v) => v.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(variable) => {
            warn!(%variable, value, "Theme variable not found");
            None
        }
        None => Some(substituted.into_owned()),
    }
}
