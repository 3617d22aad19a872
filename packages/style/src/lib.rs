//! # Sitebuilder Style
//!
//! Responsive style resolution for site components.
//!
//! - [`resolver`]: flattens mixins, custom styles and instance overrides into
//!   one property map for a breakpoint and pseudo-class
//! - [`css`]: emits a stylesheet for a whole site
//! - [`units`]: CSS length and `flex` shorthand parsing used by style inputs
//! - [`theme`]: `${name}` placeholder substitution

pub mod css;
pub mod resolver;
pub mod theme;
pub mod units;

pub use css::{build_stylesheet, CssRule, Stylesheet};
pub use resolver::{is_instance_boundary, resolve_component_style, StyleResolver};
pub use theme::substitute_theme_variables;
pub use units::{is_number, parse_css_value, parse_flex, CssUnit, CssValue, FlexValue};
