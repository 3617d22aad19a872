//! # Sitebuilder Model
//!
//! Document data model for the site builder.
//!
//! ```text
//! Site
//!  ├─ SiteContext      id counter, component table, mixins, behaviors,
//!  │                   breakpoints, theme, translations, custom sets
//!  ├─ pages            route -> Page { root_id }
//!  ├─ defaults         site-wide head
//!  └─ editor           active page/breakpoint/pseudo-class, selection
//! ```
//!
//! Components are stored flat in the context and linked by id. The page tree
//! is the primary structure; the table makes id lookups cheap.

pub mod breakpoint;
pub mod component;
pub mod context;
pub mod error;
pub mod id;
pub mod resolve;
pub mod site;
pub mod style;
pub mod traverse;
pub mod tree;

pub use breakpoint::{compare_breakpoints, default_breakpoint, sorted_breakpoints, Breakpoint};
pub use component::{
    Component, ComponentEvent, ComponentInput, ComponentTemplate, EventBehavior, InputType, Tag,
};
pub use context::{Behavior, BehaviorArg, FontSource, SiteContext, Theme, ThemeFont};
pub use error::{ModelError, ModelResult};
pub use id::{IdKind, BUILTIN_NAMESPACE};
pub use resolve::{
    id_scope, instantiate_reusable, resolve_breakpoint, resolve_mixin, resolve_reusable_component,
    BuiltinRegistry, IdScope,
};
pub use site::{
    default_breakpoint_id, EditorState, HeadTag, HeadTagKind, Page, PageHead, Site, SiteDefaults,
};
pub use style::{
    ComponentStyle, PseudoClass, PseudoStyle, RawStyle, StyleEntry, StyleMixin, StyleProperties,
};
