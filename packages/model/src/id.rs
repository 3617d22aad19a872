use crate::context::SiteContext;

/// Namespace of entities shipped with the builder rather than authored in a site
pub const BUILTIN_NAMESPACE: &str = "builtin";

/// Kind tag embedded in a typed id (`<namespace>-<kind>-<n>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Component,
    Style,
    Behavior,
    Breakpoint,
}

impl IdKind {
    pub fn tag(self) -> &'static str {
        match self {
            IdKind::Component => "c",
            IdKind::Style => "m",
            IdKind::Behavior => "b",
            IdKind::Breakpoint => "bp",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "c" => Some(IdKind::Component),
            "m" => Some(IdKind::Style),
            "b" => Some(IdKind::Behavior),
            "bp" => Some(IdKind::Breakpoint),
            _ => None,
        }
    }
}

/// Take the next value from the context counter.
///
/// The counter only moves forward; deleting an entity never returns its
/// number to the pool.
pub fn next_id(context: &mut SiteContext) -> String {
    let id = context.next_id;
    context.next_id += 1;
    id.to_string()
}

pub fn format_id(namespace: &str, kind: IdKind, n: &str) -> String {
    format!("{}-{}-{}", namespace, kind.tag(), n)
}

fn typed_id(context: &mut SiteContext, kind: IdKind) -> String {
    let n = next_id(context);
    format_id(&context.namespace, kind, &n)
}

pub fn component_id(context: &mut SiteContext) -> String {
    typed_id(context, IdKind::Component)
}

pub fn style_id(context: &mut SiteContext) -> String {
    typed_id(context, IdKind::Style)
}

pub fn behavior_id(context: &mut SiteContext) -> String {
    typed_id(context, IdKind::Behavior)
}

pub fn breakpoint_id(context: &mut SiteContext) -> String {
    typed_id(context, IdKind::Breakpoint)
}

/// Split a typed id into `(namespace, kind, n)`.
///
/// Namespaces may themselves contain dashes, so the id is split from the right.
pub fn parse_id(id: &str) -> Option<(&str, IdKind, &str)> {
    let mut parts = id.rsplitn(3, '-');
    let n = parts.next()?;
    let kind = IdKind::from_tag(parts.next()?)?;
    let namespace = parts.next()?;
    if namespace.is_empty() || n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((namespace, kind, n))
}

pub fn id_namespace(id: &str) -> Option<&str> {
    parse_id(id).map(|(namespace, _, _)| namespace)
}
