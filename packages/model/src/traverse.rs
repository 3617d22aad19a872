//! Read-only walks over the component tree.
//!
//! Walks are stack based so arbitrarily deep trees never overflow the call
//! stack. Missing child ids are skipped.

use crate::component::Component;
use crate::context::SiteContext;
use crate::site::{Page, Site};

/// Pre-order iterator over a subtree
pub struct PreOrder<'a> {
    context: &'a SiteContext,
    stack: Vec<&'a str>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Component;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(component) = self.context.component(id) {
                self.stack
                    .extend(component.children.iter().rev().map(String::as_str));
                return Some(component);
            }
        }
        None
    }
}

pub fn iter_subtree<'a>(context: &'a SiteContext, root_id: &'a str) -> PreOrder<'a> {
    PreOrder {
        context,
        stack: vec![root_id],
    }
}

/// Iterate every page tree, in page order
pub fn iter_site(site: &Site) -> impl Iterator<Item = &Component> {
    site.page_order
        .iter()
        .filter_map(|route| site.pages.get(route))
        .flat_map(|page| iter_subtree(&site.context, &page.root_id))
}

pub fn find_in_subtree<'a, F>(
    context: &'a SiteContext,
    root_id: &'a str,
    mut predicate: F,
) -> Option<&'a Component>
where
    F: FnMut(&Component) -> bool,
{
    iter_subtree(context, root_id).find(|c| predicate(c))
}

/// Lookup through the flat table
pub fn find_component<'a>(site: &'a Site, id: &str) -> Option<&'a Component> {
    site.context.component(id)
}

/// Lookup by walking page trees; must agree with [`find_component`]
pub fn find_component_in_tree<'a>(site: &'a Site, id: &str) -> Option<&'a Component> {
    iter_site(site).find(|c| c.id == id)
}

/// Parent chain, nearest ancestor first
pub struct Ancestors<'a> {
    context: &'a SiteContext,
    next: Option<&'a str>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Component;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        let component = self.context.component(id)?;
        self.next = component.parent_id.as_deref();
        Some(component)
    }
}

pub fn ancestors<'a>(context: &'a SiteContext, id: &str) -> Ancestors<'a> {
    let next = context
        .component(id)
        .and_then(|c| c.parent_id.as_deref());
    Ancestors { context, next }
}

pub fn root_of<'a>(context: &'a SiteContext, id: &'a str) -> Option<&'a str> {
    let component = context.component(id)?;
    Some(
        ancestors(context, id)
            .last()
            .map(|c| c.id.as_str())
            .unwrap_or(component.id.as_str()),
    )
}

/// Page whose tree contains the component
pub fn find_owning_page<'a>(site: &'a Site, id: &str) -> Option<&'a Page> {
    let root = root_of(&site.context, id)?;
    site.pages.values().find(|page| page.root_id == root)
}

pub fn is_descendant(context: &SiteContext, ancestor_id: &str, id: &str) -> bool {
    ancestors(context, id).any(|c| c.id == ancestor_id)
}

/// Ids of every node strictly below `id`, pre-order
pub fn descendant_ids(context: &SiteContext, id: &str) -> Vec<String> {
    iter_subtree(context, id)
        .skip(1)
        .map(|c| c.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Tag;
    use crate::tree::insert_template;
    use crate::ComponentTemplate;

    fn sample_site() -> Site {
        let mut site = Site::new("Demo", "demo", "1");
        let root = site.page("/").unwrap().root_id.clone();
        let mut tree = ComponentTemplate::new("Section", Tag::Section)
            .with_child(ComponentTemplate::new("Title", Tag::H1).with_content("Hi"))
            .with_child(
                ComponentTemplate::new("Row", Tag::Div)
                    .with_child(ComponentTemplate::new("Cell", Tag::Span)),
            );
        insert_template(&mut site.context, &mut tree, &root, None).unwrap();
        site
    }

    #[test]
    fn test_pre_order() {
        let site = sample_site();
        let names: Vec<_> = iter_site(&site).map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "Section", "Title", "Row", "Cell"]);
    }

    #[test]
    fn test_flat_and_tree_lookup_agree() {
        let site = sample_site();
        for id in site.context.components.keys() {
            assert_eq!(find_component(&site, id), find_component_in_tree(&site, id));
        }
        assert!(find_component(&site, "demo-c-99").is_none());
        assert!(find_component_in_tree(&site, "demo-c-99").is_none());
    }

    #[test]
    fn test_owning_page_and_ancestors() {
        let site = sample_site();
        let cell = iter_site(&site).find(|c| c.name == "Cell").unwrap();

        let chain: Vec<_> = ancestors(&site.context, &cell.id)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(chain, vec!["Row", "Section", "Root"]);

        assert_eq!(find_owning_page(&site, &cell.id).unwrap().route, "/");
        let section = iter_site(&site).find(|c| c.name == "Section").unwrap();
        assert!(is_descendant(&site.context, &section.id, &cell.id));
        assert!(!is_descendant(&site.context, &cell.id, &section.id));
        assert_eq!(descendant_ids(&site.context, &section.id).len(), 3);
    }

    #[test]
    fn test_deep_tree_does_not_overflow() {
        let mut site = Site::new("Deep", "deep", "1");
        let mut parent = site.page("/").unwrap().root_id.clone();
        for _ in 0..20_000 {
            let mut t = ComponentTemplate::new("Box", Tag::Div);
            parent = insert_template(&mut site.context, &mut t, &parent, None).unwrap();
        }
        assert_eq!(iter_site(&site).count(), 20_001);
        assert_eq!(ancestors(&site.context, &parent).count(), 20_000);
    }
}
