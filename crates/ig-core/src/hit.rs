//! Hit testing: point / rectangle → element lookup.
//!
//! Element geometry is in document coordinates. Children are tested in
//! reverse order (last painted = topmost) before their parent.

use crate::element::ElementTree;
use crate::id::ElementId;
use crate::role::ElementRole;
use kurbo::{Point, Rect};

/// Find the topmost element at `(px, py)`.
///
/// Returns the document element itself when the point is inside the
/// document but over no other element, and `None` when it is outside.
/// Overlay visuals that must not capture the pointer (highlight masks,
/// brush rectangle) are skipped; resize handles are hittable.
pub fn hit_test(tree: &ElementTree, px: f64, py: f64) -> Option<ElementId> {
    let p = Point::new(px, py);
    let document = tree.document();
    if let Some(hit) = hit_children(tree, document, p) {
        return Some(hit);
    }
    match tree.bounds(document) {
        Some(b) if b.contains(p) => Some(document),
        Some(_) => None,
        // An unsized document accepts every point.
        None => Some(document),
    }
}

fn hit_children(tree: &ElementTree, id: ElementId, p: Point) -> Option<ElementId> {
    for child in tree.children(id).into_iter().rev() {
        if let Some(hit) = hit_children(tree, child, p) {
            return Some(hit);
        }
        let Some(el) = tree.get(child) else { continue };
        if matches!(
            el.role,
            ElementRole::TransientContainer | ElementRole::Highlight | ElementRole::Brush
        ) {
            continue;
        }
        if el.bounds().is_some_and(|b| b.contains(p)) {
            return Some(child);
        }
    }
    None
}

/// All editable elements whose bounds touch `rect` (edges included), in
/// paint order. Used for brush (rubber-band) selection, where a brush may
/// be flat on one axis.
pub fn hit_test_rect(tree: &ElementTree, rect: Rect) -> Vec<ElementId> {
    tree.walk()
        .into_iter()
        .filter(|id| {
            tree.get(*id).is_some_and(|el| {
                el.role.is_editable()
                    && el.bounds().is_some_and(|b| {
                        b.x0 <= rect.x1 && rect.x0 <= b.x1 && b.y0 <= rect.y1 && rect.y0 <= b.y1
                    })
            })
        })
        .collect()
}

/// Walk up from `id` to the nearest element a user can edit.
pub fn resolve_editable(tree: &ElementTree, id: ElementId) -> Option<ElementId> {
    let mut current = Some(id);
    while let Some(c) = current {
        let el = tree.get(c)?;
        if el.role.is_transient() {
            return None;
        }
        if el.role.is_editable() {
            return Some(c);
        }
        current = tree.parent(c);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn tree() -> ElementTree {
        let mut tree = ElementTree::new(
            Element::group("svg", ElementRole::Document).with_rect(0.0, 0.0, 400.0, 300.0),
        );
        let svg = tree.document();
        tree.append(
            svg,
            Element::shape("a", ElementRole::ItemShape)
                .with_indexes(&[0])
                .with_rect(10.0, 10.0, 100.0, 100.0),
        );
        tree.append(
            svg,
            Element::shape("b", ElementRole::ItemShape)
                .with_indexes(&[1])
                .with_rect(50.0, 50.0, 100.0, 100.0),
        );
        tree
    }

    #[test]
    fn topmost_wins() {
        let tree = tree();
        assert_eq!(hit_test(&tree, 60.0, 60.0), Some(ElementId::intern("b")));
        assert_eq!(hit_test(&tree, 15.0, 15.0), Some(ElementId::intern("a")));
    }

    #[test]
    fn background_and_outside() {
        let tree = tree();
        assert_eq!(hit_test(&tree, 350.0, 250.0), Some(tree.document()));
        assert_eq!(hit_test(&tree, 500.0, 500.0), None);
    }

    #[test]
    fn rect_hits_intersecting_elements() {
        let tree = tree();
        let hits = hit_test_rect(&tree, Rect::new(0.0, 0.0, 30.0, 30.0));
        assert_eq!(hits, vec![ElementId::intern("a")]);
        let hits = hit_test_rect(&tree, Rect::new(0.0, 0.0, 400.0, 300.0));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn flat_rect_hits_what_it_crosses() {
        let tree = tree();
        let hits = hit_test_rect(&tree, Rect::new(0.0, 30.0, 400.0, 30.0));
        assert_eq!(hits, vec![ElementId::intern("a")]);
        // Touching an edge counts.
        let hits = hit_test_rect(&tree, Rect::new(150.0, 0.0, 150.0, 300.0));
        assert_eq!(hits, vec![ElementId::intern("b")]);
    }

    #[test]
    fn editable_resolution_walks_up() {
        let mut tree = tree();
        tree.append(
            ElementId::intern("a"),
            Element::shape("deco", ElementRole::Unknown),
        );
        assert_eq!(
            resolve_editable(&tree, ElementId::intern("deco")),
            Some(ElementId::intern("a"))
        );
        assert_eq!(resolve_editable(&tree, tree.document()), None);
    }
}
