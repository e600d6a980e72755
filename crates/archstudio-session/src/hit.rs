//! Resolve a canvas point to the thing under it.

use archstudio_core::{Diagram, ElementId, GroupId};
use archstudio_geometry::{Point, ResizeCorner};

/// What a pointer landed on, in paint order from the top
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Element(ElementId),
    GroupHandle(GroupId, ResizeCorner),
    Group(GroupId),
    Canvas,
}

/// Find the topmost target at `p`.
///
/// Elements paint above groups, and later entries paint above earlier ones, so
/// each collection is searched back to front. A group's handles sit on top of
/// its own body but under any group painted above it.
pub fn hit_test(diagram: &Diagram, p: Point, handle_radius: f64, include_groups: bool) -> HitTarget {
    if let Some(element) = diagram.elements().rev().find(|e| e.rect().contains(p)) {
        return HitTarget::Element(element.id);
    }
    if !include_groups {
        return HitTarget::Canvas;
    }
    for group in diagram.groups().rev() {
        let rect = group.rect();
        if let Some(corner) = ResizeCorner::ALL
            .into_iter()
            .find(|&c| rect.corner(c).distance_to(p) <= handle_radius)
        {
            return HitTarget::GroupHandle(group.id, corner);
        }
        if rect.contains(p) {
            return HitTarget::Group(group.id);
        }
    }
    HitTarget::Canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use archstudio_core::{ElementKind, IdGenerator};
    use archstudio_geometry::Size;

    fn diagram() -> (Diagram, ElementId, GroupId) {
        let mut diagram = Diagram::with_id_generator(IdGenerator::sequential());
        let group = diagram.add_group("G", "#fff", None, Point::new(100.0, 100.0), Size::new(400.0, 250.0));
        let element = diagram.add_element(ElementKind::Microservice, "svc", Point::new(150.0, 150.0));
        (diagram, element.id, group.id)
    }

    #[test]
    fn element_wins_over_group() {
        let (diagram, element, group) = diagram();
        assert_eq!(hit_test(&diagram, Point::new(160.0, 160.0), 8.0, true), HitTarget::Element(element));
        assert_eq!(hit_test(&diagram, Point::new(450.0, 300.0), 8.0, true), HitTarget::Group(group));
        assert_eq!(hit_test(&diagram, Point::new(10.0, 10.0), 8.0, true), HitTarget::Canvas);
    }

    #[test]
    fn corners_resolve_to_handles() {
        let (diagram, _, group) = diagram();
        assert_eq!(
            hit_test(&diagram, Point::new(503.0, 348.0), 8.0, true),
            HitTarget::GroupHandle(group, ResizeCorner::Se)
        );
        assert_eq!(
            hit_test(&diagram, Point::new(96.0, 100.0), 8.0, true),
            HitTarget::GroupHandle(group, ResizeCorner::Nw)
        );
    }

    #[test]
    fn upper_group_body_covers_lower_handle() {
        let (mut diagram, _, lower) = diagram();
        let upper = diagram.add_group("Top", "#000", None, Point::new(400.0, 250.0), Size::new(300.0, 200.0));

        // Lower group's Se corner (500, 350) lies inside the upper body
        assert_eq!(hit_test(&diagram, Point::new(500.0, 350.0), 8.0, true), HitTarget::Group(upper.id));
        // Its Ne corner (500, 100) is uncovered
        assert_eq!(
            hit_test(&diagram, Point::new(500.0, 100.0), 8.0, true),
            HitTarget::GroupHandle(lower, ResizeCorner::Ne)
        );
        // Upper handles still win over the lower body
        assert_eq!(
            hit_test(&diagram, Point::new(402.0, 252.0), 8.0, true),
            HitTarget::GroupHandle(upper.id, ResizeCorner::Nw)
        );
    }

    #[test]
    fn hidden_groups_are_not_hit() {
        let (diagram, _, _) = diagram();
        assert_eq!(hit_test(&diagram, Point::new(450.0, 300.0), 8.0, false), HitTarget::Canvas);
    }
}
