use archstudio_geometry::{
    resize_rect, to_canvas_space, Point, Rect, ResizeCorner, Size, MIN_GROUP_HEIGHT,
    MIN_GROUP_WIDTH,
};
use proptest::prelude::*;

fn corner() -> impl Strategy<Value = ResizeCorner> {
    prop_oneof![
        Just(ResizeCorner::Nw),
        Just(ResizeCorner::Ne),
        Just(ResizeCorner::Sw),
        Just(ResizeCorner::Se),
    ]
}

proptest! {
    #[test]
    fn resize_never_goes_below_floor(
        x in 0.0f64..2000.0,
        y in 0.0f64..2000.0,
        w in MIN_GROUP_WIDTH..1500.0,
        h in MIN_GROUP_HEIGHT..1500.0,
        steps in prop::collection::vec((corner(), -500.0f64..3000.0, -500.0f64..3000.0), 1..20),
    ) {
        let mut rect = Rect::new(x, y, w, h);
        for (c, px, py) in steps {
            rect = resize_rect(rect, c, Point::new(px, py), Size::MIN_GROUP);
            prop_assert!(rect.width >= MIN_GROUP_WIDTH);
            prop_assert!(rect.height >= MIN_GROUP_HEIGHT);
            prop_assert!(rect.x >= 0.0);
            prop_assert!(rect.y >= 0.0);
        }
    }

    #[test]
    fn se_resize_never_moves_origin(
        x in 0.0f64..2000.0,
        y in 0.0f64..2000.0,
        px in -500.0f64..3000.0,
        py in -500.0f64..3000.0,
    ) {
        let rect = Rect::new(x, y, 400.0, 250.0);
        let out = resize_rect(rect, ResizeCorner::Se, Point::new(px, py), Size::MIN_GROUP);
        prop_assert_eq!(out.origin(), rect.origin());
    }

    #[test]
    fn canvas_delta_scales_with_zoom(
        cx in 0.0f64..2000.0,
        cy in 0.0f64..2000.0,
        dx in -300.0f64..300.0,
        dy in -300.0f64..300.0,
        zoom in 50u16..=200,
    ) {
        let origin = Point::new(32.0, 32.0);
        let a = to_canvas_space(Point::new(cx, cy), origin, zoom);
        let b = to_canvas_space(Point::new(cx + dx, cy + dy), origin, zoom);
        let k = f64::from(zoom) / 100.0;
        prop_assert!(((b.x - a.x) - dx / k).abs() < 1e-6);
        prop_assert!(((b.y - a.y) - dy / k).abs() < 1e-6);
    }
}
