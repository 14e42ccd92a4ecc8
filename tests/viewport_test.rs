use cgmath::Deg;
use scroll_stage::{
    camera::Projection,
    viewport::{MAX_PIXEL_RATIO, ViewportState, clamp_pixel_ratio, resize},
};

use crate::common::test_utils::{FixedHost, RecordingSurface};

mod common;

fn projection() -> Projection {
    Projection::new(1, 1, Deg(40.0), 0.1, 100.0)
}

#[test]
fn should_match_container_aspect_and_backing_size() {
    let mut viewport = ViewportState::default();
    let mut projection = projection();
    let mut surface = RecordingSurface::default();
    let host = FixedHost {
        size: (800, 600),
        pixel_ratio: 1.5,
    };

    resize(&mut viewport, &mut projection, &mut surface, &host);

    assert!((projection.aspect() - 800.0 / 600.0).abs() < 1e-6);
    assert_eq!(viewport, ViewportState::new(800, 600, 1.5));
    assert_eq!(surface.calls, vec![(1200, 900, 1.5)]);
}

#[test]
fn should_clamp_pixel_ratio_to_two() {
    let mut viewport = ViewportState::default();
    let mut projection = projection();
    let mut surface = RecordingSurface::default();
    let host = FixedHost {
        size: (1000, 500),
        pixel_ratio: 3.0,
    };

    resize(&mut viewport, &mut projection, &mut surface, &host);

    assert_eq!(viewport.pixel_ratio, MAX_PIXEL_RATIO);
    assert_eq!(surface.calls, vec![(2000, 1000, 2.0)]);
}

#[test]
fn should_floor_fractional_backing_sizes() {
    let viewport = ViewportState::new(333, 101, 1.25);
    assert_eq!(viewport.backing_size(), (416, 126));
}

#[test]
fn should_treat_invalid_ratios_as_one() {
    assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
    assert_eq!(clamp_pixel_ratio(0.0), 1.0);
    assert_eq!(clamp_pixel_ratio(-2.0), 1.0);
    assert_eq!(clamp_pixel_ratio(0.5), 0.5);
}

#[test]
fn should_apply_every_resize_in_order() {
    let mut viewport = ViewportState::default();
    let mut projection = projection();
    let mut surface = RecordingSurface::default();

    for size in [(400, 400), (800, 400), (400, 800)] {
        let host = FixedHost {
            size,
            pixel_ratio: 1.0,
        };
        resize(&mut viewport, &mut projection, &mut surface, &host);
    }

    assert_eq!(
        surface.calls,
        vec![(400, 400, 1.0), (800, 400, 1.0), (400, 800, 1.0)]
    );
    assert!((projection.aspect() - 0.5).abs() < 1e-6);
}

#[test]
fn should_keep_previous_projection_for_zero_height() {
    let mut viewport = ViewportState::default();
    let mut projection = projection();
    let mut surface = RecordingSurface::default();

    let host = FixedHost {
        size: (800, 600),
        pixel_ratio: 1.0,
    };
    resize(&mut viewport, &mut projection, &mut surface, &host);
    let before = projection.matrix();

    let collapsed = FixedHost {
        size: (800, 0),
        pixel_ratio: 1.0,
    };
    resize(&mut viewport, &mut projection, &mut surface, &collapsed);

    assert!(viewport.is_degenerate());
    assert!(!projection.aspect().is_finite());
    assert_eq!(projection.matrix(), before);
    assert_eq!(surface.calls.last(), Some(&(800, 0, 1.0)));
}

#[test]
fn should_record_zero_aspect_for_zero_width() {
    let mut viewport = ViewportState::default();
    let mut projection = projection();
    let mut surface = RecordingSurface::default();
    let before = projection.matrix();

    let host = FixedHost {
        size: (0, 600),
        pixel_ratio: 1.0,
    };
    resize(&mut viewport, &mut projection, &mut surface, &host);

    assert_eq!(projection.aspect(), 0.0);
    assert_eq!(projection.matrix(), before);
    assert_eq!(surface.calls, vec![(0, 600, 1.0)]);
}
