//! Surface and Pyramid Tests
//!
//! Tests for:
//! - Surface: creation, degenerate-resolution rejection, viewport/size
//!   coupling, msaa/plain target selection on bind, uniform clear, teardown
//! - build_pyramid: floor-halved level sizing, 1×1 clamping, rollback on
//!   creation failure

mod common;

use afterglow::errors::AfterglowError;
use afterglow::surface::{Surface, SurfaceDesc, build_pyramid};
use common::{Call, TraceDevice};

fn linear_desc() -> SurfaceDesc {
    SurfaceDesc {
        wants_depth: false,
        floating_point: false,
        linear_filter: true,
        msaa_samples: 0,
    }
}

// ============================================================================
// Surface Tests
// ============================================================================

#[test]
fn surface_viewport_matches_own_size() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let surface = Surface::create(&mut device, "s", 640, 480, linear_desc()).unwrap();

    let vp = surface.viewport();
    assert_eq!((vp.x, vp.y), (0, 0));
    assert_eq!((vp.width, vp.height), (surface.width(), surface.height()));
}

#[test]
fn surface_rejects_degenerate_resolution() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());

    let err = Surface::create(&mut device, "bad", 0, 480, linear_desc()).unwrap_err();
    assert!(matches!(err, AfterglowError::DegenerateSurface { .. }));
    assert!(device.calls.is_empty(), "no resources for a rejected surface");
}

#[test]
fn surface_with_depth_creates_depth_buffer() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let desc = SurfaceDesc {
        wants_depth: true,
        ..linear_desc()
    };
    let surface = Surface::create(&mut device, "s", 320, 240, desc).unwrap();

    assert_eq!(
        device.count(|c| matches!(c, Call::CreateDepthBuffer { .. })),
        1
    );
    drop(surface);
}

#[test]
fn surface_bind_selects_msaa_target_only_when_present_and_requested() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let desc = SurfaceDesc {
        msaa_samples: 4,
        ..linear_desc()
    };
    let surface = Surface::create(&mut device, "s", 320, 240, desc).unwrap();
    let plain = surface.framebuffer().unwrap();
    let msaa = surface.msaa_framebuffer().unwrap();

    device.clear_calls();
    surface.bind(&mut device, true);
    assert_eq!(device.calls[0], Call::BindFramebuffer(Some(msaa)));

    device.clear_calls();
    surface.bind(&mut device, false);
    assert_eq!(device.calls[0], Call::BindFramebuffer(Some(plain)));
}

#[test]
fn surface_without_msaa_falls_back_to_plain_target() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let surface = Surface::create(&mut device, "s", 320, 240, linear_desc()).unwrap();
    let plain = surface.framebuffer().unwrap();

    device.clear_calls();
    surface.bind(&mut device, true);
    assert_eq!(device.calls[0], Call::BindFramebuffer(Some(plain)));
}

#[test]
fn surface_bind_restores_viewport_and_matrices() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let surface = Surface::create(&mut device, "s", 320, 240, linear_desc()).unwrap();

    device.clear_calls();
    surface.bind(&mut device, false);
    assert_eq!(device.calls[1], Call::SetViewport(surface.viewport()));
    assert_eq!(device.calls[2], Call::SetMatrices);
}

#[test]
fn surface_clear_uses_uniform_color() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let surface = Surface::create(&mut device, "s", 320, 240, linear_desc()).unwrap();

    device.clear_calls();
    surface.clear(&mut device);
    assert_eq!(device.calls, vec![Call::Clear([0.0, 0.0, 0.0, 0.0])]);
}

#[test]
fn window_surface_binds_back_buffer() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let window = Surface::window(1024, 768);

    window.bind(&mut device, false);
    assert_eq!(device.calls[0], Call::BindFramebuffer(None));
    assert!(window.texture().is_none());
}

#[test]
fn surface_destroy_releases_every_handle() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let desc = SurfaceDesc {
        wants_depth: true,
        msaa_samples: 4,
        ..linear_desc()
    };
    let mut surface = Surface::create(&mut device, "s", 320, 240, desc).unwrap();

    device.clear_calls();
    surface.destroy(&mut device);
    assert_eq!(device.count(|c| matches!(c, Call::DestroyTexture(_))), 1);
    assert_eq!(device.count(|c| matches!(c, Call::DestroyDepthBuffer(_))), 1);
    assert_eq!(device.count(|c| matches!(c, Call::DestroyFramebuffer(_))), 2);
}

// ============================================================================
// Pyramid Tests
// ============================================================================

#[test]
fn pyramid_levels_halve_with_floor_division() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let levels = build_pyramid(&mut device, "p", 512, 384, 3, linear_desc()).unwrap();

    let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width(), l.height())).collect();
    assert_eq!(sizes, vec![(512, 384), (256, 192), (128, 96)]);
    for i in 1..levels.len() {
        assert_eq!(levels[i].width(), levels[i - 1].width() / 2);
        assert_eq!(levels[i].height(), levels[i - 1].height() / 2);
    }
}

#[test]
fn pyramid_handles_odd_resolutions() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let levels = build_pyramid(&mut device, "p", 1023, 767, 3, linear_desc()).unwrap();

    let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width(), l.height())).collect();
    assert_eq!(sizes, vec![(1023, 767), (511, 383), (255, 191)]);
}

#[test]
fn pyramid_clamps_tiny_levels_to_one_pixel() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let levels = build_pyramid(&mut device, "p", 2, 1, 3, linear_desc()).unwrap();

    let sizes: Vec<(u32, u32)> = levels.iter().map(|l| (l.width(), l.height())).collect();
    assert_eq!(sizes, vec![(2, 1), (1, 1), (1, 1)]);
}

#[test]
fn pyramid_labels_levels_by_index() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    let levels = build_pyramid(&mut device, "bloompass0_", 512, 384, 3, linear_desc()).unwrap();

    let labels: Vec<&str> = levels.iter().map(afterglow::Surface::label).collect();
    assert_eq!(labels, vec!["bloompass0_0", "bloompass0_1", "bloompass0_2"]);
}

#[test]
fn pyramid_rollback_destroys_built_levels() {
    let mut device = TraceDevice::new(TraceDevice::full_caps());
    device.fail_textures_after = Some(2);

    assert!(build_pyramid(&mut device, "p", 512, 384, 3, linear_desc()).is_err());

    // The two successfully built levels must be destroyed again.
    assert_eq!(device.count(|c| matches!(c, Call::CreateTexture { .. })), 2);
    assert_eq!(device.count(|c| matches!(c, Call::DestroyTexture(_))), 2);
    assert_eq!(
        device.count(|c| matches!(c, Call::CreateFramebuffer { .. })),
        device.count(|c| matches!(c, Call::DestroyFramebuffer(_))),
    );
}
