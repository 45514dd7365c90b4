//! Strip building: pixels, artifact integrity and failure handling.

use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use booth::compositor::{BuildState, StripCompositor};
use booth::device::mock::SHOT_COLORS;
use booth::error::BoothError;
use booth::layout::{LogoAnchor, StripLayout};
use booth::render::LogoAsset;
use booth::session::{BoothEvent, SessionPhase};
use image::{DynamicImage, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use crate::common::fixtures::read_rgb;
use crate::common::rig::{CompositorRig, colored_frames};

#[tokio::test]
async fn test_file_and_encoding_are_the_same_png() {
    let rig = CompositorRig::new();

    let artifact = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    let on_disk = std::fs::read(&artifact.path).unwrap();
    let decoded = STANDARD.decode(&artifact.encoded).unwrap();
    assert_eq!(on_disk, decoded);
    assert_eq!(artifact.png_bytes().unwrap(), on_disk);
    assert_eq!(artifact.digest, hex::encode(Sha256::digest(&on_disk)));

    let from_file = image::load_from_memory(&on_disk).unwrap().to_rgba8();
    let from_b64 = image::load_from_memory(&decoded).unwrap().to_rgba8();
    assert_eq!(from_file.as_raw(), from_b64.as_raw());
    assert_eq!((artifact.width, artifact.height), (240, 621));
}

#[tokio::test]
async fn test_frames_land_top_to_bottom_on_white() {
    let rig = CompositorRig::new();
    let layout = *rig.compositor.layout();

    let artifact = rig
        .compositor
        .build_strip(colored_frames(200, 125), None)
        .await
        .unwrap();
    let strip = read_rgb(&artifact.path);

    for (index, color) in SHOT_COLORS.iter().enumerate() {
        let rect = layout.frame_rect(index);
        let center = strip.get_pixel(rect.x + rect.width / 2, rect.y + rect.height / 2);
        assert_eq!(&center.0, color, "frame {index}");
    }
    assert_eq!(strip.get_pixel(5, 5).0, [255, 255, 255]);
    assert_eq!(strip.get_pixel(235, 300).0, [255, 255, 255]);
}

#[tokio::test]
async fn test_scaled_layout_renders_more_pixels() {
    let layout = StripLayout {
        scale: 3,
        ..StripLayout::default()
    };
    let rig = CompositorRig::new();
    let compositor = StripCompositor::new(
        rig.rasterizer.clone(),
        platform_of(&rig),
        rig.bus.clone(),
    )
    .with_layout(layout);

    let artifact = compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();
    assert_eq!((artifact.width, artifact.height), (720, 1863));
    let strip = read_rgb(&artifact.path);
    assert_eq!(strip.dimensions(), (720, 1863));
}

#[tokio::test]
async fn test_logo_is_drawn_in_its_slot() {
    for anchor in [LogoAnchor::Bottom, LogoAnchor::Footer] {
        let layout = StripLayout {
            logo_anchor: anchor,
            ..StripLayout::default()
        };
        let rig = CompositorRig::new();
        let compositor = StripCompositor::new(
            rig.rasterizer.clone(),
            platform_of(&rig),
            rig.bus.clone(),
        )
        .with_layout(layout);
        let logo = LogoAsset::from_image(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            150,
            75,
            Rgb([10, 10, 10]),
        )));

        let artifact = compositor
            .build_strip(colored_frames(64, 40), Some(&logo))
            .await
            .unwrap();
        let strip = read_rgb(&artifact.path);

        let rect = layout.logo_rect();
        assert_eq!(strip.dimensions(), layout.pixel_size());
        assert_eq!(
            strip
                .get_pixel(rect.x + rect.width / 2, rect.y + rect.height / 2)
                .0,
            [10, 10, 10],
            "{anchor:?}"
        );
    }
}

#[tokio::test]
async fn test_failed_render_keeps_nothing() {
    let rig = CompositorRig::new();
    let mut events = rig.bus.subscribe();
    rig.rasterizer.fail_next();

    let err = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap_err();

    assert!(matches!(err, BoothError::Build(_)));
    assert!(rig.compositor.artifact().is_none());
    assert!(matches!(rig.compositor.state(), BuildState::Failed(_)));
    assert!(rig.strip_files().is_empty());
    assert!(rig.library.saved().is_empty());
    assert!(matches!(
        rig.bus.phase(),
        SessionPhase::BuildFailed { ref message } if message.contains("injected")
    ));

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, BoothEvent::ArtifactReady { .. }));
        saw_failure |= matches!(event, BoothEvent::BuildFailed { .. });
    }
    assert!(saw_failure);
}

#[tokio::test]
async fn test_rebuild_replaces_previous_strip() {
    let rig = CompositorRig::new();

    let first = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();
    let second = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert!(!first.path.exists());
    assert!(second.path.exists());
    assert_eq!(rig.strip_files(), vec![second.path.clone()]);
}

#[tokio::test]
async fn test_missing_layout_ack_falls_back_after_settle() {
    let rig = CompositorRig::builder().never_ready().build();

    let start = Instant::now();
    let artifact = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(artifact.path.exists());
    assert_eq!(rig.rasterizer.ready_checks(), 1);
    assert_eq!(rig.rasterizer.renders(), 1);
}

#[tokio::test]
async fn test_ready_strip_is_saved_to_library() {
    let rig = CompositorRig::new();

    let artifact = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    assert_eq!(rig.library.permission_requests(), 1);
    assert_eq!(rig.library.saved(), vec![artifact.path.clone()]);
    assert_eq!(
        rig.bus.phase(),
        SessionPhase::Ready {
            exporting: false,
            sharing: false
        }
    );
}

fn platform_of(rig: &CompositorRig) -> booth::platform::Platform {
    booth::platform::Platform {
        library: rig.library.clone(),
        exporter: rig.exporter.clone(),
        share: rig.share.clone(),
    }
}
