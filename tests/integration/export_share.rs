//! Export and share against the platform doubles and the desktop services.

use std::sync::Arc;
use std::time::Duration;

use booth::compositor::StripCompositor;
use booth::document::{PNG_MIME, PNG_UTI, two_up_html};
use booth::error::BoothError;
use booth::platform::mock::{MockExporter, MockShareSheet};
use booth::platform::{DirectoryLibrary, DirectoryShareSheet, FileDocumentExporter, Platform};
use booth::render::ImageRasterizer;
use booth::session::{SessionBus, SessionPhase};

use crate::common::rig::{CompositorRig, colored_frames};

#[tokio::test]
async fn test_export_without_strip_changes_nothing() {
    let rig = CompositorRig::new();
    let before = rig.bus.phase();

    let err = rig.compositor.export_as_document().await.unwrap_err();

    assert!(matches!(err, BoothError::NothingToExport));
    assert_eq!(err.to_string(), "No image available to export.");
    assert_eq!(rig.bus.phase(), before);
    assert!(rig.exporter.documents().is_empty());
    assert!(rig.exporter.printed().is_empty());
}

#[tokio::test]
async fn test_share_without_strip_is_rejected() {
    let rig = CompositorRig::new();
    assert!(matches!(
        rig.compositor.share_artifact().await,
        Err(BoothError::NothingToShare)
    ));
    assert!(rig.share.shared().is_empty());
}

#[tokio::test]
async fn test_export_prints_two_copies_of_the_strip() {
    let rig = CompositorRig::new();
    let artifact = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    let document = rig.compositor.export_as_document().await.unwrap();

    let documents = rig.exporter.documents();
    assert_eq!(documents.len(), 1);
    let (path, html) = &documents[0];
    assert_eq!(path, &document);
    assert_eq!(html, &two_up_html(&artifact.encoded));
    assert_eq!(html.matches(&artifact.encoded).count(), 2);
    assert_eq!(rig.exporter.printed(), vec![document]);

    assert!(!rig.compositor.is_exporting());
    assert!(rig.bus.phase().is_ready());
}

#[tokio::test]
async fn test_failed_print_keeps_the_strip() {
    let rig = CompositorRig::builder()
        .exporter(MockExporter::new().failing_print("printer offline"))
        .build();
    let artifact = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    let err = rig.compositor.export_as_document().await.unwrap_err();

    assert!(matches!(err, BoothError::Export(ref m) if m.contains("printer offline")));
    assert!(artifact.path.exists());
    assert_eq!(rig.compositor.artifact().map(|a| a.id), Some(artifact.id));
    assert!(!rig.compositor.is_exporting());
}

#[tokio::test]
async fn test_overlapping_exports_are_rejected() {
    let rig = CompositorRig::builder()
        .exporter(MockExporter::new().with_delay(Duration::from_millis(100)))
        .build();
    rig.compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    let (first, second) = tokio::join!(rig.compositor.export_as_document(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        rig.compositor.export_as_document().await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(BoothError::Busy { operation: "export" })));
    assert_eq!(rig.exporter.documents().len(), 1);
}

#[tokio::test]
async fn test_sharing_flag_shows_on_ready_phase() {
    let rig = CompositorRig::builder()
        .share(MockShareSheet::new().with_delay(Duration::from_millis(100)))
        .build();
    rig.compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();
    let mut phases = rig.bus.watch_phase();

    let (shared, seen) = tokio::join!(rig.compositor.share_artifact(), async {
        phases.changed().await.unwrap();
        phases.borrow().clone()
    });

    shared.unwrap();
    assert_eq!(
        seen,
        SessionPhase::Ready {
            exporting: false,
            sharing: true
        }
    );
    assert_eq!(
        rig.bus.phase(),
        SessionPhase::Ready {
            exporting: false,
            sharing: false
        }
    );
}

#[tokio::test]
async fn test_share_passes_png_type() {
    let rig = CompositorRig::new();
    let artifact = rig
        .compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    rig.compositor.share_artifact().await.unwrap();

    assert_eq!(
        rig.share.shared(),
        vec![(
            artifact.path.clone(),
            PNG_MIME.to_string(),
            PNG_UTI.to_string()
        )]
    );
}

#[tokio::test]
async fn test_unavailable_share_sheet() {
    let rig = CompositorRig::builder()
        .share(MockShareSheet::unavailable())
        .build();
    rig.compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();

    let err = rig.compositor.share_artifact().await.unwrap_err();
    assert!(matches!(err, BoothError::ShareUnavailable));
    assert_eq!(err.to_string(), "Sharing not supported.");
}

#[tokio::test]
async fn test_desktop_services_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let platform = Platform {
        library: Arc::new(DirectoryLibrary::new(dir.path().join("library"))),
        exporter: Arc::new(FileDocumentExporter::new(dir.path().join("documents"))),
        share: Arc::new(DirectoryShareSheet::new(Some(dir.path().join("outbox")))),
    };
    let compositor = StripCompositor::new(
        Arc::new(ImageRasterizer::new(dir.path().join("strips"))),
        platform,
        Arc::new(SessionBus::new()),
    );

    let artifact = compositor
        .build_strip(colored_frames(64, 40), None)
        .await
        .unwrap();
    let document = compositor.export_as_document().await.unwrap();
    compositor.share_artifact().await.unwrap();

    let library: Vec<_> = std::fs::read_dir(dir.path().join("library"))
        .unwrap()
        .collect();
    assert_eq!(library.len(), 1);

    let html = std::fs::read_to_string(&document).unwrap();
    assert_eq!(html, two_up_html(&artifact.encoded));

    let shared = dir
        .path()
        .join("outbox")
        .join(artifact.path.file_name().unwrap());
    assert_eq!(
        std::fs::read(shared).unwrap(),
        std::fs::read(&artifact.path).unwrap()
    );
}
