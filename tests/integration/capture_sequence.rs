//! Capture sequencing across the sequencer, cameras and session bus.

use std::sync::Arc;
use std::time::Duration;

use booth::device::mock::{MockCamera, MockShot, SHOT_COLORS};
use booth::device::{Facing, FolderCamera};
use booth::error::{BoothError, CaptureFailure};
use booth::sequencer::{CaptureSequencer, SequenceOutcome, SequenceTiming};
use booth::session::{BoothEvent, SessionBus, SessionPhase};
use image::GenericImageView;

use crate::common::fixtures::{FRAME_COLORS, TestFrames};

fn fast() -> SequenceTiming {
    SequenceTiming {
        countdown_from: 3,
        tick: Duration::from_millis(1),
        capture_timeout: Duration::from_secs(5),
    }
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<BoothEvent>) -> Vec<BoothEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

#[tokio::test(start_paused = true)]
async fn test_each_round_counts_down_then_captures() {
    let camera = Arc::new(MockCamera::new());
    let bus = Arc::new(SessionBus::new());
    let mut events = bus.subscribe();
    let seq = CaptureSequencer::new(camera.clone(), Arc::clone(&bus));

    let outcome = seq.start_sequence().await.unwrap();
    assert!(matches!(outcome, SequenceOutcome::Completed(_)));

    let seen = drain(&mut events);
    assert_eq!(seen.first(), Some(&BoothEvent::SequenceStarted));
    assert_eq!(seen.last(), Some(&BoothEvent::SequenceCompleted));

    for shot in 1..=4 {
        let round: Vec<&BoothEvent> = seen
            .iter()
            .filter(|e| match e {
                BoothEvent::Countdown { shot: s, .. }
                | BoothEvent::CountdownCleared { shot: s }
                | BoothEvent::FrameCaptured { shot: s } => *s == shot,
                _ => false,
            })
            .collect();
        assert_eq!(
            round,
            vec![
                &BoothEvent::Countdown { shot, value: 3 },
                &BoothEvent::Countdown { shot, value: 2 },
                &BoothEvent::Countdown { shot, value: 1 },
                &BoothEvent::CountdownCleared { shot },
                &BoothEvent::FrameCaptured { shot },
            ]
        );
    }
    assert_eq!(seq.countdown(), None);
}

#[tokio::test(start_paused = true)]
async fn test_captures_are_spaced_by_the_countdown() {
    let camera = Arc::new(MockCamera::new());
    let seq = CaptureSequencer::new(camera.clone(), Arc::new(SessionBus::new()));

    seq.start_sequence().await.unwrap();

    let times = camera.capture_times();
    assert_eq!(times.len(), 4);
    for pair in times.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_secs(3));
    }
}

#[tokio::test(start_paused = true)]
async fn test_frames_arrive_in_capture_order() {
    let camera = Arc::new(MockCamera::new());
    let seq = CaptureSequencer::new(camera, Arc::new(SessionBus::new()));

    let SequenceOutcome::Completed(frames) = seq.start_sequence().await.unwrap() else {
        panic!("expected completion");
    };

    for (frame, color) in frames.iter().zip(SHOT_COLORS) {
        let img = frame.decode().unwrap();
        assert_eq!(img.get_pixel(0, 0).0[..3], color);
    }
}

#[tokio::test(start_paused = true)]
async fn test_hung_camera_times_out_and_aborts() {
    let camera = Arc::new(MockCamera::new().script(3, MockShot::Hang));
    let bus = Arc::new(SessionBus::new());
    let seq = CaptureSequencer::new(camera, Arc::clone(&bus)).with_timing(SequenceTiming {
        capture_timeout: Duration::from_secs(2),
        ..fast()
    });

    let err = seq.start_sequence().await.unwrap_err();
    assert!(matches!(
        err,
        BoothError::Capture {
            shot: 3,
            cause: CaptureFailure::TimedOut(_)
        }
    ));
    assert_eq!(seq.frame_count(), 2);
    assert!(matches!(
        bus.phase(),
        SessionPhase::Aborted { frames: 2, .. }
    ));
    assert!(!seq.is_busy());
}

#[tokio::test(start_paused = true)]
async fn test_second_capture_empty_aborts_with_one_frame() {
    let camera = Arc::new(MockCamera::new().script(2, MockShot::NoResult));
    let bus = Arc::new(SessionBus::new());
    let mut events = bus.subscribe();
    let seq = CaptureSequencer::new(camera.clone(), Arc::clone(&bus));

    assert!(seq.start_sequence().await.is_err());

    assert_eq!(camera.capture_count(), 2);
    assert!(matches!(
        bus.phase(),
        SessionPhase::Aborted { frames: 1, .. }
    ));
    let seen = drain(&mut events);
    assert!(seen.iter().any(|e| matches!(e, BoothEvent::SequenceAborted { shot: 2, .. })));
    assert!(!seen.contains(&BoothEvent::SequenceCompleted));
}

#[tokio::test(start_paused = true)]
async fn test_facing_toggle_reaches_camera() {
    let camera = Arc::new(MockCamera::new());
    let seq = CaptureSequencer::new(camera.clone(), Arc::new(SessionBus::new()));

    assert_eq!(seq.toggle_facing().await.unwrap(), Facing::Front);
    assert_eq!(camera.facing(), Facing::Front);
    assert_eq!(seq.toggle_facing().await.unwrap(), Facing::Back);
}

#[tokio::test]
async fn test_folder_camera_feeds_sequence_in_name_order() {
    let frames = TestFrames::four();
    let camera = Arc::new(FolderCamera::open(frames.path()).unwrap());
    let seq = CaptureSequencer::new(camera, Arc::new(SessionBus::new())).with_timing(fast());

    let SequenceOutcome::Completed(captured) = seq.start_sequence().await.unwrap() else {
        panic!("expected completion");
    };

    let files = frames.files();
    for ((frame, file), color) in captured.iter().zip(&files).zip(FRAME_COLORS) {
        assert_eq!(frame.path(), Some(file.as_path()));
        assert_eq!(frame.decode().unwrap().get_pixel(5, 5).0[..3], color);
    }
}

#[tokio::test]
async fn test_folder_camera_front_facing_is_mirrored() {
    let dir = tempfile::tempdir().unwrap();
    let mut img = image::RgbImage::from_pixel(40, 20, image::Rgb([0, 0, 0]));
    for y in 0..20 {
        img.put_pixel(0, y, image::Rgb([255, 255, 255]));
    }
    img.save(dir.path().join("left-edge.png")).unwrap();

    let camera = Arc::new(FolderCamera::open(dir.path()).unwrap().with_facing(Facing::Front));
    let seq = CaptureSequencer::new(camera, Arc::new(SessionBus::new()))
        .with_timing(fast())
        .with_facing(Facing::Front);

    let SequenceOutcome::Completed(captured) = seq.start_sequence().await.unwrap() else {
        panic!("expected completion");
    };
    let first = captured.iter().next().unwrap();
    assert_eq!(first.facing(), Facing::Front);
    let decoded = first.decode().unwrap();
    assert_eq!(decoded.get_pixel(39, 10).0[..3], [255, 255, 255]);
    assert_eq!(decoded.get_pixel(0, 10).0[..3], [0, 0, 0]);
}
