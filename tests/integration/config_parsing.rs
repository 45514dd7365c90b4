//! Config files on disk, and the booth they produce.

use std::path::Path;
use std::sync::Arc;

use booth::config::{BoothConfig, ConfigFormat, load_config, load_config_from_str, save_config};
use booth::device::Facing;
use booth::device::mock::MockCamera;
use booth::error::{BoothError, ErrorKind};
use booth::layout::LogoAnchor;
use booth::platform::{Permission, Platform};
use booth::render::mock::MockRasterizer;
use booth::{Booth, SessionOutcome};

use crate::common::fixtures::{read_rgb, solid_png, write_config};

const KIOSK_YAML: &str = r##"
capture:
  countdown_from: 1
  tick_ms: 1
  facing: front
strip:
  background: "#102030"
  logo: assets/logo.png
  settle_ms: 20
  layout:
    logo_anchor: footer
output:
  dir: strips
  save_to_library: false
  share_dir: outbox
"##;

fn kiosk_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    solid_png(&dir.path().join("assets/logo.png"), 150, 75, [1, 2, 3]);
    dir
}

#[test]
fn test_yaml_paths_resolve_against_config_dir() {
    let dir = kiosk_dir();
    let path = write_config(dir.path(), "booth.yaml", KIOSK_YAML);

    let config = load_config(&path).unwrap();

    assert_eq!(config.capture.countdown_from, 1);
    assert_eq!(config.capture.facing, Facing::Front);
    assert_eq!(config.strip.layout.logo_anchor, LogoAnchor::Footer);
    assert_eq!(
        config.strip.logo.as_deref(),
        Some(dir.path().join("assets/logo.png").as_path())
    );
    assert_eq!(config.output.strip_dir(), dir.path().join("strips"));
    assert_eq!(config.output.share_dir, Some(dir.path().join("outbox")));
    assert!(config.output.library_dir().is_none());
    config.check_assets().unwrap();
}

#[test]
fn test_toml_and_yaml_agree() {
    let yaml = load_config_from_str(KIOSK_YAML, ConfigFormat::Yaml).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let toml_path = dir.path().join("booth.toml");
    save_config(&yaml, &toml_path).unwrap();
    let text = std::fs::read_to_string(&toml_path).unwrap();
    let from_toml = load_config_from_str(&text, ConfigFormat::Toml).unwrap();

    assert_eq!(from_toml, yaml);
}

#[test]
fn test_missing_file_suggests_init() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_config(dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, BoothError::ConfigNotFound { .. }));
    assert_eq!(err.suggestion(), Some("Run: booth init"));
}

#[test]
fn test_invalid_values_are_config_errors() {
    let cases = [
        "[capture]\ncountdown_from = 0\n",
        "[strip]\nbackground = \"white\"\n",
        "[strip.layout]\nscale = 0\n",
        "[strip.layout]\nphoto_height = 4294967295\n",
        "[capture]\nfacing = \"sideways\"\n",
    ];
    for case in cases {
        let err = load_config_from_str(case, ConfigFormat::Toml).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config, "{case}");
    }
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "booth.ini", "countdown=3");
    assert!(matches!(
        load_config(&path),
        Err(BoothError::ConfigParse(_))
    ));
}

#[test]
fn test_missing_logo_fails_asset_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "booth.toml", "[strip]\nlogo = \"nope.png\"\n");

    let config = load_config(&path).unwrap();
    assert!(matches!(
        config.check_assets(),
        Err(BoothError::ImageNotFound { .. })
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn test_default_path_follows_config_home() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().display().to_string();
    let _env = crate::common::env::with_config_home(&home);

    assert_eq!(
        booth::config::default_config_path(),
        Path::new(&home).join("photobooth").join("config.toml")
    );
}

#[tokio::test]
async fn test_desktop_platform_follows_output_section() {
    let dir = kiosk_dir();
    let config = load_config(write_config(dir.path(), "booth.yaml", KIOSK_YAML)).unwrap();

    let platform = Platform::desktop(&config.output);

    assert_eq!(platform.library.request_permission().await, Permission::Denied);
    assert!(platform.share.is_available().await);
}

#[tokio::test]
async fn test_configured_booth_uses_background_and_logo() {
    let dir = kiosk_dir();
    let config = load_config(write_config(dir.path(), "booth.yaml", KIOSK_YAML)).unwrap();
    let camera = Arc::new(MockCamera::new());

    let booth = Booth::builder(
        camera.clone(),
        Arc::new(MockRasterizer::new(config.output.strip_dir())),
        Platform::desktop(&config.output),
    )
    .configure(&config)
    .unwrap()
    .build();

    assert_eq!(booth.facing(), Facing::Front);
    let SessionOutcome::Ready(artifact) = booth.start_sequence().await.unwrap() else {
        panic!("expected a strip");
    };
    assert!(artifact.path.starts_with(dir.path().join("strips")));

    let strip = read_rgb(&artifact.path);
    assert_eq!(strip.get_pixel(2, 2).0, [0x10, 0x20, 0x30]);
    let logo = config.strip.layout.logo_rect();
    assert_eq!(
        strip
            .get_pixel(logo.x + logo.width / 2, logo.y + logo.height / 2)
            .0,
        [1, 2, 3]
    );
}

#[test]
fn test_defaults_round_trip_through_init_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");
    save_config(&BoothConfig::default(), &path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("[capture]"));
    assert!(text.contains("[strip.layout]"));
    assert_eq!(
        load_config_from_str(&text, ConfigFormat::Toml).unwrap(),
        BoothConfig::default()
    );
}
