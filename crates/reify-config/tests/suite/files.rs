use pretty_assertions::assert_eq;
use reify_config::{ConfigError, LoggingConfig, Mode, ReifyConfig};
use tempfile::NamedTempFile;

#[test]
fn empty_config_uses_defaults() {
    let config = ReifyConfig::load_from_str("").unwrap();
    assert_eq!(config, ReifyConfig::default());
    assert_eq!(config.verification.mode, Mode::Disabled);
    assert!(config.witness.enabled);
    assert_eq!(config.logging, LoggingConfig::default());
}

#[test]
fn parses_every_section() {
    let text = r#"
[verification]
mode = "MINIMAL"

[witness]
enabled = false

[logging]
level = "reify.check=debug"
json = true
stderr = false
"#;
    let config = ReifyConfig::load_from_str(text).unwrap();
    assert_eq!(config.verification.mode, Mode::Minimal);
    assert!(!config.witness.enabled);
    assert_eq!(config.logging.level, "reify.check=debug");
    assert!(config.logging.json);
    assert!(!config.logging.stderr);
}

#[test]
fn unknown_mode_in_file_is_a_parse_error() {
    let err = ReifyConfig::load_from_str("[verification]\nmode = \"LOUD\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}

#[test]
fn loads_from_a_file_on_disk() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), "[verification]\nmode = \"FULL\"\n").unwrap();

    let config = ReifyConfig::load_from_path(file.path()).unwrap();
    assert_eq!(config.verification.mode, Mode::Full);
}

#[test]
fn missing_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = ReifyConfig::load_from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => {
            assert_eq!(reported, path.display().to_string())
        }
        other => panic!("expected an I/O error, got {other:?}"),
    }
}
