use shopdoc_render::*;
use std::collections::HashMap;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_defaults_are_valid() {
    let config = EngineConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.display_offset_minutes, 330);
    assert_eq!(config.resolved_storage_root(), PathBuf::from("public"));
}

#[test]
fn test_env_overrides() {
    let config = EngineConfig::default().with_env(lookup(&[
        ("SHOPDOC_STORAGE_ROOT", "/srv/shop"),
        ("SHOPDOC_BASE_URL", "https://docs.example"),
        ("SHOPDOC_FONTS_DIR", "/srv/fonts"),
        ("SHOPDOC_DISPLAY_OFFSET_MINUTES", "-240"),
    ]));

    assert_eq!(config.storage_root, PathBuf::from("/srv/shop"));
    assert_eq!(config.base_url, "https://docs.example");
    assert_eq!(config.regular_font_path(), PathBuf::from("/srv/fonts/NotoSans-Regular.ttf"));
    assert_eq!(config.display_offset_minutes, -240);
    assert!(!config.is_ephemeral_environment);
}

#[test]
fn test_invalid_offset_env_is_ignored() {
    let config = EngineConfig::default().with_env(lookup(&[("SHOPDOC_DISPLAY_OFFSET_MINUTES", "ist")]));
    assert_eq!(config.display_offset_minutes, 330);
}

#[test]
fn test_serverless_markers_make_storage_ephemeral() {
    for marker in ["VERCEL", "AWS_LAMBDA_FUNCTION_NAME", "NETLIFY"] {
        let config = EngineConfig::default().with_env(lookup(&[(marker, "1")]));
        assert!(config.is_ephemeral_environment, "{marker}");
        assert_eq!(config.resolved_storage_root(), std::env::temp_dir().join("shopdoc"));
    }
}

#[test]
fn test_explicit_flag_beats_markers() {
    let config =
        EngineConfig::default().with_env(lookup(&[("VERCEL", "1"), ("SHOPDOC_EPHEMERAL", "false")]));
    assert!(!config.is_ephemeral_environment);
}

#[test]
fn test_validation_rejects_bad_values() {
    let config = EngineConfig {
        base_url: "  ".into(),
        ..Default::default()
    };
    match config.validate() {
        Err(RenderError::Config(msg)) => assert!(msg.contains("Base URL")),
        other => panic!("Expected Config error, got {other:?}"),
    }

    let config = EngineConfig {
        display_offset_minutes: 24 * 60,
        ..Default::default()
    };
    assert!(config.validate().is_err());
    assert!(Renderer::new(&config).is_err());
}

#[tokio::test]
async fn test_save_and_load() {
    let temp = NamedTempFile::new().unwrap();
    let config = EngineConfig {
        base_url: "https://shop.example".into(),
        default_logo: Some(PathBuf::from("assets/logo.png")),
        ..Default::default()
    };

    config.save(temp.path()).await.unwrap();
    let loaded = EngineConfig::load(temp.path()).await.unwrap();
    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_load_uses_defaults_for_missing_keys() {
    let temp = NamedTempFile::new().unwrap();
    std::fs::write(temp.path(), r#"{ "baseUrl": "https://a.example" }"#).unwrap();

    let loaded = EngineConfig::load(temp.path()).await.unwrap();
    assert_eq!(loaded.base_url, "https://a.example");
    assert_eq!(loaded.fonts_directory, PathBuf::from("assets/fonts"));
}
