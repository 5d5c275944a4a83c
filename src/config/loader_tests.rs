//! Tests for configuration file loading.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;

#[test]
fn default_config_path_contains_config_toml() {
    let Some(path) = default_config_path() else {
        return;
    };
    let path_str = path.to_string_lossy();
    assert!(
        path_str.contains("chat-layout") && path_str.ends_with("config.toml"),
        "Path should contain 'chat-layout' and end with 'config.toml', got: {}",
        path_str
    );
}

#[test]
fn default_log_path_ends_with_log_file_name() {
    let path = default_log_path();
    assert!(
        path.to_string_lossy().ends_with("chat-layout.log"),
        "Default log path should end with 'chat-layout.log', got: {:?}",
        path
    );
}

#[test]
fn load_config_file_returns_ok_none_for_missing_file() {
    let result = load_config_file("/nonexistent/path/to/config.toml");
    assert_eq!(
        result,
        Ok(None),
        "Missing config file should return Ok(None), not an error"
    );
}

#[test]
fn load_config_file_parses_valid_toml() {
    let config_path = env::temp_dir().join("chat_layout_test_config.toml");

    let toml_content = r#"
log_file_path = "/tmp/chat-layout-test.log"

[layout]
inter_item_spacing = 7.0
inter_section_spacing = 3.0
compensation_anchor = "bottom"
keep_content_at_bottom_of_visible_area = true
estimated_item_size = { width = 300.0, height = 40.0 }
additional_insets = { top = 8.0, bottom = 12.0 }
"#;

    fs::write(&config_path, toml_content).expect("Failed to write test config");

    let config = load_config_file(&config_path)
        .expect("Should successfully parse valid TOML")
        .expect("Should return Some(ConfigFile) for existing file");
    let layout = config.layout.expect("layout table present");

    assert_eq!(config.log_file_path, Some(PathBuf::from("/tmp/chat-layout-test.log")));
    assert_eq!(layout.inter_item_spacing, Some(7.0));
    assert_eq!(layout.inter_section_spacing, Some(3.0));
    assert_eq!(layout.compensation_anchor, Some(CompensationAnchor::Bottom));
    assert_eq!(layout.keep_content_at_bottom_of_visible_area, Some(true));
    assert_eq!(layout.estimated_item_size, Some(Size::new(300.0, 40.0)));
    assert_eq!(
        layout.additional_insets,
        Some(EdgeInsets::new(8.0, 0.0, 12.0, 0.0))
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_returns_error_for_invalid_toml() {
    let config_path = env::temp_dir().join("chat_layout_test_invalid.toml");
    fs::write(&config_path, "[layout\ninter_item_spacing = ").expect("Failed to write test config");

    let result = load_config_file(&config_path);
    assert!(
        matches!(result, Err(ConfigError::ParseError { .. })),
        "Invalid TOML should produce ParseError, got {:?}",
        result
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn config_file_rejects_unknown_fields() {
    let result: Result<ConfigFile, _> = toml::from_str("scroll_speed = 3\n");
    assert!(result.is_err(), "Unknown top-level keys should be rejected");

    let result: Result<ConfigFile, _> = toml::from_str("[layout]\nrow_height = 4\n");
    assert!(result.is_err(), "Unknown layout keys should be rejected");
}

#[test]
fn merge_config_uses_defaults_when_none() {
    let resolved = merge_config(None);
    assert_eq!(resolved, ResolvedConfig::default());
}

#[test]
fn merge_config_overrides_with_config_file_values() {
    let config_file = ConfigFile {
        log_file_path: Some(PathBuf::from("/custom/app.log")),
        layout: Some(LayoutSection {
            inter_item_spacing: Some(7.0),
            compensation_anchor: Some(CompensationAnchor::Top),
            ..LayoutSection::default()
        }),
    };

    let resolved = merge_config(Some(config_file));
    let defaults = LayoutSettings::default();

    assert_eq!(resolved.log_file_path, PathBuf::from("/custom/app.log"));
    assert_eq!(resolved.settings.inter_item_spacing, 7.0);
    assert_eq!(resolved.settings.compensation_anchor, CompensationAnchor::Top);
    assert_eq!(resolved.settings.inter_section_spacing, defaults.inter_section_spacing);
    assert_eq!(resolved.settings.estimated_item_size, defaults.estimated_item_size);
}

#[test]
fn merge_config_sanitizes_negative_spacing() {
    let config_file = ConfigFile {
        log_file_path: None,
        layout: Some(LayoutSection {
            inter_item_spacing: Some(-4.0),
            ..LayoutSection::default()
        }),
    };

    let resolved = merge_config(Some(config_file));
    assert_eq!(resolved.settings.inter_item_spacing, 0.0);
}

#[test]
fn merge_config_without_layout_table_keeps_default_settings() {
    let config_file = ConfigFile {
        log_file_path: Some(PathBuf::from("x.log")),
        layout: None,
    };

    let resolved = merge_config(Some(config_file));
    assert_eq!(resolved.settings, LayoutSettings::default());
}

/// RAII guard to ensure environment variable cleanup even under test parallelism.
/// Removes the var on drop, preventing test pollution in parallel execution.
struct EnvGuard(&'static str);

impl EnvGuard {
    fn new(name: &'static str) -> Self {
        env::remove_var(name);
        EnvGuard(name)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        env::remove_var(self.0);
    }
}

#[test]
#[serial(chat_layout_anchor)]
fn apply_env_overrides_respects_anchor_var() {
    let _guard = EnvGuard::new("CHAT_LAYOUT_ANCHOR");
    env::set_var("CHAT_LAYOUT_ANCHOR", "bottom");

    let result = apply_env_overrides(ResolvedConfig::default());

    assert_eq!(result.settings.compensation_anchor, CompensationAnchor::Bottom);
}

#[test]
#[serial(chat_layout_anchor)]
fn apply_env_overrides_ignores_unparseable_anchor() {
    let _guard = EnvGuard::new("CHAT_LAYOUT_ANCHOR");
    env::set_var("CHAT_LAYOUT_ANCHOR", "sideways");

    let base = ResolvedConfig::default();
    let result = apply_env_overrides(base.clone());

    assert_eq!(result, base);
}

#[test]
#[serial(chat_layout_anchor)]
fn apply_env_overrides_no_change_when_env_var_not_set() {
    let _guard = EnvGuard::new("CHAT_LAYOUT_ANCHOR");

    let base = ResolvedConfig::default();
    assert_eq!(apply_env_overrides(base.clone()), base);
}

#[test]
#[serial(chat_layout_config)]
fn load_config_with_precedence_prefers_explicit_path() {
    let _guard = EnvGuard::new("CHAT_LAYOUT_CONFIG");
    let temp_dir = env::temp_dir();

    let explicit_path = temp_dir.join("chat_layout_explicit.toml");
    fs::write(&explicit_path, "[layout]\ninter_item_spacing = 1.0\n").unwrap();
    let env_path = temp_dir.join("chat_layout_env.toml");
    fs::write(&env_path, "[layout]\ninter_item_spacing = 2.0\n").unwrap();
    env::set_var("CHAT_LAYOUT_CONFIG", env_path.to_str().unwrap());

    let config = load_config_with_precedence(Some(explicit_path.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(config.layout.unwrap().inter_item_spacing, Some(1.0));

    fs::remove_file(explicit_path).ok();
    fs::remove_file(env_path).ok();
}

#[test]
#[serial(chat_layout_config)]
fn load_config_with_precedence_uses_env_var_when_no_explicit_path() {
    let _guard = EnvGuard::new("CHAT_LAYOUT_CONFIG");

    let env_path = env::temp_dir().join("chat_layout_env_only.toml");
    fs::write(&env_path, "[layout]\ninter_section_spacing = 3.0\n").unwrap();
    env::set_var("CHAT_LAYOUT_CONFIG", env_path.to_str().unwrap());

    let config = load_config_with_precedence(None).unwrap().unwrap();
    assert_eq!(config.layout.unwrap().inter_section_spacing, Some(3.0));

    fs::remove_file(env_path).ok();
}

#[test]
fn apply_cli_overrides_anchor_and_log_path() {
    let base = ResolvedConfig::default();
    let result = apply_cli_overrides(
        base,
        Some(CompensationAnchor::Bottom),
        Some(PathBuf::from("cli.log")),
    );
    assert_eq!(result.settings.compensation_anchor, CompensationAnchor::Bottom);
    assert_eq!(result.log_file_path, PathBuf::from("cli.log"));
}

#[test]
fn apply_cli_overrides_no_overrides() {
    let base = ResolvedConfig::default();
    assert_eq!(apply_cli_overrides(base.clone(), None, None), base);
}

#[test]
#[serial(chat_layout_anchor)]
fn precedence_chain_file_then_env_then_cli() {
    let _guard = EnvGuard::new("CHAT_LAYOUT_ANCHOR");

    let file = ConfigFile {
        log_file_path: None,
        layout: Some(LayoutSection {
            compensation_anchor: Some(CompensationAnchor::Top),
            ..LayoutSection::default()
        }),
    };
    let merged = merge_config(Some(file));
    assert_eq!(merged.settings.compensation_anchor, CompensationAnchor::Top);

    env::set_var("CHAT_LAYOUT_ANCHOR", "disabled");
    let with_env = apply_env_overrides(merged);
    assert_eq!(with_env.settings.compensation_anchor, CompensationAnchor::Disabled);

    let with_cli = apply_cli_overrides(with_env, Some(CompensationAnchor::Bottom), None);
    assert_eq!(with_cli.settings.compensation_anchor, CompensationAnchor::Bottom);
}
