//! Layered configuration loading

use super::test_utils::with_env_vars;
use scoped_context::config::{ConfigLoader, ScopedContextConfig};
use scoped_context::{Context, ContextError, ContextKey, Host};
use std::fs;
use tempfile::TempDir;

fn loader(prefix: &str) -> ConfigLoader {
    ConfigLoader::new().with_env_prefix(prefix)
}

#[test]
fn test_load_base_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("scoped-context.toml"),
        r#"
[host]
label = "storefront"

[host.diagnostics]
report_shadowing = true

[logging]
level = "debug"
format = "json"
"#,
    )
    .unwrap();

    let config = loader("SCOPED_CONTEXT_IT_BASE")
        .with_environment("none")
        .load(temp_dir.path())
        .unwrap();
    assert_eq!(config.host.label, "storefront");
    assert!(config.host.diagnostics.report_shadowing);
    assert!(config.host.diagnostics.warn_self_lookup);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_environment_overlay_overrides_base() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("scoped-context.toml"),
        "[host]\nlabel = \"base\"\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("scoped-context.production.toml"),
        "[host.diagnostics]\nwarn_self_lookup = false\n",
    )
    .unwrap();

    let config = loader("SCOPED_CONTEXT_IT_OVERLAY")
        .with_environment("production")
        .load(temp_dir.path())
        .unwrap();
    assert_eq!(config.host.label, "base");
    assert!(!config.host.diagnostics.warn_self_lookup);
}

#[test]
fn test_environment_selected_from_env_var() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("scoped-context.staging.toml"),
        "[host]\nlabel = \"staging\"\n",
    )
    .unwrap();

    let config = with_env_vars(&[("SCOPED_CONTEXT_ENV", "staging")], || {
        loader("SCOPED_CONTEXT_IT_SELECT").load(temp_dir.path())
    })
    .unwrap();
    assert_eq!(config.host.label, "staging");
}

#[test]
fn test_env_vars_override_files() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("scoped-context.toml"),
        "[host]\nlabel = \"from-file\"\n",
    )
    .unwrap();

    let config = with_env_vars(
        &[
            ("SCOPED_CONTEXT_IT_ENV__HOST__LABEL", "from-env"),
            ("SCOPED_CONTEXT_IT_ENV__HOST__DIAGNOSTICS__REPORT_SHADOWING", "true"),
        ],
        || {
            loader("SCOPED_CONTEXT_IT_ENV")
                .with_environment("none")
                .load(temp_dir.path())
        },
    )
    .unwrap();
    assert_eq!(config.host.label, "from-env");
    assert!(config.host.diagnostics.report_shadowing);
}

#[test]
fn test_invalid_config_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("scoped-context.toml"),
        "[logging]\nformat = \"xml\"\n",
    )
    .unwrap();

    let result = loader("SCOPED_CONTEXT_IT_INVALID")
        .with_environment("none")
        .load(temp_dir.path());
    assert!(matches!(
        result,
        Err(ContextError::ConfigError(msg)) if msg.contains("Invalid log format")
    ));
}

#[test]
fn test_loaded_host_config_drives_host() {
    let temp_dir = TempDir::new().unwrap();
    let mut written = ScopedContextConfig::default();
    written.host.label = "configured".to_string();
    let path = temp_dir.path().join("custom.toml");
    fs::write(&path, written.to_toml_string().unwrap()).unwrap();

    let config = loader("SCOPED_CONTEXT_IT_HOST").load_file(&path).unwrap();
    let host = Host::with_config(config.host);
    assert_eq!(host.label(), "configured");

    let context = Context::new(ContextKey::unique("n"), Some(1));
    assert_eq!(host.mount("Root").enter(|| context.read()), Ok(1));
}
