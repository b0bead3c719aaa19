use secrecy::ExposeSecret;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;
use theranova::configuration::{get_configuration_from, FlowMode, ProviderKind};
use theranova::server::config::build_backend;

const BASE: &str = r#"
application:
  port: 8000
  host: 0.0.0.0
model:
  provider: openrouter
flows:
  mode: live
"#;

fn config_dir(local: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("base.yaml"), BASE).unwrap();
    fs::write(dir.path().join("local.yaml"), local).unwrap();
    dir
}

fn clear_env() {
    for key in [
        "APP_ENVIRONMENT",
        "APP_APPLICATION__PORT",
        "APP_MODEL__PROVIDER",
        "APP_MODEL__API_KEY",
        "APP_MODEL__MODEL",
        "APP_FLOWS__MODE",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn environment_file_overrides_base() {
    clear_env();
    let dir = config_dir("application:\n  host: 127.0.0.1\nflows:\n  mode: offline\n");

    let settings = get_configuration_from(dir.path()).unwrap();

    assert_eq!(settings.application.host, "127.0.0.1");
    assert_eq!(settings.application.port, 8000);
    assert_eq!(settings.flows.mode, FlowMode::Offline);
    assert_eq!(settings.model.provider, ProviderKind::OpenRouter);
    assert_eq!(settings.model.timeout_secs, 30);
    assert!(settings.model.api_key.expose_secret().is_empty());
}

#[test]
#[serial]
fn env_vars_override_files() {
    clear_env();
    let dir = config_dir("{}\n");
    std::env::set_var("APP_APPLICATION__PORT", "9100");
    std::env::set_var("APP_MODEL__PROVIDER", "ollama");
    std::env::set_var("APP_MODEL__API_KEY", "sk-test");

    let settings = get_configuration_from(dir.path());
    clear_env();
    let settings = settings.unwrap();

    assert_eq!(settings.application.port, 9100);
    assert_eq!(settings.model.provider, ProviderKind::Ollama);
    assert_eq!(settings.model.api_key.expose_secret(), "sk-test");
    assert_eq!(settings.flows.mode, FlowMode::Live);
}

#[test]
#[serial]
fn unknown_environment_is_rejected() {
    clear_env();
    let dir = config_dir("{}\n");
    std::env::set_var("APP_ENVIRONMENT", "staging");

    let result = get_configuration_from(dir.path());
    clear_env();

    assert!(result.is_err());
}

#[test]
#[serial]
fn unknown_flow_mode_is_rejected() {
    clear_env();
    let dir = config_dir("flows:\n  mode: sometimes\n");
    assert!(get_configuration_from(dir.path()).is_err());
}

#[test]
#[serial]
fn unset_model_falls_back_to_the_provider_default() {
    clear_env();
    let dir = config_dir("model:\n  provider: ollama\n");

    let settings = get_configuration_from(dir.path()).unwrap();
    assert_eq!(settings.model.model, None);

    let backend = build_backend(&settings).unwrap();
    assert_eq!(backend.describe(), "live (ollama / llama3.1)");
}

#[test]
#[serial]
fn configured_model_is_sent_to_the_provider() {
    clear_env();
    let dir = config_dir("{}\n");
    std::env::set_var("APP_MODEL__MODEL", "anthropic/claude-3.5-haiku");

    let settings = get_configuration_from(dir.path());
    clear_env();
    let backend = build_backend(&settings.unwrap()).unwrap();

    assert_eq!(backend.describe(), "live (OpenRouter / anthropic/claude-3.5-haiku)");
}
