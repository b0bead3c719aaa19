use config::{Config, ConfigError, Environment as ConfigEnvironment, File};
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub flows: FlowSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenRouter,
    Ollama,
}

#[derive(serde::Deserialize, Clone)]
pub struct ModelSettings {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_api_key")]
    pub api_key: Secret<String>,
    /// Falls back to the provider's own default model when unset.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(
        default = "default_timeout_secs",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            api_key: default_api_key(),
            model: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlowMode {
    #[default]
    Live,
    Offline,
}

#[derive(serde::Deserialize, Clone, Default)]
pub struct FlowSettings {
    #[serde(default)]
    pub mode: FlowMode,
}

fn default_provider() -> ProviderKind {
    ProviderKind::OpenRouter
}

fn default_api_key() -> Secret<String> {
    Secret::new(String::new())
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.2
}

/// Loads `configuration/base.yaml`, then the file for `APP_ENVIRONMENT`, then
/// `APP_`-prefixed environment variables (`APP_MODEL__PROVIDER=ollama`).
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("failed to determine current directory: {e}")))?
        .join("configuration");
    get_configuration_from(&base_path)
}

pub fn get_configuration_from(base_path: &Path) -> Result<Settings, ConfigError> {
    let environment: AppEnvironment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let environment_filename = format!("{}.yaml", environment.as_str());
    info!("Loading configuration from {}", environment_filename);

    let settings = Config::builder()
        .add_source(File::from(base_path.join("base.yaml")))
        .add_source(File::from(base_path.join(&environment_filename)).required(false))
        .add_source(
            ConfigEnvironment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;

    info!(
        host = %settings.application.host,
        port = settings.application.port,
        provider = ?settings.model.provider,
        model = ?settings.model.model,
        mode = ?settings.flows.mode,
        "configuration loaded"
    );

    Ok(settings)
}

pub enum AppEnvironment {
    Local,
    Production,
}

impl AppEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnvironment::Local => "local",
            AppEnvironment::Production => "production",
        }
    }
}

impl TryFrom<String> for AppEnvironment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}
