//! Configuration for the seq2seq server.

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::accelerator::DevicePreference;

/// Environment variable holding the model directory.
pub const MODEL_ID_ENV: &str = "MODEL_ID";

/// Main configuration structure for the seq2seq server.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub accelerator: AcceleratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Tokio worker threads. Unset means one per core.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Expose `GET /docs` with the endpoint listing.
    #[serde(default)]
    pub enable_docs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            enable_docs: false,
        }
    }
}

/// The served model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Name used in request paths and v2 responses.
    #[serde(default = "default_model_name")]
    pub name: String,
    /// Model directory. Overridden by `MODEL_ID`.
    /// Reported as `model_name` in v1 predictions.
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Add a generated `request_id` to v1 responses.
    #[serde(default)]
    pub include_request_id: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            path: default_model_path(),
            include_request_id: false,
        }
    }
}

/// Remote generation engine (any Open Inference Protocol v2 server).
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_url")]
    pub base_url: String,
    /// Model name on the engine. Defaults to `model.name`.
    #[serde(default)]
    pub model_name: Option<String>,
    /// Ask the engine to load the model through its repository API at startup.
    #[serde(default = "default_true")]
    pub load_on_startup: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: default_engine_url(),
            model_name: None,
            load_on_startup: true,
            timeout_secs: default_timeout(),
        }
    }
}

/// Tokenization and decoding parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_true")]
    pub truncation: bool,
    #[serde(default = "default_num_beams")]
    pub num_beams: u32,
    #[serde(default = "default_true")]
    pub early_stopping: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            truncation: true,
            num_beams: default_num_beams(),
            early_stopping: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AcceleratorConfig {
    #[serde(default)]
    pub device: DevicePreference,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_model_name() -> String {
    "seq2seq".to_string()
}
fn default_model_path() -> String {
    "/mnt/models".to_string()
}
fn default_engine_url() -> String {
    "http://localhost:8000".to_string()
}
fn default_timeout() -> u64 {
    300
}
fn default_max_length() -> usize {
    512
}
fn default_num_beams() -> u32 {
    4
}
fn default_true() -> bool {
    true
}

impl EngineConfig {
    /// Model name to use on the engine side.
    pub fn remote_model_name<'a>(&'a self, model: &'a ModelConfig) -> &'a str {
        self.model_name.as_deref().unwrap_or(&model.name)
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. `MODEL_ID` for the model directory
    /// 2. Environment variables (SEQ2SEQ__SECTION__KEY format)
    /// 3. config.toml file (if present)
    /// 4. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port() as i64)?
            .set_default("model.name", default_model_name())?
            .set_default("model.path", default_model_path())?
            // Load from config.toml if exists
            .add_source(File::with_name("config").required(false))
            // Override with environment variables (SEQ2SEQ__SECTION__KEY format)
            .add_source(
                Environment::with_prefix("SEQ2SEQ")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("model.path", std::env::var(MODEL_ID_ENV).ok())?
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let server = ServerConfig::default();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 8080);
        assert!(server.workers.is_none());
        assert!(!server.enable_docs);
    }

    #[test]
    fn test_default_generation_config() {
        let generation = GenerationConfig::default();
        assert_eq!(generation.max_length, 512);
        assert!(generation.truncation);
        assert_eq!(generation.num_beams, 4);
        assert!(generation.early_stopping);
    }

    #[test]
    fn test_default_model_path() {
        assert_eq!(ModelConfig::default().path, "/mnt/models");
    }

    #[test]
    fn test_remote_model_name_fallback() {
        let model = ModelConfig::default();
        let mut engine = EngineConfig::default();
        assert_eq!(engine.remote_model_name(&model), "seq2seq");

        engine.model_name = Some("t5-it".to_string());
        assert_eq!(engine.remote_model_name(&model), "t5-it");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let loaded: Config = ConfigLoader::builder()
            .add_source(config::File::from_str(
                "[server]\nport = 9000\n[accelerator]\ndevice = \"cpu\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(loaded.server.port, 9000);
        assert_eq!(loaded.server.host, "0.0.0.0");
        assert_eq!(loaded.accelerator.device, DevicePreference::Cpu);
        assert_eq!(loaded.generation.max_length, 512);
    }
}
