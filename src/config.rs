use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default Camunda REST API base URL
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:8080/engine-rest";

/// Global configuration for cmndseven
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CmndsevenConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Connection settings for the Camunda engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Camunda REST API base URL
    pub url: String,

    /// Value of the `Authorization` header sent with every request
    pub authorization: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_ENGINE_URL.to_string(),
            authorization: None,
        }
    }
}

/// Configuration for the headless-browser diagram renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Path to the Node.js executable (looked up on PATH when unset)
    pub node_path: Option<PathBuf>,

    /// Path to the Chrome/Chromium executable (looked up on PATH when unset)
    pub browser_path: Option<PathBuf>,

    /// Directory holding the prebuilt viewer and puppeteer bundles
    pub assets_dir: PathBuf,

    /// Time to wait after the browser exits before reading the screenshot
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            node_path: None,
            browser_path: None,
            assets_dir: PathBuf::from(format!("{}/.local/share/cmndseven/assets", home_dir())),
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

/// Engine connection options threaded through every API call.
///
/// Built once per invocation and passed explicitly; nothing in the crate keeps
/// connection state in globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub url: String,
    pub authorization: Option<String>,
}

impl GlobalOptions {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            authorization: None,
        }
    }

    #[must_use]
    pub fn with_authorization(mut self, authorization: impl Into<String>) -> Self {
        let authorization = authorization.into();
        self.authorization = (!authorization.is_empty()).then_some(authorization);
        self
    }

    /// Resolve options with CLI values taking precedence over the config file.
    ///
    /// Empty strings count as unset, so `CAMUNDA_AUTHORIZATION=` disables the header.
    #[must_use]
    pub fn resolve(
        url: Option<String>,
        authorization: Option<String>,
        config: &EngineConfig,
    ) -> Self {
        let url = url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| config.url.clone());
        let authorization = authorization
            .or_else(|| config.authorization.clone())
            .filter(|a| !a.is_empty());
        Self { url, authorization }
    }
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_URL)
    }
}

impl CmndsevenConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Command line arguments (applied by the caller)
    /// 2. Environment variables (CMNDSEVEN__*)
    /// 3. Explicit config file passed with --config
    /// 4. Config file (cmndseven.yaml in current dir or ~/.config/cmndseven/cmndseven.yaml)
    /// 5. Defaults (lowest priority)
    pub fn load(extra_file: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut config_builder = config::Config::builder()
            .add_source(config::Config::try_from(&CmndsevenConfig::default())?)
            .add_source(
                config::File::with_name("cmndseven")
                    .format(config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::File::with_name(&format!("{}/.config/cmndseven/cmndseven", home_dir()))
                    .format(config::FileFormat::Yaml)
                    .required(false),
            );

        if let Some(path) = extra_file {
            config_builder = config_builder.add_source(config::File::from(path).required(true));
        }

        let config = config_builder
            .add_source(
                config::Environment::with_prefix("CMNDSEVEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        config.try_deserialize()
    }
}
