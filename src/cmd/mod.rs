pub mod complete;
pub mod render;

pub use complete::{CompleteArgs, handle_complete};
pub use render::{RenderArgs, handle_render};

use crate::config::{CmndsevenConfig, GlobalOptions};
use clap::Args;
use std::path::PathBuf;

/// Options accepted by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Set Camunda REST API base URL
    #[arg(long, global = true, env = "CAMUNDA_URL", value_name = "URL")]
    pub url: Option<String>,

    /// Set Authorization header sent with every API call
    #[arg(
        long,
        global = true,
        env = "CAMUNDA_AUTHORIZATION",
        value_name = "VALUE",
        hide_env_values = true
    )]
    pub authorization: Option<String>,

    /// Additional configuration file (YAML, TOML or JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// Merge CLI arguments with config file settings
    /// CLI arguments take precedence over config file settings
    #[must_use]
    pub fn merge_with_config(&self, config: &CmndsevenConfig) -> GlobalOptions {
        GlobalOptions::resolve(
            self.url.clone(),
            self.authorization.clone(),
            &config.engine,
        )
    }
}
