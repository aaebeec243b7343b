use clap::{Args, Subcommand};
use snafu::prelude::*;
use std::path::PathBuf;

use super::GlobalArgs;
use crate::config::{CmndsevenConfig, RenderConfig};
use crate::engine::{self, EngineClient};
use crate::output::{self, OutputTarget};
use crate::providers::render::{self, DiagramRenderer, PuppeteerRenderer};
use crate::report;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to load configuration"))]
    Config { source: config::ConfigError },

    #[snafu(display("Invalid engine connection settings"))]
    Engine { source: engine::Error },

    #[snafu(display("Renderer unavailable"))]
    RendererUnavailable { source: render::Error },

    #[snafu(display("Could not build report for instance {instance_id}"))]
    Report {
        instance_id: String,
        source: report::Error,
    },

    #[snafu(display("Failed to write report to {target}"))]
    WriteOutput {
        target: String,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(subcommand)]
    pub command: RenderCommands,
}

#[derive(Subcommand, Debug)]
pub enum RenderCommands {
    /// Render a historic process instance as a self-contained HTML report
    Instance(InstanceArgs),
}

#[derive(Args, Debug)]
pub struct InstanceArgs {
    /// Historic process instance ID
    #[arg(value_name = "INSTANCE_ID")]
    pub instance_id: String,

    /// Output file; "-" or omitted writes to stdout
    #[arg(value_name = "OUTPUT_PATH", default_value = "-")]
    pub output_path: PathBuf,

    /// Node.js executable used to drive the headless browser
    #[arg(long, value_name = "PATH")]
    pub node: Option<PathBuf>,

    /// Chrome/Chromium executable
    #[arg(long, value_name = "PATH")]
    pub browser: Option<PathBuf>,

    /// Directory containing the viewer and puppeteer bundles
    #[arg(long, value_name = "DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Milliseconds to wait after the browser exits before reading the screenshot
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,
}

impl InstanceArgs {
    /// Merge CLI arguments with config file settings
    /// CLI arguments take precedence over config file settings
    #[must_use]
    pub fn merge_with_config(&self, config: RenderConfig) -> RenderConfig {
        RenderConfig {
            node_path: self.node.clone().or(config.node_path),
            browser_path: self.browser.clone().or(config.browser_path),
            assets_dir: self.assets_dir.clone().unwrap_or(config.assets_dir),
            settle_delay_ms: self.settle_ms.unwrap_or(config.settle_delay_ms),
        }
    }
}

/// Handle the render subcommand
pub async fn handle_render(global: &GlobalArgs, args: RenderArgs) -> Result<()> {
    match args.command {
        RenderCommands::Instance(instance) => handle_render_instance(global, instance).await,
    }
}

async fn handle_render_instance(global: &GlobalArgs, args: InstanceArgs) -> Result<()> {
    let config = CmndsevenConfig::load(global.config.as_deref()).context(ConfigSnafu)?;
    let options = global.merge_with_config(&config);
    let renderer = PuppeteerRenderer::from_config(&args.merge_with_config(config.render));

    if global.verbose {
        output::format_render_start(&args.instance_id, &options.url);
    }

    // Fail on missing node/browser/bundles before talking to the engine
    renderer.check_available().context(RendererUnavailableSnafu)?;

    let client = EngineClient::new(&options).context(EngineSnafu)?;
    let html = report::render_instance_report(&client, &renderer, &args.instance_id)
        .await
        .context(ReportSnafu {
            instance_id: args.instance_id.clone(),
        })?;

    let target = OutputTarget::from_arg(Some(&args.output_path));
    target
        .write(&html, &mut std::io::stdout().lock())
        .with_context(|_| WriteOutputSnafu {
            target: match &target {
                OutputTarget::Stdout => "stdout".to_string(),
                OutputTarget::File(path) => path.display().to_string(),
            },
        })?;

    if let OutputTarget::File(path) = &target {
        output::format_report_saved(path);
    }

    Ok(())
}
