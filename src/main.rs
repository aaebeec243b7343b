use clap::Parser;
use cmndseven::cmd::{self, CompleteArgs, GlobalArgs, RenderArgs, handle_complete, handle_render};
use snafu::prelude::*;
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Render failed"))]
    Render { source: cmd::render::Error },

    #[snafu(display("Completion failed"))]
    Complete { source: cmd::complete::Error },
}

#[derive(Parser, Debug)]
#[command(name = "cmndseven")]
#[command(version)]
#[command(about = "Camunda Platform 7 CLI", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Render engine data as standalone reports
    Render(RenderArgs),
    /// Shell-completion helpers
    Complete(CompleteArgs),
}

/// Initialize tracing/logging with indicatif integration
///
/// Everything goes to stderr; stdout carries the report.
fn init_tracing(verbose: bool) {
    let indicatif_layer = IndicatifLayer::new().with_progress_style(
        indicatif::ProgressStyle::with_template("{spinner:.cyan} {span_name} {wide_msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );

    let filter_layer = if verbose {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"))
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(indicatif_layer.get_stderr_writer());

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .with(indicatif_layer)
        .init();
}

#[snafu::report]
#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match cli.command {
        Commands::Render(args) => handle_render(&cli.global, args).await.context(RenderSnafu),
        Commands::Complete(args) => handle_complete(&cli.global, args)
            .await
            .context(CompleteSnafu),
    }
}
