pub mod puppeteer;

pub use self::puppeteer::PuppeteerRenderer;

use crate::report::ViewerFragment;
use async_trait::async_trait;
use snafu::prelude::*;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Tool not installed: {tool}\n{install_instructions}"))]
    ToolNotInstalled {
        tool: String,
        install_instructions: String,
    },

    #[snafu(display(
        "Viewer asset '{}' not found. Build the viewer bundles and point render.assets_dir (or --assets-dir) at them.",
        path.display()
    ))]
    MissingAsset { path: PathBuf },

    #[snafu(display("Failed to create temporary directory: {source}"))]
    TempDirFailed { source: std::io::Error },

    #[snafu(display("Failed to write '{}': {source}", path.display()))]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to copy '{}': {source}", path.display()))]
    CopyFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Viewer skeleton has no '{placeholder}' token"))]
    MissingPlaceholder { placeholder: String },

    #[snafu(display("Failed to serialize viewer data: {source}"))]
    Fragment { source: serde_json::Error },

    #[snafu(display("Failed to spawn process '{command}': {source}"))]
    SpawnFailed {
        command: String,
        source: std::io::Error,
    },

    #[snafu(display("Command '{command}' failed ({status}): {stderr}"))]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[snafu(display("Rendered screenshot '{}' could not be read: {source}", path.display()))]
    MissingScreenshot {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turns a BPMN document plus execution data into a PNG image
#[async_trait]
pub trait DiagramRenderer: Send + Sync + std::fmt::Debug {
    /// Name of the rendering backend (e.g., "puppeteer")
    fn name(&self) -> &'static str;

    /// Verify that every external tool and asset the renderer needs is present
    ///
    /// # Errors
    /// Returns a descriptive error naming the first missing piece.
    fn check_available(&self) -> Result<()>;

    /// Render the diagram with timing and incident overlays
    ///
    /// # Arguments
    /// * `bpmn_xml` - BPMN 2.0 XML of the process definition
    /// * `fragment` - Activity timeline and incident markers to overlay
    async fn render(&self, bpmn_xml: &str, fragment: &ViewerFragment) -> Result<Vec<u8>>;
}
