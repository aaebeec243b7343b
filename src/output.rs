//! Report destinations and status lines
//!
//! The HTML report and completion candidates are the only things written to
//! stdout; human-facing status goes to stderr so the report can be piped.

use console::style;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where a rendered report is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    /// `-` or no path selects stdout
    #[must_use]
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path.as_os_str() != "-" => OutputTarget::File(path.to_path_buf()),
            Some(_) | None => OutputTarget::Stdout,
        }
    }

    /// Write `html` (plus a trailing newline) to the target.
    ///
    /// `stdout` is only touched for [`OutputTarget::Stdout`]; files receive the
    /// exact same bytes.
    pub fn write(&self, html: &str, stdout: &mut impl Write) -> std::io::Result<()> {
        match self {
            OutputTarget::Stdout => {
                stdout.write_all(html.as_bytes())?;
                stdout.write_all(b"\n")?;
                stdout.flush()
            }
            OutputTarget::File(path) => {
                let mut file = std::fs::File::create(path)?;
                file.write_all(html.as_bytes())?;
                file.write_all(b"\n")?;
                file.flush()
            }
        }
    }
}

/// Format the confirmation shown after writing a report file
pub fn format_report_saved(path: &Path) {
    eprintln!(
        "{} Report saved to: {}",
        style("✓").green(),
        style(path.display()).bold()
    );
}

/// Format the banner shown before rendering in verbose mode
pub fn format_render_start(instance_id: &str, engine_url: &str) {
    eprintln!("\n{}", style("Instance Report").bold().cyan());
    eprintln!("{}", "─".repeat(80));
    eprintln!(
        "  {} {}",
        style("Instance ID:").dim(),
        style(instance_id).cyan()
    );
    eprintln!("  {} {}", style("Engine:").dim(), style(engine_url).dim());
    eprintln!("{}", "─".repeat(80));
}
