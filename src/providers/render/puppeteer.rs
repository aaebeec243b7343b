//! Headless-browser renderer driven by an external Node.js process
//!
//! Each render stages a private temporary directory holding the BPMN document,
//! the prebuilt `bpmn-js` and Puppeteer bundles, the screenshot driver and the
//! viewer page with the execution data spliced in. `node <dir>` then loads the
//! page in Chrome/Chromium and writes `output.png` next to it. The directory is
//! removed when the render returns, whether it succeeded or not.

use async_trait::async_trait;
use snafu::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::{
    CommandFailedSnafu, CopyFailedSnafu, DiagramRenderer, FragmentSnafu, MissingAssetSnafu,
    MissingPlaceholderSnafu, MissingScreenshotSnafu, Result, SpawnFailedSnafu,
    TempDirFailedSnafu, ToolNotInstalledSnafu, WriteFailedSnafu,
};
use crate::config::RenderConfig;
use crate::report::ViewerFragment;

/// Token in the viewer skeleton replaced by the execution data script
pub const PLACEHOLDER: &str = "/* PLACEHOLDER */";

pub const VIEWER_BUNDLE: &str = "bpmn-viewer.production.min.js";
pub const PUPPETEER_BUNDLE: &str = "puppeteer.production.min.js";

const SKELETON_HTML: &str = include_str!("../../../assets/skeleton.html");
const DRIVER_JS: &str = include_str!("../../../assets/index.js");

const INPUT_FILE: &str = "input.bpmn";
const OUTPUT_FILE: &str = "output.png";

const BROWSER_CANDIDATES: [&str; 4] = ["chrome", "chromium", "chromium-browser", "google-chrome"];

/// Replace the first placeholder token in `skeleton` with `script`.
///
/// Everything around the token is preserved byte for byte.
pub fn splice_placeholder(skeleton: &str, script: &str) -> Result<String> {
    ensure!(
        skeleton.contains(PLACEHOLDER),
        MissingPlaceholderSnafu {
            placeholder: PLACEHOLDER
        }
    );
    Ok(skeleton.replacen(PLACEHOLDER, script, 1))
}

#[derive(Debug, Clone)]
pub struct PuppeteerRenderer {
    /// Explicit Node.js executable; `node` from PATH when unset
    node_path: Option<PathBuf>,
    /// Explicit browser executable; first of [`BROWSER_CANDIDATES`] on PATH when unset
    browser_path: Option<PathBuf>,
    assets_dir: PathBuf,
    settle_delay: Duration,
}

impl PuppeteerRenderer {
    #[must_use]
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            node_path: None,
            browser_path: None,
            assets_dir: assets_dir.into(),
            settle_delay: Duration::from_secs(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            node_path: config.node_path.clone(),
            browser_path: config.browser_path.clone(),
            assets_dir: config.assets_dir.clone(),
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        }
    }

    #[must_use]
    pub fn with_node_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.node_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_browser_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.browser_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    fn resolve_node(&self) -> Result<PathBuf> {
        let candidate = self
            .node_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("node"));
        which::which(&candidate).map_err(|_| {
            ToolNotInstalledSnafu {
                tool: format!("Node.js ({})", candidate.display()),
                install_instructions: "Install with:\n\
                   - Ubuntu/Debian: sudo apt-get install nodejs\n\
                   - macOS: brew install node\n\
                   - Or set render.node_path / --node to the node executable"
                    .to_string(),
            }
            .build()
        })
    }

    fn resolve_browser(&self) -> Result<PathBuf> {
        let found = match &self.browser_path {
            Some(path) => which::which(path).ok(),
            None => BROWSER_CANDIDATES
                .iter()
                .find_map(|name| which::which(name).ok()),
        };
        found.ok_or_else(|| {
            let tool = self.browser_path.as_ref().map_or_else(
                || format!("Chrome/Chromium ({})", BROWSER_CANDIDATES.join(", ")),
                |path| format!("Chrome/Chromium ({})", path.display()),
            );
            ToolNotInstalledSnafu {
                tool,
                install_instructions: "Install with:\n\
                   - Ubuntu/Debian: sudo apt-get install chromium\n\
                   - macOS: brew install --cask chromium\n\
                   - Or set render.browser_path / --browser to the browser executable"
                    .to_string(),
            }
            .build()
        })
    }

    fn bundle_paths(&self) -> [PathBuf; 2] {
        [
            self.assets_dir.join(VIEWER_BUNDLE),
            self.assets_dir.join(PUPPETEER_BUNDLE),
        ]
    }

    fn check_assets(&self) -> Result<()> {
        for path in self.bundle_paths() {
            ensure!(path.is_file(), MissingAssetSnafu { path });
        }
        Ok(())
    }

    /// Populate `dir` with everything the screenshot driver reads
    pub fn stage(&self, dir: &Path, bpmn_xml: &str, fragment: &ViewerFragment) -> Result<()> {
        let write = |name: &str, contents: &str| -> Result<()> {
            let path = dir.join(name);
            std::fs::write(&path, contents).context(WriteFailedSnafu { path })
        };

        write(INPUT_FILE, bpmn_xml)?;
        write("index.js", DRIVER_JS)?;

        let script = fragment.to_script().context(FragmentSnafu)?;
        write("skeleton.html", &splice_placeholder(SKELETON_HTML, &script)?)?;

        for bundle in self.bundle_paths() {
            let Some(name) = bundle.file_name() else {
                continue;
            };
            std::fs::copy(&bundle, dir.join(name)).context(CopyFailedSnafu {
                path: bundle.clone(),
            })?;
        }

        debug!("Staged viewer workspace in {}", dir.display());
        Ok(())
    }
}

#[async_trait]
impl DiagramRenderer for PuppeteerRenderer {
    fn name(&self) -> &'static str {
        "puppeteer"
    }

    fn check_available(&self) -> Result<()> {
        self.resolve_node()?;
        self.resolve_browser()?;
        self.check_assets()
    }

    #[tracing::instrument(name = "render_diagram", skip_all)]
    async fn render(&self, bpmn_xml: &str, fragment: &ViewerFragment) -> Result<Vec<u8>> {
        let node = self.resolve_node()?;
        let browser = self.resolve_browser()?;
        self.check_assets()?;

        let workdir = tempfile::Builder::new()
            .prefix("cmndseven-")
            .tempdir()
            .context(TempDirFailedSnafu)?;
        self.stage(workdir.path(), bpmn_xml, fragment)?;

        let command = node.display().to_string();
        info!(
            "Rendering diagram with {} and {}",
            command,
            browser.display()
        );

        let output = Command::new(&node)
            .arg(workdir.path())
            .env("PUPPETEER_EXECUTABLE_PATH", &browser)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .context(SpawnFailedSnafu {
                command: command.clone(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return CommandFailedSnafu {
                command,
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            }
            .fail();
        }

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let screenshot = workdir.path().join(OUTPUT_FILE);
        tokio::fs::read(&screenshot)
            .await
            .context(MissingScreenshotSnafu { path: screenshot })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::providers::render::Error;
    use crate::report::{IncidentMarker, TimelineEntry};

    const BPMN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="d">
  <bpmn:process id="p"><bpmn:userTask id="Task_A"/></bpmn:process>
</bpmn:definitions>"#;

    fn fragment() -> ViewerFragment {
        ViewerFragment {
            activities: vec![TimelineEntry {
                activity_id: "Task_A".to_string(),
                start_time: 1000.0,
                end_time: None,
            }],
            incidents: vec![IncidentMarker {
                activity_id: "Task_A".to_string(),
                incident_message: "boom".to_string(),
            }],
        }
    }

    fn assets_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VIEWER_BUNDLE), "/* viewer */").unwrap();
        std::fs::write(dir.path().join(PUPPETEER_BUNDLE), "/* puppeteer */").unwrap();
        dir
    }

    #[test]
    fn test_splice_replaces_single_placeholder() {
        let skeleton = "<html>\n<script>\nlet a = 1;\n/* PLACEHOLDER */\nlet b = 2;\n</script>\n</html>\n";
        let script = "renderActivities(bpmnViewer, [], []);";
        let spliced = splice_placeholder(skeleton, script).unwrap();

        let (before, after) = skeleton.split_once(PLACEHOLDER).unwrap();
        assert_eq!(spliced, format!("{before}{script}{after}"));
        assert!(!spliced.contains(PLACEHOLDER));
    }

    #[test]
    fn test_splice_only_first_occurrence() {
        let skeleton = "/* PLACEHOLDER */ and /* PLACEHOLDER */";
        let spliced = splice_placeholder(skeleton, "x").unwrap();
        assert_eq!(spliced, "x and /* PLACEHOLDER */");
    }

    #[test]
    fn test_splice_requires_placeholder() {
        let err = splice_placeholder("<html></html>", "x").unwrap_err();
        assert!(matches!(err, Error::MissingPlaceholder { .. }));
    }

    #[test]
    fn test_builtin_skeleton_has_one_placeholder() {
        assert_eq!(SKELETON_HTML.matches(PLACEHOLDER).count(), 1);
        assert!(SKELETON_HTML.contains("function renderActivities("));
    }

    #[test]
    fn test_stage_writes_workspace() {
        let assets = assets_dir();
        let workdir = tempfile::tempdir().unwrap();
        let renderer = PuppeteerRenderer::new(assets.path());

        renderer.stage(workdir.path(), BPMN, &fragment()).unwrap();

        let read = |name: &str| std::fs::read_to_string(workdir.path().join(name)).unwrap();
        assert_eq!(read(INPUT_FILE), BPMN);
        assert_eq!(read("index.js"), DRIVER_JS);
        assert_eq!(read(VIEWER_BUNDLE), "/* viewer */");
        assert_eq!(read(PUPPETEER_BUNDLE), "/* puppeteer */");

        let skeleton = read("skeleton.html");
        let script = fragment().to_script().unwrap();
        assert_eq!(skeleton, splice_placeholder(SKELETON_HTML, &script).unwrap());
        assert!(skeleton.contains(r#""endTime":null"#));
    }

    #[test]
    fn test_missing_assets_reported() {
        let empty = tempfile::tempdir().unwrap();
        let renderer = PuppeteerRenderer::new(empty.path());
        match renderer.check_assets().unwrap_err() {
            Error::MissingAsset { path } => assert!(path.ends_with(VIEWER_BUNDLE)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_node_reported() {
        let renderer = PuppeteerRenderer::new("/nonexistent")
            .with_node_path("/nonexistent/bin/node-that-does-not-exist");
        let err = renderer.check_available().unwrap_err();
        assert!(matches!(err, Error::ToolNotInstalled { .. }));
        assert!(err.to_string().contains("node-that-does-not-exist"));
    }

    #[cfg(unix)]
    mod subprocess {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        // Writing an executable while another test forks can fail with ETXTBSY
        static SPAWN_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

        fn fake_node(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-node");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn renderer(tools: &Path, assets: &Path, body: &str) -> PuppeteerRenderer {
            let node = fake_node(tools, body);
            PuppeteerRenderer::new(assets)
                .with_node_path(&node)
                .with_browser_path(&node)
                .with_settle_delay(Duration::ZERO)
        }

        #[tokio::test]
        async fn test_render_reads_screenshot() {
            let _guard = SPAWN_LOCK.lock().await;
            let tools = tempfile::tempdir().unwrap();
            let assets = assets_dir();
            let renderer = renderer(
                tools.path(),
                assets.path(),
                r#"test -f "$1/skeleton.html" || exit 7
printf 'PNG:%s' "$PUPPETEER_EXECUTABLE_PATH" > "$1/output.png""#,
            );

            let png = String::from_utf8(renderer.render(BPMN, &fragment()).await.unwrap()).unwrap();
            assert!(png.starts_with("PNG:/"), "screenshot was {png}");
            assert!(png.ends_with("fake-node"), "screenshot was {png}");
        }

        #[tokio::test]
        async fn test_nonzero_exit_fails_before_reading() {
            let _guard = SPAWN_LOCK.lock().await;
            let tools = tempfile::tempdir().unwrap();
            let assets = assets_dir();
            let renderer = renderer(
                tools.path(),
                assets.path(),
                r#"printf 'stale' > "$1/output.png"
echo "browser crashed" >&2
exit 3"#,
            );

            match renderer.render(BPMN, &fragment()).await.unwrap_err() {
                Error::CommandFailed { status, stderr, .. } => {
                    assert!(status.contains('3'), "status was {status}");
                    assert_eq!(stderr, "browser crashed");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_missing_screenshot_reported() {
            let _guard = SPAWN_LOCK.lock().await;
            let tools = tempfile::tempdir().unwrap();
            let assets = assets_dir();
            let renderer = renderer(tools.path(), assets.path(), "exit 0");

            let err = renderer.render(BPMN, &fragment()).await.unwrap_err();
            assert!(matches!(err, Error::MissingScreenshot { .. }));
        }

        #[tokio::test]
        async fn test_workdir_removed_after_render() {
            let _guard = SPAWN_LOCK.lock().await;
            let tools = tempfile::tempdir().unwrap();
            let assets = assets_dir();
            let seen = tools.path().join("workdir");

            let renderer = renderer(
                tools.path(),
                assets.path(),
                &format!(
                    r#"printf '%s' "$1" > "{}"
printf 'png' > "$1/output.png""#,
                    seen.display()
                ),
            );
            renderer.render(BPMN, &fragment()).await.unwrap();

            let workdir = PathBuf::from(std::fs::read_to_string(&seen).unwrap());
            assert!(workdir.file_name().is_some());
            assert!(!workdir.exists(), "{} was left behind", workdir.display());
        }

        #[tokio::test]
        async fn test_workdir_removed_after_failure() {
            let _guard = SPAWN_LOCK.lock().await;
            let tools = tempfile::tempdir().unwrap();
            let assets = assets_dir();
            let seen = tools.path().join("workdir");

            let renderer = renderer(
                tools.path(),
                assets.path(),
                &format!(
                    r#"printf '%s' "$1" > "{}"
exit 4"#,
                    seen.display()
                ),
            );
            let err = renderer.render(BPMN, &fragment()).await.unwrap_err();
            assert!(matches!(err, Error::CommandFailed { .. }));

            let workdir = PathBuf::from(std::fs::read_to_string(&seen).unwrap());
            assert!(workdir.file_name().is_some());
            assert!(!workdir.exists(), "{} was left behind", workdir.display());
        }
    }
}
