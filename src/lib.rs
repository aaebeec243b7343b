//! # cmndseven - Camunda Platform 7 CLI
//!
//! `cmndseven` talks to the REST API of a Camunda Platform 7 engine and turns a
//! historic process instance into a standalone HTML report: the BPMN diagram
//! with per-activity durations and incident markers, followed by the incident
//! messages and their stack traces.
//!
//! ## Pipeline
//!
//! - [`engine`] - typed client for the engine REST endpoints
//! - [`report`] - fetches instance data, builds the viewer data and the HTML page
//! - [`providers::render`] - [`DiagramRenderer`] capability and the headless-browser implementation
//! - [`output`] - stdout/file report destinations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cmndseven::{EngineClient, GlobalOptions, PuppeteerRenderer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = GlobalOptions::new("http://localhost:8080/engine-rest");
//! let client = EngineClient::new(&options)?;
//! let renderer = PuppeteerRenderer::new("/usr/share/cmndseven/assets");
//!
//! let html = cmndseven::report::render_instance_report(&client, &renderer, "42").await?;
//! std::fs::write("instance-42.html", html)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Command-Line Interface
//!
//! ```bash
//! # Render to stdout
//! cmndseven --url http://localhost:8080/engine-rest render instance 42 > report.html
//!
//! # Render to a file
//! CAMUNDA_AUTHORIZATION="Basic ZGVtbzpkZW1v" cmndseven render instance 42 report.html
//!
//! # Completion candidates
//! cmndseven complete user-task 42
//! ```
//!
//! ## Configuration
//!
//! cmndseven can be configured via:
//! - Configuration file (`cmndseven.yaml`)
//! - Environment variables (prefix: `CMNDSEVEN__`, plus `CAMUNDA_URL` / `CAMUNDA_AUTHORIZATION`)
//! - Command-line arguments
//!
//! See [`config::CmndsevenConfig`] for available options.

pub mod cmd;
pub mod config;
pub mod engine;
pub mod output;
pub mod providers;
pub mod report;

// Re-export commonly used types for convenience
pub use config::GlobalOptions;
pub use engine::EngineClient;
pub use providers::render::{DiagramRenderer, PuppeteerRenderer};
