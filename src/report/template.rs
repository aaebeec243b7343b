use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use snafu::prelude::*;

const INSTANCE_TEMPLATE: &str = include_str!("../../assets/instance.html");

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to parse report template: {source}"))]
    Parse { source: liquid::Error },

    #[snafu(display("Failed to render report template: {source}"))]
    Render { source: liquid::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

/// An incident as listed below the diagram
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IncidentDetail {
    pub message: String,
    /// Stack trace or external task error details; empty when unavailable
    pub detail: String,
}

#[derive(Serialize)]
struct ReportContext<'a> {
    title: &'a str,
    src: String,
    incidents: &'a [IncidentDetail],
}

/// Encode bytes as a `data:` URI
#[must_use]
pub fn data_uri(mimetype: &str, data: &[u8]) -> String {
    format!("data:{mimetype};base64,{}", STANDARD.encode(data))
}

/// HTML page embedding the rendered diagram and the incident list
pub struct ReportTemplate {
    template: liquid::Template,
}

impl std::fmt::Debug for ReportTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportTemplate").finish_non_exhaustive()
    }
}

impl ReportTemplate {
    /// Parse the built-in instance report template
    pub fn new() -> Result<Self> {
        Self::from_source(INSTANCE_TEMPLATE)
    }

    pub fn from_source(source: &str) -> Result<Self> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .context(ParseSnafu)?;
        let template = parser.parse(source).context(ParseSnafu)?;
        Ok(Self { template })
    }

    /// Render the report; the PNG is inlined as a base64 data URI
    pub fn render(&self, title: &str, png: &[u8], incidents: &[IncidentDetail]) -> Result<String> {
        let context = ReportContext {
            title,
            src: data_uri("image/png", png),
            incidents,
        };
        let globals = liquid::to_object(&context).context(RenderSnafu)?;
        let html = self.template.render(&globals).context(RenderSnafu)?;
        Ok(html.trim().to_string())
    }
}
