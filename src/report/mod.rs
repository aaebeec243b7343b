//! Instance report pipeline
//!
//! [`assemble`] gathers everything the report needs from the engine,
//! [`ViewerFragment`] turns the timeline and incidents into viewer data, a
//! [`DiagramRenderer`] produces the PNG and [`ReportTemplate`] wraps it all
//! into a single HTML page.

pub mod fragment;
pub mod template;

pub use fragment::{IncidentMarker, TimelineEntry, ViewerFragment};
pub use template::{IncidentDetail, ReportTemplate, data_uri};

use crate::engine::{
    self, ActivityRecord, EngineClient, HistoricProcessInstance, Incident, IncidentKind,
};
use crate::providers::render::{self, DiagramRenderer};
use snafu::prelude::*;
use std::collections::HashMap;
use tracing::{info, warn};

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to fetch {what} from the engine"))]
    Fetch {
        what: String,
        source: engine::Error,
    },

    #[snafu(display("Failed to render diagram with {renderer}"))]
    Render {
        renderer: String,
        source: render::Error,
    },

    #[snafu(display("Failed to build report"))]
    Template { source: template::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Detail text (stack trace or error details) per activity id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StacktraceLookup {
    details: HashMap<String, String>,
}

impl StacktraceLookup {
    pub fn insert(&mut self, activity_id: impl Into<String>, detail: impl Into<String>) {
        self.details.insert(activity_id.into(), detail.into());
    }

    /// Detail for an activity, or `""` when none was recorded
    #[must_use]
    pub fn get(&self, activity_id: &str) -> &str {
        self.details.get(activity_id).map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.details.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }
}

/// Everything fetched from the engine for one process instance
#[derive(Debug, Clone)]
pub struct ReportData {
    pub instance: HistoricProcessInstance,
    pub bpmn_xml: String,
    pub activities: Vec<ActivityRecord>,
    pub incidents: Vec<Incident>,
    pub details: StacktraceLookup,
}

impl ReportData {
    #[must_use]
    pub fn fragment(&self) -> ViewerFragment {
        ViewerFragment::from_records(&self.activities, &self.incidents)
    }

    /// Incident messages paired with their detail text, in engine order
    #[must_use]
    pub fn incident_details(&self) -> Vec<IncidentDetail> {
        self.incidents
            .iter()
            .map(|incident| IncidentDetail {
                message: incident.message.clone(),
                detail: self.details.get(&incident.activity_id).to_string(),
            })
            .collect()
    }
}

/// Fetch the detail text of every incident.
///
/// One request per incident; kinds other than failed jobs and failed external
/// tasks get an empty detail without contacting the engine.
pub async fn lookup_details(
    client: &EngineClient,
    incidents: &[Incident],
) -> Result<StacktraceLookup> {
    let mut lookup = StacktraceLookup::default();

    for incident in incidents {
        let detail = match (&incident.kind, incident.configuration.as_deref()) {
            (IncidentKind::FailedJob, Some(job_id)) => client
                .job_stacktrace(job_id)
                .await
                .context(FetchSnafu {
                    what: format!("stack trace of job {job_id}"),
                })?,
            (IncidentKind::FailedExternalTask, Some(task_id)) => client
                .external_task_error_details(task_id)
                .await
                .context(FetchSnafu {
                    what: format!("error details of external task {task_id}"),
                })?,
            (IncidentKind::FailedJob | IncidentKind::FailedExternalTask, None) => {
                warn!(
                    "Incident {} ({}) has no configuration; detail unavailable",
                    incident.id,
                    incident.kind.as_str()
                );
                String::new()
            }
            (IncidentKind::Other(_), _) => String::new(),
        };
        lookup.insert(incident.activity_id.clone(), detail);
    }

    Ok(lookup)
}

/// Gather instance metadata, diagram, activity history, incidents and their details
#[tracing::instrument(name = "fetch_instance", skip(client))]
pub async fn assemble(client: &EngineClient, instance_id: &str) -> Result<ReportData> {
    let instance = client
        .historic_process_instance(instance_id)
        .await
        .context(FetchSnafu {
            what: format!("historic process instance {instance_id}"),
        })?;

    let definition = client
        .process_definition_xml(&instance.process_definition_id)
        .await
        .context(FetchSnafu {
            what: format!(
                "BPMN XML of process definition {}",
                instance.process_definition_id
            ),
        })?;

    let activities = client
        .historic_activity_instances(instance_id)
        .await
        .context(FetchSnafu {
            what: format!("activity history of {instance_id}"),
        })?;

    let incidents = client.incidents(instance_id).await.context(FetchSnafu {
        what: format!("incidents of {instance_id}"),
    })?;

    info!(
        "Fetched instance {} of {}: {} activities, {} incidents",
        instance.id,
        instance
            .process_definition_key
            .as_deref()
            .unwrap_or(&instance.process_definition_id),
        activities.len(),
        incidents.len()
    );

    let details = lookup_details(client, &incidents).await?;

    Ok(ReportData {
        instance,
        bpmn_xml: definition.bpmn20_xml,
        activities,
        incidents,
        details,
    })
}

/// Run the full pipeline and return the HTML report for `instance_id`
pub async fn render_instance_report(
    client: &EngineClient,
    renderer: &dyn DiagramRenderer,
    instance_id: &str,
) -> Result<String> {
    let data = assemble(client, instance_id).await?;

    let png = renderer
        .render(&data.bpmn_xml, &data.fragment())
        .await
        .context(RenderSnafu {
            renderer: renderer.name(),
        })?;

    ReportTemplate::new()
        .and_then(|template| template.render(instance_id, &png, &data.incident_details()))
        .context(TemplateSnafu)
}
