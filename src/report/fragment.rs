//! Execution data handed to the diagram viewer
//!
//! The viewer page receives the activity timeline and the incident markers as
//! two JavaScript constants followed by a `renderActivities` call.

use crate::engine::{ActivityRecord, Incident};
use serde::Serialize;

/// One activity on the timeline; times are epoch seconds
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub activity_id: String,
    pub start_time: f64,
    /// Always serialized; `null` marks a running activity
    pub end_time: Option<f64>,
}

/// Incident overlay for a single activity
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IncidentMarker {
    pub activity_id: String,
    pub incident_message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewerFragment {
    pub activities: Vec<TimelineEntry>,
    pub incidents: Vec<IncidentMarker>,
}

fn epoch_seconds(time: &chrono::DateTime<chrono::FixedOffset>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}

impl ViewerFragment {
    /// Build the fragment from engine records, keeping their order
    #[must_use]
    pub fn from_records(activities: &[ActivityRecord], incidents: &[Incident]) -> Self {
        Self {
            activities: activities
                .iter()
                .map(|activity| TimelineEntry {
                    activity_id: activity.activity_id.clone(),
                    start_time: epoch_seconds(&activity.start_time),
                    end_time: activity.end_time.as_ref().map(epoch_seconds),
                })
                .collect(),
            incidents: incidents
                .iter()
                .map(|incident| IncidentMarker {
                    activity_id: incident.activity_id.clone(),
                    incident_message: incident.message.clone(),
                })
                .collect(),
        }
    }

    pub fn activities_json(&self) -> serde_json::Result<String> {
        script_json(&self.activities)
    }

    pub fn incidents_json(&self) -> serde_json::Result<String> {
        script_json(&self.incidents)
    }

    /// JavaScript statements spliced into the viewer skeleton
    pub fn to_script(&self) -> serde_json::Result<String> {
        Ok(format!(
            "\nconst activities = {};\nconst incidents = {};\nrenderActivities(bpmnViewer, activities, incidents);\n",
            self.activities_json()?,
            self.incidents_json()?
        ))
    }
}

/// Serialize for inline `<script>` use: `</` would end the script element early.
fn script_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}
