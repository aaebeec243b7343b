//! Camunda Platform 7 REST payloads
//!
//! Only the fields the report pipeline reads are modelled; everything else in
//! the engine's responses is ignored during deserialization.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer};

/// `GET /history/process-instance/{id}`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricProcessInstance {
    pub id: String,
    pub process_definition_id: String,
    #[serde(default)]
    pub process_definition_key: Option<String>,
    #[serde(default)]
    pub business_key: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, with = "engine_time::option")]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "engine_time::option")]
    pub end_time: Option<DateTime<FixedOffset>>,
}

/// `GET /process-definition/{id}/xml`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDefinitionDiagram {
    pub id: String,
    pub bpmn20_xml: String,
}

/// One entry of `GET /history/activity-instance`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    #[serde(default)]
    pub id: String,
    pub activity_id: String,
    #[serde(default)]
    pub activity_name: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(with = "engine_time")]
    pub start_time: DateTime<FixedOffset>,
    /// `None` while the activity is still running
    #[serde(default, with = "engine_time::option")]
    pub end_time: Option<DateTime<FixedOffset>>,
}

/// Incident type as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum IncidentKind {
    /// `failedJob`: configuration holds the job id
    FailedJob,
    /// `failedExternalTask`: configuration holds the external task id
    FailedExternalTask,
    Other(String),
}

impl From<String> for IncidentKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "failedJob" => IncidentKind::FailedJob,
            "failedExternalTask" => IncidentKind::FailedExternalTask,
            _ => IncidentKind::Other(value),
        }
    }
}

impl IncidentKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            IncidentKind::FailedJob => "failedJob",
            IncidentKind::FailedExternalTask => "failedExternalTask",
            IncidentKind::Other(kind) => kind,
        }
    }
}

/// One entry of `GET /incident`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    #[serde(default)]
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub activity_id: String,
    #[serde(rename = "incidentType")]
    pub kind: IncidentKind,
    /// Job id or external task id, depending on `kind`
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(
        rename = "incidentMessage",
        default,
        deserialize_with = "nullable_string"
    )]
    pub message: String,
}

/// One entry of `GET /task`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserTask {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub process_instance_id: Option<String>,
    #[serde(default)]
    pub task_definition_key: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Engine date handling: `yyyy-MM-dd'T'HH:mm:ss.SSSZ`, with RFC 3339 as fallback.
pub mod engine_time {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, de};

    const ENGINE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

    pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_str(value, ENGINE_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(|e| de::Error::custom(format!("invalid engine date '{raw}': {e}")))
    }

    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::{Deserialize, Deserializer, de};

        pub fn deserialize<'de, D>(
            deserializer: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw).map(Some).map_err(|e| {
                    de::Error::custom(format!("invalid engine date '{raw}': {e}"))
                }),
                None => Ok(None),
            }
        }
    }
}
