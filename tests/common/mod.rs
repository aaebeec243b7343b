#![allow(dead_code)]

use async_trait::async_trait;
use cmndseven::providers::render::{self, DiagramRenderer};
use cmndseven::report::ViewerFragment;
use cmndseven::{EngineClient, GlobalOptions};
use serde_json::{Value, json};
use std::sync::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake";

pub const BPMN: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL" id="Definitions_1">
  <bpmn:process id="invoice" isExecutable="true">
    <bpmn:serviceTask id="Task_A" />
    <bpmn:userTask id="Task_B" />
  </bpmn:process>
</bpmn:definitions>"#;

/// Base URL of the mocked engine, including the usual `/engine-rest` prefix
pub fn engine_url(server: &MockServer) -> String {
    format!("{}/engine-rest", server.uri())
}

pub fn client(server: &MockServer) -> EngineClient {
    EngineClient::new(&GlobalOptions::new(engine_url(server))).unwrap()
}

/// Renderer that records its inputs and returns a fixed PNG
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub calls: Mutex<Vec<(String, ViewerFragment)>>,
    pub fail: bool,
}

impl RecordingRenderer {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::default(),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(String, ViewerFragment)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DiagramRenderer for RecordingRenderer {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn check_available(&self) -> render::Result<()> {
        Ok(())
    }

    async fn render(&self, bpmn_xml: &str, fragment: &ViewerFragment) -> render::Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((bpmn_xml.to_string(), fragment.clone()));
        if self.fail {
            return Err(render::Error::CommandFailed {
                command: "node".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "browser crashed".to_string(),
            });
        }
        Ok(PNG_BYTES.to_vec())
    }
}

/// Mount instance "42" of definition `invoice:1:7` with the given activities and incidents
pub async fn mount_instance(server: &MockServer, activities: Value, incidents: Value) {
    Mock::given(method("GET"))
        .and(path("/engine-rest/history/process-instance/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "processDefinitionId": "invoice:1:7",
            "processDefinitionKey": "invoice",
            "state": "ACTIVE",
            "startTime": "1970-01-01T00:16:40.000+0000",
            "endTime": null
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/engine-rest/process-definition/invoice:1:7/xml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "invoice:1:7",
            "bpmn20Xml": BPMN
        })))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/engine-rest/history/activity-instance"))
        .and(query_param("processInstanceId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(activities))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/engine-rest/incident"))
        .and(query_param("processInstanceId", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(incidents))
        .expect(1)
        .mount(server)
        .await;
}

/// Task_A ran from t=1000s to t=1005s, Task_B started at t=1005s and is still running
pub fn two_activities() -> Value {
    json!([
        {
            "id": "Task_A:1",
            "activityId": "Task_A",
            "activityType": "serviceTask",
            "startTime": "1970-01-01T00:16:40.000+0000",
            "endTime": "1970-01-01T00:16:45.000+0000"
        },
        {
            "id": "Task_B:2",
            "activityId": "Task_B",
            "activityType": "userTask",
            "startTime": "1970-01-01T00:16:45.000+0000",
            "endTime": null
        }
    ])
}
