//! Artifact Document
//!
//! The final normalized execution plan, serialized as JSON for the
//! external run-time engine. Built last, never mutated after
//! construction.

use std::collections::BTreeMap;
use std::error::Error;
use std::fs;

use log::info;
use serde::{Deserialize, Serialize};

use crate::model::values::LiteralValue;

/// Artifact format version.
pub const ARTIFACT_VERSION: &str = "1.0";

/// The complete execution plan for one experiment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactDocument {
    pub experiment: String,
    pub version: String,

    /// Task definitions grouped by workflow.
    pub tasks: Vec<Vec<TaskDefinition>>,

    pub spaces: Vec<SpaceDefinition>,
    pub control: ControlDefinition,

    /// Experiment-level initial data.
    pub input_data: BTreeMap<String, String>,
}

/// One resolved task as the run-time engine sees it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub task_id: String,
    pub workflow: String,
    pub implementation: String,
    pub dynamic_parameters: Vec<String>,
    pub static_parameters: BTreeMap<String, LiteralValue>,
    pub input_data: Vec<String>,
    pub output_data: Vec<String>,
}

/// One space: its task order, expanded parameter sets, and initial data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpaceDefinition {
    pub space_id: String,

    /// Execution order using deduplicated task ids.
    pub tasks_order: Vec<String>,

    /// One parameter map per run.
    pub parameters: Vec<BTreeMap<String, LiteralValue>>,

    pub input_data: BTreeMap<String, String>,
}

/// The inter-space control graph.
///
/// The START transition is represented by the `START` field; the
/// transition list holds everything else.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ControlDefinition {
    #[serde(rename = "START")]
    pub start: String,

    pub transitions: Vec<TransitionDefinition>,
}

/// One transition of the artifact's control graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransitionDefinition {
    pub from: String,
    pub to: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl ArtifactDocument {
    /// Renders the document as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes the document to a file as JSON.
    pub fn save(&self, path: &str) -> Result<(), Box<dyn Error>> {
        let json = self.to_json()?;
        fs::write(path, json)?;
        info!("Artifact saved to: {}", path);
        Ok(())
    }
}
