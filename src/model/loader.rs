//! Experiment Bundle Loading
//!
//! Reads the canonical YAML serialization of an experiment and the
//! transitive closure of the workflows its spaces reference. The DSL
//! parsing layer that produces this form is external; this module only
//! deserializes already-parsed model trees.

use std::collections::HashMap;
use std::fs;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

use super::experiment::ExperimentModel;
use super::workflow::WorkflowModel;

/// An experiment plus every workflow it can reach.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExperimentBundle {
    pub experiment: ExperimentModel,

    #[serde(default)]
    pub workflows: Vec<WorkflowModel>,
}

impl ExperimentBundle {
    /// Indexes the bundled workflows by name.
    pub fn workflows_by_name(&self) -> HashMap<String, WorkflowModel> {
        self.workflows
            .iter()
            .map(|w| (w.name.clone(), w.clone()))
            .collect()
    }
}

/// Loads an experiment bundle from a YAML file.
///
/// After deserialization every task is tagged with its owning workflow
/// name, so later passes never have to guess ownership.
///
/// # Example
///
/// ```rust,no_run
/// use expc::model::loader::load_bundle;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let bundle = load_bundle("experiment.yaml")?;
///     println!("Loaded {} spaces", bundle.experiment.spaces.len());
///     Ok(())
/// }
/// ```
pub fn load_bundle(path: &str) -> Result<ExperimentBundle, LoadError> {
    info!("Loading experiment bundle from: {}", path);

    let content = fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_string(),
        source: e,
    })?;

    debug!("Bundle content loaded ({} bytes)", content.len());

    let mut bundle: ExperimentBundle =
        serde_yaml::from_str(&content).map_err(|e| LoadError::Parse {
            path: path.to_string(),
            source: e,
        })?;

    tag_task_ownership(&mut bundle);

    info!(
        "Parsed experiment '{}': {} spaces, {} workflows",
        bundle.experiment.name,
        bundle.experiment.spaces.len(),
        bundle.workflows.len()
    );

    Ok(bundle)
}

/// Fills each task's `workflow` field with its owning workflow's name.
fn tag_task_ownership(bundle: &mut ExperimentBundle) {
    for workflow in &mut bundle.workflows {
        for task in &mut workflow.tasks {
            task.workflow = workflow.name.clone();
        }
    }
}
