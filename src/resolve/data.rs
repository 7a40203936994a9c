//! Initial Data Resolution
//!
//! Computes the three layers of static initial data (experiment,
//! workflow chain, space overrides), the set of inputs that must exist
//! before any task runs, and whether every space can satisfy them.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::error::SemanticError;
use crate::model::experiment::{ExperimentModel, SpaceModel};
use crate::model::workflow::WorkflowModel;
use crate::resolve::inheritance;
use crate::resolve::tasks::TaskResolution;

/// The resolved static data of an experiment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialData {
    /// Experiment-level literal data values.
    pub experiment: BTreeMap<String, String>,
    /// Per-space layer: workflow-chain values overlaid with the space's
    /// own overrides. Kept separate per space, never merged into the
    /// experiment layer.
    pub spaces: BTreeMap<String, BTreeMap<String, String>>,
    /// Inputs required before any task runs: all resolved-task inputs
    /// minus all resolved-task outputs, sorted.
    pub required_inputs: Vec<String>,
}

/// Resolves all static data layers of the experiment.
pub fn resolve(
    experiment: &ExperimentModel,
    workflows: &HashMap<String, WorkflowModel>,
    resolution: &TaskResolution,
) -> InitialData {
    let experiment_layer: BTreeMap<String, String> = experiment
        .data
        .iter()
        .filter_map(|d| d.value.clone().map(|v| (d.name.clone(), v)))
        .collect();

    let mut spaces = BTreeMap::new();
    for space in &experiment.spaces {
        spaces.insert(space.name.clone(), space_layer(space, workflows));
    }

    let mut required_inputs: Vec<String> = resolution
        .tasks
        .iter()
        .flat_map(|t| t.inputs.iter().cloned())
        .filter(|input| {
            !resolution
                .tasks
                .iter()
                .any(|t| t.outputs.iter().any(|o| o == input))
        })
        .collect();
    required_inputs.sort();
    required_inputs.dedup();

    debug!("Required initial inputs: {:?}", required_inputs);

    InitialData {
        experiment: experiment_layer,
        spaces,
        required_inputs,
    }
}

/// One space's data layer: the resolved workflow's values (child entries
/// already shadow parent entries after merging) overlaid with the space's
/// own overrides, which win.
fn space_layer(
    space: &SpaceModel,
    workflows: &HashMap<String, WorkflowModel>,
) -> BTreeMap<String, String> {
    let mut layer = BTreeMap::new();

    if let Ok(workflow) = inheritance::resolve_workflow(&space.workflow, workflows) {
        for definition in &workflow.data {
            if let Some(value) = &definition.value {
                layer.entry(definition.name.clone()).or_insert(value.clone());
            }
        }
    }

    for definition in &space.data {
        if let Some(value) = &definition.value {
            layer.insert(definition.name.clone(), value.clone());
        }
    }

    layer
}

/// Checks that every required initial input is satisfiable for every
/// space, via the space's own layer or the experiment layer.
///
/// All offending (space, input) pairs are collected.
pub fn validate_initial_inputs(
    initial: &InitialData,
    experiment: &ExperimentModel,
) -> Vec<SemanticError> {
    let mut errors = Vec::new();

    for space in &experiment.spaces {
        let layer = initial.spaces.get(&space.name);
        for input in &initial.required_inputs {
            let satisfied = layer.map(|l| l.contains_key(input)).unwrap_or(false)
                || initial.experiment.contains_key(input);
            if !satisfied {
                errors.push(SemanticError::MissingInitialInput {
                    space: space.name.clone(),
                    input: input.clone(),
                });
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::values::DataDefinition;
    use crate::model::workflow::TaskModel;
    use crate::resolve::tasks::ResolvedTask;
    use std::collections::BTreeMap;

    fn workflows(models: Vec<WorkflowModel>) -> HashMap<String, WorkflowModel> {
        models.into_iter().map(|w| (w.name.clone(), w)).collect()
    }

    fn resolved_task(id: &str, inputs: &[&str], outputs: &[&str]) -> ResolvedTask {
        let (workflow, name) = id.split_once(':').unwrap();
        ResolvedTask {
            id: id.to_string(),
            workflow: workflow.to_string(),
            name: name.to_string(),
            implementation: Some("task.py".to_string()),
            static_parameters: BTreeMap::new(),
            dynamic_parameters: Vec::new(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn resolution(tasks: Vec<ResolvedTask>) -> TaskResolution {
        TaskResolution {
            tasks,
            id_remapping: HashMap::new(),
        }
    }

    #[test]
    fn test_required_inputs_are_inputs_minus_outputs() {
        let resolution = resolution(vec![
            resolved_task("w:t1", &["dataset"], &["clean"]),
            resolved_task("w:t2", &["clean"], &["model"]),
        ]);
        let experiment = ExperimentModel::new("e");

        let initial = resolve(&experiment, &workflows(vec![]), &resolution);
        assert_eq!(initial.required_inputs, vec!["dataset"]);
    }

    #[test]
    fn test_experiment_layer_collects_valued_definitions() {
        let experiment = ExperimentModel::new("e")
            .with_data(DataDefinition::with_value("dataset", "data.csv"))
            .with_data(DataDefinition::new("model"));

        let initial = resolve(&experiment, &workflows(vec![]), &resolution(vec![]));
        assert_eq!(initial.experiment.get("dataset").map(String::as_str), Some("data.csv"));
        // Definitions without a value contribute no entry.
        assert!(!initial.experiment.contains_key("model"));
    }

    #[test]
    fn test_space_layer_shadows_workflow_values() {
        let workflow = WorkflowModel::new("w")
            .with_task(TaskModel::new("t", "w").with_implementation("t.py"))
            .with_data(DataDefinition::with_value("config", "default.json"))
            .with_data(DataDefinition::with_value("seed", "1"));

        let space = SpaceModel::new("s", "w")
            .with_data(DataDefinition::with_value("config", "tuned.json"));
        let experiment = ExperimentModel::new("e").with_space(space);

        let initial = resolve(&experiment, &workflows(vec![workflow]), &resolution(vec![]));
        let layer = initial.spaces.get("s").unwrap();

        assert_eq!(layer.get("config").map(String::as_str), Some("tuned.json"));
        assert_eq!(layer.get("seed").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_parent_chain_values_resolve_with_child_override() {
        let parent = WorkflowModel::new("base")
            .with_data(DataDefinition::with_value("config", "base.json"))
            .with_data(DataDefinition::with_value("seed", "1"));
        let child = WorkflowModel::new("child")
            .with_parent("base")
            .with_data(DataDefinition::with_value("config", "child.json"));

        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s", "child"));
        let initial = resolve(&experiment, &workflows(vec![parent, child]), &resolution(vec![]));
        let layer = initial.spaces.get("s").unwrap();

        assert_eq!(layer.get("config").map(String::as_str), Some("child.json"));
        assert_eq!(layer.get("seed").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_satisfied_initial_inputs_pass() {
        let resolution = resolution(vec![resolved_task("w:t", &["dataset"], &["model"])]);
        let experiment = ExperimentModel::new("e")
            .with_data(DataDefinition::with_value("dataset", "data.csv"))
            .with_space(SpaceModel::new("s", "w"));

        let initial = resolve(&experiment, &workflows(vec![]), &resolution);
        assert!(validate_initial_inputs(&initial, &experiment).is_empty());
    }

    #[test]
    fn test_unsatisfied_inputs_aggregate_per_space() {
        let resolution = resolution(vec![resolved_task("w:t", &["dataset"], &[])]);
        let experiment = ExperimentModel::new("e")
            .with_space(SpaceModel::new("s1", "w"))
            .with_space(
                SpaceModel::new("s2", "w")
                    .with_data(DataDefinition::with_value("dataset", "override.csv")),
            );

        let initial = resolve(&experiment, &workflows(vec![]), &resolution);
        let errors = validate_initial_inputs(&initial, &experiment);

        // Only s1 lacks the input; s2 satisfies it via its own override.
        assert_eq!(
            errors,
            vec![SemanticError::MissingInitialInput {
                space: "s1".to_string(),
                input: "dataset".to_string(),
            }]
        );
    }
}
