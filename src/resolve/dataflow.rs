//! Data-Flow Validation
//!
//! Simulates each space's execution order to check that every task input
//! is available before the task runs, and that every input required
//! anywhere is defined or produced somewhere.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::debug;

use crate::error::SemanticError;
use crate::model::experiment::ExperimentModel;
use crate::model::workflow::WorkflowModel;
use crate::resolve::inheritance;

/// Validates data flow for every space of the experiment.
///
/// All problems are collected; the walk never stops at the first error.
pub fn validate(
    experiment: &ExperimentModel,
    workflows: &HashMap<String, WorkflowModel>,
) -> Vec<SemanticError> {
    let mut errors = Vec::new();

    let experiment_data: HashSet<String> = experiment.data_names().into_iter().collect();

    // Tracked across all spaces for the closing never-defined check.
    let mut required: BTreeSet<String> = BTreeSet::new();
    let mut produced: HashSet<String> = HashSet::new();
    let mut defined: HashSet<String> = experiment_data.clone();
    let mut flagged: HashSet<String> = HashSet::new();

    for space in &experiment.spaces {
        let workflow = match inheritance::resolve_workflow(&space.workflow, workflows) {
            Ok(workflow) => workflow,
            // Unresolvable workflows are reported by the cross-reference
            // checks; nothing to simulate here.
            Err(_) => continue,
        };

        defined.extend(workflow.data_names());

        let mut available: HashSet<String> = experiment_data.clone();
        available.extend(workflow.data_names());

        debug!(
            "Space '{}': simulating execution order {:?}",
            space.name,
            workflow.execution_order()
        );

        for task_name in workflow.execution_order() {
            let task = match workflow.task(&task_name) {
                Some(task) => task,
                // Chain elements without a task definition are reported
                // by the chain cross-checks.
                None => continue,
            };

            for input in &task.inputs {
                required.insert(input.clone());
                if !available.contains(input) {
                    flagged.insert(input.clone());
                    errors.push(SemanticError::DataNotAvailable {
                        space: space.name.clone(),
                        task: task.name.clone(),
                        input: input.clone(),
                    });
                }
            }
            for output in &task.outputs {
                produced.insert(output.clone());
                available.insert(output.clone());
            }
        }
    }

    // Anything required that no declaration and no task accounts for, and
    // that no walk already reported.
    for input in required {
        if !defined.contains(&input) && !produced.contains(&input) && !flagged.contains(&input) {
            errors.push(SemanticError::UndefinedData(input));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::experiment::SpaceModel;
    use crate::model::values::{DataDefinition, END, START};
    use crate::model::workflow::TaskModel;

    fn workflows(models: Vec<WorkflowModel>) -> HashMap<String, WorkflowModel> {
        models.into_iter().map(|w| (w.name.clone(), w)).collect()
    }

    fn pipeline_workflow() -> WorkflowModel {
        WorkflowModel::new("w")
            .with_task(
                TaskModel::new("t1", "w")
                    .with_implementation("t1.py")
                    .with_output("d1"),
            )
            .with_task(
                TaskModel::new("t2", "w")
                    .with_implementation("t2.py")
                    .with_input("d1"),
            )
            .with_chain(&[START, "t1", "t2", END])
    }

    #[test]
    fn test_ordered_pipeline_is_valid() {
        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s", "w"));
        let errors = validate(&experiment, &workflows(vec![pipeline_workflow()]));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_input_reports_exactly_one_error() {
        let workflow = WorkflowModel::new("w")
            .with_task(
                TaskModel::new("t1", "w")
                    .with_implementation("t1.py")
                    .with_output("d1"),
            )
            .with_task(
                TaskModel::new("t2", "w")
                    .with_implementation("t2.py")
                    .with_input("d2"),
            )
            .with_chain(&[START, "t1", "t2", END]);

        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s", "w"));
        let errors = validate(&experiment, &workflows(vec![workflow]));

        assert_eq!(
            errors,
            vec![SemanticError::DataNotAvailable {
                space: "s".to_string(),
                task: "t2".to_string(),
                input: "d2".to_string(),
            }]
        );
    }

    #[test]
    fn test_out_of_order_chain_is_an_error() {
        let workflow = WorkflowModel::new("w")
            .with_task(
                TaskModel::new("producer", "w")
                    .with_implementation("p.py")
                    .with_output("d"),
            )
            .with_task(
                TaskModel::new("consumer", "w")
                    .with_implementation("c.py")
                    .with_input("d"),
            )
            // Consumer runs before producer.
            .with_chain(&[START, "consumer", "producer", END]);

        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s", "w"));
        let errors = validate(&experiment, &workflows(vec![workflow]));

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            SemanticError::DataNotAvailable { .. }
        ));
    }

    #[test]
    fn test_experiment_data_seeds_availability() {
        let workflow = WorkflowModel::new("w")
            .with_task(
                TaskModel::new("t", "w")
                    .with_implementation("t.py")
                    .with_input("dataset"),
            )
            .with_chain(&[START, "t", END]);

        let experiment = ExperimentModel::new("e")
            .with_data(DataDefinition::with_value("dataset", "data.csv"))
            .with_space(SpaceModel::new("s", "w"));

        assert!(validate(&experiment, &workflows(vec![workflow])).is_empty());
    }

    #[test]
    fn test_workflow_data_seeds_availability() {
        let workflow = WorkflowModel::new("w")
            .with_task(
                TaskModel::new("t", "w")
                    .with_implementation("t.py")
                    .with_input("config"),
            )
            .with_data(DataDefinition::with_value("config", "cfg.json"))
            .with_chain(&[START, "t", END]);

        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s", "w"));
        assert!(validate(&experiment, &workflows(vec![workflow])).is_empty());
    }

    #[test]
    fn test_each_space_simulates_independently() {
        let workflow = pipeline_workflow();
        let experiment = ExperimentModel::new("e")
            .with_space(SpaceModel::new("s1", "w"))
            .with_space(SpaceModel::new("s2", "w"));

        // d1 produced inside each space's own simulation; no bleed-through
        // needed and no errors.
        assert!(validate(&experiment, &workflows(vec![workflow])).is_empty());
    }

    #[test]
    fn test_unresolvable_workflow_is_skipped() {
        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s", "ghost"));
        // The missing workflow itself is someone else's report.
        assert!(validate(&experiment, &workflows(vec![])).is_empty());
    }
}
