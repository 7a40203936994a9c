//! Workflow Inheritance Resolution
//!
//! Flattens a workflow's single-parent inheritance chain into one task/
//! data/chain set. Merging is a pure function over the model trees: the
//! input workflows are never mutated.
//!
//! Override rules, applied identically for child-over-parent overlays and
//! for `configure task` blocks:
//! - implementation is replaced only when the override provides one
//! - parameters are merged by name, the override value winning
//! - inputs/outputs are replaced wholesale only when the override list is
//!   non-empty
//!
//! When both child and parent declare a chain or data, the child's own
//! declaration wins; parent data not shadowed by the child is appended.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::error::SemanticError;
use crate::graph::DiGraph;
use crate::model::workflow::{
    ParameterModel, TaskConfigurationModel, TaskModel, WorkflowModel,
};

/// Resolves a workflow by name into its flattened form.
///
/// The result has no remaining parent reference and no pending
/// configuration blocks: both have been folded into the task set.
pub fn resolve_workflow(
    name: &str,
    workflows: &HashMap<String, WorkflowModel>,
) -> Result<WorkflowModel, SemanticError> {
    let workflow = workflows
        .get(name)
        .ok_or_else(|| SemanticError::MissingWorkflow(name.to_string()))?;
    let mut seen = HashSet::new();
    resolve_recursive(workflow, workflows, &mut seen)
}

fn resolve_recursive(
    workflow: &WorkflowModel,
    workflows: &HashMap<String, WorkflowModel>,
    seen: &mut HashSet<String>,
) -> Result<WorkflowModel, SemanticError> {
    // Cyclic parent pointers are reported by the dedicated pass; the
    // merge itself must still terminate on them.
    if !seen.insert(workflow.name.clone()) {
        return Err(SemanticError::CircularInheritance(workflow.name.clone()));
    }

    let parent_name = match &workflow.parent {
        Some(parent) => parent,
        None => {
            let mut flat = workflow.clone();
            let tasks = std::mem::take(&mut flat.tasks);
            flat.tasks = apply_configurations(tasks, &workflow.configurations);
            flat.configurations.clear();
            return Ok(flat);
        }
    };

    let parent = workflows
        .get(parent_name)
        .ok_or_else(|| SemanticError::MissingParentWorkflow {
            workflow: workflow.name.clone(),
            parent: parent_name.clone(),
        })?;

    // Depth-first: the whole ancestor chain is flattened before the child
    // is overlaid.
    let parent = resolve_recursive(parent, workflows, seen)?;
    Ok(merge(&parent, workflow))
}

/// Merges a resolved parent and a raw child into the child's flattened
/// form.
fn merge(parent: &WorkflowModel, child: &WorkflowModel) -> WorkflowModel {
    // Inherited tasks are re-tagged with the child's workflow name.
    let mut tasks: Vec<TaskModel> = parent
        .tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            task.workflow = child.name.clone();
            task
        })
        .collect();

    for own in &child.tasks {
        let mut own = own.clone();
        own.workflow = child.name.clone();

        match tasks.iter_mut().find(|t| t.name == own.name) {
            Some(inherited) => *inherited = overlay_task(inherited, &own),
            None => tasks.push(own),
        }
    }

    let tasks = apply_configurations(tasks, &child.configurations);

    // Child data first, unshadowed parent data appended.
    let mut data = child.data.clone();
    for definition in &parent.data {
        if !data.iter().any(|d| d.name == definition.name) {
            data.push(definition.clone());
        }
    }

    WorkflowModel {
        name: child.name.clone(),
        parent: None,
        tasks,
        data,
        chain: child.chain.clone().or_else(|| parent.chain.clone()),
        configurations: Vec::new(),
    }
}

/// Overlays a task defined in the child on its inherited counterpart.
fn overlay_task(inherited: &TaskModel, own: &TaskModel) -> TaskModel {
    let mut merged = inherited.clone();
    merged.workflow = own.workflow.clone();

    if own.implementation.is_some() {
        merged.implementation = own.implementation.clone();
    }
    merged.parameters = merge_parameters(&inherited.parameters, &own.parameters);
    if !own.inputs.is_empty() {
        merged.inputs = own.inputs.clone();
    }
    if !own.outputs.is_empty() {
        merged.outputs = own.outputs.clone();
    }

    merged
}

/// Merges parameter lists by name, the override value winning.
fn merge_parameters(base: &[ParameterModel], overrides: &[ParameterModel]) -> Vec<ParameterModel> {
    let mut merged = base.to_vec();
    for parameter in overrides {
        match merged.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => existing.value = parameter.value.clone(),
            None => merged.push(parameter.clone()),
        }
    }
    merged
}

/// Applies `configure task` blocks onto a task set.
fn apply_configurations(
    mut tasks: Vec<TaskModel>,
    configurations: &[TaskConfigurationModel],
) -> Vec<TaskModel> {
    for configuration in configurations {
        match tasks.iter_mut().find(|t| t.name == configuration.task) {
            Some(task) => {
                if configuration.implementation.is_some() {
                    task.implementation = configuration.implementation.clone();
                }
                task.parameters = merge_parameters(&task.parameters, &configuration.parameters);
                if !configuration.inputs.is_empty() {
                    task.inputs = configuration.inputs.clone();
                }
                if !configuration.outputs.is_empty() {
                    task.outputs = configuration.outputs.clone();
                }
            }
            None => warn!(
                "Configuration targets unknown task '{}', skipping",
                configuration.task
            ),
        }
    }
    tasks
}

/// Reports every workflow whose parent chain runs into a cycle.
///
/// This is a separate pass from the merge: it walks parent pointers with
/// a per-root visited set and never recurses, so cyclic input is reported
/// instead of looping.
pub fn detect_cycles(workflows: &HashMap<String, WorkflowModel>) -> Vec<SemanticError> {
    let mut graph = DiGraph::new();
    for workflow in workflows.values() {
        graph.add_node(workflow.name.clone());
        if let Some(parent) = &workflow.parent {
            graph.add_edge(workflow.name.clone(), parent.clone());
        }
    }

    let mut names: Vec<String> = workflows.keys().cloned().collect();
    names.sort();

    names
        .into_iter()
        .filter(|name| graph.cycle_from(name).is_some())
        .map(SemanticError::CircularInheritance)
        .collect()
}
