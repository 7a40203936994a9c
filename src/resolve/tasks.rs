//! Task Resolution
//!
//! Produces one `ResolvedTask` per distinct `workflow:task` id across all
//! spaces, binding space-level configuration overrides and classifying
//! every task parameter as static (literal default recorded verbatim) or
//! dynamic (value supplied per-run by the parameter expander).
//!
//! After resolution, structurally identical tasks that sibling workflows
//! inherited from a common parent are collapsed into one canonical task
//! under the ancestor's id; the id remapping is returned to the caller
//! for use while emitting per-space task orders.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};

use crate::error::SemanticError;
use crate::model::experiment::{ExperimentModel, SpaceModel};
use crate::model::values::LiteralValue;
use crate::model::workflow::{TaskModel, WorkflowModel};
use crate::resolve::inheritance;

/// A fully resolved task: the unit the artifact's task definitions are
/// lowered from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTask {
    /// Stable `"workflow:task"` id.
    pub id: String,
    pub workflow: String,
    pub name: String,
    pub implementation: Option<String>,
    /// Parameters with a literal default, recorded verbatim.
    pub static_parameters: BTreeMap<String, LiteralValue>,
    /// Parameters whose concrete values come from the expanded
    /// combinations, in task declaration order.
    pub dynamic_parameters: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl ResolvedTask {
    /// Structural identity: everything except id and owning workflow.
    fn same_structure(&self, other: &ResolvedTask) -> bool {
        self.implementation == other.implementation
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.dynamic_parameters == other.dynamic_parameters
            && self.static_parameters == other.static_parameters
    }
}

/// The result of one resolution pass.
#[derive(Debug, Clone, Default)]
pub struct TaskResolution {
    pub tasks: Vec<ResolvedTask>,
    /// Original id -> canonical id, for every task touched by
    /// deduplication (identity entries included).
    pub id_remapping: HashMap<String, String>,
}

impl TaskResolution {
    /// The canonical id for a task, following the remapping table.
    pub fn canonical_id<'a>(&'a self, id: &'a str) -> &'a str {
        self.id_remapping.get(id).map(|s| s.as_str()).unwrap_or(id)
    }

    /// Looks up a resolved task by (canonical) id.
    pub fn task(&self, id: &str) -> Option<&ResolvedTask> {
        self.tasks.iter().find(|t| t.id == id)
    }
}

/// Resolves every task of every space's workflow.
///
/// Fails fast on the first fatal inconsistency (missing workflow, missing
/// required parameter); `validate` reports these ahead of time, so during
/// generation the error paths never fire for a validated model.
pub fn resolve(
    experiment: &ExperimentModel,
    workflows: &HashMap<String, WorkflowModel>,
) -> Result<TaskResolution, SemanticError> {
    let mut tasks: Vec<ResolvedTask> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for space in &experiment.spaces {
        let workflow = inheritance::resolve_workflow(&space.workflow, workflows)?;

        for task in &workflow.tasks {
            let id = format!("{}:{}", workflow.name, task.name);
            if !seen.insert(id.clone()) {
                continue;
            }
            tasks.push(resolve_task(id, space, task)?);
        }
    }

    let resolution = deduplicate(tasks, workflows);
    info!(
        "Resolved {} tasks ({} ids remapped)",
        resolution.tasks.len(),
        resolution
            .id_remapping
            .iter()
            .filter(|(from, to)| from != to)
            .count()
    );
    Ok(resolution)
}

/// Resolves one task against the space that first reaches it.
fn resolve_task(
    id: String,
    space: &SpaceModel,
    task: &TaskModel,
) -> Result<ResolvedTask, SemanticError> {
    let configuration = space.configuration(&task.name);

    let mut implementation = task.implementation.clone();
    let mut inputs = task.inputs.clone();
    let mut outputs = task.outputs.clone();
    if let Some(config) = configuration {
        if config.implementation.is_some() {
            implementation = config.implementation.clone();
        }
        if !config.inputs.is_empty() {
            inputs = config.inputs.clone();
        }
        if !config.outputs.is_empty() {
            outputs = config.outputs.clone();
        }
    }

    let overrides: HashSet<String> = space.override_keys().into_iter().collect();

    let mut static_parameters = BTreeMap::new();
    let mut dynamic_parameters = Vec::new();
    for parameter in &task.parameters {
        if let Some(value) = &parameter.value {
            static_parameters.insert(parameter.name.clone(), value.clone());
        } else if overrides.contains(&parameter.name)
            || overrides.contains(&format!("{}:{}", task.name, parameter.name))
        {
            dynamic_parameters.push(parameter.name.clone());
        } else {
            return Err(SemanticError::MissingRequiredParameter {
                space: space.name.clone(),
                task: task.name.clone(),
                parameter: parameter.name.clone(),
            });
        }
    }

    Ok(ResolvedTask {
        id,
        workflow: task.workflow.clone(),
        name: task.name.clone(),
        implementation,
        static_parameters,
        dynamic_parameters,
        inputs,
        outputs,
    })
}

/// Collapses structurally identical tasks that sibling workflows share
/// through a common ancestor.
///
/// Tasks are grouped by bare name, then by nearest common ancestor (the
/// owning workflow's parent, or the workflow itself when it has none).
/// A sub-group collapses only when every member is structurally
/// identical; otherwise each keeps its own id.
fn deduplicate(
    tasks: Vec<ResolvedTask>,
    workflows: &HashMap<String, WorkflowModel>,
) -> TaskResolution {
    let mut groups: BTreeMap<(String, String), Vec<usize>> = BTreeMap::new();
    for (index, task) in tasks.iter().enumerate() {
        let ancestor = workflows
            .get(&task.workflow)
            .and_then(|w| w.parent.clone())
            .unwrap_or_else(|| task.workflow.clone());
        groups
            .entry((task.name.clone(), ancestor))
            .or_default()
            .push(index);
    }

    let mut id_remapping = HashMap::new();
    let mut removed: HashSet<usize> = HashSet::new();
    let mut canonical_ids: HashMap<usize, (String, String)> = HashMap::new();

    for ((name, ancestor), members) in &groups {
        if members.len() < 2 {
            continue;
        }

        let first = &tasks[members[0]];
        let identical = members.iter().all(|&i| tasks[i].same_structure(first));
        if !identical {
            debug!(
                "Task '{}' differs across workflows under '{}': keeping separate ids",
                name, ancestor
            );
            continue;
        }

        let canonical = format!("{}:{}", ancestor, name);
        for &index in members {
            id_remapping.insert(tasks[index].id.clone(), canonical.clone());
        }
        canonical_ids.insert(members[0], (canonical, ancestor.clone()));
        for &index in &members[1..] {
            removed.insert(index);
        }
    }

    let tasks = tasks
        .into_iter()
        .enumerate()
        .filter(|(index, _)| !removed.contains(index))
        .map(|(index, mut task)| {
            if let Some((canonical, ancestor)) = canonical_ids.get(&index) {
                task.id = canonical.clone();
                task.workflow = ancestor.clone();
            }
            task
        })
        .collect();

    TaskResolution { tasks, id_remapping }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::experiment::{SpaceParameter, SpaceTaskConfiguration};
    use crate::model::values::ParameterDomain;
    use crate::model::workflow::ParameterModel;

    fn workflows(models: Vec<WorkflowModel>) -> HashMap<String, WorkflowModel> {
        models.into_iter().map(|w| (w.name.clone(), w)).collect()
    }

    fn training_workflow() -> WorkflowModel {
        WorkflowModel::new("training").with_task(
            TaskModel::new("train", "training")
                .with_implementation("train.py")
                .with_parameter(ParameterModel::with_value("epochs", 10))
                .with_parameter(ParameterModel::required("learning_rate"))
                .with_input("dataset")
                .with_output("model"),
        )
    }

    fn lr_space(name: &str) -> SpaceModel {
        SpaceModel::new(name, "training").with_parameter(SpaceParameter::new(
            "learning_rate",
            ParameterDomain::range(0.1, 0.3, 0.1),
        ))
    }

    #[test]
    fn test_default_is_static_override_is_dynamic() {
        let experiment = ExperimentModel::new("e").with_space(lr_space("s1"));
        let map = workflows(vec![training_workflow()]);

        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(resolution.tasks.len(), 1);

        let task = &resolution.tasks[0];
        assert_eq!(task.id, "training:train");
        assert_eq!(
            task.static_parameters.get("epochs"),
            Some(&LiteralValue::Int(10))
        );
        assert_eq!(task.dynamic_parameters, vec!["learning_rate"]);
    }

    #[test]
    fn test_task_qualified_override_marks_dynamic() {
        let space = SpaceModel::new("s1", "training").with_configuration(
            SpaceTaskConfiguration::new("train").with_parameter(SpaceParameter::new(
                "learning_rate",
                ParameterDomain::Literal(LiteralValue::Float(0.5)),
            )),
        );
        let experiment = ExperimentModel::new("e").with_space(space);
        let map = workflows(vec![training_workflow()]);

        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(resolution.tasks[0].dynamic_parameters, vec!["learning_rate"]);
    }

    #[test]
    fn test_missing_required_parameter_is_an_error() {
        let experiment =
            ExperimentModel::new("e").with_space(SpaceModel::new("s1", "training"));
        let map = workflows(vec![training_workflow()]);

        let result = resolve(&experiment, &map);
        assert_eq!(
            result.unwrap_err(),
            SemanticError::MissingRequiredParameter {
                space: "s1".to_string(),
                task: "train".to_string(),
                parameter: "learning_rate".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_workflow_is_an_error() {
        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s1", "ghost"));
        let result = resolve(&experiment, &workflows(vec![]));

        assert_eq!(
            result.unwrap_err(),
            SemanticError::MissingWorkflow("ghost".to_string())
        );
    }

    #[test]
    fn test_space_configuration_overrides_implementation_and_io() {
        let space = SpaceModel::new("s1", "training")
            .with_parameter(SpaceParameter::new(
                "learning_rate",
                ParameterDomain::Literal(LiteralValue::Float(0.1)),
            ))
            .with_configuration(
                SpaceTaskConfiguration::new("train").with_implementation("custom_train.py"),
            );
        let experiment = ExperimentModel::new("e").with_space(space);
        let map = workflows(vec![training_workflow()]);

        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(
            resolution.tasks[0].implementation.as_deref(),
            Some("custom_train.py")
        );
        // io lists were not overridden: the task's own lists survive.
        assert_eq!(resolution.tasks[0].inputs, vec!["dataset"]);
    }

    #[test]
    fn test_two_spaces_same_workflow_share_one_task() {
        let experiment = ExperimentModel::new("e")
            .with_space(lr_space("s1"))
            .with_space(lr_space("s2"));
        let map = workflows(vec![training_workflow()]);

        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(resolution.tasks.len(), 1);
        assert_eq!(resolution.tasks[0].id, "training:train");
        assert_eq!(resolution.canonical_id("training:train"), "training:train");
    }

    #[test]
    fn test_sibling_workflows_deduplicate_under_common_parent() {
        let parent = WorkflowModel::new("base").with_task(
            TaskModel::new("report", "base")
                .with_implementation("report.py")
                .with_input("model"),
        );
        let left = WorkflowModel::new("left").with_parent("base");
        let right = WorkflowModel::new("right").with_parent("base");

        let experiment = ExperimentModel::new("e")
            .with_space(SpaceModel::new("s1", "left"))
            .with_space(SpaceModel::new("s2", "right"));
        let map = workflows(vec![parent, left, right]);

        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(resolution.tasks.len(), 1);
        assert_eq!(resolution.tasks[0].id, "base:report");
        assert_eq!(resolution.tasks[0].workflow, "base");
        assert_eq!(resolution.canonical_id("left:report"), "base:report");
        assert_eq!(resolution.canonical_id("right:report"), "base:report");
    }

    #[test]
    fn test_structurally_different_siblings_keep_their_ids() {
        let parent = WorkflowModel::new("base").with_task(
            TaskModel::new("report", "base")
                .with_implementation("report.py")
                .with_input("model"),
        );
        let left = WorkflowModel::new("left").with_parent("base");
        // right overrides the implementation, so the structures differ.
        let right = WorkflowModel::new("right").with_parent("base").with_task(
            TaskModel::new("report", "right").with_implementation("fancy_report.py"),
        );

        let experiment = ExperimentModel::new("e")
            .with_space(SpaceModel::new("s1", "left"))
            .with_space(SpaceModel::new("s2", "right"));
        let map = workflows(vec![parent, left, right]);

        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(resolution.tasks.len(), 2);
        assert_eq!(resolution.canonical_id("left:report"), "left:report");
        assert_eq!(resolution.canonical_id("right:report"), "right:report");
    }

    #[test]
    fn test_unrelated_same_named_tasks_do_not_collapse() {
        let one = WorkflowModel::new("one")
            .with_task(TaskModel::new("setup", "one").with_implementation("setup.py"));
        let two = WorkflowModel::new("two")
            .with_task(TaskModel::new("setup", "two").with_implementation("setup.py"));

        let experiment = ExperimentModel::new("e")
            .with_space(SpaceModel::new("s1", "one"))
            .with_space(SpaceModel::new("s2", "two"));
        let map = workflows(vec![one, two]);

        // Same name and structure, but no shared ancestor: both ids stay.
        let resolution = resolve(&experiment, &map).unwrap();
        assert_eq!(resolution.tasks.len(), 2);
        assert!(resolution.id_remapping.is_empty());
    }
}
