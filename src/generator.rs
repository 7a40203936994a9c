//! Artifact Generation
//!
//! Orchestrates the resolution passes over a parsed experiment and its
//! workflows, and lowers the result into the artifact document.
//!
//! Two public operations:
//!
//! - [`Generator::validate`]: a non-throwing pass that accumulates every
//!   error and warning it can find and keeps going
//! - [`Generator::generate`]: runs `validate` first, and only when no
//!   errors exist filters the experiment to reachable spaces, resolves
//!   tasks, expands parameters, and emits the artifact
//!
//! No partial artifact is ever emitted while errors exist.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::artifact::{
    ArtifactDocument, ControlDefinition, SpaceDefinition, TaskDefinition, TransitionDefinition,
    ARTIFACT_VERSION,
};
use crate::error::{LoadError, SemanticError, SemanticWarning, ValidationReport};
use crate::graph::DiGraph;
use crate::model::experiment::ExperimentModel;
use crate::model::loader;
use crate::model::values::START;
use crate::model::workflow::WorkflowModel;
use crate::resolve::{control, data, dataflow, inheritance, params, tasks};

/// The result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// The artifact, present only when validation reported no errors.
    pub artifact: Option<ArtifactDocument>,
    pub validation: ValidationReport,
}

/// Compiles one experiment and the workflows it references.
pub struct Generator<'a> {
    experiment: &'a ExperimentModel,
    workflows: &'a HashMap<String, WorkflowModel>,
    base_dir: Option<PathBuf>,
}

impl<'a> Generator<'a> {
    /// Creates a generator over parsed models.
    pub fn new(
        experiment: &'a ExperimentModel,
        workflows: &'a HashMap<String, WorkflowModel>,
    ) -> Self {
        Self {
            experiment,
            workflows,
            base_dir: None,
        }
    }

    /// Sets the directory implementation paths are checked against.
    /// Without it, file existence is not checked at all.
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = Some(base_dir);
        self
    }

    /// Validates the experiment without generating anything.
    ///
    /// Never fails early: every pass appends what it finds and validation
    /// continues, so one run surfaces as many independent problems as
    /// possible. Running it twice on unchanged input yields identical
    /// lists.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        let mut names: Vec<&String> = self.workflows.keys().collect();
        names.sort();

        // Inheritance cycles first: later passes resolve chains and would
        // only rediscover these.
        for error in inheritance::detect_cycles(self.workflows) {
            report.error(error);
        }

        self.check_cross_references(&names, &mut report);

        let (errors, warnings) = control::validate(self.experiment);
        for error in errors {
            report.error(error);
        }
        for warning in warnings {
            report.warning(warning);
        }

        self.check_chains(&names, &mut report);
        self.check_strategies(&mut report);
        self.check_data_cycles(&names, &mut report);
        self.check_implementations(&mut report);
        self.check_data_flow(&mut report);
        self.check_unused_parameters(&mut report);

        report.dedup();
        info!(
            "Validation finished: {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Generates the artifact.
    ///
    /// Runs `validate` first and short-circuits when it reports errors.
    /// The resolver error paths below are unreachable for a validated
    /// model but still land in the report if hit.
    pub fn generate(&self) -> GenerateOutcome {
        let mut validation = self.validate();
        if !validation.is_ok() {
            info!(
                "Skipping generation: {} validation errors",
                validation.errors.len()
            );
            return GenerateOutcome {
                artifact: None,
                validation,
            };
        }

        match self.build() {
            Ok(artifact) => GenerateOutcome {
                artifact: Some(artifact),
                validation,
            },
            Err(error) => {
                validation.error(error);
                GenerateOutcome {
                    artifact: None,
                    validation,
                }
            }
        }
    }

    /// Lowers the validated experiment into the artifact document.
    fn build(&self) -> Result<ArtifactDocument, SemanticError> {
        let flow = control::resolve(self.experiment)?;

        // Only reachable spaces make it into the artifact.
        let mut filtered = self.experiment.clone();
        filtered.spaces.retain(|s| flow.reachable.contains(&s.name));
        debug!(
            "{} of {} spaces reachable",
            filtered.spaces.len(),
            self.experiment.spaces.len()
        );

        let resolution = tasks::resolve(&filtered, self.workflows)?;
        let initial = data::resolve(&filtered, self.workflows, &resolution);

        let mut spaces = Vec::new();
        let mut used_ids: Vec<String> = Vec::new();
        let mut used_set: HashSet<String> = HashSet::new();

        for space in &filtered.spaces {
            let workflow = inheritance::resolve_workflow(&space.workflow, self.workflows)?;

            let mut tasks_order = Vec::new();
            for task_name in workflow.execution_order() {
                let id = format!("{}:{}", workflow.name, task_name);
                let id = resolution.canonical_id(&id).to_string();
                if used_set.insert(id.clone()) {
                    used_ids.push(id.clone());
                }
                tasks_order.push(id);
            }

            let combinations = params::expand_space(space, Some(&workflow))?;

            spaces.push(SpaceDefinition {
                space_id: space.name.clone(),
                tasks_order,
                parameters: combinations.combinations,
                input_data: initial.spaces.get(&space.name).cloned().unwrap_or_default(),
            });
        }

        // Used tasks, grouped by workflow in first-use order.
        let mut groups: Vec<(String, Vec<TaskDefinition>)> = Vec::new();
        for id in &used_ids {
            let task = match resolution.task(id) {
                Some(task) => task,
                None => continue,
            };
            let implementation = task.implementation.clone().ok_or_else(|| {
                SemanticError::MissingImplementation {
                    workflow: task.workflow.clone(),
                    task: task.name.clone(),
                }
            })?;

            let definition = TaskDefinition {
                task_id: task.id.clone(),
                workflow: task.workflow.clone(),
                implementation,
                dynamic_parameters: task.dynamic_parameters.clone(),
                static_parameters: task.static_parameters.clone(),
                input_data: task.inputs.clone(),
                output_data: task.outputs.clone(),
            };
            match groups.iter_mut().find(|(w, _)| *w == task.workflow) {
                Some((_, list)) => list.push(definition),
                None => groups.push((task.workflow.clone(), vec![definition])),
            }
        }

        let start = flow.start.clone().ok_or(SemanticError::NoStartTransition)?;
        let transitions = flow
            .transitions
            .iter()
            .filter(|t| t.from != START)
            .map(|t| TransitionDefinition {
                from: t.from.clone(),
                to: t.to.clone(),
                condition: t.condition.clone(),
            })
            .collect();

        Ok(ArtifactDocument {
            experiment: self.experiment.name.clone(),
            version: ARTIFACT_VERSION.to_string(),
            tasks: groups.into_iter().map(|(_, list)| list).collect(),
            spaces,
            control: ControlDefinition { start, transitions },
            input_data: initial.experiment.clone(),
        })
    }

    /// Space -> workflow and workflow -> parent references must resolve.
    fn check_cross_references(&self, names: &[&String], report: &mut ValidationReport) {
        for space in &self.experiment.spaces {
            if !self.workflows.contains_key(&space.workflow) {
                report.error(SemanticError::MissingWorkflow(space.workflow.clone()));
            }
        }

        for name in names {
            let workflow = &self.workflows[*name];
            if let Some(parent) = &workflow.parent {
                if !self.workflows.contains_key(parent) {
                    report.error(SemanticError::MissingParentWorkflow {
                        workflow: workflow.name.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }
    }

    /// Duplicate task names, chain elements without a definition, and
    /// tasks a declared chain never runs.
    fn check_chains(&self, names: &[&String], report: &mut ValidationReport) {
        for name in names {
            let workflow = &self.workflows[*name];

            let mut seen = HashSet::new();
            for task in &workflow.tasks {
                if !seen.insert(task.name.as_str()) {
                    report.error(SemanticError::DuplicateTaskDefinition {
                        workflow: workflow.name.clone(),
                        task: task.name.clone(),
                    });
                }
            }

            let resolved = match inheritance::resolve_workflow(name.as_str(), self.workflows) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            };
            let chain = match &resolved.chain {
                Some(chain) => chain,
                None => continue,
            };

            let order = chain.execution_order();
            for element in &order {
                if resolved.task(element).is_none() {
                    report.error(SemanticError::UndefinedChainTask {
                        workflow: resolved.name.clone(),
                        task: element.clone(),
                    });
                }
            }

            let in_chain: HashSet<&str> = order.iter().map(String::as_str).collect();
            for task in &resolved.tasks {
                if !in_chain.contains(task.name.as_str()) {
                    report.warning(SemanticWarning::TaskNotInExecutionChain {
                        workflow: resolved.name.clone(),
                        task: task.name.clone(),
                    });
                }
            }
        }
    }

    fn check_strategies(&self, report: &mut ValidationReport) {
        for space in &self.experiment.spaces {
            let strategy = space.strategy.as_str();
            if strategy != params::GRID_SEARCH && strategy != params::RANDOM_SEARCH {
                report.error(SemanticError::UnknownStrategy {
                    space: space.name.clone(),
                    strategy: space.strategy.clone(),
                });
            }
        }
    }

    /// Intra-workflow data dependencies must be acyclic: an edge runs
    /// from every producer of a data name to each of its consumers.
    fn check_data_cycles(&self, names: &[&String], report: &mut ValidationReport) {
        for name in names {
            let resolved = match inheritance::resolve_workflow(name.as_str(), self.workflows) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            };

            let mut graph = DiGraph::new();
            for producer in &resolved.tasks {
                for output in &producer.outputs {
                    for consumer in &resolved.tasks {
                        if consumer.inputs.contains(output) {
                            graph.add_edge(producer.name.clone(), consumer.name.clone());
                        }
                    }
                }
            }

            if let Some(path) = graph.find_cycle() {
                report.error(SemanticError::CircularDataDependency {
                    workflow: resolved.name.clone(),
                    path,
                });
            }
        }
    }

    /// Every task a space will execute needs an implementation; a missing
    /// implementation *file* is only ever a warning.
    fn check_implementations(&self, report: &mut ValidationReport) {
        for space in &self.experiment.spaces {
            let resolved = match inheritance::resolve_workflow(&space.workflow, self.workflows) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            };

            for task_name in resolved.execution_order() {
                let task = match resolved.task(&task_name) {
                    Some(task) => task,
                    None => continue,
                };

                let implementation = space
                    .configuration(&task.name)
                    .and_then(|c| c.implementation.clone())
                    .or_else(|| task.implementation.clone());

                match implementation {
                    None => report.error(SemanticError::MissingImplementation {
                        workflow: resolved.name.clone(),
                        task: task.name.clone(),
                    }),
                    Some(file) => {
                        if let Some(base) = &self.base_dir {
                            if !base.join(&file).exists() {
                                report.warning(SemanticWarning::ImplementationFileNotFound {
                                    task: task.name.clone(),
                                    file,
                                });
                            }
                        }
                    }
                }
            }
        }
    }

    /// Execution-order simulation plus initial-input satisfiability.
    ///
    /// Task resolution is run here for its required-parameter check; its
    /// other failure modes are already reported by the passes above.
    fn check_data_flow(&self, report: &mut ValidationReport) {
        let flow_errors = dataflow::validate(self.experiment, self.workflows);

        // (space, input) pairs the walk already reported; the initial-input
        // pass must not report the same pair a second time.
        let flagged: HashSet<(String, String)> = flow_errors
            .iter()
            .filter_map(|e| match e {
                SemanticError::DataNotAvailable { space, input, .. } => {
                    Some((space.clone(), input.clone()))
                }
                _ => None,
            })
            .collect();

        for error in flow_errors {
            report.error(error);
        }

        match tasks::resolve(self.experiment, self.workflows) {
            Ok(resolution) => {
                let initial = data::resolve(self.experiment, self.workflows, &resolution);
                for error in data::validate_initial_inputs(&initial, self.experiment) {
                    let duplicate = match &error {
                        SemanticError::MissingInitialInput { space, input } => {
                            flagged.contains(&(space.clone(), input.clone()))
                        }
                        _ => false,
                    };
                    if !duplicate {
                        report.error(error);
                    }
                }
            }
            Err(error @ SemanticError::MissingRequiredParameter { .. }) => report.error(error),
            Err(_) => {}
        }
    }

    /// Space parameters nothing consumes.
    fn check_unused_parameters(&self, report: &mut ValidationReport) {
        for space in &self.experiment.spaces {
            let resolved = match inheritance::resolve_workflow(&space.workflow, self.workflows) {
                Ok(resolved) => resolved,
                Err(_) => continue,
            };

            for parameter in &space.parameters {
                let used = resolved
                    .tasks
                    .iter()
                    .any(|t| t.parameter(&parameter.name).is_some());
                if !used {
                    report.warning(SemanticWarning::UnusedParameter {
                        space: space.name.clone(),
                        parameter: parameter.name.clone(),
                    });
                }
            }

            for configuration in &space.configurations {
                for parameter in &configuration.parameters {
                    let used = resolved
                        .task(&configuration.task)
                        .map(|t| t.parameter(&parameter.name).is_some())
                        .unwrap_or(false);
                    if !used {
                        report.warning(SemanticWarning::UnusedParameter {
                            space: space.name.clone(),
                            parameter: format!("{}:{}", configuration.task, parameter.name),
                        });
                    }
                }
            }
        }
    }
}

/// Validates an experiment bundle file.
pub fn validate(path: &str) -> Result<ValidationReport, LoadError> {
    let bundle = loader::load_bundle(path)?;
    let workflows = bundle.workflows_by_name();
    let generator = Generator::new(&bundle.experiment, &workflows).with_base_dir(base_dir(path));
    Ok(generator.validate())
}

/// Generates the artifact for an experiment bundle file.
pub fn generate(path: &str) -> Result<GenerateOutcome, LoadError> {
    let bundle = loader::load_bundle(path)?;
    let workflows = bundle.workflows_by_name();
    let generator = Generator::new(&bundle.experiment, &workflows).with_base_dir(base_dir(path));
    Ok(generator.generate())
}

/// Implementation paths are resolved relative to the bundle's directory.
fn base_dir(path: &str) -> PathBuf {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
