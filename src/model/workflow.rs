//! Workflow Data Model
//!
//! Core data structures for one workflow definition: its tasks, data
//! declarations, execution chain, configuration overrides, and single
//! optional inheritance parent.
//!
//! # Example YAML Form
//!
//! ```yaml
//! name: training
//! parent: base
//! tasks:
//!   - name: preprocess
//!     implementation: scripts/preprocess.py
//!     inputs: [dataset]
//!     outputs: [clean_dataset]
//!   - name: train
//!     implementation: scripts/train.py
//!     parameters:
//!       - name: epochs
//!         value: 10
//!       - name: learning_rate
//!     inputs: [clean_dataset]
//!     outputs: [model]
//! chain: [START, preprocess, train, END]
//! ```

use serde::{Deserialize, Serialize};

use super::values::{DataDefinition, LiteralValue, END, START};

/// One task-level parameter.
///
/// A missing `value` means the parameter must be supplied externally by a
/// space that runs the task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ParameterModel {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LiteralValue>,
}

impl ParameterModel {
    /// Creates a parameter without a default value.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Creates a parameter with a literal default value.
    pub fn with_value(name: impl Into<String>, value: impl Into<LiteralValue>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// An abstract or concrete task within a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskModel {
    /// Task name, unique within its workflow.
    pub name: String,

    /// Owning workflow name. Filled by the loader and re-tagged during
    /// inheritance merging.
    #[serde(default)]
    pub workflow: String,

    /// Path of the implementation script. `None` marks an abstract task
    /// that must be configured before use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterModel>,

    /// Names of data this task consumes.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Names of data this task produces.
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl TaskModel {
    /// Creates a task owned by the given workflow.
    pub fn new(name: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workflow: workflow.into(),
            implementation: None,
            parameters: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the implementation script path.
    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    /// Adds a parameter.
    pub fn with_parameter(mut self, parameter: ParameterModel) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds an input data name.
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.inputs.push(input.into());
        self
    }

    /// Adds an output data name.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.outputs.push(output.into());
        self
    }

    /// True when the task has no implementation of its own.
    pub fn is_abstract(&self) -> bool {
        self.implementation.is_none()
    }

    /// Looks up a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterModel> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// A `configure task X { ... }` override block declared inside a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskConfigurationModel {
    /// Name of the task being configured.
    pub task: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,

    #[serde(default)]
    pub parameters: Vec<ParameterModel>,

    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,
}

impl TaskConfigurationModel {
    /// Creates an empty configuration for a task.
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            implementation: None,
            parameters: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the implementation override.
    pub fn with_implementation(mut self, implementation: impl Into<String>) -> Self {
        self.implementation = Some(implementation.into());
        self
    }

    /// Adds a parameter override.
    pub fn with_parameter(mut self, parameter: ParameterModel) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// The declared execution order of a workflow's tasks.
///
/// Elements are task names plus the synthetic `START`/`END` markers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct TaskChain {
    pub elements: Vec<String>,
}

impl TaskChain {
    /// Builds a chain from its elements.
    pub fn new(elements: Vec<String>) -> Self {
        Self { elements }
    }

    /// The chain with `START`/`END` markers stripped.
    pub fn execution_order(&self) -> Vec<String> {
        self.elements
            .iter()
            .filter(|e| e.as_str() != START && e.as_str() != END)
            .cloned()
            .collect()
    }
}

/// One workflow definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowModel {
    pub name: String,

    /// Name of the single inheritance parent, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    #[serde(default)]
    pub tasks: Vec<TaskModel>,

    #[serde(default)]
    pub data: Vec<DataDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<TaskChain>,

    /// `configure task` blocks applied on top of the (merged) task set.
    #[serde(default)]
    pub configurations: Vec<TaskConfigurationModel>,
}

impl WorkflowModel {
    /// Creates an empty workflow.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            tasks: Vec::new(),
            data: Vec::new(),
            chain: None,
            configurations: Vec::new(),
        }
    }

    /// Sets the inheritance parent.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Adds a task.
    pub fn with_task(mut self, task: TaskModel) -> Self {
        self.tasks.push(task);
        self
    }

    /// Adds a data declaration.
    pub fn with_data(mut self, data: DataDefinition) -> Self {
        self.data.push(data);
        self
    }

    /// Sets the task chain from its elements.
    pub fn with_chain(mut self, elements: &[&str]) -> Self {
        self.chain = Some(TaskChain::new(
            elements.iter().map(|e| e.to_string()).collect(),
        ));
        self
    }

    /// Adds a task configuration block.
    pub fn with_configuration(mut self, configuration: TaskConfigurationModel) -> Self {
        self.configurations.push(configuration);
        self
    }

    /// Looks up a task by name.
    pub fn task(&self, name: &str) -> Option<&TaskModel> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Names of all declared data.
    pub fn data_names(&self) -> Vec<String> {
        self.data.iter().map(|d| d.name.clone()).collect()
    }

    /// The workflow's execution order: the chain when one is present,
    /// otherwise the task declaration order.
    pub fn execution_order(&self) -> Vec<String> {
        match &self.chain {
            Some(chain) => chain.execution_order(),
            None => self.tasks.iter().map(|t| t.name.clone()).collect(),
        }
    }
}
