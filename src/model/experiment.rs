//! Experiment Data Model
//!
//! One experiment: its parameter spaces, experiment-level data
//! declarations, and the optional inter-space control flow.
//!
//! # Example YAML Form
//!
//! ```yaml
//! name: tuning
//! data:
//!   - name: dataset
//!     value: "data.csv"
//! spaces:
//!   - name: coarse
//!     workflow: training
//!     strategy: gridsearch
//!     parameters:
//!       - name: learning_rate
//!         value: {min: 0.1, max: 0.5, step: 0.1}
//! control:
//!   transitions:
//!     - {from: START, to: coarse}
//!     - {from: coarse, to: END}
//! ```

use serde::{Deserialize, Serialize};

use super::values::{DataDefinition, ParameterDomain};

/// A space-level parameter with its declared domain.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpaceParameter {
    pub name: String,
    pub value: ParameterDomain,
}

impl SpaceParameter {
    /// Creates a space parameter.
    pub fn new(name: impl Into<String>, value: ParameterDomain) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A `configure task X { ... }` block declared inside a space.
///
/// Parameters declared here are task-qualified: they are keyed as
/// `"task:param"` during expansion so they never collide with space-level
/// parameters of the same name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpaceTaskConfiguration {
    pub task: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<String>,

    #[serde(default)]
    pub parameters: Vec<SpaceParameter>,

    #[serde(default)]
    pub inputs: Vec<String>,

    #[serde(default)]
    pub outputs: Vec<String>,
}

impl SpaceTaskConfiguration {
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

    /// Adds a task-qualified parameter.
    pub fn with_parameter(mut self, parameter: SpaceParameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// One parameter-space instantiation of a workflow.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SpaceModel {
    pub name: String,

    /// Name of the workflow this space runs.
    pub workflow: String,

    /// Search strategy name (`gridsearch` or `randomsearch`).
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Space-level parameters, in declaration order. The order drives
    /// grid expansion.
    #[serde(default)]
    pub parameters: Vec<SpaceParameter>,

    #[serde(default)]
    pub configurations: Vec<SpaceTaskConfiguration>,

    /// Space-level data overrides.
    #[serde(default)]
    pub data: Vec<DataDefinition>,
}

fn default_strategy() -> String {
    "gridsearch".to_string()
}

impl SpaceModel {
    /// Creates a space over the given workflow with the default strategy.
    pub fn new(name: impl Into<String>, workflow: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workflow: workflow.into(),
            strategy: default_strategy(),
            parameters: Vec::new(),
            configurations: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Sets the search strategy.
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    /// Adds a space-level parameter.
    pub fn with_parameter(mut self, parameter: SpaceParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds a task configuration block.
    pub fn with_configuration(mut self, configuration: SpaceTaskConfiguration) -> Self {
        self.configurations.push(configuration);
        self
    }

    /// Adds a space-level data override.
    pub fn with_data(mut self, data: DataDefinition) -> Self {
        self.data.push(data);
        self
    }

    /// Looks up the configuration block for a task, if any.
    pub fn configuration(&self, task: &str) -> Option<&SpaceTaskConfiguration> {
        self.configurations.iter().find(|c| c.task == task)
    }

    /// All override keys this space provides: bare space-level parameter
    /// names plus `"task:param"` keys from configuration blocks.
    pub fn override_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.parameters.iter().map(|p| p.name.clone()).collect();
        for configuration in &self.configurations {
            for parameter in &configuration.parameters {
                keys.push(format!("{}:{}", configuration.task, parameter.name));
            }
        }
        keys
    }
}

/// A single transition of the inter-space control flow.
///
/// `from`/`to` name declared spaces or the synthetic `START`/`END` nodes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: String,
    pub to: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl Transition {
    /// Creates an unconditional transition.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: None,
        }
    }

    /// Creates a conditional transition.
    pub fn conditional(
        from: impl Into<String>,
        to: impl Into<String>,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: Some(condition.into()),
        }
    }
}

/// The declared inter-space execution graph.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ControlFlow {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// One experiment definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExperimentModel {
    pub name: String,

    #[serde(default)]
    pub spaces: Vec<SpaceModel>,

    #[serde(default)]
    pub data: Vec<DataDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<ControlFlow>,
}

impl ExperimentModel {
    /// Creates an empty experiment.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spaces: Vec::new(),
            data: Vec::new(),
            control: None,
        }
    }

    /// Adds a space.
    pub fn with_space(mut self, space: SpaceModel) -> Self {
        self.spaces.push(space);
        self
    }

    /// Adds an experiment-level data declaration.
    pub fn with_data(mut self, data: DataDefinition) -> Self {
        self.data.push(data);
        self
    }

    /// Sets the control flow from its transitions.
    pub fn with_control(mut self, transitions: Vec<Transition>) -> Self {
        self.control = Some(ControlFlow { transitions });
        self
    }

    /// Looks up a space by name.
    pub fn space(&self, name: &str) -> Option<&SpaceModel> {
        self.spaces.iter().find(|s| s.name == name)
    }

    /// Names of all experiment-level data declarations.
    pub fn data_names(&self) -> Vec<String> {
        self.data.iter().map(|d| d.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::values::LiteralValue;

    #[test]
    fn test_space_defaults_to_gridsearch() {
        let space = SpaceModel::new("s1", "training");
        assert_eq!(space.strategy, "gridsearch");
    }

    #[test]
    fn test_space_override_keys_are_qualified() {
        let space = SpaceModel::new("s1", "training")
            .with_parameter(SpaceParameter::new(
                "learning_rate",
                ParameterDomain::range(0.1, 0.5, 0.1),
            ))
            .with_configuration(SpaceTaskConfiguration::new("train").with_parameter(
                SpaceParameter::new(
                    "batch_size",
                    ParameterDomain::enumeration(vec![LiteralValue::Int(16), LiteralValue::Int(32)]),
                ),
            ));

        assert_eq!(space.override_keys(), vec!["learning_rate", "train:batch_size"]);
    }

    #[test]
    fn test_experiment_space_lookup() {
        let experiment = ExperimentModel::new("e").with_space(SpaceModel::new("s1", "w"));
        assert!(experiment.space("s1").is_some());
        assert!(experiment.space("s2").is_none());
    }

    #[test]
    fn test_experiment_yaml_round_trip() {
        let yaml = r#"
name: tuning
data:
  - name: dataset
    value: "data.csv"
spaces:
  - name: coarse
    workflow: training
    strategy: randomsearch
    parameters:
      - name: learning_rate
        value: {min: 0.1, max: 0.5, step: 0.1}
    configurations:
      - task: train
        parameters:
          - name: optimizer
            value: {enum: ["sgd", "adam"]}
control:
  transitions:
    - {from: START, to: coarse}
    - {from: coarse, to: END, condition: "accuracy > 0.9"}
"#;
        let experiment: ExperimentModel = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(experiment.name, "tuning");
        assert_eq!(experiment.spaces.len(), 1);
        assert_eq!(experiment.spaces[0].strategy, "randomsearch");
        assert_eq!(
            experiment.spaces[0].override_keys(),
            vec!["learning_rate", "train:optimizer"]
        );

        let control = experiment.control.as_ref().unwrap();
        assert_eq!(control.transitions.len(), 2);
        assert_eq!(
            control.transitions[1].condition.as_deref(),
            Some("accuracy > 0.9")
        );
    }
}
