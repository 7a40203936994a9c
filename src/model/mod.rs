//! Model Trees
//!
//! The parsed form of the two DSLs, as plain serializable value types.
//!
//! # Structure
//!
//! - [`values`]: literal values, parameter domains, data declarations
//! - [`workflow`]: one workflow definition (tasks, chain, inheritance)
//! - [`experiment`]: one experiment (spaces, control flow)
//! - [`loader`]: YAML loading of an experiment bundle

pub mod experiment;
pub mod loader;
pub mod values;
pub mod workflow;

pub use experiment::{
    ControlFlow, ExperimentModel, SpaceModel, SpaceParameter, SpaceTaskConfiguration, Transition,
};
pub use loader::{load_bundle, ExperimentBundle};
pub use values::{DataDefinition, LiteralValue, ParameterDomain, END, START};
pub use workflow::{
    ParameterModel, TaskChain, TaskConfigurationModel, TaskModel, WorkflowModel,
};
