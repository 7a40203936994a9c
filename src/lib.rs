//! expc - Experiment Workflow Compiler
//!
//! Compiles parameterized experiment definitions - parameter spaces over
//! inheritable task workflows - into a single normalized, execution-ready
//! artifact document for an external run-time engine.
//!
//! # Architecture
//!
//! The library is organized into five main modules:
//!
//! - [`model`]: Parsed model trees for the two DSLs and their YAML loading
//! - [`resolve`]: The semantic resolution passes (inheritance, parameters,
//!   tasks, data flow, control flow)
//! - [`generator`]: The orchestrator exposing `validate` and `generate`
//! - [`artifact`]: The serializable artifact document
//! - [`error`]: Error/warning kinds and the validation report
//!
//! # Example
//!
//! ```rust,no_run
//! use expc::generate;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = generate("experiment.yaml")?;
//!
//!     if let Some(artifact) = outcome.artifact {
//!         artifact.save("artifact.json")?;
//!     } else {
//!         for message in outcome.validation.error_messages() {
//!             eprintln!("error: {}", message);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod artifact;
pub mod error;
pub mod generator;
pub mod graph;
pub mod model;
pub mod resolve;

// Re-export commonly used types
pub use artifact::ArtifactDocument;
pub use error::{LoadError, SemanticError, SemanticWarning, ValidationReport};
pub use generator::{generate, validate, GenerateOutcome, Generator};
pub use model::loader::load_bundle;
pub use model::{ExperimentModel, WorkflowModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "expc";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "expc");
    }

    #[test]
    fn test_module_exports_models() {
        let experiment = ExperimentModel::new("e");
        assert_eq!(experiment.name, "e");

        let workflow = WorkflowModel::new("w");
        assert!(workflow.tasks.is_empty());
    }

    #[test]
    fn test_module_exports_report() {
        let report = ValidationReport::new();
        assert!(report.is_ok());
    }
}
