//! Semantic Errors and Warnings
//!
//! Every problem the compiler can report, as two closed enumerations:
//! blocking errors and advisory warnings. The `ValidationReport` collects
//! both and is shared by `validate` and `generate`.

use thiserror::Error;

/// A blocking semantic error. Generation never emits an artifact while
/// any of these is present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum SemanticError {
    #[error("Workflow '{0}' not found")]
    MissingWorkflow(String),

    #[error("Parent workflow '{parent}' of workflow '{workflow}' not found")]
    MissingParentWorkflow { workflow: String, parent: String },

    #[error("Circular inheritance detected involving workflow '{0}'")]
    CircularInheritance(String),

    #[error("Space '{space}': unknown strategy '{strategy}'")]
    UnknownStrategy { space: String, strategy: String },

    #[error("Task '{task}' in workflow '{workflow}' has no implementation")]
    MissingImplementation { workflow: String, task: String },

    #[error("Required parameter '{parameter}' of task '{task}' is not provided by space '{space}'")]
    MissingRequiredParameter {
        space: String,
        task: String,
        parameter: String,
    },

    #[error("Required initial input '{input}' is not satisfied for space '{space}'")]
    MissingInitialInput { space: String, input: String },

    #[error("Space '{space}': task '{task}' requires input '{input}' which is not available at that point")]
    DataNotAvailable {
        space: String,
        task: String,
        input: String,
    },

    #[error("Data '{0}' is used but never defined or produced by any task")]
    UndefinedData(String),

    #[error("Space '{0}' is not reachable from START but is referenced in the control flow")]
    UnreachableSpace(String),

    #[error("Circular data dependency in workflow '{workflow}': {}", .path.join(" -> "))]
    CircularDataDependency { workflow: String, path: Vec<String> },

    #[error("'{0}' cannot reach END")]
    ControlFlowDeadEnd(String),

    #[error("Space '{0}' transitions to itself")]
    SelfLoop(String),

    #[error("Multiple transitions from START")]
    MultipleStartTransitions,

    #[error("Control flow declares no transition from START")]
    NoStartTransition,

    #[error("Transition from END is not allowed (END -> {0})")]
    TransitionFromEnd(String),

    #[error("Transition references unknown space '{0}'")]
    UnknownTransitionTarget(String),

    #[error("Workflow '{workflow}': task '{task}' is defined more than once")]
    DuplicateTaskDefinition { workflow: String, task: String },

    #[error("Workflow '{workflow}': chain references undefined task '{task}'")]
    UndefinedChainTask { workflow: String, task: String },

    #[error("Experiment defines no spaces")]
    NoSpaces,
}

/// An advisory warning. Never blocks artifact generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum SemanticWarning {
    #[error("Space '{0}' is declared but never referenced in the control flow")]
    OrphanedSpace(String),

    #[error("Space '{space}': parameter '{parameter}' is declared but never used by any task")]
    UnusedParameter { space: String, parameter: String },

    #[error("Workflow '{workflow}': task '{task}' is not part of the execution chain")]
    TaskNotInExecutionChain { workflow: String, task: String },

    #[error("Implementation file '{file}' for task '{task}' was not found")]
    ImplementationFileNotFound { task: String, file: String },
}

/// Accumulated result of a validation pass.
///
/// `validate` never fails early: it appends everything it finds and keeps
/// going, so a single run surfaces as many independent problems as possible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<SemanticError>,
    pub warnings: Vec<SemanticWarning>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no blocking errors were recorded.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records a blocking error.
    pub fn error(&mut self, error: SemanticError) {
        self.errors.push(error);
    }

    /// Records an advisory warning.
    pub fn warning(&mut self, warning: SemanticWarning) {
        self.warnings.push(warning);
    }

    /// Absorbs another report.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Drops duplicate entries while keeping first-occurrence order.
    ///
    /// Several passes can legitimately rediscover the same problem (for
    /// example a circular inheritance chain hit by every resolution that
    /// touches it); the report stays stable and minimal.
    pub fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.errors.retain(|e| seen.insert(e.clone()));
        let mut seen = std::collections::HashSet::new();
        self.warnings.retain(|w| seen.insert(w.clone()));
    }

    /// Renders the error list as display strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    /// Renders the warning list as display strings.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

/// Failure to read or deserialize an experiment bundle.
///
/// Kept separate from [`SemanticError`]: a file that cannot be loaded has
/// no model to validate.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read experiment file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse experiment file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SemanticError::MissingWorkflow("training".to_string());
        assert_eq!(err.to_string(), "Workflow 'training' not found");

        let err = SemanticError::MissingRequiredParameter {
            space: "s1".to_string(),
            task: "train".to_string(),
            parameter: "lr".to_string(),
        };
        assert!(err.to_string().starts_with("Required parameter"));
        assert!(err.to_string().contains("'lr'"));

        let err = SemanticError::MultipleStartTransitions;
        assert_eq!(err.to_string(), "Multiple transitions from START");
    }

    #[test]
    fn test_cycle_path_display() {
        let err = SemanticError::CircularDataDependency {
            workflow: "w".to_string(),
            path: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert!(err.to_string().contains("a -> b -> a"));
    }

    #[test]
    fn test_warning_display() {
        let warn = SemanticWarning::UnusedParameter {
            space: "s1".to_string(),
            parameter: "batch".to_string(),
        };
        assert!(warn.to_string().contains("'batch'"));
        assert!(warn.to_string().contains("never used"));
    }

    #[test]
    fn test_report_is_ok() {
        let mut report = ValidationReport::new();
        assert!(report.is_ok());

        report.warning(SemanticWarning::OrphanedSpace("s1".to_string()));
        assert!(report.is_ok());

        report.error(SemanticError::NoSpaces);
        assert!(!report.is_ok());
    }

    #[test]
    fn test_report_merge() {
        let mut left = ValidationReport::new();
        left.error(SemanticError::NoSpaces);

        let mut right = ValidationReport::new();
        right.error(SemanticError::MissingWorkflow("w".to_string()));
        right.warning(SemanticWarning::OrphanedSpace("s".to_string()));

        left.merge(right);
        assert_eq!(left.errors.len(), 2);
        assert_eq!(left.warnings.len(), 1);
    }

    #[test]
    fn test_report_dedup_keeps_order() {
        let mut report = ValidationReport::new();
        report.error(SemanticError::NoSpaces);
        report.error(SemanticError::MissingWorkflow("w".to_string()));
        report.error(SemanticError::NoSpaces);

        report.dedup();
        assert_eq!(
            report.errors,
            vec![
                SemanticError::NoSpaces,
                SemanticError::MissingWorkflow("w".to_string()),
            ]
        );
    }

    #[test]
    fn test_report_messages() {
        let mut report = ValidationReport::new();
        report.error(SemanticError::NoSpaces);
        report.warning(SemanticWarning::OrphanedSpace("s1".to_string()));

        assert_eq!(report.error_messages(), vec!["Experiment defines no spaces"]);
        assert_eq!(report.warning_messages().len(), 1);
    }
}
