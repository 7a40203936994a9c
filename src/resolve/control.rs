//! Control-Flow Resolution and Validation
//!
//! Builds the inter-space transition graph, validates its shape, computes
//! reachability from START, and synthesizes a default linear flow through
//! the declared spaces when the experiment declares none.

use std::collections::HashSet;

use log::{debug, info};

use crate::error::{SemanticError, SemanticWarning};
use crate::graph::DiGraph;
use crate::model::experiment::{ExperimentModel, Transition};
use crate::model::values::{END, START};

/// The resolved inter-space execution graph.
#[derive(Debug, Clone, Default)]
pub struct ResolvedControlFlow {
    /// Target of the single transition originating at START.
    pub start: Option<String>,
    /// Declared or synthesized transitions, including the START one.
    pub transitions: Vec<Transition>,
    /// Spaces reachable from START.
    pub reachable: HashSet<String>,
}

/// Resolves the experiment's control flow for generation.
///
/// Validation runs separately and first; the error paths here only fire
/// on unvalidated input.
pub fn resolve(experiment: &ExperimentModel) -> Result<ResolvedControlFlow, SemanticError> {
    let transitions = match &experiment.control {
        Some(control) => control.transitions.clone(),
        None => synthesize(experiment)?,
    };

    let mut starts = transitions.iter().filter(|t| t.from == START);
    let start = starts.next().map(|t| t.to.clone());
    if starts.next().is_some() {
        return Err(SemanticError::MultipleStartTransitions);
    }

    let mut graph = DiGraph::new();
    for transition in &transitions {
        graph.add_edge(transition.from.clone(), transition.to.clone());
    }

    let reachable: HashSet<String> = graph
        .reachable_from(START)
        .into_iter()
        .filter(|node| node.as_str() != START && node.as_str() != END)
        .collect();

    debug!("Reachable spaces: {:?}", reachable);

    Ok(ResolvedControlFlow {
        start,
        transitions,
        reachable,
    })
}

/// Synthesizes the default linear flow: a chain through all declared
/// spaces in declaration order, ending at END.
fn synthesize(experiment: &ExperimentModel) -> Result<Vec<Transition>, SemanticError> {
    if experiment.spaces.is_empty() {
        return Err(SemanticError::NoSpaces);
    }

    info!(
        "No control flow declared: synthesizing linear flow over {} spaces",
        experiment.spaces.len()
    );

    let mut transitions = vec![Transition::new(START, experiment.spaces[0].name.clone())];
    for pair in experiment.spaces.windows(2) {
        transitions.push(Transition::new(pair[0].name.clone(), pair[1].name.clone()));
    }
    let last = &experiment.spaces[experiment.spaces.len() - 1];
    transitions.push(Transition::new(last.name.clone(), END));

    Ok(transitions)
}

/// Validates the declared control flow, accumulating every problem.
///
/// Check order: multiple START transitions (stops all further checks),
/// transitions from END, unknown space names (suppresses the graph
/// checks), self-loops, dead ends, and finally reachability.
pub fn validate(
    experiment: &ExperimentModel,
) -> (Vec<SemanticError>, Vec<SemanticWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if experiment.spaces.is_empty() {
        errors.push(SemanticError::NoSpaces);
    }

    let control = match &experiment.control {
        Some(control) => control,
        // A synthesized flow is linear by construction; nothing to check.
        None => return (errors, warnings),
    };
    let transitions = &control.transitions;

    let start_count = transitions.iter().filter(|t| t.from == START).count();
    if start_count > 1 {
        errors.push(SemanticError::MultipleStartTransitions);
        return (errors, warnings);
    }

    let mut malformed = false;
    if start_count == 0 {
        errors.push(SemanticError::NoStartTransition);
        malformed = true;
    }

    for transition in transitions {
        if transition.from == END {
            errors.push(SemanticError::TransitionFromEnd(transition.to.clone()));
        }
    }

    let names: HashSet<&str> = experiment.spaces.iter().map(|s| s.name.as_str()).collect();
    for transition in transitions {
        for node in [&transition.from, &transition.to] {
            if node.as_str() != START && node.as_str() != END && !names.contains(node.as_str()) {
                errors.push(SemanticError::UnknownTransitionTarget(node.clone()));
                malformed = true;
            }
        }
    }

    for transition in transitions {
        if transition.from == transition.to {
            errors.push(SemanticError::SelfLoop(transition.from.clone()));
        }
    }

    if malformed {
        return (errors, warnings);
    }

    let mut graph = DiGraph::new();
    graph.add_node(END);
    for transition in transitions {
        graph.add_edge(transition.from.clone(), transition.to.clone());
    }

    if let Some(node) = graph.dead_end_from(START, END) {
        errors.push(SemanticError::ControlFlowDeadEnd(node));
    }

    let reachable = graph.reachable_from(START);
    let referenced: HashSet<&str> = transitions
        .iter()
        .flat_map(|t| [t.from.as_str(), t.to.as_str()])
        .collect();

    for space in &experiment.spaces {
        if !reachable.contains(&space.name) {
            if referenced.contains(space.name.as_str()) {
                errors.push(SemanticError::UnreachableSpace(space.name.clone()));
            } else {
                warnings.push(SemanticWarning::OrphanedSpace(space.name.clone()));
            }
        }
    }

    (errors, warnings)
}
