//! Parameter Expansion
//!
//! Turns a space's declared parameter domains into concrete candidate
//! lists and combines them into one parameter set per run, according to
//! the space's search strategy.

use std::collections::BTreeMap;

use log::{debug, warn};
use rand::Rng;

use crate::error::SemanticError;
use crate::model::experiment::SpaceModel;
use crate::model::values::{LiteralValue, ParameterDomain, RangeDomain};
use crate::model::workflow::WorkflowModel;

/// Exhaustive Cartesian product strategy.
pub const GRID_SEARCH: &str = "gridsearch";

/// Fixed-size random sample strategy.
pub const RANDOM_SEARCH: &str = "randomsearch";

/// Number of samples drawn by `randomsearch`.
pub const RANDOM_SEARCH_SAMPLES: usize = 10;

/// Range values are rounded to 4 decimal places to suppress
/// floating-point drift while stepping.
const RANGE_SCALE: f64 = 10_000.0;

/// One space's expanded parameter sets: one map per run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterCombinations {
    pub space: String,
    pub combinations: Vec<BTreeMap<String, LiteralValue>>,
}

/// Expands a single parameter domain into its candidate values.
pub fn expand_domain(domain: &ParameterDomain) -> Vec<LiteralValue> {
    match domain {
        ParameterDomain::Enum(e) => e.values.clone(),
        ParameterDomain::Range(range) => expand_range(range),
        ParameterDomain::Literal(value) => vec![value.clone()],
    }
}

fn expand_range(range: &RangeDomain) -> Vec<LiteralValue> {
    if range.step <= 0.0 {
        warn!(
            "Range with non-positive step {} yields only its minimum",
            range.step
        );
        return vec![LiteralValue::Float(round(range.min))];
    }

    let mut values = Vec::new();
    let mut value = round(range.min);
    while value <= range.max {
        values.push(LiteralValue::Float(value));
        value = round(value + range.step);
    }
    values
}

fn round(value: f64) -> f64 {
    (value * RANGE_SCALE).round() / RANGE_SCALE
}

/// Expands a space into its per-run parameter combinations.
///
/// When the space's resolved workflow is given, dimensions that no task
/// parameter consumes are pruned before combination: bare keys must match
/// a parameter of at least one task, `"task:param"` keys a parameter of
/// that task.
///
/// # Arguments
///
/// * `space` - the space to expand
/// * `workflow` - the space's resolved workflow, for pruning
pub fn expand_space(
    space: &SpaceModel,
    workflow: Option<&WorkflowModel>,
) -> Result<ParameterCombinations, SemanticError> {
    let dimensions = collect_dimensions(space, workflow);

    debug!(
        "Space '{}': {} parameter dimensions, strategy '{}'",
        space.name,
        dimensions.len(),
        space.strategy
    );

    let combinations = match space.strategy.as_str() {
        GRID_SEARCH => cartesian_product(&dimensions),
        RANDOM_SEARCH => random_sample(&dimensions),
        _ => {
            return Err(SemanticError::UnknownStrategy {
                space: space.name.clone(),
                strategy: space.strategy.clone(),
            })
        }
    };

    Ok(ParameterCombinations {
        space: space.name.clone(),
        combinations,
    })
}

/// Collects the space's dimensions in declaration order: space-level
/// parameters under their bare name, configuration-block parameters under
/// `"task:param"`.
fn collect_dimensions(
    space: &SpaceModel,
    workflow: Option<&WorkflowModel>,
) -> Vec<(String, Vec<LiteralValue>)> {
    let mut dimensions = Vec::new();

    for parameter in &space.parameters {
        let used = workflow
            .map(|w| w.tasks.iter().any(|t| t.parameter(&parameter.name).is_some()))
            .unwrap_or(true);
        if !used {
            debug!(
                "Space '{}': pruning unused parameter '{}'",
                space.name, parameter.name
            );
            continue;
        }
        dimensions.push((parameter.name.clone(), expand_domain(&parameter.value)));
    }

    for configuration in &space.configurations {
        for parameter in &configuration.parameters {
            let used = workflow
                .map(|w| {
                    w.task(&configuration.task)
                        .map(|t| t.parameter(&parameter.name).is_some())
                        .unwrap_or(false)
                })
                .unwrap_or(true);
            if !used {
                debug!(
                    "Space '{}': pruning unused parameter '{}:{}'",
                    space.name, configuration.task, parameter.name
                );
                continue;
            }
            dimensions.push((
                format!("{}:{}", configuration.task, parameter.name),
                expand_domain(&parameter.value),
            ));
        }
    }

    dimensions
}

/// Full Cartesian product over all dimensions, in declaration order.
fn cartesian_product(
    dimensions: &[(String, Vec<LiteralValue>)],
) -> Vec<BTreeMap<String, LiteralValue>> {
    let mut combinations = vec![BTreeMap::new()];

    for (name, values) in dimensions {
        let mut next = Vec::with_capacity(combinations.len() * values.len());
        for combination in &combinations {
            for value in values {
                let mut extended = combination.clone();
                extended.insert(name.clone(), value.clone());
                next.push(extended);
            }
        }
        combinations = next;
    }

    combinations
}

/// Exactly [`RANDOM_SEARCH_SAMPLES`] independent samples, each picking one
/// value per dimension uniformly at random (with replacement).
fn random_sample(
    dimensions: &[(String, Vec<LiteralValue>)],
) -> Vec<BTreeMap<String, LiteralValue>> {
    let mut rng = rand::thread_rng();
    let mut combinations = Vec::with_capacity(RANDOM_SEARCH_SAMPLES);

    for _ in 0..RANDOM_SEARCH_SAMPLES {
        let mut combination = BTreeMap::new();
        for (name, values) in dimensions {
            if values.is_empty() {
                continue;
            }
            let pick = rng.gen_range(0..values.len());
            combination.insert(name.clone(), values[pick].clone());
        }
        combinations.push(combination);
    }

    combinations
}
