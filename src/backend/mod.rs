//! The solver collaborator: anything that can minimise a [`Model`] within a time budget.
mod mip;
mod pumpkin;

use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

pub use mip::MipBackend;
pub use pumpkin::PumpkinBackend;

use crate::model::Model;

/// The outcome of minimising a model.
///
/// Solutions hold one value per model variable, indexed by variable id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveResult {
    /// The solution is proven to minimise the objective.
    Optimal(Vec<i32>),
    /// The time budget ran out before optimality was proven.
    Feasible(Vec<i32>),
    Infeasible,
    /// The time budget ran out before any solution was found.
    Unknown,
}

impl SolveResult {
    pub fn values(&self) -> Option<&[i32]> {
        match self {
            SolveResult::Optimal(values) | SolveResult::Feasible(values) => Some(values),
            SolveResult::Infeasible | SolveResult::Unknown => None,
        }
    }
}

/// Receives the objective value of every improving solution found during a solve.
///
/// Observers only watch; they cannot steer or stop the search.
pub trait SolutionObserver {
    fn on_solution(&self, objective: i64);
}

pub trait Backend {
    /// Minimise the objective of `model`, giving up after `time_limit`.
    fn solve(
        &self,
        model: &Model,
        time_limit: Duration,
        observer: Option<&dyn SolutionObserver>,
    ) -> Result<SolveResult, BackendError>;
}

/// Failures of the solver itself, as opposed to the problem having no solution.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("the objective range [{lowest}, {highest}] does not fit the solver's integers")]
    ObjectiveOutOfRange { lowest: i64, highest: i64 },
    #[error("the MIP solver failed: {0}")]
    Mip(#[from] good_lp::ResolutionError),
    #[error("the MIP solver returned {value} for the integer variable {name}")]
    NonIntegral { name: String, value: f64 },
    #[error("the reported solution violates {violated} constraints of the model")]
    InvalidSolution { violated: usize },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum BackendKind {
    /// Lazy clause generation constraint programming.
    #[default]
    Pumpkin,
    /// Mixed integer linear programming.
    Mip,
}

impl BackendKind {
    pub fn create(self) -> Box<dyn Backend> {
        match self {
            BackendKind::Pumpkin => Box::new(PumpkinBackend),
            BackendKind::Mip => Box::new(MipBackend),
        }
    }
}
