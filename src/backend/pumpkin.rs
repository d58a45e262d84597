use std::time::Duration;

use log::debug;
use pumpkin_solver::constraints;
use pumpkin_solver::optimisation::linear_unsat_sat::LinearUnsatSat;
use pumpkin_solver::optimisation::OptimisationDirection;
use pumpkin_solver::results::OptimisationResult;
use pumpkin_solver::results::ProblemSolution;
use pumpkin_solver::results::SolutionReference;
use pumpkin_solver::termination::TimeBudget;
use pumpkin_solver::variables::AffineView;
use pumpkin_solver::variables::DomainId;
use pumpkin_solver::variables::TransformableVariable;
use pumpkin_solver::ConstraintOperationError;
use pumpkin_solver::DefaultBrancher;
use pumpkin_solver::Solver;

use super::Backend;
use super::BackendError;
use super::SolutionObserver;
use super::SolveResult;
use crate::model::Constraint;
use crate::model::IntVariable;
use crate::model::Model;

/// Solves models with the Pumpkin lazy clause generation solver, minimising with linear
/// UNSAT-SAT search.
///
/// After a first solution, the objective bound starts at its lowest value and is relaxed one
/// step at a time. The first solution within the bound is optimal; a timeout returns the first
/// solution as feasible.
#[derive(Clone, Copy, Debug, Default)]
pub struct PumpkinBackend;

impl Backend for PumpkinBackend {
    fn solve(
        &self,
        model: &Model,
        time_limit: Duration,
        observer: Option<&dyn SolutionObserver>,
    ) -> Result<SolveResult, BackendError> {
        let (lowest, highest) = model.objective_bounds();
        let (Ok(lowest), Ok(highest)) = (i32::try_from(lowest), i32::try_from(highest)) else {
            return Err(BackendError::ObjectiveOutOfRange { lowest, highest });
        };

        let mut solver = Solver::default();
        let variables = VariableMap::create(model, &mut solver);
        let objective = solver.new_named_bounded_integer(lowest, highest, "objective");

        if add_constraints(model, &variables, objective, &mut solver).is_err() {
            debug!("Conflict at the root while posting the constraints");
            return Ok(SolveResult::Infeasible);
        }

        let mut brancher = solver.default_brancher();
        let mut time_budget = TimeBudget::starting_now(time_limit);

        let callback = move |_: &Solver, solution: SolutionReference, _: &DefaultBrancher| {
            if let Some(observer) = observer {
                observer.on_solution(i64::from(solution.get_integer_value(objective)));
            }
        };

        let result = solver.optimise(
            &mut brancher,
            &mut time_budget,
            LinearUnsatSat::new(OptimisationDirection::Minimise, objective, callback),
        );

        Ok(match result {
            OptimisationResult::Optimal(solution) => {
                SolveResult::Optimal(variables.values(|domain| solution.get_integer_value(domain)))
            }
            OptimisationResult::Satisfiable(solution) => {
                SolveResult::Feasible(variables.values(|domain| solution.get_integer_value(domain)))
            }
            OptimisationResult::Unsatisfiable => SolveResult::Infeasible,
            OptimisationResult::Unknown => SolveResult::Unknown,
        })
    }
}

fn add_constraints(
    model: &Model,
    variables: &VariableMap,
    objective: DomainId,
    solver: &mut Solver,
) -> Result<(), ConstraintOperationError> {
    let tag = solver.new_constraint_tag();
    let to_solver_variables = |terms: &[IntVariable]| -> Vec<AffineView<DomainId>> {
        terms
            .iter()
            .map(|&term| variables.to_solver_variable(term))
            .collect()
    };

    for constraint in model.constraints() {
        match constraint {
            Constraint::LinearEqual { terms, rhs } => {
                solver
                    .add_constraint(constraints::equals(to_solver_variables(terms), *rhs, tag))
                    .post()?;
            }
            Constraint::LinearLessEqual { terms, rhs } => {
                solver
                    .add_constraint(constraints::less_than_or_equals(
                        to_solver_variables(terms),
                        *rhs,
                        tag,
                    ))
                    .post()?;
            }
            Constraint::LinearGreaterEqual { terms, rhs } => {
                let negated: Vec<_> = terms.iter().map(|term| term.scaled(-1)).collect();

                solver
                    .add_constraint(constraints::less_than_or_equals(
                        to_solver_variables(&negated),
                        -rhs,
                        tag,
                    ))
                    .post()?;
            }
            Constraint::AtMostOne(terms) => {
                solver
                    .add_constraint(constraints::less_than_or_equals(
                        to_solver_variables(terms),
                        1,
                        tag,
                    ))
                    .post()?;
            }
        }
    }

    // objective - sum(weight * term) = 0
    let mut objective_terms: Vec<_> = model
        .objective()
        .iter()
        .map(|&(weight, term)| variables.to_solver_variable(term.scaled(weight)))
        .collect();
    objective_terms.push(objective.scaled(-1));

    solver
        .add_constraint(constraints::equals(objective_terms, 0, tag))
        .post()
}

/// The solver variable behind every model variable, indexed by variable id.
#[derive(Clone, Debug)]
struct VariableMap {
    domains: Vec<DomainId>,
}

impl VariableMap {
    fn create(model: &Model, solver: &mut Solver) -> VariableMap {
        let domains = model
            .variables()
            .map(|(name, lower_bound, upper_bound)| {
                solver.new_named_bounded_integer(lower_bound, upper_bound, name)
            })
            .collect();

        VariableMap { domains }
    }

    fn to_solver_variable(&self, variable: IntVariable) -> AffineView<DomainId> {
        self.domains[variable.id()]
            .scaled(variable.scale())
            .offset(variable.constant())
    }

    fn values(&self, value_of: impl Fn(DomainId) -> i32) -> Vec<i32> {
        self.domains.iter().map(|&domain| value_of(domain)).collect()
    }
}
