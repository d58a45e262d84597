use std::time::Duration;

use good_lp::constraint;
use good_lp::highs;
use good_lp::solvers::SolutionStatus;
use good_lp::solvers::WithTimeLimit;
use good_lp::variable;
use good_lp::Expression;
use good_lp::ProblemVariables;
use good_lp::ResolutionError;
use good_lp::Solution;
use good_lp::SolverModel;
use good_lp::Variable;
use log::debug;

use super::Backend;
use super::BackendError;
use super::SolutionObserver;
use super::SolveResult;
use crate::model::Constraint;
use crate::model::IntVariable;
use crate::model::Model;

/// Values further than this from an integer are reported as solver failures.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

/// Solves models as mixed integer linear programs with HiGHS.
///
/// A solve stopped by the time limit reports its incumbent as feasible, or nothing when the
/// incumbent does not satisfy the model.
#[derive(Clone, Copy, Debug, Default)]
pub struct MipBackend;

impl Backend for MipBackend {
    fn solve(
        &self,
        model: &Model,
        time_limit: Duration,
        observer: Option<&dyn SolutionObserver>,
    ) -> Result<SolveResult, BackendError> {
        let mut problem = ProblemVariables::new();
        let variables: Vec<Variable> = model
            .variables()
            .map(|(name, lower_bound, upper_bound)| {
                problem.add(
                    variable()
                        .integer()
                        .min(lower_bound)
                        .max(upper_bound)
                        .name(name),
                )
            })
            .collect();

        let objective = model
            .objective()
            .iter()
            .fold(Expression::from(0.0), |mut objective, &(weight, term)| {
                objective += linear_expression(&variables, &[term.scaled(weight)]);
                objective
            });

        let mut program = problem
            .minimise(objective)
            .using(highs)
            .with_time_limit(time_limit.as_secs_f64());

        for constraint in model.constraints() {
            let _ = match constraint {
                Constraint::LinearEqual { terms, rhs } => program.add_constraint(constraint!(
                    linear_expression(&variables, terms) == f64::from(*rhs)
                )),
                Constraint::LinearLessEqual { terms, rhs } => program.add_constraint(constraint!(
                    linear_expression(&variables, terms) <= f64::from(*rhs)
                )),
                Constraint::LinearGreaterEqual { terms, rhs } => program.add_constraint(
                    constraint!(linear_expression(&variables, terms) >= f64::from(*rhs)),
                ),
                Constraint::AtMostOne(terms) => program
                    .add_constraint(constraint!(linear_expression(&variables, terms) <= 1.0)),
            };
        }

        debug!(
            "Solving MIP with {} variables and {} constraints",
            model.num_variables(),
            model.num_constraints()
        );

        let solution = match program.solve() {
            Ok(solution) => solution,
            // Every variable is bounded, so an unbounded report means no solution exists.
            Err(ResolutionError::Infeasible | ResolutionError::Unbounded) => {
                return Ok(SolveResult::Infeasible)
            }
            Err(error) => return Err(error.into()),
        };

        let proven = matches!(solution.status(), SolutionStatus::Optimal);
        let raw: Vec<f64> = variables.iter().map(|&variable| solution.value(variable)).collect();

        let values = match integral_values(model, &raw) {
            Ok(values) => values,
            Err(error) if proven => return Err(error),
            Err(error) => {
                debug!("Discarding the time-limited incumbent: {error}");
                return Ok(SolveResult::Unknown);
            }
        };

        if !proven
            && (model.violated_constraints(&values).next().is_some() || !model.within_bounds(&values))
        {
            debug!("The time limit was reached without a solution satisfying the model");
            return Ok(SolveResult::Unknown);
        }

        if let Some(observer) = observer {
            observer.on_solution(model.evaluate_objective(&values));
        }

        Ok(if proven {
            SolveResult::Optimal(values)
        } else {
            SolveResult::Feasible(values)
        })
    }
}

/// Round the solver values to integers, failing on values which are not integral.
fn integral_values(model: &Model, raw: &[f64]) -> Result<Vec<i32>, BackendError> {
    model
        .variables()
        .zip(raw)
        .map(|((name, _, _), &value)| {
            let rounded = value.round();

            if (value - rounded).abs() > INTEGRALITY_TOLERANCE {
                return Err(BackendError::NonIntegral {
                    name: name.to_owned(),
                    value,
                });
            }

            Ok(rounded as i32)
        })
        .collect()
}

fn linear_expression(variables: &[Variable], terms: &[IntVariable]) -> Expression {
    terms
        .iter()
        .fold(Expression::from(0.0), |mut expression, term| {
            expression += f64::from(term.scale()) * variables[term.id()];
            expression += f64::from(term.constant());
            expression
        })
}
