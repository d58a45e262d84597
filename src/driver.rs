//! Solves a single week and reads the assignment back out of the solver values.
use std::fmt::Display;
use std::time::Duration;

use log::debug;
use log::info;
use log::warn;

use crate::backend::Backend;
use crate::backend::BackendError;
use crate::backend::SolutionObserver;
use crate::backend::SolveResult;
use crate::builder::build_week;
use crate::builder::WeekModel;
use crate::domain::Assignment;
use crate::domain::History;
use crate::domain::Scenario;
use crate::domain::WeekData;
use crate::domain::WeekSchedule;
use crate::domain::DAYS_PER_WEEK;
use crate::error::SchedulingError;
use crate::error::SchedulingResult;
use crate::objective;
use crate::objective::ViolationKind;
use crate::objective::Weights;

/// The parameters shared by every week's solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveSettings {
    /// The wall-clock budget of one week.
    pub time_limit: Duration,
    pub weights: Weights,
}

/// How good a week's solution is known to be.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    /// The time limit was reached before optimality was proven.
    Feasible,
}

impl Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveStatus::Optimal => write!(f, "OPTIMAL"),
            SolveStatus::Feasible => write!(f, "FEASIBLE"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekSolution {
    pub week: usize,
    pub status: SolveStatus,
    pub objective: i64,
    /// The weighted penalty per kind of violation, summing to `objective`.
    pub penalties: Vec<(ViolationKind, i64)>,
    pub schedule: WeekSchedule,
}

/// Build, solve and read back week `week`.
///
/// A solution which is not proven optimal is accepted as is; only the absence of any solution
/// is an error.
pub fn solve_week(
    backend: &dyn Backend,
    scenario: &Scenario,
    week: usize,
    data: &WeekData,
    history: &History,
    settings: &SolveSettings,
    observer: Option<&dyn SolutionObserver>,
) -> SchedulingResult<WeekSolution> {
    let mut week_model = build_week(scenario, week, data, history)?;
    let violations = week_model.violations().to_vec();
    objective::assemble(&mut week_model.model, &violations, &settings.weights);

    info!("Solving week {week}");

    let (status, values) = match backend.solve(&week_model.model, settings.time_limit, observer)? {
        SolveResult::Optimal(values) => (SolveStatus::Optimal, values),
        SolveResult::Feasible(values) => {
            warn!("Week {week}: the time limit was reached before optimality was proven");
            (SolveStatus::Feasible, values)
        }
        SolveResult::Infeasible => return Err(SchedulingError::InfeasibleWeek { week }),
        SolveResult::Unknown => {
            return Err(SchedulingError::NoSolutionFound {
                week,
                time_limit: settings.time_limit,
            })
        }
    };

    let violated = week_model.model.violated_constraints(&values).count();
    if violated > 0 || !week_model.model.within_bounds(&values) {
        return Err(BackendError::InvalidSolution { violated }.into());
    }

    let objective = week_model.model.evaluate_objective(&values);
    let penalties = objective::breakdown(&violations, &settings.weights, &values);
    debug!("Week {week} penalties: {penalties:?}");

    Ok(WeekSolution {
        week,
        status,
        objective,
        penalties,
        schedule: extract_schedule(scenario, &week_model, &values),
    })
}

fn extract_schedule(scenario: &Scenario, week_model: &WeekModel, values: &[i32]) -> WeekSchedule {
    let mut schedule = WeekSchedule::new(scenario.nurses.len());

    for n in 0..scenario.nurses.len() {
        for d in 0..DAYS_PER_WEEK {
            for (s, definition) in scenario.shift_types.iter().enumerate() {
                if week_model.works(n, d, s).value(values) == 0 {
                    continue;
                }

                let skill = (0..scenario.skills.len())
                    .find(|&k| week_model.works_with_skill(n, d, s, k).value(values) == 1)
                    .map(|k| scenario.skills[k]);

                // Skill totality is a model constraint, so a worked shift always has a skill.
                if let Some(skill) = skill {
                    schedule.assign(
                        n,
                        d,
                        Assignment {
                            shift_type: definition.shift_type,
                            skill,
                        },
                    );
                }
            }
        }
    }

    schedule
}
