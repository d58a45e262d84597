//! Solves the weeks of a scheduling period one after another, handing each week's history to the
//! next.
use fnv::FnvHashMap;
use log::debug;
use log::info;

use crate::backend::Backend;
use crate::backend::SolutionObserver;
use crate::domain::Assignment;
use crate::domain::History;
use crate::domain::Scenario;
use crate::domain::ScheduledShift;
use crate::domain::WeekData;
use crate::domain::WeekSchedule;
use crate::domain::Weekday;
use crate::domain::DAYS_PER_WEEK;
use crate::driver::solve_week;
use crate::driver::SolveSettings;
use crate::driver::SolveStatus;
use crate::driver::WeekSolution;
use crate::error::InputError;
use crate::error::SchedulingResult;

/// Where the rolling solve is. Weeks are never revisited once the next one starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizonState {
    Pending,
    Solving(usize),
    Solved(usize),
    /// Solving the week failed; the remaining weeks cannot be solved.
    Aborted(usize),
    Complete,
}

/// The per-week outcome reported for the horizon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekSummary {
    pub week: usize,
    pub status: SolveStatus,
    pub objective: i64,
}

/// The assignments over the whole horizon, keyed by nurse and absolute day.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    nurses: Vec<String>,
    weeks: Vec<WeekSchedule>,
}

impl Schedule {
    pub fn new(scenario: &Scenario) -> Schedule {
        Schedule {
            nurses: scenario.nurses.iter().map(|nurse| nurse.id.clone()).collect(),
            weeks: Vec::new(),
        }
    }

    pub fn push_week(&mut self, week: WeekSchedule) {
        self.weeks.push(week);
    }

    pub fn num_weeks(&self) -> usize {
        self.weeks.len()
    }

    pub fn week(&self, week: usize) -> &WeekSchedule {
        &self.weeks[week]
    }

    /// The assignment of `nurse` on the absolute day `day`, counted from the first Monday.
    pub fn assignment(&self, nurse: usize, day: usize) -> Option<Assignment> {
        self.weeks
            .get(day / DAYS_PER_WEEK)
            .and_then(|week| week.get(nurse, day % DAYS_PER_WEEK))
    }

    /// Every assignment in the horizon, ordered by week, nurse and day.
    pub fn shifts(&self) -> impl Iterator<Item = ScheduledShift> + '_ {
        self.weeks.iter().enumerate().flat_map(move |(week, schedule)| {
            schedule.iter().map(move |(nurse, day, assignment)| ScheduledShift {
                nurse: self.nurses[nurse].clone(),
                day: week * DAYS_PER_WEEK + day,
                week,
                weekday: Weekday::ALL[day],
                shift_type: assignment.shift_type,
                skill: assignment.skill,
            })
        })
    }

    /// The number of assignments per nurse id.
    pub fn assignment_counts(&self) -> FnvHashMap<&str, usize> {
        let mut counts: FnvHashMap<&str, usize> =
            self.nurses.iter().map(|nurse| (nurse.as_str(), 0)).collect();

        for week in &self.weeks {
            for (nurse, _, _) in week.iter() {
                *counts.entry(self.nurses[nurse].as_str()).or_default() += 1;
            }
        }

        counts
    }
}

/// The result of solving every week of the horizon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HorizonResult {
    pub weeks: Vec<WeekSummary>,
    pub schedule: Schedule,
    /// The history at the end of the last week.
    pub history: History,
}

impl HorizonResult {
    pub fn total_objective(&self) -> i64 {
        self.weeks.iter().map(|week| week.objective).sum()
    }
}

/// Drives [`solve_week`] over week 0 up to the last week of the scenario.
pub struct RollingHorizon<'a> {
    scenario: &'a Scenario,
    weeks: &'a [WeekData],
    backend: &'a dyn Backend,
    settings: SolveSettings,
    observer: Option<&'a dyn SolutionObserver>,
    state: HorizonState,
    history: History,
    summaries: Vec<WeekSummary>,
    schedule: Schedule,
}

impl std::fmt::Debug for RollingHorizon<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingHorizon")
            .field("state", &self.state)
            .field("history", &self.history)
            .field("summaries", &self.summaries)
            .finish_non_exhaustive()
    }
}

impl<'a> RollingHorizon<'a> {
    /// Check that there is week data for every week and a history entry for every nurse.
    pub fn new(
        scenario: &'a Scenario,
        weeks: &'a [WeekData],
        history: History,
        backend: &'a dyn Backend,
        settings: SolveSettings,
    ) -> Result<RollingHorizon<'a>, InputError> {
        scenario.validate()?;

        if weeks.len() != scenario.number_of_weeks {
            return Err(InputError::WeekCountMismatch {
                expected: scenario.number_of_weeks,
                actual: weeks.len(),
            });
        }

        for week in weeks {
            week.validate(scenario)?;
        }

        Ok(RollingHorizon {
            scenario,
            weeks,
            backend,
            settings,
            observer: None,
            state: HorizonState::Pending,
            history: history.aligned_with(scenario)?,
            summaries: Vec::new(),
            schedule: Schedule::new(scenario),
        })
    }

    pub fn with_observer(mut self, observer: &'a dyn SolutionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> HorizonState {
        self.state
    }

    /// The history leading into the next unsolved week.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Solve the next week, returning `None` once the horizon is complete or has been aborted.
    pub fn solve_next(&mut self) -> SchedulingResult<Option<WeekSummary>> {
        let week = match self.state {
            HorizonState::Pending => 0,
            HorizonState::Solved(week) => week + 1,
            HorizonState::Solving(_) | HorizonState::Aborted(_) | HorizonState::Complete => {
                return Ok(None)
            }
        };

        self.state = HorizonState::Solving(week);

        let solution = match solve_week(
            self.backend,
            self.scenario,
            week,
            &self.weeks[week],
            &self.history,
            &self.settings,
            self.observer,
        ) {
            Ok(solution) => solution,
            Err(error) => {
                self.state = HorizonState::Aborted(week);
                return Err(error);
            }
        };

        Ok(Some(self.accept(solution)))
    }

    fn accept(&mut self, solution: WeekSolution) -> WeekSummary {
        let summary = WeekSummary {
            week: solution.week,
            status: solution.status,
            objective: solution.objective,
        };

        info!(
            "Week {}: {} with objective {}",
            summary.week, summary.status, summary.objective
        );

        self.history = self.history.advance(&solution.schedule);
        debug!("History after week {}: {:?}", summary.week, self.history);

        self.schedule.push_week(solution.schedule);
        self.summaries.push(summary);

        self.state = if summary.week + 1 == self.scenario.number_of_weeks {
            HorizonState::Complete
        } else {
            HorizonState::Solved(summary.week)
        };

        summary
    }

    /// Solve every remaining week. The first week without a solution aborts the horizon.
    pub fn run(mut self) -> SchedulingResult<HorizonResult> {
        while self.solve_next()?.is_some() {}

        Ok(HorizonResult {
            weeks: self.summaries,
            schedule: self.schedule,
            history: self.history,
        })
    }
}
