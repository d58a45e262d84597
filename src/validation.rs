//! Re-checks the hard constraints on a solved schedule, independently of the model.
//!
//! Double bookings and shifts without a skill cannot be represented by [`WeekSchedule`], so the
//! remaining hard constraints are checked:
//! - every assignment uses a skill the nurse has, and a declared shift type
//! - every minimum staffing requirement is met
//! - no forbidden succession occurs, including across week boundaries
use std::fmt::Display;

use crate::domain::History;
use crate::domain::Scenario;
use crate::domain::ShiftType;
use crate::domain::Skill;
use crate::domain::WeekData;
use crate::domain::WeekSchedule;
use crate::domain::Weekday;
use crate::domain::DAYS_PER_WEEK;
use crate::horizon::Schedule;

/// A hard constraint broken by a schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    MissingSkill {
        nurse: String,
        week: usize,
        day: Weekday,
        skill: Skill,
    },
    UndeclaredShiftType {
        nurse: String,
        week: usize,
        day: Weekday,
        shift_type: ShiftType,
    },
    Understaffed {
        week: usize,
        day: Weekday,
        shift_type: ShiftType,
        skill: Skill,
        minimum: u32,
        assigned: u32,
    },
    /// `succeeding` is worked on `day`, the day after `preceding`. For Monday of week 0 the
    /// preceding shift comes from the initial history.
    ForbiddenSuccession {
        nurse: String,
        week: usize,
        day: Weekday,
        preceding: ShiftType,
        succeeding: ShiftType,
    },
}

impl Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingSkill {
                nurse,
                week,
                day,
                skill,
            } => write!(f, "{nurse} works as {skill} on {day} of week {week} without the skill"),
            Violation::UndeclaredShiftType {
                nurse,
                week,
                day,
                shift_type,
            } => write!(
                f,
                "{nurse} works the undeclared shift type {shift_type} on {day} of week {week}"
            ),
            Violation::Understaffed {
                week,
                day,
                shift_type,
                skill,
                minimum,
                assigned,
            } => write!(
                f,
                "{shift_type} {skill} on {day} of week {week} has {assigned} nurses, {minimum} required"
            ),
            Violation::ForbiddenSuccession {
                nurse,
                week,
                day,
                preceding,
                succeeding,
            } => write!(
                f,
                "{nurse} works {succeeding} on {day} of week {week} after {preceding}"
            ),
        }
    }
}

/// Every hard constraint violated by `schedule`, which starts from `history`.
///
/// Weeks without week data or beyond the schedule are not checked.
pub fn validate(
    scenario: &Scenario,
    weeks: &[WeekData],
    history: &History,
    schedule: &Schedule,
) -> Vec<Violation> {
    let successors = scenario.forbidden_successors();
    let mut violations = Vec::new();

    for (week, data) in weeks.iter().enumerate().take(schedule.num_weeks()) {
        let week_schedule = schedule.week(week);

        check_assignments(scenario, week, week_schedule, &mut violations);
        check_staffing(week, data, week_schedule, &mut violations);
    }

    for (n, nurse) in scenario.nurses.iter().enumerate() {
        let mut previous = history
            .nurses
            .iter()
            .find(|entry| entry.nurse == nurse.id)
            .and_then(|entry| entry.last_shift_type);

        for day in 0..schedule.num_weeks() * DAYS_PER_WEEK {
            let current = schedule.assignment(n, day).map(|a| a.shift_type);

            if let (Some(preceding), Some(succeeding)) = (previous, current) {
                let forbidden = scenario
                    .shift_index(preceding, "")
                    .ok()
                    .zip(scenario.shift_index(succeeding, "").ok())
                    .is_some_and(|(p, s)| successors[p].contains(&s));

                if forbidden {
                    violations.push(Violation::ForbiddenSuccession {
                        nurse: nurse.id.clone(),
                        week: day / DAYS_PER_WEEK,
                        day: Weekday::ALL[day % DAYS_PER_WEEK],
                        preceding,
                        succeeding,
                    });
                }
            }

            previous = current;
        }
    }

    violations
}

fn check_assignments(
    scenario: &Scenario,
    week: usize,
    schedule: &WeekSchedule,
    violations: &mut Vec<Violation>,
) {
    for (n, d, assignment) in schedule.iter() {
        let nurse = &scenario.nurses[n];

        if !nurse.skills.contains(assignment.skill) {
            violations.push(Violation::MissingSkill {
                nurse: nurse.id.clone(),
                week,
                day: Weekday::ALL[d],
                skill: assignment.skill,
            });
        }

        if scenario.shift_index(assignment.shift_type, "").is_err() {
            violations.push(Violation::UndeclaredShiftType {
                nurse: nurse.id.clone(),
                week,
                day: Weekday::ALL[d],
                shift_type: assignment.shift_type,
            });
        }
    }
}

fn check_staffing(
    week: usize,
    data: &WeekData,
    schedule: &WeekSchedule,
    violations: &mut Vec<Violation>,
) {
    for requirement in &data.requirements {
        for (d, day) in Weekday::ALL.into_iter().enumerate() {
            let minimum = requirement.days[d].minimum;
            let assigned = schedule.coverage(d, requirement.shift_type, requirement.skill);

            if assigned < minimum {
                violations.push(Violation::Understaffed {
                    week,
                    day,
                    shift_type: requirement.shift_type,
                    skill: requirement.skill,
                    minimum,
                    assigned,
                });
            }
        }
    }
}
