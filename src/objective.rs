//! Combines the soft-constraint violation variables of a week into one linear objective.
use std::fmt::Display;

use crate::model::IntVariable;
use crate::model::Model;

/// The soft constraints, each with its own weight in the objective.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ViolationKind {
    /// Staffing below the optimal headcount of a (day, shift type, skill).
    Understaffing,
    UnsatisfiedPreference,
    /// Working weekends beyond the prorated contract ceiling.
    WeekendOverflow,
    IncompleteWeekend,
    AssignmentsOver,
    AssignmentsUnder,
    ConsecutiveWorkingDays,
    ConsecutiveDaysOff,
    ConsecutiveAssignments,
}

impl ViolationKind {
    pub const ALL: [ViolationKind; 9] = [
        ViolationKind::Understaffing,
        ViolationKind::UnsatisfiedPreference,
        ViolationKind::WeekendOverflow,
        ViolationKind::IncompleteWeekend,
        ViolationKind::AssignmentsOver,
        ViolationKind::AssignmentsUnder,
        ViolationKind::ConsecutiveWorkingDays,
        ViolationKind::ConsecutiveDaysOff,
        ViolationKind::ConsecutiveAssignments,
    ];
}

impl Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ViolationKind::Understaffing => "understaffed",
            ViolationKind::UnsatisfiedPreference => "unsatisfied_preference",
            ViolationKind::WeekendOverflow => "weekend_overflow",
            ViolationKind::IncompleteWeekend => "incomplete_weekend",
            ViolationKind::AssignmentsOver => "assignments_over",
            ViolationKind::AssignmentsUnder => "assignments_under",
            ViolationKind::ConsecutiveWorkingDays => "consecutive_working_days",
            ViolationKind::ConsecutiveDaysOff => "consecutive_days_off",
            ViolationKind::ConsecutiveAssignments => "consecutive_assignments",
        };

        write!(f, "{name}")
    }
}

/// A variable measuring how much one soft constraint is violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SoftViolation {
    pub kind: ViolationKind,
    pub variable: IntVariable,
}

/// The weight of every kind of violation.
///
/// Coverage and fairness outrank shift-type streaks, which in turn outrank individual
/// preferences.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Weights {
    pub understaffing: i32,
    pub unsatisfied_preference: i32,
    pub weekend_overflow: i32,
    pub incomplete_weekend: i32,
    pub assignments_over: i32,
    pub assignments_under: i32,
    pub consecutive_working_days: i32,
    pub consecutive_days_off: i32,
    pub consecutive_assignments: i32,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            understaffing: 30,
            unsatisfied_preference: 10,
            weekend_overflow: 30,
            incomplete_weekend: 30,
            assignments_over: 20,
            assignments_under: 20,
            consecutive_working_days: 30,
            consecutive_days_off: 30,
            consecutive_assignments: 15,
        }
    }
}

impl Weights {
    pub fn weight(&self, kind: ViolationKind) -> i32 {
        match kind {
            ViolationKind::Understaffing => self.understaffing,
            ViolationKind::UnsatisfiedPreference => self.unsatisfied_preference,
            ViolationKind::WeekendOverflow => self.weekend_overflow,
            ViolationKind::IncompleteWeekend => self.incomplete_weekend,
            ViolationKind::AssignmentsOver => self.assignments_over,
            ViolationKind::AssignmentsUnder => self.assignments_under,
            ViolationKind::ConsecutiveWorkingDays => self.consecutive_working_days,
            ViolationKind::ConsecutiveDaysOff => self.consecutive_days_off,
            ViolationKind::ConsecutiveAssignments => self.consecutive_assignments,
        }
    }
}

/// Add every violation, scaled by its weight, to the objective of `model`.
///
/// Hard constraints never appear in the objective.
pub fn assemble(model: &mut Model, violations: &[SoftViolation], weights: &Weights) {
    for violation in violations {
        let weight = weights.weight(violation.kind);

        if weight != 0 {
            model.add_objective_term(weight, violation.variable);
        }
    }
}

/// The weighted penalty of every kind of violation under a solution, in [`ViolationKind::ALL`]
/// order. Kinds without violations are left out.
pub fn breakdown(
    violations: &[SoftViolation],
    weights: &Weights,
    values: &[i32],
) -> Vec<(ViolationKind, i64)> {
    ViolationKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let penalty: i64 = violations
                .iter()
                .filter(|violation| violation.kind == kind)
                .map(|violation| {
                    i64::from(weights.weight(kind)) * i64::from(violation.variable.value(values))
                })
                .sum();

            (penalty != 0).then_some((kind, penalty))
        })
        .collect()
}
