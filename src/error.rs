use std::time::Duration;

use thiserror::Error;

use crate::backend::BackendError;
use crate::domain::ShiftType;
use crate::domain::Skill;

pub type SchedulingResult<T> = Result<T, SchedulingError>;

/// Failures which abort the remainder of the horizon.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("week {week} admits no assignment satisfying the hard constraints")]
    InfeasibleWeek { week: usize },
    #[error("no solution was found for week {week} within {time_limit:?}")]
    NoSolutionFound { week: usize, time_limit: Duration },
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
    #[error("the solver backend failed: {0}")]
    Backend(#[from] BackendError),
}

/// Configuration errors detected while validating the input or building a week's model.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("nurse {nurse} refers to the unknown contract {contract}")]
    UnknownContract { nurse: String, contract: String },
    #[error("the nurse {0} is not part of the scenario")]
    UnknownNurse(String),
    #[error("the identifier {0} is used more than once")]
    DuplicateId(String),
    #[error("the skill {skill} is used by {context} but not declared by the scenario")]
    UndeclaredSkill { skill: Skill, context: String },
    #[error("the shift type {shift_type} is used by {context} but not declared by the scenario")]
    UndeclaredShiftType {
        shift_type: ShiftType,
        context: String,
    },
    #[error("the scenario spans {expected} weeks but {actual} weeks of data were supplied")]
    WeekCountMismatch { expected: usize, actual: usize },
    #[error("week {week} is outside of the {weeks}-week horizon")]
    WeekOutOfRange { week: usize, weeks: usize },
    #[error("the history has no entry for nurse {0}")]
    MissingHistory(String),
    #[error("the history records {streak} consecutive {shift_type} assignments, more than its {working_days} consecutive working days for nurse {nurse}")]
    InconsistentHistory {
        nurse: String,
        shift_type: ShiftType,
        streak: u32,
        working_days: u32,
    },
    #[error("the scenario must span at least one week")]
    EmptyHorizon,
}
