//! The vocabulary the model builder operates on: skills, shift types, days, contracts, nurses,
//! weekly demand and the history carried from one week into the next.
//!
//! The field names of the serialised forms follow the INRC-II instance files, so the scenario,
//! history and week data files of that competition deserialise directly into these types.
mod history;
mod scenario;
mod schedule;
mod week;

use std::fmt::Display;

use enumset::EnumSetType;
use serde::Deserialize;
use serde::Serialize;

pub use history::History;
pub use history::NurseHistory;
pub use scenario::Contract;
pub use scenario::ForbiddenSuccession;
pub use scenario::Nurse;
pub use scenario::Scenario;
pub use scenario::ShiftTypeDefinition;
pub use schedule::Assignment;
pub use schedule::ScheduledShift;
pub use schedule::WeekSchedule;
pub use week::DayRequirement;
pub use week::Requirement;
pub use week::RequestedShift;
pub use week::ShiftOffRequest;
pub use week::WeekData;

/// Every week in the horizon has the same seven days, Monday first.
pub const DAYS_PER_WEEK: usize = 7;

/// The skills a nurse can work a shift under.
///
/// The order reflects seniority and is only used for display.
#[derive(Debug, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumSetType)]
pub enum Skill {
    HeadNurse,
    Nurse,
    Caretaker,
    Trainee,
}

impl Display for Skill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// The schedulable shift types, ordered by the time of day at which they start.
///
/// The wildcard used in shift-off requests is not a shift type; see [`RequestedShift`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShiftType {
    Early,
    Day,
    Late,
    Night,
}

impl ShiftType {
    pub const ALL: [ShiftType; 4] = [
        ShiftType::Early,
        ShiftType::Day,
        ShiftType::Late,
        ShiftType::Night,
    ];

    /// The position of the shift in the daily order, `Early` being 0.
    pub fn index(self) -> usize {
        self as usize
    }

    pub(crate) fn from_name(name: &str) -> Option<ShiftType> {
        ShiftType::ALL
            .into_iter()
            .find(|shift| format!("{shift:?}") == name)
    }
}

impl Display for ShiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; DAYS_PER_WEEK] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub const SATURDAY: usize = Weekday::Saturday as usize;
    pub const SUNDAY: usize = Weekday::Sunday as usize;

    /// Day-of-week index, Monday being 0.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
