use serde::Deserialize;
use serde::Serialize;

use super::Scenario;
use super::ShiftType;
use super::Skill;
use super::Weekday;
use super::DAYS_PER_WEEK;
use crate::error::InputError;

/// Staffing for one day: `minimum` is a hard floor, `optimal` a soft target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRequirement {
    pub minimum: u32,
    pub optimal: u32,
}

/// The demand for one (shift type, skill) pair on every day of a week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RequirementRecord", into = "RequirementRecord")]
pub struct Requirement {
    pub shift_type: ShiftType,
    pub skill: Skill,
    pub days: [DayRequirement; DAYS_PER_WEEK],
}

/// The shift a nurse would rather not work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestedShift {
    /// The nurse would rather not work at all on that day.
    Any,
    Shift(ShiftType),
}

impl TryFrom<String> for RequestedShift {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "Any" {
            return Ok(RequestedShift::Any);
        }

        ShiftType::from_name(&value)
            .map(RequestedShift::Shift)
            .ok_or_else(|| format!("unknown shift type {value}"))
    }
}

impl From<RequestedShift> for String {
    fn from(value: RequestedShift) -> Self {
        match value {
            RequestedShift::Any => "Any".to_owned(),
            RequestedShift::Shift(shift_type) => shift_type.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftOffRequest {
    pub nurse: String,
    #[serde(rename = "shiftType")]
    pub shift: RequestedShift,
    pub day: Weekday,
}

/// Everything which changes from one week to the next apart from the history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekData {
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(rename = "shiftOffRequests", default)]
    pub shift_off_requests: Vec<ShiftOffRequest>,
}

impl WeekData {
    /// Check that every requirement and request refers to something the scenario declares.
    pub fn validate(&self, scenario: &Scenario) -> Result<(), InputError> {
        for requirement in &self.requirements {
            let context = format!("the {} {} requirement", requirement.shift_type, requirement.skill);

            let _ = scenario.shift_index(requirement.shift_type, &context)?;
            let _ = scenario.skill_index(requirement.skill, &context)?;
        }

        for request in &self.shift_off_requests {
            let _ = scenario.nurse_index(&request.nurse)?;

            if let RequestedShift::Shift(shift_type) = request.shift {
                let _ = scenario
                    .shift_index(shift_type, &format!("a shift-off request of {}", request.nurse))?;
            }
        }

        Ok(())
    }
}

/// The INRC-II layout, with one field per weekday.
#[derive(Serialize, Deserialize)]
struct RequirementRecord {
    #[serde(rename = "shiftType")]
    shift_type: ShiftType,
    skill: Skill,
    #[serde(rename = "requirementOnMonday", default)]
    monday: DayRequirement,
    #[serde(rename = "requirementOnTuesday", default)]
    tuesday: DayRequirement,
    #[serde(rename = "requirementOnWednesday", default)]
    wednesday: DayRequirement,
    #[serde(rename = "requirementOnThursday", default)]
    thursday: DayRequirement,
    #[serde(rename = "requirementOnFriday", default)]
    friday: DayRequirement,
    #[serde(rename = "requirementOnSaturday", default)]
    saturday: DayRequirement,
    #[serde(rename = "requirementOnSunday", default)]
    sunday: DayRequirement,
}

impl From<RequirementRecord> for Requirement {
    fn from(record: RequirementRecord) -> Self {
        Requirement {
            shift_type: record.shift_type,
            skill: record.skill,
            days: [
                record.monday,
                record.tuesday,
                record.wednesday,
                record.thursday,
                record.friday,
                record.saturday,
                record.sunday,
            ],
        }
    }
}

impl From<Requirement> for RequirementRecord {
    fn from(requirement: Requirement) -> Self {
        let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] = requirement.days;

        RequirementRecord {
            shift_type: requirement.shift_type,
            skill: requirement.skill,
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
        }
    }
}
