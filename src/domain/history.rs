use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use super::Assignment;
use super::Scenario;
use super::ShiftType;
use super::Weekday;
use super::DAYS_PER_WEEK;
use crate::error::InputError;

/// The counters and streaks of one nurse at the end of the previous week.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NurseHistory {
    pub nurse: String,
    /// Assignments worked so far in the horizon.
    #[serde(rename = "numberOfAssignments")]
    pub assignments: u32,
    /// Weekends with at least one assignment so far in the horizon.
    #[serde(rename = "numberOfWorkingWeekends")]
    pub working_weekends: u32,
    /// The shift worked on the last day, `None` if the nurse was off.
    #[serde(rename = "lastAssignedShiftType", with = "last_shift_type")]
    pub last_shift_type: Option<ShiftType>,
    /// The length of the trailing run of `last_shift_type` assignments.
    #[serde(rename = "numberOfConsecutiveAssignments")]
    pub consecutive_assignments: u32,
    #[serde(rename = "numberOfConsecutiveWorkingDays")]
    pub consecutive_working_days: u32,
    #[serde(rename = "numberOfConsecutiveDaysOff")]
    pub consecutive_days_off: u32,
}

impl NurseHistory {
    /// The history after working `week`.
    ///
    /// Streaks are recomputed by scanning back from Sunday. Only a streak covering the whole
    /// week is extended with the value carried in from before the week.
    pub fn advance(&self, week: &[Option<Assignment>; DAYS_PER_WEEK]) -> NurseHistory {
        let worked = week.iter().filter(|day| day.is_some()).count() as u32;
        let works_weekend = week[Weekday::SATURDAY].is_some() || week[Weekday::SUNDAY].is_some();

        let mut next = NurseHistory {
            nurse: self.nurse.clone(),
            assignments: self.assignments + worked,
            working_weekends: self.working_weekends + u32::from(works_weekend),
            ..NurseHistory::default()
        };

        match week[Weekday::SUNDAY] {
            None => {
                let streak = trailing(week, |day| day.is_none());
                next.consecutive_days_off = carry(streak, self.consecutive_days_off);
            }

            Some(last) => {
                let streak = trailing(week, |day| day.is_some());
                next.consecutive_working_days = carry(streak, self.consecutive_working_days);

                let same_shift = trailing(week, |day| {
                    day.is_some_and(|assignment| assignment.shift_type == last.shift_type)
                });
                next.consecutive_assignments = if self.last_shift_type == Some(last.shift_type) {
                    carry(same_shift, self.consecutive_assignments)
                } else {
                    same_shift
                };
                next.last_shift_type = Some(last.shift_type);
            }
        }

        next
    }
}

fn trailing(
    week: &[Option<Assignment>; DAYS_PER_WEEK],
    predicate: impl Fn(&Option<Assignment>) -> bool,
) -> u32 {
    week.iter().rev().take_while(|day| predicate(day)).count() as u32
}

fn carry(streak: u32, previous: u32) -> u32 {
    if streak as usize == DAYS_PER_WEEK {
        streak + previous
    } else {
        streak
    }
}

/// The per-nurse state handed from one week's solve to the next.
///
/// A history is never mutated in place; [`History::advance`] produces the history for the
/// following week.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    /// The index of the week this history leads into.
    #[serde(default)]
    pub week: usize,
    #[serde(rename = "nurseHistory")]
    pub nurses: Vec<NurseHistory>,
}

impl History {
    /// A history in which no nurse has worked yet.
    pub fn empty(scenario: &Scenario) -> History {
        History {
            week: 0,
            nurses: scenario
                .nurses
                .iter()
                .map(|nurse| NurseHistory {
                    nurse: nurse.id.clone(),
                    ..NurseHistory::default()
                })
                .collect(),
        }
    }

    /// Reorder the entries to follow the nurse order of the scenario, checking that every nurse
    /// has exactly one consistent entry.
    pub fn aligned_with(self, scenario: &Scenario) -> Result<History, InputError> {
        for entry in &self.nurses {
            let _ = scenario.nurse_index(&entry.nurse)?;

            if let Some(shift_type) = entry.last_shift_type {
                if entry.consecutive_assignments > entry.consecutive_working_days {
                    return Err(InputError::InconsistentHistory {
                        nurse: entry.nurse.clone(),
                        shift_type,
                        streak: entry.consecutive_assignments,
                        working_days: entry.consecutive_working_days,
                    });
                }
            }
        }

        let nurses = scenario
            .nurses
            .iter()
            .map(|nurse| {
                let mut entries = self.nurses.iter().filter(|entry| entry.nurse == nurse.id);

                match (entries.next(), entries.next()) {
                    (Some(entry), None) => Ok(entry.clone()),
                    (Some(_), Some(_)) => Err(InputError::DuplicateId(nurse.id.clone())),
                    (None, _) => Err(InputError::MissingHistory(nurse.id.clone())),
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(History {
            week: self.week,
            nurses,
        })
    }

    pub fn nurse(&self, index: usize) -> &NurseHistory {
        &self.nurses[index]
    }

    /// The history leading into the week after `schedule`.
    pub fn advance(&self, schedule: &super::WeekSchedule) -> History {
        History {
            week: self.week + 1,
            nurses: self
                .nurses
                .iter()
                .enumerate()
                .map(|(nurse, previous)| previous.advance(schedule.nurse_week(nurse)))
                .collect(),
        }
    }
}

/// INRC-II writes an idle last day as the string `"None"`.
mod last_shift_type {
    use super::*;

    pub(super) fn serialize<S: Serializer>(
        value: &Option<ShiftType>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(shift_type) => shift_type.serialize(serializer),
            None => serializer.serialize_str("None"),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ShiftType>, D::Error> {
        let name = String::deserialize(deserializer)?;

        if name == "None" {
            return Ok(None);
        }

        ShiftType::from_name(&name)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown shift type {name}")))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::Skill;

    const OFF: Option<Assignment> = None;

    fn on(shift_type: ShiftType) -> Option<Assignment> {
        Some(Assignment {
            shift_type,
            skill: Skill::Nurse,
        })
    }

    fn history() -> NurseHistory {
        NurseHistory {
            nurse: "NU_0".to_owned(),
            assignments: 4,
            working_weekends: 1,
            last_shift_type: Some(ShiftType::Late),
            consecutive_assignments: 2,
            consecutive_working_days: 3,
            consecutive_days_off: 0,
        }
    }

    #[test]
    fn deserialises_inrc_history() {
        let history: History = serde_json::from_value(json!({
            "week": 0,
            "scenario": "n002w1",
            "nurseHistory": [{
                "nurse": "NU_0",
                "numberOfAssignments": 0,
                "numberOfWorkingWeekends": 0,
                "lastAssignedShiftType": "None",
                "numberOfConsecutiveAssignments": 0,
                "numberOfConsecutiveWorkingDays": 0,
                "numberOfConsecutiveDaysOff": 2
            }, {
                "nurse": "NU_1",
                "numberOfAssignments": 0,
                "numberOfWorkingWeekends": 0,
                "lastAssignedShiftType": "Night",
                "numberOfConsecutiveAssignments": 1,
                "numberOfConsecutiveWorkingDays": 3,
                "numberOfConsecutiveDaysOff": 0
            }]
        }))
        .expect("valid history");

        assert_eq!(history.nurses[0].last_shift_type, None);
        assert_eq!(history.nurses[0].consecutive_days_off, 2);
        assert_eq!(history.nurses[1].last_shift_type, Some(ShiftType::Night));
    }

    #[test]
    fn counters_accumulate() {
        let week = [on(ShiftType::Early), OFF, OFF, on(ShiftType::Late), OFF, on(ShiftType::Day), OFF];

        let next = history().advance(&week);

        assert_eq!(next.assignments, 7);
        assert_eq!(next.working_weekends, 2);
    }

    #[test]
    fn weekend_is_counted_once() {
        let week = [OFF, OFF, OFF, OFF, OFF, on(ShiftType::Day), on(ShiftType::Day)];

        assert_eq!(history().advance(&week).working_weekends, 2);
    }

    #[test]
    fn days_off_streak_ends_on_sunday() {
        let week = [on(ShiftType::Early), on(ShiftType::Early), OFF, on(ShiftType::Day), OFF, OFF, OFF];

        let next = history().advance(&week);

        assert_eq!(next.consecutive_days_off, 3);
        assert_eq!(next.consecutive_working_days, 0);
        assert_eq!(next.consecutive_assignments, 0);
        assert_eq!(next.last_shift_type, None);
    }

    #[test]
    fn working_streak_tracks_last_shift_type() {
        let week = [OFF, OFF, on(ShiftType::Early), on(ShiftType::Day), on(ShiftType::Late), on(ShiftType::Night), on(ShiftType::Night)];

        let next = history().advance(&week);

        assert_eq!(next.consecutive_working_days, 5);
        assert_eq!(next.consecutive_days_off, 0);
        assert_eq!(next.last_shift_type, Some(ShiftType::Night));
        assert_eq!(next.consecutive_assignments, 2);
    }

    #[test]
    fn full_week_streak_extends_the_carried_streak() {
        let week = [on(ShiftType::Late); DAYS_PER_WEEK];

        let next = history().advance(&week);

        assert_eq!(next.consecutive_working_days, 10);
        assert_eq!(next.consecutive_assignments, 9);
    }

    #[test]
    fn full_week_of_another_shift_restarts_the_assignment_streak() {
        let week = [on(ShiftType::Early); DAYS_PER_WEEK];

        let next = history().advance(&week);

        assert_eq!(next.consecutive_working_days, 10);
        assert_eq!(next.consecutive_assignments, 7);
    }

    #[test]
    fn full_week_off_extends_the_carried_days_off() {
        let previous = NurseHistory {
            last_shift_type: None,
            consecutive_assignments: 0,
            consecutive_working_days: 0,
            consecutive_days_off: 2,
            ..history()
        };

        let next = previous.advance(&[OFF; DAYS_PER_WEEK]);

        assert_eq!(next.consecutive_days_off, 9);
        assert_eq!(next.working_weekends, 1);
    }
}
