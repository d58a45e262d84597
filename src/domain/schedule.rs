use serde::Serialize;

use super::ShiftType;
use super::Skill;
use super::Weekday;
use super::DAYS_PER_WEEK;

/// The shift a nurse works on a day, and the skill it is covered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub shift_type: ShiftType,
    pub skill: Skill,
}

/// The assignments of every nurse over one week, indexed by nurse then day.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WeekSchedule {
    nurses: Vec<[Option<Assignment>; DAYS_PER_WEEK]>,
}

impl WeekSchedule {
    /// A week in which none of `num_nurses` nurses works.
    pub fn new(num_nurses: usize) -> WeekSchedule {
        WeekSchedule {
            nurses: vec![[None; DAYS_PER_WEEK]; num_nurses],
        }
    }

    pub fn assign(&mut self, nurse: usize, day: usize, assignment: Assignment) {
        self.nurses[nurse][day] = Some(assignment);
    }

    pub fn get(&self, nurse: usize, day: usize) -> Option<Assignment> {
        self.nurses[nurse][day]
    }

    pub fn nurse_week(&self, nurse: usize) -> &[Option<Assignment>; DAYS_PER_WEEK] {
        &self.nurses[nurse]
    }

    pub fn num_nurses(&self) -> usize {
        self.nurses.len()
    }

    /// All assignments as `(nurse, day, assignment)`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, Assignment)> + '_ {
        self.nurses.iter().enumerate().flat_map(|(nurse, week)| {
            week.iter()
                .enumerate()
                .filter_map(move |(day, assignment)| assignment.map(|a| (nurse, day, a)))
        })
    }

    /// The number of nurses working `shift_type` on `day` under `skill`.
    pub fn coverage(&self, day: usize, shift_type: ShiftType, skill: Skill) -> u32 {
        self.nurses
            .iter()
            .filter(|week| week[day] == Some(Assignment { shift_type, skill }))
            .count() as u32
    }
}

/// One assignment of the full horizon, in the layout of the exported schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScheduledShift {
    pub nurse: String,
    /// The day counted from the first Monday of the horizon.
    pub day: usize,
    pub week: usize,
    pub weekday: Weekday,
    #[serde(rename = "shiftType")]
    pub shift_type: ShiftType,
    pub skill: Skill,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_counts_matching_assignments() {
        let mut schedule = WeekSchedule::new(3);
        let night_nurse = Assignment {
            shift_type: ShiftType::Night,
            skill: Skill::Nurse,
        };

        schedule.assign(0, 2, night_nurse);
        schedule.assign(1, 2, night_nurse);
        schedule.assign(
            2,
            2,
            Assignment {
                shift_type: ShiftType::Night,
                skill: Skill::HeadNurse,
            },
        );

        assert_eq!(schedule.coverage(2, ShiftType::Night, Skill::Nurse), 2);
        assert_eq!(schedule.coverage(3, ShiftType::Night, Skill::Nurse), 0);
        assert_eq!(schedule.iter().count(), 3);
    }
}
