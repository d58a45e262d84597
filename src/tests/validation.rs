#![cfg(test)]

use crate::domain::Assignment;
use crate::domain::Scenario;
use crate::domain::ShiftType;
use crate::domain::Skill;
use crate::domain::WeekSchedule;
use crate::domain::Weekday;
use crate::horizon::Schedule;
use crate::tests::fixtures::*;
use crate::validation::validate;
use crate::validation::Violation;

fn two_week_scenario() -> Scenario {
    scenario(
        2,
        &[ShiftType::Early, ShiftType::Late, ShiftType::Night],
        &[Skill::HeadNurse, Skill::Nurse],
        contract(14),
        vec![
            nurse("HN_0", Skill::HeadNurse | Skill::Nurse),
            nurse("NU_1", Skill::Nurse.into()),
        ],
    )
}

fn assignment(shift_type: ShiftType, skill: Skill) -> Assignment {
    Assignment { shift_type, skill }
}

#[test]
fn reports_every_broken_hard_constraint() {
    let scenario = two_week_scenario();
    let weeks = vec![
        week(vec![requirement(ShiftType::Early, Skill::HeadNurse, &[(0, 1, 1)])]),
        week(vec![requirement(ShiftType::Late, Skill::Nurse, &[(2, 1, 2)])]),
    ];
    let mut history = empty_history(&scenario);
    history.nurses[1].last_shift_type = Some(ShiftType::Late);
    history.nurses[1].consecutive_assignments = 1;
    history.nurses[1].consecutive_working_days = 1;

    let mut first = WeekSchedule::new(2);
    first.assign(1, 0, assignment(ShiftType::Early, Skill::HeadNurse));
    first.assign(0, Weekday::SUNDAY, assignment(ShiftType::Night, Skill::Nurse));
    let mut second = WeekSchedule::new(2);
    second.assign(0, 0, assignment(ShiftType::Early, Skill::Nurse));

    let mut schedule = Schedule::new(&scenario);
    schedule.push_week(first);
    schedule.push_week(second);

    let violations = validate(&scenario, &weeks, &history, &schedule);

    assert_eq!(
        violations,
        vec![
            Violation::MissingSkill {
                nurse: "NU_1".to_owned(),
                week: 0,
                day: Weekday::Monday,
                skill: Skill::HeadNurse,
            },
            Violation::Understaffed {
                week: 1,
                day: Weekday::Wednesday,
                shift_type: ShiftType::Late,
                skill: Skill::Nurse,
                minimum: 1,
                assigned: 0,
            },
            Violation::ForbiddenSuccession {
                nurse: "HN_0".to_owned(),
                week: 1,
                day: Weekday::Monday,
                preceding: ShiftType::Night,
                succeeding: ShiftType::Early,
            },
            Violation::ForbiddenSuccession {
                nurse: "NU_1".to_owned(),
                week: 0,
                day: Weekday::Monday,
                preceding: ShiftType::Late,
                succeeding: ShiftType::Early,
            },
        ]
    );
}

#[test]
fn a_feasible_schedule_has_no_violations() {
    let scenario = two_week_scenario();
    let weeks = vec![
        week(vec![requirement(ShiftType::Early, Skill::HeadNurse, &[(0, 1, 1)])]),
        week(vec![requirement(ShiftType::Late, Skill::Nurse, &[(2, 1, 2)])]),
    ];
    let history = empty_history(&scenario);

    let mut first = WeekSchedule::new(2);
    first.assign(0, 0, assignment(ShiftType::Early, Skill::HeadNurse));
    first.assign(1, Weekday::SUNDAY, assignment(ShiftType::Early, Skill::Nurse));
    let mut second = WeekSchedule::new(2);
    second.assign(1, 0, assignment(ShiftType::Late, Skill::Nurse));
    second.assign(1, 1, assignment(ShiftType::Late, Skill::Nurse));
    second.assign(1, 2, assignment(ShiftType::Late, Skill::Nurse));

    let mut schedule = Schedule::new(&scenario);
    schedule.push_week(first);
    schedule.push_week(second);

    assert!(validate(&scenario, &weeks, &history, &schedule).is_empty());
}

#[test]
fn violations_read_as_sentences() {
    let violation = Violation::Understaffed {
        week: 3,
        day: Weekday::Friday,
        shift_type: ShiftType::Night,
        skill: Skill::Nurse,
        minimum: 2,
        assigned: 1,
    };

    assert_eq!(
        violation.to_string(),
        "Night Nurse on Friday of week 3 has 1 nurses, 2 required"
    );
}
