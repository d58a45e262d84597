#![cfg(test)]

use std::cell::RefCell;
use std::time::Duration;

use crate::backend::Backend;
use crate::backend::MipBackend;
use crate::backend::PumpkinBackend;
use crate::backend::SolutionObserver;
use crate::domain::Assignment;
use crate::domain::History;
use crate::domain::RequestedShift;
use crate::domain::Scenario;
use crate::domain::ShiftOffRequest;
use crate::domain::ShiftType;
use crate::domain::Skill;
use crate::domain::WeekData;
use crate::domain::Weekday;
use crate::domain::DAYS_PER_WEEK;
use crate::driver::solve_week;
use crate::driver::SolveSettings;
use crate::driver::SolveStatus;
use crate::driver::WeekSolution;
use crate::error::SchedulingError;
use crate::error::SchedulingResult;
use crate::objective::ViolationKind;
use crate::objective::Weights;
use crate::tests::fixtures::*;

fn settings() -> SolveSettings {
    SolveSettings {
        time_limit: Duration::from_secs(30),
        weights: Weights::default(),
    }
}

fn solve_with(
    backend: &dyn Backend,
    scenario: &Scenario,
    data: &WeekData,
    history: &History,
) -> SchedulingResult<WeekSolution> {
    solve_week(backend, scenario, 0, data, history, &settings(), None)
}

fn single_nurse_single_shift() -> (Scenario, WeekData) {
    let scenario = scenario(
        1,
        &[ShiftType::Early],
        &[Skill::Nurse],
        contract(1),
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let data = week(vec![requirement(ShiftType::Early, Skill::Nurse, &[(0, 1, 1)])]);

    (scenario, data)
}

fn assert_single_monday_shift(solution: &WeekSolution) {
    let early_nurse = Assignment {
        shift_type: ShiftType::Early,
        skill: Skill::Nurse,
    };

    assert_eq!(solution.status, SolveStatus::Optimal);
    assert_eq!(solution.objective, 0);
    assert_eq!(solution.schedule.get(0, 0), Some(early_nurse));
    for day in 1..DAYS_PER_WEEK {
        assert_eq!(solution.schedule.get(0, day), None);
    }
}

#[test]
fn single_nurse_covers_the_only_requirement() {
    let (scenario, data) = single_nurse_single_shift();
    let history = empty_history(&scenario);

    let solution = solve_with(&PumpkinBackend, &scenario, &data, &history).expect("solvable");

    assert_single_monday_shift(&solution);
}

#[test]
fn mip_backend_agrees_on_the_single_nurse_week() {
    let (scenario, data) = single_nurse_single_shift();
    let history = empty_history(&scenario);

    let solution = solve_with(&MipBackend, &scenario, &data, &history).expect("solvable");

    assert_single_monday_shift(&solution);
}

#[test]
fn minimum_staffing_is_met_by_the_only_qualified_nurse() {
    let scenario = scenario(
        1,
        &[ShiftType::Day],
        &[Skill::HeadNurse, Skill::Nurse],
        contract(7),
        vec![
            nurse("NU_0", Skill::Nurse.into()),
            nurse("HN_1", Skill::HeadNurse | Skill::Nurse),
        ],
    );
    let data = week(vec![requirement(ShiftType::Day, Skill::HeadNurse, &[(0, 1, 1)])]);
    let history = empty_history(&scenario);

    let solution = solve_with(&PumpkinBackend, &scenario, &data, &history).expect("solvable");

    assert_eq!(
        solution.schedule.get(1, 0),
        Some(Assignment {
            shift_type: ShiftType::Day,
            skill: Skill::HeadNurse,
        })
    );
    assert_eq!(solution.schedule.coverage(0, ShiftType::Day, Skill::HeadNurse), 1);
}

#[test]
fn night_forbids_earlier_shifts_on_the_next_day() {
    let scenario = scenario(
        1,
        &ShiftType::ALL,
        &[Skill::Nurse],
        contract(7),
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let data = week(vec![
        requirement(ShiftType::Night, Skill::Nurse, &[(0, 1, 1)]),
        requirement(ShiftType::Early, Skill::Nurse, &[(1, 0, 1)]),
        requirement(ShiftType::Day, Skill::Nurse, &[(1, 0, 1)]),
        requirement(ShiftType::Late, Skill::Nurse, &[(1, 0, 1)]),
    ]);
    let history = empty_history(&scenario);

    let solution = solve_with(&PumpkinBackend, &scenario, &data, &history).expect("solvable");

    assert_eq!(
        solution.schedule.get(0, 0).map(|assignment| assignment.shift_type),
        Some(ShiftType::Night)
    );
    let tuesday = solution.schedule.get(0, 1).map(|assignment| assignment.shift_type);
    assert!(matches!(tuesday, None | Some(ShiftType::Night)));
    // Every optimum of Tuesday goes unmet.
    assert_eq!(solution.objective, 3 * 30);
}

#[test]
fn forced_forbidden_succession_is_infeasible() {
    let scenario = scenario(
        1,
        &[ShiftType::Early, ShiftType::Night],
        &[Skill::Nurse],
        contract(7),
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let data = week(vec![
        requirement(ShiftType::Night, Skill::Nurse, &[(0, 1, 1)]),
        requirement(ShiftType::Early, Skill::Nurse, &[(1, 1, 1)]),
    ]);
    let history = empty_history(&scenario);

    let result = solve_with(&PumpkinBackend, &scenario, &data, &history);

    assert!(matches!(result, Err(SchedulingError::InfeasibleWeek { week: 0 })));
}

#[test]
fn nurse_without_skills_cannot_cover_a_minimum() {
    let scenario = scenario(
        1,
        &[ShiftType::Early],
        &[Skill::Nurse],
        contract(7),
        vec![nurse("NU_0", enumset::EnumSet::empty())],
    );
    let data = week(vec![requirement(ShiftType::Early, Skill::Nurse, &[(3, 1, 1)])]);
    let history = empty_history(&scenario);

    let result = solve_with(&PumpkinBackend, &scenario, &data, &history);

    assert!(matches!(result, Err(SchedulingError::InfeasibleWeek { week: 0 })));
}

#[test]
fn coverage_outweighs_a_day_off_request() {
    let scenario = scenario(
        1,
        &[ShiftType::Late],
        &[Skill::Nurse],
        contract(7),
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let mut data = week(vec![requirement(ShiftType::Late, Skill::Nurse, &[(2, 0, 1)])]);
    data.shift_off_requests.push(ShiftOffRequest {
        nurse: "NU_0".to_owned(),
        shift: RequestedShift::Any,
        day: Weekday::Wednesday,
    });
    let history = empty_history(&scenario);

    let solution = solve_with(&PumpkinBackend, &scenario, &data, &history).expect("solvable");

    assert!(solution.schedule.get(0, 2).is_some());
    assert_eq!(solution.objective, 10);
    assert_eq!(
        solution.penalties,
        vec![(ViolationKind::UnsatisfiedPreference, 10)]
    );
}

#[test]
fn complete_weekend_pulls_in_sunday() {
    let mut complete = contract(7);
    complete.complete_weekends = true;
    let scenario = scenario(
        1,
        &[ShiftType::Day],
        &[Skill::Nurse],
        complete,
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let data = week(vec![requirement(ShiftType::Day, Skill::Nurse, &[(5, 1, 1)])]);
    let history = empty_history(&scenario);

    let solution = solve_with(&PumpkinBackend, &scenario, &data, &history).expect("solvable");

    assert!(solution.schedule.get(0, Weekday::SATURDAY).is_some());
    assert!(solution.schedule.get(0, Weekday::SUNDAY).is_some());
    assert_eq!(solution.objective, 0);
}

#[test]
fn observer_sees_the_final_objective() {
    #[derive(Default)]
    struct Recorder(RefCell<Vec<i64>>);

    impl SolutionObserver for Recorder {
        fn on_solution(&self, objective: i64) {
            self.0.borrow_mut().push(objective);
        }
    }

    let scenario = scenario(
        1,
        &[ShiftType::Late],
        &[Skill::Nurse],
        contract(7),
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let mut data = week(vec![requirement(ShiftType::Late, Skill::Nurse, &[(2, 0, 1)])]);
    data.shift_off_requests.push(ShiftOffRequest {
        nurse: "NU_0".to_owned(),
        shift: RequestedShift::Shift(ShiftType::Late),
        day: Weekday::Wednesday,
    });
    let history = empty_history(&scenario);
    let recorder = Recorder::default();

    let solution = solve_week(
        &PumpkinBackend,
        &scenario,
        0,
        &data,
        &history,
        &settings(),
        Some(&recorder),
    )
    .expect("solvable");

    let observed = recorder.0.borrow();
    assert!(!observed.is_empty());
    assert_eq!(observed.last(), Some(&solution.objective));
    assert!(observed.windows(2).all(|pair| pair[1] <= pair[0]));
}

fn carried_streak_week() -> (Scenario, WeekData, History) {
    let mut contract = contract(10);
    contract.minimum_assignments = 6;
    contract.maximum_consecutive_working_days = 5;
    contract.maximum_consecutive_days_off = 3;
    contract.maximum_working_weekends = 2;
    contract.complete_weekends = true;

    let mut scenario = scenario(
        2,
        &[ShiftType::Early, ShiftType::Late, ShiftType::Night],
        &[Skill::HeadNurse, Skill::Nurse],
        contract,
        vec![
            nurse("HN_0", Skill::HeadNurse | Skill::Nurse),
            nurse("NU_1", Skill::Nurse.into()),
            nurse("NU_2", Skill::Nurse.into()),
        ],
    );
    scenario.shift_types[2].maximum_consecutive_assignments = 3;

    let every_day = |minimum, optimal| -> Vec<(usize, u32, u32)> {
        (0..DAYS_PER_WEEK).map(|day| (day, minimum, optimal)).collect()
    };
    let mut data = week(vec![
        requirement(ShiftType::Early, Skill::Nurse, &every_day(1, 1)),
        requirement(ShiftType::Late, Skill::Nurse, &every_day(1, 2)),
        requirement(ShiftType::Night, Skill::HeadNurse, &every_day(0, 1)),
    ]);
    data.shift_off_requests.push(ShiftOffRequest {
        nurse: "NU_1".to_owned(),
        shift: RequestedShift::Any,
        day: Weekday::Saturday,
    });

    let mut history = empty_history(&scenario);
    history.week = 1;
    let head_nurse = &mut history.nurses[0];
    head_nurse.assignments = 5;
    head_nurse.last_shift_type = Some(ShiftType::Night);
    head_nurse.consecutive_assignments = 2;
    head_nurse.consecutive_working_days = 4;
    let rested = &mut history.nurses[1];
    rested.assignments = 3;
    rested.consecutive_days_off = 2;
    let early = &mut history.nurses[2];
    early.assignments = 4;
    early.working_weekends = 1;
    early.last_shift_type = Some(ShiftType::Early);
    early.consecutive_assignments = 1;
    early.consecutive_working_days = 1;

    (scenario, data, history)
}

#[test]
fn backends_agree_on_a_week_with_carried_streaks() {
    let (scenario, data, history) = carried_streak_week();
    let settings = SolveSettings {
        time_limit: Duration::from_secs(120),
        ..settings()
    };

    let cp = solve_week(&PumpkinBackend, &scenario, 1, &data, &history, &settings, None)
        .expect("solvable");
    let mip = solve_week(&MipBackend, &scenario, 1, &data, &history, &settings, None)
        .expect("solvable");

    assert_eq!(cp.status, SolveStatus::Optimal);
    assert_eq!(mip.status, SolveStatus::Optimal);
    assert_eq!(cp.objective, mip.objective);
    assert_eq!(
        cp.penalties.iter().map(|(_, penalty)| penalty).sum::<i64>(),
        cp.objective
    );
    // The last Night of the history rules out Early and Late on Monday.
    assert!(matches!(
        cp.schedule.get(0, 0).map(|assignment| assignment.shift_type),
        None | Some(ShiftType::Night)
    ));
}

#[test]
fn carried_days_off_at_the_limit_force_work_on_monday() {
    let mut contract = contract(7);
    contract.maximum_consecutive_days_off = 2;
    let scenario = scenario(
        1,
        &[ShiftType::Early],
        &[Skill::Nurse],
        contract,
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    let mut history = empty_history(&scenario);
    history.nurses[0].consecutive_days_off = 2;

    for backend in [&PumpkinBackend as &dyn Backend, &MipBackend] {
        let solution =
            solve_with(backend, &scenario, &week(Vec::new()), &history).expect("solvable");

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, 0);
        assert!(solution.schedule.get(0, 0).is_some());
    }
}

#[test]
fn carried_night_streak_at_the_limit_is_penalised_once() {
    let mut scenario = scenario(
        1,
        &[ShiftType::Night],
        &[Skill::Nurse],
        contract(7),
        vec![nurse("NU_0", Skill::Nurse.into())],
    );
    scenario.shift_types[0].maximum_consecutive_assignments = 3;
    let data = week(vec![requirement(ShiftType::Night, Skill::Nurse, &[(0, 1, 1)])]);
    let mut history = empty_history(&scenario);
    history.nurses[0].last_shift_type = Some(ShiftType::Night);
    history.nurses[0].consecutive_assignments = 3;
    history.nurses[0].consecutive_working_days = 3;

    for backend in [&PumpkinBackend as &dyn Backend, &MipBackend] {
        let solution = solve_with(backend, &scenario, &data, &history).expect("solvable");

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, 15);
        assert_eq!(
            solution.penalties,
            vec![(ViolationKind::ConsecutiveAssignments, 15)]
        );
    }
}
