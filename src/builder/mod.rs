//! Translates one week of the scheduling problem into a [`Model`].
//!
//! The builder is deterministic: the same scenario, week data and history always produce the same
//! variables and constraints, in the same order.
mod windows;

use log::debug;

pub use windows::Window;

use crate::domain::History;
use crate::domain::RequestedShift;
use crate::domain::Scenario;
use crate::domain::WeekData;
use crate::domain::Weekday;
use crate::domain::DAYS_PER_WEEK;
use crate::error::InputError;
use crate::model::Constraint;
use crate::model::IntVariable;
use crate::model::Model;
use crate::objective::SoftViolation;
use crate::objective::ViolationKind;

/// The model of one week, together with the variables needed to read back a solution.
#[derive(Clone, Debug)]
pub struct WeekModel {
    pub model: Model,
    pub week: usize,
    /// `works[n][d][s]`
    works: Vec<[Vec<IntVariable>; DAYS_PER_WEEK]>,
    /// `works_with_skill[n][d][s][k]`
    works_with_skill: Vec<[Vec<Vec<IntVariable>>; DAYS_PER_WEEK]>,
    /// `works_day[n][d]`
    works_day: Vec<[IntVariable; DAYS_PER_WEEK]>,
    working_weekend: Vec<IntVariable>,
    violations: Vec<SoftViolation>,
    windows: Vec<Window>,
}

impl WeekModel {
    pub fn works(&self, nurse: usize, day: usize, shift: usize) -> IntVariable {
        self.works[nurse][day][shift]
    }

    pub fn works_with_skill(&self, nurse: usize, day: usize, shift: usize, skill: usize) -> IntVariable {
        self.works_with_skill[nurse][day][shift][skill]
    }

    pub fn works_day(&self, nurse: usize, day: usize) -> IntVariable {
        self.works_day[nurse][day]
    }

    pub fn working_weekend(&self, nurse: usize) -> IntVariable {
        self.working_weekend[nurse]
    }

    /// Every soft-constraint violation variable, for the objective assembler.
    pub fn violations(&self) -> &[SoftViolation] {
        &self.violations
    }

    /// The trailing windows of the consecutive limits.
    pub fn windows(&self) -> &[Window] {
        &self.windows
    }
}

/// Build the model of week `week`, given the history at the end of the previous week.
///
/// The history has to be aligned with the scenario, see [`History::aligned_with`].
pub fn build_week(
    scenario: &Scenario,
    week: usize,
    data: &WeekData,
    history: &History,
) -> Result<WeekModel, InputError> {
    if week >= scenario.number_of_weeks {
        return Err(InputError::WeekOutOfRange {
            week,
            weeks: scenario.number_of_weeks,
        });
    }

    scenario.validate()?;
    data.validate(scenario)?;

    for (n, nurse) in scenario.nurses.iter().enumerate() {
        if history.nurses.get(n).map(|entry| entry.nurse.as_str()) != Some(nurse.id.as_str()) {
            return Err(InputError::MissingHistory(nurse.id.clone()));
        }
    }

    let mut builder = Builder {
        scenario,
        week,
        history,
        model: Model::default(),
        violations: Vec::new(),
        windows: Vec::new(),
    };

    let (works, works_with_skill) = builder.create_shift_variables()?;
    let works_day = builder.create_working_days(&works);

    builder.add_successions(&works);
    builder.add_staffing(data, &works_with_skill)?;
    builder.add_preferences(data, &works, &works_day)?;
    let working_weekend = builder.add_weekends(&works_day)?;
    builder.add_assignment_totals(&works_day)?;
    builder.add_consecutive_limits(&works, &works_day)?;

    debug!(
        "Week {week}: {} variables, {} constraints, {} soft violations",
        builder.model.num_variables(),
        builder.model.num_constraints(),
        builder.violations.len()
    );

    Ok(WeekModel {
        model: builder.model,
        week,
        works,
        works_with_skill,
        works_day,
        working_weekend,
        violations: builder.violations,
        windows: builder.windows,
    })
}

struct Builder<'a> {
    scenario: &'a Scenario,
    week: usize,
    history: &'a History,
    model: Model,
    violations: Vec<SoftViolation>,
    windows: Vec<Window>,
}

type ShiftVariables = Vec<[Vec<IntVariable>; DAYS_PER_WEEK]>;
type SkillVariables = Vec<[Vec<Vec<IntVariable>>; DAYS_PER_WEEK]>;

impl Builder<'_> {
    fn soft(&mut self, kind: ViolationKind, variable: IntVariable) {
        self.violations.push(SoftViolation { kind, variable });
    }

    /// `value` prorated to the weeks up to and including this one, rounded up.
    fn prorated(&self, value: u32) -> i32 {
        let elapsed = (self.week + 1) as u64;
        let weeks = self.scenario.number_of_weeks as u64;

        ((u64::from(value) * elapsed).div_ceil(weeks)) as i32
    }

    /// The `works` and `works_with_skill` variables, with the structural restrictions in their
    /// domains: skills a nurse lacks, and shifts the previous week's last shift forbids on day 0.
    fn create_shift_variables(&mut self) -> Result<(ShiftVariables, SkillVariables), InputError> {
        let scenario = self.scenario;
        let successors = scenario.forbidden_successors();
        let mut works = Vec::with_capacity(scenario.nurses.len());
        let mut works_with_skill = Vec::with_capacity(scenario.nurses.len());

        for (n, nurse) in scenario.nurses.iter().enumerate() {
            let forbidden_on_monday = match self.history.nurse(n).last_shift_type {
                Some(last) => {
                    let context = format!("the history of {}", nurse.id);
                    successors[scenario.shift_index(last, &context)?].clone()
                }
                None => Vec::new(),
            };

            let mut nurse_works: [Vec<IntVariable>; DAYS_PER_WEEK] = Default::default();
            let mut nurse_skills: [Vec<Vec<IntVariable>>; DAYS_PER_WEEK] = Default::default();

            for (d, day) in Weekday::ALL.into_iter().enumerate() {
                for (s, definition) in scenario.shift_types.iter().enumerate() {
                    let shift_type = definition.shift_type;
                    let upper_bound = i32::from(d > 0 || !forbidden_on_monday.contains(&s));
                    let shift = self.model.new_interval_variable(
                        format!("works[{}, {day}, {shift_type}]", nurse.id),
                        0,
                        upper_bound,
                    );

                    let skills: Vec<_> = scenario
                        .skills
                        .iter()
                        .map(|&skill| {
                            let upper_bound = i32::from(nurse.skills.contains(skill));
                            self.model.new_interval_variable(
                                format!("works_with_skill[{}, {day}, {shift_type}, {skill}]", nurse.id),
                                0,
                                upper_bound,
                            )
                        })
                        .collect();

                    // Working a shift means covering it under exactly one skill.
                    self.model.add_constraint(Constraint::AtMostOne(skills.clone()));
                    self.model.add_constraint(Constraint::LinearEqual {
                        terms: skills
                            .iter()
                            .copied()
                            .chain(std::iter::once(shift.scaled(-1)))
                            .collect(),
                        rhs: 0,
                    });

                    nurse_works[d].push(shift);
                    nurse_skills[d].push(skills);
                }
            }

            works.push(nurse_works);
            works_with_skill.push(nurse_skills);
        }

        Ok((works, works_with_skill))
    }

    /// `works_day[n][d]`, the number of shifts worked on a day, which is at most one.
    fn create_working_days(&mut self, works: &ShiftVariables) -> Vec<[IntVariable; DAYS_PER_WEEK]> {
        let scenario = self.scenario;

        scenario
            .nurses
            .iter()
            .zip(works)
            .map(|(nurse, nurse_works)| {
                std::array::from_fn(|d| {
                    let day = self
                        .model
                        .new_boolean(format!("works_day[{}, {}]", nurse.id, Weekday::ALL[d]));

                    self.model
                        .add_constraint(Constraint::AtMostOne(nurse_works[d].clone()));
                    self.model.add_constraint(Constraint::LinearEqual {
                        terms: nurse_works[d]
                            .iter()
                            .copied()
                            .chain(std::iter::once(day.scaled(-1)))
                            .collect(),
                        rhs: 0,
                    });

                    day
                })
            })
            .collect()
    }

    /// A shift and any shift it forbids on the next day form an at-most-one group.
    fn add_successions(&mut self, works: &ShiftVariables) {
        let successors = self.scenario.forbidden_successors();

        for nurse_works in works {
            for d in 0..DAYS_PER_WEEK - 1 {
                for (s, forbidden) in successors.iter().enumerate() {
                    if forbidden.is_empty() {
                        continue;
                    }

                    let group = std::iter::once(nurse_works[d][s])
                        .chain(forbidden.iter().map(|&next| nurse_works[d + 1][next]))
                        .collect();

                    self.model.add_constraint(Constraint::AtMostOne(group));
                }
            }
        }
    }

    /// The minimum headcount is a hard floor; shortfall below the optimal headcount is penalised.
    fn add_staffing(&mut self, data: &WeekData, works_with_skill: &SkillVariables) -> Result<(), InputError> {
        for requirement in &data.requirements {
            let context = format!("the {} {} requirement", requirement.shift_type, requirement.skill);
            let s = self.scenario.shift_index(requirement.shift_type, &context)?;
            let k = self.scenario.skill_index(requirement.skill, &context)?;

            for (d, day) in Weekday::ALL.into_iter().enumerate() {
                let demand = requirement.days[d];
                let staff: Vec<_> = works_with_skill
                    .iter()
                    .map(|nurse_skills| nurse_skills[d][s][k])
                    .collect();

                if demand.minimum > 0 {
                    self.model.add_constraint(Constraint::LinearGreaterEqual {
                        terms: staff.clone(),
                        rhs: demand.minimum as i32,
                    });
                }

                if demand.optimal > 0 {
                    let understaffed = self.model.new_interval_variable(
                        format!(
                            "{}[{day}, {}, {}]",
                            ViolationKind::Understaffing,
                            requirement.shift_type,
                            requirement.skill
                        ),
                        0,
                        demand.optimal as i32,
                    );

                    self.model.add_constraint(Constraint::LinearGreaterEqual {
                        terms: std::iter::once(understaffed).chain(staff).collect(),
                        rhs: demand.optimal as i32,
                    });
                    self.soft(ViolationKind::Understaffing, understaffed);
                }
            }
        }

        Ok(())
    }

    fn add_preferences(
        &mut self,
        data: &WeekData,
        works: &ShiftVariables,
        works_day: &[[IntVariable; DAYS_PER_WEEK]],
    ) -> Result<(), InputError> {
        for request in &data.shift_off_requests {
            let n = self.scenario.nurse_index(&request.nurse)?;
            let d = request.day.index();

            let worked = match request.shift {
                RequestedShift::Any => works_day[n][d],
                RequestedShift::Shift(shift_type) => {
                    let context = format!("a shift-off request of {}", request.nurse);
                    works[n][d][self.scenario.shift_index(shift_type, &context)?]
                }
            };

            let unsatisfied = self.model.new_boolean(format!(
                "{}[{}, {}, {}]",
                ViolationKind::UnsatisfiedPreference,
                request.nurse,
                request.day,
                String::from(request.shift)
            ));

            self.model.add_constraint(Constraint::LinearEqual {
                terms: vec![unsatisfied, worked.scaled(-1)],
                rhs: 0,
            });
            self.soft(ViolationKind::UnsatisfiedPreference, unsatisfied);
        }

        Ok(())
    }

    fn add_weekends(
        &mut self,
        works_day: &[[IntVariable; DAYS_PER_WEEK]],
    ) -> Result<Vec<IntVariable>, InputError> {
        let scenario = self.scenario;
        let mut working_weekend = Vec::with_capacity(works_day.len());

        for (n, nurse) in scenario.nurses.iter().enumerate() {
            let saturday = works_day[n][Weekday::SATURDAY];
            let sunday = works_day[n][Weekday::SUNDAY];
            let weekend = self
                .model
                .new_boolean(format!("working_weekend[{}]", nurse.id));

            // weekend = saturday OR sunday
            self.model.add_constraint(Constraint::LinearGreaterEqual {
                terms: vec![saturday, sunday, weekend.scaled(-1)],
                rhs: 0,
            });
            self.model.add_constraint(Constraint::LinearLessEqual {
                terms: vec![saturday, weekend.scaled(-1)],
                rhs: 0,
            });
            self.model.add_constraint(Constraint::LinearLessEqual {
                terms: vec![sunday, weekend.scaled(-1)],
                rhs: 0,
            });

            let contract = scenario.contract_for(nurse)?;
            let worked = self.history.nurse(n).working_weekends as i32;
            let ceiling = self.prorated(contract.maximum_working_weekends);
            let overflow = self.model.new_interval_variable(
                format!("{}[{}]", ViolationKind::WeekendOverflow, nurse.id),
                0,
                (worked + 1 - ceiling).max(0),
            );

            // overflow >= worked + weekend - ceiling
            self.model.add_constraint(Constraint::LinearGreaterEqual {
                terms: vec![overflow, weekend.scaled(-1)],
                rhs: worked - ceiling,
            });
            self.soft(ViolationKind::WeekendOverflow, overflow);

            if contract.complete_weekends {
                let incomplete = self
                    .model
                    .new_boolean(format!("{}[{}]", ViolationKind::IncompleteWeekend, nurse.id));

                // incomplete = 2 * weekend - saturday - sunday
                self.model.add_constraint(Constraint::LinearEqual {
                    terms: vec![incomplete, weekend.scaled(-2), saturday, sunday],
                    rhs: 0,
                });
                self.soft(ViolationKind::IncompleteWeekend, incomplete);
            }

            working_weekend.push(weekend);
        }

        Ok(working_weekend)
    }

    /// Total assignments so far against the contract bounds, prorated to the elapsed weeks.
    fn add_assignment_totals(
        &mut self,
        works_day: &[[IntVariable; DAYS_PER_WEEK]],
    ) -> Result<(), InputError> {
        let scenario = self.scenario;

        for (n, nurse) in scenario.nurses.iter().enumerate() {
            let contract = scenario.contract_for(nurse)?;

            let worked = self.history.nurse(n).assignments as i32;
            let maximum = self.prorated(contract.maximum_assignments);
            let minimum = self.prorated(contract.minimum_assignments);
            let week_days = works_day[n].iter().copied();

            let over = self.model.new_interval_variable(
                format!("{}[{}]", ViolationKind::AssignmentsOver, nurse.id),
                0,
                (worked + DAYS_PER_WEEK as i32 - maximum).max(0),
            );
            // over >= worked + sum(days) - maximum
            self.model.add_constraint(Constraint::LinearGreaterEqual {
                terms: std::iter::once(over)
                    .chain(week_days.clone().map(|day| day.scaled(-1)))
                    .collect(),
                rhs: worked - maximum,
            });
            self.soft(ViolationKind::AssignmentsOver, over);

            let under = self.model.new_interval_variable(
                format!("{}[{}]", ViolationKind::AssignmentsUnder, nurse.id),
                0,
                (minimum - worked).max(0),
            );
            // under >= minimum - worked - sum(days)
            self.model.add_constraint(Constraint::LinearGreaterEqual {
                terms: std::iter::once(under).chain(week_days).collect(),
                rhs: minimum - worked,
            });
            self.soft(ViolationKind::AssignmentsUnder, under);
        }

        Ok(())
    }

    fn add_consecutive_limits(
        &mut self,
        works: &ShiftVariables,
        works_day: &[[IntVariable; DAYS_PER_WEEK]],
    ) -> Result<(), InputError> {
        let scenario = self.scenario;

        for (n, nurse) in scenario.nurses.iter().enumerate() {
            let history = self.history.nurse(n);
            let contract = scenario.contract_for(nurse)?;
            let off = works_day[n].map(|day| day.scaled(-1).offset(1));

            let mut windows = windows::post_windows(
                &mut self.model,
                ViolationKind::ConsecutiveWorkingDays,
                (n, &nurse.id),
                &works_day[n],
                contract.maximum_consecutive_working_days,
                history.consecutive_working_days,
            );

            windows.extend(windows::post_windows(
                &mut self.model,
                ViolationKind::ConsecutiveDaysOff,
                (n, &nurse.id),
                &off,
                contract.maximum_consecutive_days_off,
                history.consecutive_days_off,
            ));

            for (s, definition) in scenario.shift_types.iter().enumerate() {
                let carried = if history.last_shift_type == Some(definition.shift_type) {
                    history.consecutive_assignments
                } else {
                    0
                };
                let shift: [IntVariable; DAYS_PER_WEEK] = std::array::from_fn(|d| works[n][d][s]);

                windows.extend(windows::post_windows(
                    &mut self.model,
                    ViolationKind::ConsecutiveAssignments,
                    (n, &format!("{}, {}", nurse.id, definition.shift_type)),
                    &shift,
                    definition.maximum_consecutive_assignments,
                    carried,
                ));
            }

            self.violations.extend(windows.iter().map(SoftViolation::from));
            self.windows.extend(windows);
        }

        Ok(())
    }
}
