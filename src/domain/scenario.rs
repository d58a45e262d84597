use enumset::EnumSet;
use fnv::FnvHashSet;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

use super::ShiftType;
use super::Skill;
use crate::error::InputError;

/// The limits shared by every nurse working under the same contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    /// Lower bound on the number of assignments over the whole horizon.
    #[serde(rename = "minimumNumberOfAssignments")]
    pub minimum_assignments: u32,
    /// Upper bound on the number of assignments over the whole horizon.
    #[serde(rename = "maximumNumberOfAssignments")]
    pub maximum_assignments: u32,
    #[serde(rename = "maximumNumberOfConsecutiveWorkingDays")]
    pub maximum_consecutive_working_days: u32,
    #[serde(rename = "maximumNumberOfConsecutiveDaysOff")]
    pub maximum_consecutive_days_off: u32,
    /// Upper bound on the number of weekends with at least one assignment, over the horizon.
    #[serde(rename = "maximumNumberOfWorkingWeekends")]
    pub maximum_working_weekends: u32,
    /// Whether a weekend has to be worked on both days or on neither.
    #[serde(rename = "completeWeekends", deserialize_with = "flag")]
    pub complete_weekends: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nurse {
    pub id: String,
    pub contract: String,
    #[serde(with = "skill_list")]
    pub skills: EnumSet<Skill>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTypeDefinition {
    #[serde(rename = "id")]
    pub shift_type: ShiftType,
    #[serde(rename = "maximumNumberOfConsecutiveAssignments")]
    pub maximum_consecutive_assignments: u32,
}

/// The shift types which may not be worked on the day after `preceding`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForbiddenSuccession {
    #[serde(rename = "precedingShiftType")]
    pub preceding: ShiftType,
    #[serde(rename = "succeedingShiftTypes")]
    pub succeeding: Vec<ShiftType>,
}

/// The invariant part of a scheduling period: who can work, under which contract, and which
/// shift types and skills exist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "numberOfWeeks")]
    pub number_of_weeks: usize,
    pub skills: Vec<Skill>,
    /// The shift types in the order in which they are indexed by the model.
    #[serde(rename = "shiftTypes")]
    pub shift_types: Vec<ShiftTypeDefinition>,
    /// When absent, every shift type forbids all shift types which start earlier in the day.
    #[serde(
        rename = "forbiddenShiftTypeSuccessions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub forbidden_successions: Option<Vec<ForbiddenSuccession>>,
    pub contracts: Vec<Contract>,
    pub nurses: Vec<Nurse>,
}

impl Scenario {
    /// Check the references between nurses, contracts, skills and shift types.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.number_of_weeks == 0 {
            return Err(InputError::EmptyHorizon);
        }

        ensure_unique(self.contracts.iter().map(|contract| contract.id.clone()))?;
        ensure_unique(self.nurses.iter().map(|nurse| nurse.id.clone()))?;
        ensure_unique(self.skills.iter().map(|skill| skill.to_string()))?;
        ensure_unique(
            self.shift_types
                .iter()
                .map(|definition| definition.shift_type.to_string()),
        )?;

        let declared_skills: EnumSet<Skill> = self.skills.iter().copied().collect();

        for nurse in &self.nurses {
            let _ = self.contract_for(nurse)?;

            if let Some(skill) = (nurse.skills - declared_skills).iter().next() {
                return Err(InputError::UndeclaredSkill {
                    skill,
                    context: format!("nurse {}", nurse.id),
                });
            }
        }

        for succession in self.forbidden_successions.iter().flatten() {
            for shift_type in std::iter::once(succession.preceding).chain(succession.succeeding.iter().copied()) {
                let _ = self.shift_index(shift_type, "the forbidden successions")?;
            }
        }

        Ok(())
    }

    pub fn contract_for(&self, nurse: &Nurse) -> Result<&Contract, InputError> {
        self.contracts
            .iter()
            .find(|contract| contract.id == nurse.contract)
            .ok_or_else(|| InputError::UnknownContract {
                nurse: nurse.id.clone(),
                contract: nurse.contract.clone(),
            })
    }

    pub fn nurse_index(&self, id: &str) -> Result<usize, InputError> {
        self.nurses
            .iter()
            .position(|nurse| nurse.id == id)
            .ok_or_else(|| InputError::UnknownNurse(id.to_owned()))
    }

    /// The model index of `shift_type`; `context` names the referencing input on failure.
    pub fn shift_index(&self, shift_type: ShiftType, context: &str) -> Result<usize, InputError> {
        self.shift_types
            .iter()
            .position(|definition| definition.shift_type == shift_type)
            .ok_or_else(|| InputError::UndeclaredShiftType {
                shift_type,
                context: context.to_owned(),
            })
    }

    /// The model index of `skill`; `context` names the referencing input on failure.
    pub fn skill_index(&self, skill: Skill, context: &str) -> Result<usize, InputError> {
        self.skills
            .iter()
            .position(|&declared| declared == skill)
            .ok_or_else(|| InputError::UndeclaredSkill {
                skill,
                context: context.to_owned(),
            })
    }

    /// For every shift index, the indices of the shifts which may not be worked the next day.
    pub fn forbidden_successors(&self) -> Vec<Vec<usize>> {
        match &self.forbidden_successions {
            Some(table) => self
                .shift_types
                .iter()
                .map(|definition| {
                    table
                        .iter()
                        .filter(|succession| succession.preceding == definition.shift_type)
                        .flat_map(|succession| succession.succeeding.iter())
                        .filter_map(|&successor| self.shift_index(successor, "").ok())
                        .collect()
                })
                .collect(),
            None => self
                .shift_types
                .iter()
                .map(|definition| {
                    self.shift_types
                        .iter()
                        .enumerate()
                        .filter(|(_, successor)| successor.shift_type < definition.shift_type)
                        .map(|(index, _)| index)
                        .collect()
                })
                .collect(),
        }
    }
}

fn ensure_unique(ids: impl IntoIterator<Item = String>) -> Result<(), InputError> {
    let mut seen = FnvHashSet::default();

    for id in ids {
        if !seen.insert(id.clone()) {
            return Err(InputError::DuplicateId(id));
        }
    }

    Ok(())
}

/// INRC-II encodes booleans as 0/1.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}

mod skill_list {
    use enumset::EnumSet;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    use crate::domain::Skill;

    pub(super) fn serialize<S: Serializer>(
        skills: &EnumSet<Skill>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(skills.iter())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<EnumSet<Skill>, D::Error> {
        Ok(Vec::<Skill>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}
