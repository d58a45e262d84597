//! A solver independent description of an optimisation problem.
//!
//! The builder only ever talks to [`Model`]; each backend translates the descriptors it holds
//! into the calls of its own solver.
use std::fmt::Display;

/// Builds up the model, from which a backend can construct its solver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Model {
    /// Every element denotes the name and bounds of the variable.
    variables: Vec<(String, i32, i32)>,
    /// The constraints in the model.
    constraints: Vec<Constraint>,
    /// The weighted terms of the objective, which is always minimised.
    objective: Vec<(i32, IntVariable)>,
}

impl Model {
    /// Create a new 0-1 variable.
    pub fn new_boolean(&mut self, name: impl Display) -> IntVariable {
        self.new_interval_variable(name, 0, 1)
    }

    /// Create a new interval variable.
    pub fn new_interval_variable(
        &mut self,
        name: impl Display,
        lower_bound: i32,
        upper_bound: i32,
    ) -> IntVariable {
        let id = self.variables.len();

        self.variables
            .push((name.to_string(), lower_bound, upper_bound));

        IntVariable {
            scale: 1,
            offset: 0,
            id,
        }
    }

    /// Add a constraint to the model.
    ///
    /// It is important to only use constraints with variables created on the same instance of
    /// [`Model`].
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Add `weight * variable` to the objective.
    pub fn add_objective_term(&mut self, weight: i32, variable: IntVariable) {
        self.objective.push((weight, variable));
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// The name and bounds of every variable, indexed by variable id.
    pub fn variables(&self) -> impl Iterator<Item = (&str, i32, i32)> + '_ {
        self.variables
            .iter()
            .map(|(name, lower_bound, upper_bound)| (name.as_str(), *lower_bound, *upper_bound))
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &[(i32, IntVariable)] {
        &self.objective
    }

    pub fn name(&self, variable: IntVariable) -> &str {
        &self.variables[variable.id].0
    }

    /// The bounds of the (possibly transformed) variable.
    pub fn bounds(&self, variable: IntVariable) -> (i32, i32) {
        let (_, lower_bound, upper_bound) = &self.variables[variable.id];

        let a = variable.evaluate(*lower_bound);
        let b = variable.evaluate(*upper_bound);

        (a.min(b), a.max(b))
    }

    /// The largest value the objective can take, and the smallest.
    pub fn objective_bounds(&self) -> (i64, i64) {
        self.objective
            .iter()
            .fold((0, 0), |(lowest, highest), &(weight, variable)| {
                let (lower_bound, upper_bound) = self.bounds(variable.scaled(weight));
                (
                    lowest + i64::from(lower_bound),
                    highest + i64::from(upper_bound),
                )
            })
    }

    /// The value of the objective under an assignment to every variable of the model.
    pub fn evaluate_objective(&self, values: &[i32]) -> i64 {
        self.objective
            .iter()
            .map(|&(weight, variable)| i64::from(weight) * i64::from(variable.value(values)))
            .sum()
    }

    /// The constraints violated by an assignment to every variable of the model.
    pub fn violated_constraints<'a>(
        &'a self,
        values: &'a [i32],
    ) -> impl Iterator<Item = &'a Constraint> + 'a {
        self.constraints
            .iter()
            .filter(move |constraint| !constraint.is_satisfied(values))
    }

    /// Whether every value lies within the bounds of its variable.
    pub fn within_bounds(&self, values: &[i32]) -> bool {
        values.len() == self.variables.len()
            && self
                .variables
                .iter()
                .zip(values)
                .all(|((_, lower_bound, upper_bound), value)| {
                    (*lower_bound..=*upper_bound).contains(value)
                })
    }
}

/// The constraints which can be used in [`Model`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constraint {
    LinearEqual { terms: Vec<IntVariable>, rhs: i32 },
    LinearLessEqual { terms: Vec<IntVariable>, rhs: i32 },
    LinearGreaterEqual { terms: Vec<IntVariable>, rhs: i32 },
    /// At most one of the 0-1 variables is 1.
    AtMostOne(Vec<IntVariable>),
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[i32]) -> bool {
        let sum = |terms: &[IntVariable]| -> i64 {
            terms
                .iter()
                .map(|term| i64::from(term.value(values)))
                .sum()
        };

        match self {
            Constraint::LinearEqual { terms, rhs } => sum(terms) == i64::from(*rhs),
            Constraint::LinearLessEqual { terms, rhs } => sum(terms) <= i64::from(*rhs),
            Constraint::LinearGreaterEqual { terms, rhs } => sum(terms) >= i64::from(*rhs),
            Constraint::AtMostOne(variables) => sum(variables) <= 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IntVariable {
    /// The scale w.r.t. the underlying domain.
    scale: i32,
    /// The offset w.r.t. the underyling domain.
    offset: i32,
    /// The variable id.
    id: usize,
}

impl IntVariable {
    pub fn scaled(&self, scale: i32) -> IntVariable {
        IntVariable {
            scale: self.scale * scale,
            offset: self.offset * scale,
            id: self.id,
        }
    }

    pub fn offset(&self, offset: i32) -> IntVariable {
        IntVariable {
            scale: self.scale,
            offset: self.offset + offset,
            id: self.id,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// The coefficient applied to the underlying variable.
    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// The constant added after scaling.
    pub fn constant(&self) -> i32 {
        self.offset
    }

    /// The value of this view when the underlying variable takes `value`.
    pub fn evaluate(&self, value: i32) -> i32 {
        self.scale * value + self.offset
    }

    /// The value of this view under an assignment to every variable of the model.
    pub fn value(&self, values: &[i32]) -> i32 {
        self.evaluate(values[self.id])
    }
}
