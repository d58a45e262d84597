//! # Nurse scheduling
//! Rostering of nurses over a horizon of several weeks, solved one week at a time.
//!
//! Every week is translated by the [`builder`] into a solver independent [`model::Model`]: hard
//! constraints which every roster has to satisfy, and soft constraints whose violations are
//! weighted into the objective by the [`objective`] module. A [`backend::Backend`] minimises the
//! model, after which the [`driver`] reads the roster back and the [`horizon`] carries the
//! resulting [`domain::History`] into the next week.
//!
//! ```no_run
//! # use std::time::Duration;
//! # use nurse_scheduling::backend::BackendKind;
//! # use nurse_scheduling::domain::{History, Scenario, WeekData};
//! # use nurse_scheduling::driver::SolveSettings;
//! # use nurse_scheduling::horizon::RollingHorizon;
//! # use nurse_scheduling::objective::Weights;
//! # fn roster(scenario: Scenario, weeks: Vec<WeekData>, history: History) -> anyhow::Result<()> {
//! let backend = BackendKind::Pumpkin.create();
//! let settings = SolveSettings {
//!     time_limit: Duration::from_secs(10),
//!     weights: Weights::default(),
//! };
//!
//! let result = RollingHorizon::new(&scenario, &weeks, history, backend.as_ref(), settings)?.run()?;
//! println!("total penalty: {}", result.total_objective());
//! # Ok(())
//! # }
//! ```
pub mod backend;
pub mod builder;
pub mod domain;
pub mod driver;
pub mod error;
pub mod horizon;
pub mod model;
pub mod objective;
pub mod runner;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::InputError;
pub use error::SchedulingError;
pub use error::SchedulingResult;
