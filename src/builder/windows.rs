//! Trailing-window encodings of the maximum consecutive limits.
//!
//! A run of more than `limit` consecutive days on which an indicator holds is penalised once for
//! every day beyond the limit. Every window of `limit + 1` days which lies inside the week gets
//! its own violation variable, as does every window which starts in the previous week and ends
//! on day `e`, provided the streak carried in from the history is long enough to reach it.
use crate::domain::DAYS_PER_WEEK;
use crate::model::Constraint;
use crate::model::IntVariable;
use crate::model::Model;
use crate::objective::SoftViolation;
use crate::objective::ViolationKind;

/// A window whose violation variable was posted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub kind: ViolationKind,
    pub nurse: usize,
    /// The first day of the window within the week. Windows reaching into the previous week
    /// start at 0.
    pub first_day: usize,
    pub last_day: usize,
    /// The part of the window covered by the previous week, 0 for interior windows.
    pub carried: u32,
    pub violation: IntVariable,
}

impl Window {
    pub fn crosses_week_boundary(&self) -> bool {
        self.carried > 0
    }
}

/// Post the windows for one nurse and one indicator, which is 1 on the days counting towards the
/// streak.
///
/// `carried` is the length of the streak at the end of the previous week.
pub(crate) fn post_windows(
    model: &mut Model,
    kind: ViolationKind,
    nurse: (usize, &str),
    indicators: &[IntVariable; DAYS_PER_WEEK],
    limit: u32,
    carried: u32,
) -> Vec<Window> {
    let limit = limit as usize;
    let mut windows = Vec::new();

    // Windows of limit + 1 days ending on `last_day`, entirely inside the week.
    for last_day in limit..DAYS_PER_WEEK {
        let first_day = last_day - limit;
        let violation = post_window(
            model,
            kind,
            nurse.1,
            &indicators[first_day..=last_day],
            limit,
            format!("{first_day}..={last_day}"),
        );

        windows.push(Window {
            kind,
            nurse: nurse.0,
            first_day,
            last_day,
            carried: 0,
            violation,
        });
    }

    // Windows starting in the previous week: the carried streak plus days 0..=last_day exceed
    // the limit once `carried + last_day + 1 > limit`.
    if carried > 0 && limit > 0 {
        let first_end = limit.saturating_sub(carried as usize);
        let last_end = (limit - 1).min(DAYS_PER_WEEK - 1);

        for last_day in first_end..=last_end {
            let violation = post_window(
                model,
                kind,
                nurse.1,
                &indicators[..=last_day],
                last_day,
                format!("history..={last_day}"),
            );

            windows.push(Window {
                kind,
                nurse: nurse.0,
                first_day: 0,
                last_day,
                carried: (limit - last_day) as u32,
                violation,
            });
        }
    }

    windows
}

/// `violation >= sum(indicators) - bound`, where the window violates when every indicator holds.
fn post_window(
    model: &mut Model,
    kind: ViolationKind,
    nurse: &str,
    indicators: &[IntVariable],
    bound: usize,
    days: String,
) -> IntVariable {
    let violation = model.new_boolean(format!("{kind}[{nurse}, {days}]"));

    let terms = std::iter::once(violation)
        .chain(indicators.iter().map(|indicator| indicator.scaled(-1)))
        .collect();

    model.add_constraint(Constraint::LinearGreaterEqual {
        terms,
        rhs: -(bound as i32),
    });

    violation
}

impl From<&Window> for SoftViolation {
    fn from(window: &Window) -> Self {
        SoftViolation {
            kind: window.kind,
            variable: window.violation,
        }
    }
}
