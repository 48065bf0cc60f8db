//! Declining budget PR.

use chrono::NaiveDate;

use crate::domain::BudgetSchedule;
use crate::metrics::calendar::budget_year_index;

impl BudgetSchedule {
    /// Budget PR for a budget-year index (negative indices extrapolate upward).
    pub fn value_at_index(&self, index: i64) -> f64 {
        let exp = i32::try_from(index).unwrap_or(if index < 0 { i32::MIN } else { i32::MAX });
        self.base * self.annual_decay.powi(exp)
    }

    /// Budget PR in force on `date`.
    pub fn value_on(&self, date: NaiveDate) -> f64 {
        self.value_at_index(budget_year_index(date, self.baseline_year))
    }
}
