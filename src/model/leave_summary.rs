use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyLeave {
    pub year: i32,
    pub month: u32,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyLeave {
    pub year: i32,
    pub days: u32,
}

/// Days to book for one approved request. Written by the leave store in the
/// same unit of work as the `PrincipalApproved` status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    pub employee_id: String,
    pub year: i32,
    pub month: u32,
    pub days: u32,
}

/// Running total of approved leave days for one employee.
///
/// Entries are keyed by `(year, month)` and `year` respectively and only ever
/// grow. For every year the monthly days add up to the yearly entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveSummary {
    pub employee_id: String,
    pub monthly_leaves: Vec<MonthlyLeave>,
    pub yearly_leaves: Vec<YearlyLeave>,
}

impl LeaveSummary {
    pub fn new(employee_id: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            monthly_leaves: Vec::new(),
            yearly_leaves: Vec::new(),
        }
    }

    pub fn apply(&mut self, accrual: &Accrual) {
        self.add(accrual.year, accrual.month, accrual.days);
    }

    /// Find-or-create both buckets and add `days` to each.
    pub fn add(&mut self, year: i32, month: u32, days: u32) {
        match self
            .monthly_leaves
            .iter_mut()
            .find(|entry| entry.year == year && entry.month == month)
        {
            Some(entry) => entry.days += days,
            None => {
                self.monthly_leaves.push(MonthlyLeave { year, month, days });
                self.monthly_leaves.sort_by_key(|entry| (entry.year, entry.month));
            }
        }

        match self.yearly_leaves.iter_mut().find(|entry| entry.year == year) {
            Some(entry) => entry.days += days,
            None => {
                self.yearly_leaves.push(YearlyLeave { year, days });
                self.yearly_leaves.sort_by_key(|entry| entry.year);
            }
        }
    }

    pub fn monthly_days(&self, year: i32, month: u32) -> u32 {
        self.monthly_leaves
            .iter()
            .find(|entry| entry.year == year && entry.month == month)
            .map_or(0, |entry| entry.days)
    }

    pub fn yearly_days(&self, year: i32) -> u32 {
        self.yearly_leaves
            .iter()
            .find(|entry| entry.year == year)
            .map_or(0, |entry| entry.days)
    }
}
