use std::sync::Arc;

use crate::error::LeaveError;
use crate::model::leave_summary::{Accrual, LeaveSummary};
use crate::store::LedgerStore;

/// Per-employee ledger of approved leave days.
///
/// Accrual is not idempotent. The decision engine hands exactly one
/// [`Accrual`] to the store with the single `PrincipalApproved` transition,
/// and the store writes both or neither.
#[derive(Clone)]
pub struct SummaryAccumulator {
    ledger: Arc<dyn LedgerStore>,
}

impl SummaryAccumulator {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Validated ledger booking for `days` approved days.
    pub fn accrual(
        employee_id: &str,
        year: i32,
        month: u32,
        days: u32,
    ) -> Result<Accrual, LeaveError> {
        if !(1..=12).contains(&month) {
            return Err(LeaveError::Validation(format!("Invalid month {month}")));
        }
        if days == 0 {
            return Err(LeaveError::Validation("Leave days must be at least 1".into()));
        }

        Ok(Accrual {
            employee_id: employee_id.to_string(),
            year,
            month,
            days,
        })
    }

    pub async fn summary(&self, employee_id: &str) -> Result<LeaveSummary, LeaveError> {
        self.ledger
            .summary(employee_id)
            .await?
            .ok_or_else(|| LeaveError::NotFound("Leave summary not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryLedgerStore;

    #[test]
    fn accrual_carries_the_bucket() {
        let accrual = SummaryAccumulator::accrual("EMP001", 2026, 4, 3).unwrap();
        assert_eq!(
            accrual,
            Accrual {
                employee_id: "EMP001".into(),
                year: 2026,
                month: 4,
                days: 3,
            }
        );
    }

    #[test]
    fn rejects_out_of_range_input() {
        assert!(matches!(
            SummaryAccumulator::accrual("EMP001", 2026, 13, 1),
            Err(LeaveError::Validation(_))
        ));
        assert!(matches!(
            SummaryAccumulator::accrual("EMP001", 2026, 0, 1),
            Err(LeaveError::Validation(_))
        ));
        assert!(matches!(
            SummaryAccumulator::accrual("EMP001", 2026, 1, 0),
            Err(LeaveError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn missing_ledger_is_not_found() {
        let accumulator = SummaryAccumulator::new(Arc::new(MemoryLedgerStore::default()));
        assert!(matches!(
            accumulator.summary("EMP001").await,
            Err(LeaveError::NotFound(_))
        ));
    }
}
