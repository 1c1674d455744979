use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::StoreError;
use crate::model::employee::DirectoryEntry;
use crate::model::leave_request::{LeaveId, LeaveRequest, LeaveStatus, NewLeaveRequest, Transition};
use crate::model::leave_summary::{Accrual, LeaveSummary};
use crate::service::access_filter::{self, LeaveFilter};
use crate::store::{Directory, LedgerStore, LeaveStore};

fn poisoned(what: &str) -> StoreError {
    StoreError::Unavailable(format!("{what} lock poisoned"))
}

fn newest_first(mut records: Vec<LeaveRequest>) -> Vec<LeaveRequest> {
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    records
}

#[derive(Default)]
struct LeaveTable {
    next_id: LeaveId,
    records: BTreeMap<LeaveId, LeaveRequest>,
}

/// Leave records held in process memory. Approvals book into `ledger` while
/// the table lock is held.
pub struct MemoryLeaveStore {
    table: RwLock<LeaveTable>,
    ledger: Arc<MemoryLedgerStore>,
}

impl MemoryLeaveStore {
    pub fn new(ledger: Arc<MemoryLedgerStore>) -> Self {
        Self {
            table: RwLock::new(LeaveTable::default()),
            ledger,
        }
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn create(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned("leave table"))?;
        table.next_id += 1;
        let record = request.into_request(table.next_id);
        table.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: LeaveId) -> Result<Option<LeaveRequest>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned("leave table"))?;
        Ok(table.records.get(&id).cloned())
    }

    async fn list_by_filter(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let table = self.table.read().map_err(|_| poisoned("leave table"))?;
        let records = table
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        Ok(newest_first(records))
    }

    async fn list_by_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, StoreError> {
        self.list_by_filter(&access_filter::self_view(employee_id))
            .await
    }

    async fn apply_transition(
        &self,
        id: LeaveId,
        expected: LeaveStatus,
        transition: &Transition,
        accrual: Option<&Accrual>,
    ) -> Result<bool, StoreError> {
        let mut table = self.table.write().map_err(|_| poisoned("leave table"))?;
        let Some(record) = table.records.get_mut(&id) else {
            return Ok(false);
        };
        if record.status != expected {
            return Ok(false);
        }

        // Ledger first: if it fails the record is left untouched.
        if let Some(accrual) = accrual {
            self.ledger.book(accrual)?;
        }
        transition.apply_to(record);
        Ok(true)
    }
}

/// Ledger held in process memory. The whole find-or-create-and-increment runs
/// under one lock.
#[derive(Default)]
pub struct MemoryLedgerStore {
    summaries: Mutex<HashMap<String, LeaveSummary>>,
}

impl MemoryLedgerStore {
    fn book(&self, accrual: &Accrual) -> Result<(), StoreError> {
        let mut summaries = self.summaries.lock().map_err(|_| poisoned("ledger"))?;
        summaries
            .entry(accrual.employee_id.clone())
            .or_insert_with(|| LeaveSummary::new(accrual.employee_id.as_str()))
            .apply(accrual);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn summary(&self, employee_id: &str) -> Result<Option<LeaveSummary>, StoreError> {
        let summaries = self.summaries.lock().map_err(|_| poisoned("ledger"))?;
        Ok(summaries.get(employee_id).cloned())
    }
}

/// Fixed employee directory, seeded by the caller.
#[derive(Default)]
pub struct MemoryDirectory {
    entries: HashMap<String, DirectoryEntry>,
}

impl MemoryDirectory {
    pub fn with_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (entry.employee_id.clone(), entry))
            .collect();
        Self { entries }
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn lookup(&self, employee_id: &str) -> Result<Option<DirectoryEntry>, StoreError> {
        Ok(self.entries.get(employee_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::department::DepartmentId;
    use crate::model::leave_request::*;
    use chrono::{NaiveDate, Utc};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn new_request(employee_id: &str, status: LeaveStatus) -> NewLeaveRequest {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        NewLeaveRequest {
            employee_id: employee_id.into(),
            requester_name: "Ravi".into(),
            department: DepartmentId::normalize("CSE").unwrap(),
            category: LeaveCategory::Regular,
            leave_type: LeaveType::Casual,
            requester_class: RequesterClass::Staff,
            start_date: date,
            end_date: date,
            duration: DurationGranularity::FullDay,
            reason: "family".into(),
            contact: None,
            attachment_ref: None,
            od: None,
            leave_days: 1,
            status,
            hod_decision: HodDecision::NotApplicable,
            created_at: Utc::now(),
        }
    }

    fn approval() -> Transition {
        Transition::PrincipalDecided(DecisionRecord {
            decider_employee_id: "PRN001".into(),
            outcome: DecisionOutcome::Approved,
            comment: None,
            decided_at: Utc::now(),
        })
    }

    fn accrual(employee_id: &str, month: u32, days: u32) -> Accrual {
        Accrual {
            employee_id: employee_id.into(),
            year: 2026,
            month,
            days,
        }
    }

    #[actix_web::test]
    async fn approval_books_ledger_with_status() {
        let ledger = Arc::new(MemoryLedgerStore::default());
        let store = MemoryLeaveStore::new(ledger.clone());
        let first = store
            .create(new_request("STF001", LeaveStatus::HodApproved))
            .await
            .unwrap();
        let second = store
            .create(new_request("STF001", LeaveStatus::HodApproved))
            .await
            .unwrap();

        for (id, month, days) in [(first.id, 3, 2), (second.id, 4, 1)] {
            let booking = accrual("STF001", month, days);
            let applied = store
                .apply_transition(id, LeaveStatus::HodApproved, &approval(), Some(&booking))
                .await
                .unwrap();
            assert!(applied);
        }

        let summary = ledger.summary("STF001").await.unwrap().unwrap();
        assert_eq!(summary.monthly_days(2026, 3), 2);
        assert_eq!(summary.monthly_days(2026, 4), 1);
        assert_eq!(summary.yearly_days(2026), 3);
    }

    #[actix_web::test]
    async fn stale_precondition_books_nothing() {
        let ledger = Arc::new(MemoryLedgerStore::default());
        let store = MemoryLeaveStore::new(ledger.clone());
        let created = store
            .create(new_request("STF001", LeaveStatus::Pending))
            .await
            .unwrap();

        let applied = store
            .apply_transition(
                created.id,
                LeaveStatus::HodApproved,
                &approval(),
                Some(&accrual("STF001", 3, 1)),
            )
            .await
            .unwrap();

        assert!(!applied);
        assert!(ledger.summary("STF001").await.unwrap().is_none());
        let stored = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn ledger_failure_leaves_status_unchanged() {
        let ledger = Arc::new(MemoryLedgerStore::default());
        let store = MemoryLeaveStore::new(ledger.clone());
        let created = store
            .create(new_request("STF001", LeaveStatus::HodApproved))
            .await
            .unwrap();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = ledger.summaries.lock().unwrap();
            panic!("ledger writer crashed");
        }));

        let result = store
            .apply_transition(
                created.id,
                LeaveStatus::HodApproved,
                &approval(),
                Some(&accrual("STF001", 3, 1)),
            )
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        let stored = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::HodApproved);
        assert_eq!(stored.principal_decision, PrincipalDecision::Pending);
    }
}
