//! Storage seams of the leave workflow.
//!
//! `mysql` backs the running service, `memory` gives the same semantics
//! (including the status precondition and the status-plus-ledger unit of
//! work) without a database.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::employee::DirectoryEntry;
use crate::model::leave_request::{LeaveId, LeaveRequest, LeaveStatus, NewLeaveRequest, Transition};
use crate::model::leave_summary::{Accrual, LeaveSummary};
use crate::service::access_filter::LeaveFilter;

pub mod memory;
pub mod mysql;

/// Persistence of leave and OD-leave records. No business rules live here.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn create(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError>;

    async fn get_by_id(&self, id: LeaveId) -> Result<Option<LeaveRequest>, StoreError>;

    /// Newest first.
    async fn list_by_filter(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Newest first.
    async fn list_by_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Writes `transition` only if the record is still in `expected`, and
    /// books `accrual` into the ledger in the same unit of work. Returns
    /// `false` when the precondition no longer holds (or the record is gone).
    /// On `false` or on error nothing is written, ledger included.
    async fn apply_transition(
        &self,
        id: LeaveId,
        expected: LeaveStatus,
        transition: &Transition,
        accrual: Option<&Accrual>,
    ) -> Result<bool, StoreError>;
}

/// Read side of the per-employee ledger. Increments are written through
/// [`LeaveStore::apply_transition`].
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn summary(&self, employee_id: &str) -> Result<Option<LeaveSummary>, StoreError>;
}

/// Employee/department directory.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn lookup(&self, employee_id: &str) -> Result<Option<DirectoryEntry>, StoreError>;
}
