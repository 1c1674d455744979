use chrono::{DateTime, NaiveDate, Utc};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::LeaveError;
use crate::model::department::DepartmentId;
use crate::model::employee::DirectoryEntry;
use crate::model::leave_request::{
    DecisionOutcome, DecisionRecord, DurationGranularity, HodDecision, LeaveCategory, LeaveId,
    LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, OdDetails, RequesterClass, Transition,
    inclusive_leave_days,
};
use crate::model::leave_summary::{Accrual, LeaveSummary};
use crate::service::access_filter;
use crate::service::summary_accumulator::SummaryAccumulator;
use crate::store::{Directory, LedgerStore, LeaveStore};

/// Switches for behaviour whose intent is not settled.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeavePolicy {
    /// Principal approval of OD leave also books days into the ledger.
    pub accrue_od_leave: bool,
}

/// Raw leave application as received at the boundary. Everything is
/// optional here so missing fields become one `Validation` error.
#[derive(Debug, Clone, Default)]
pub struct LeaveApplication {
    pub employee_id: Option<String>,
    pub requester_name: Option<String>,
    pub department: Option<String>,
    pub requester_class: Option<String>,
    pub leave_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub leave_duration: Option<String>,
    pub reason: Option<String>,
    pub contact: Option<String>,
    pub attachment_ref: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OdApplication {
    pub event_name: Option<String>,
    pub location: Option<String>,
    pub approval_letter: Option<String>,
}

/// A reviewer's decision as received at the boundary.
#[derive(Debug, Clone, Default)]
pub struct DecisionInput {
    pub decider_employee_id: Option<String>,
    pub decision: Option<String>,
    pub comment: Option<String>,
}

/// Regular leave skips HOD review for every class except Faculty and cc.
pub fn regular_bypasses_hod(class: RequesterClass) -> bool {
    !matches!(class, RequesterClass::Faculty | RequesterClass::Cc)
}

/// OD leave skips HOD review only for HOD and Staff requesters.
pub fn od_bypasses_hod(class: RequesterClass) -> bool {
    matches!(class, RequesterClass::Hod | RequesterClass::Staff)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn optional(value: Option<String>) -> Option<String> {
    present(&value).map(str::to_string)
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, LeaveError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| LeaveError::Validation(format!("Invalid {field}: {value}")))
}

fn allowed_list(category: LeaveCategory) -> String {
    LeaveType::allowed_for(category)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Owns the leave state machine: submission, HOD decision, Principal
/// decision and withdrawal. Every write goes through a status precondition in
/// the store so concurrent reviewers cannot both win.
#[derive(Clone)]
pub struct DecisionEngine {
    store: Arc<dyn LeaveStore>,
    directory: Arc<dyn Directory>,
    accumulator: SummaryAccumulator,
    policy: LeavePolicy,
}

impl DecisionEngine {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        ledger: Arc<dyn LedgerStore>,
        directory: Arc<dyn Directory>,
        policy: LeavePolicy,
    ) -> Self {
        Self {
            store,
            directory,
            accumulator: SummaryAccumulator::new(ledger),
            policy,
        }
    }

    /* =========================
    Submission
    ========================= */

    pub async fn create(
        &self,
        application: LeaveApplication,
        od: Option<OdApplication>,
    ) -> Result<LeaveRequest, LeaveError> {
        let category = if od.is_some() {
            LeaveCategory::Od
        } else {
            LeaveCategory::Regular
        };

        let mut missing = Vec::new();
        let mut require = |name: &'static str, value: &Option<String>| {
            if present(value).is_none() {
                missing.push(name);
            }
        };
        require("employeeId", &application.employee_id);
        require("firstName", &application.requester_name);
        require("leaveType", &application.leave_type);
        require("startDate", &application.start_date);
        require("endDate", &application.end_date);
        require("leaveDuration", &application.leave_duration);
        require("reason", &application.reason);
        if let Some(od) = &od {
            require("eventName", &od.event_name);
            require("location", &od.location);
        }
        if !missing.is_empty() {
            return Err(LeaveError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        // Presence is checked above.
        let field = |value: &Option<String>| present(value).unwrap_or_default().to_string();
        let employee_id = field(&application.employee_id);

        let start_date = parse_date("startDate", &field(&application.start_date))?;
        let end_date = parse_date("endDate", &field(&application.end_date))?;
        let leave_days = inclusive_leave_days(start_date, end_date).ok_or_else(|| {
            LeaveError::Validation("endDate cannot be before startDate".into())
        })?;

        let leave_type = LeaveType::from_str(&field(&application.leave_type))
            .ok()
            .filter(|t| t.category() == category)
            .ok_or_else(|| {
                LeaveError::Validation(format!(
                    "Invalid leaveType. Allowed: {}",
                    allowed_list(category)
                ))
            })?;

        let duration = DurationGranularity::from_str(&field(&application.leave_duration))
            .map_err(|_| {
                LeaveError::Validation("Invalid leaveDuration. Allowed: Full Day, Half Day".into())
            })?;

        let claimed_class = match present(&application.requester_class) {
            Some(raw) => Some(RequesterClass::from_str(raw).map_err(|_| {
                LeaveError::Validation(format!("Invalid requesterClass: {raw}"))
            })?),
            None => None,
        };

        let entry = self.directory.lookup(&employee_id).await?;
        let (department, requester_class) = self.resolve_requester(
            entry.as_ref(),
            present(&application.department),
            claimed_class,
        )?;

        let bypass = match category {
            LeaveCategory::Regular => regular_bypasses_hod(requester_class),
            LeaveCategory::Od => od_bypasses_hod(requester_class),
        };
        let (status, hod_decision) = if bypass {
            (LeaveStatus::HodApproved, HodDecision::NotApplicable)
        } else {
            (LeaveStatus::Pending, HodDecision::Pending)
        };

        let od = od.map(|od| OdDetails {
            event_name: field(&od.event_name),
            location: field(&od.location),
            approval_letter: optional(od.approval_letter),
        });

        let created = self
            .store
            .create(NewLeaveRequest {
                employee_id,
                requester_name: field(&application.requester_name),
                department,
                category,
                leave_type,
                requester_class,
                start_date,
                end_date,
                duration,
                reason: field(&application.reason),
                contact: optional(application.contact),
                attachment_ref: optional(application.attachment_ref),
                od,
                leave_days,
                status,
                hod_decision,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            leave_id = created.id,
            employee_id = %created.employee_id,
            category = %created.category,
            status = %created.status,
            leave_days = created.leave_days,
            "Leave request submitted"
        );
        Ok(created)
    }

    /// Department and class come from the directory when the employee is
    /// known, otherwise from the application itself.
    fn resolve_requester(
        &self,
        entry: Option<&DirectoryEntry>,
        claimed_department: Option<&str>,
        claimed_class: Option<RequesterClass>,
    ) -> Result<(DepartmentId, RequesterClass), LeaveError> {
        if let Some(entry) = entry {
            return Ok((entry.department.clone(), entry.employee_type));
        }

        let department = claimed_department
            .and_then(DepartmentId::normalize)
            .ok_or_else(|| LeaveError::Validation("Missing required fields: department".into()))?;
        let class = claimed_class.ok_or_else(|| {
            LeaveError::Validation("Missing required fields: requesterClass".into())
        })?;
        Ok((department, class))
    }

    /* =========================
    Decisions
    ========================= */

    pub async fn apply_hod_decision(
        &self,
        leave_id: LeaveId,
        input: DecisionInput,
    ) -> Result<LeaveRequest, LeaveError> {
        let (decider_id, outcome) = Self::parse_decision(&input, "hodEmployeeId")?;
        let request = self.get(leave_id).await?;

        let decider = self
            .directory
            .lookup(&decider_id)
            .await?
            .filter(DirectoryEntry::is_hod)
            .ok_or_else(|| LeaveError::Unauthorized("Only a HOD can review this request".into()))?;

        if decider.department != request.department {
            return Err(LeaveError::Forbidden(
                "HOD can only review requests from their own department".into(),
            ));
        }
        if request.status != LeaveStatus::Pending {
            return Err(LeaveError::InvalidState(format!(
                "Leave request is not pending HOD approval (status: {})",
                request.status
            )));
        }
        if request.hod_decision != HodDecision::Pending {
            return Err(LeaveError::InvalidState(
                "Leave request does not require HOD approval".into(),
            ));
        }

        let record = DecisionRecord {
            decider_employee_id: decider_id,
            outcome,
            comment: optional(input.comment),
            decided_at: Utc::now(),
        };
        self.transition(&request, Transition::HodDecided(record), None)
            .await
    }

    pub async fn apply_principal_decision(
        &self,
        leave_id: LeaveId,
        input: DecisionInput,
    ) -> Result<LeaveRequest, LeaveError> {
        let (decider_id, outcome) = Self::parse_decision(&input, "principalEmployeeId")?;
        let request = self.get(leave_id).await?;

        match request.status {
            LeaveStatus::HodApproved => {}
            LeaveStatus::Pending if request.bypasses_hod() => {}
            LeaveStatus::Pending => {
                return Err(LeaveError::InvalidState(
                    "Leave request requires HOD approval first".into(),
                ));
            }
            status => {
                return Err(LeaveError::InvalidState(format!(
                    "Leave request is not awaiting Principal approval (status: {status})"
                )));
            }
        }

        self.directory
            .lookup(&decider_id)
            .await?
            .filter(DirectoryEntry::is_principal)
            .ok_or_else(|| {
                LeaveError::Unauthorized("Only the Principal can review this request".into())
            })?;

        // Booked with the status change; the precondition admits exactly one
        // PrincipalApproved write per request.
        let accrual = if outcome == DecisionOutcome::Approved && self.accrues(request.category) {
            let (year, month) = request.accrual_period();
            Some(SummaryAccumulator::accrual(
                &request.employee_id,
                year,
                month,
                request.leave_days,
            )?)
        } else {
            None
        };

        let record = DecisionRecord {
            decider_employee_id: decider_id,
            outcome,
            comment: optional(input.comment),
            decided_at: Utc::now(),
        };
        let updated = self
            .transition(&request, Transition::PrincipalDecided(record), accrual.as_ref())
            .await?;

        if let Some(accrual) = accrual {
            info!(
                employee_id = %accrual.employee_id,
                year = accrual.year,
                month = accrual.month,
                days = accrual.days,
                "Leave days accrued"
            );
        }

        Ok(updated)
    }

    /// Requester takes back a request that is still awaiting review.
    pub async fn withdraw(
        &self,
        leave_id: LeaveId,
        employee_id: Option<String>,
    ) -> Result<LeaveRequest, LeaveError> {
        let employee_id = optional(employee_id)
            .ok_or_else(|| LeaveError::Validation("Missing required fields: employeeId".into()))?;
        let request = self.get(leave_id).await?;

        if request.employee_id != employee_id {
            return Err(LeaveError::Forbidden(
                "Only the requester can withdraw a leave request".into(),
            ));
        }
        if !matches!(request.status, LeaveStatus::Pending | LeaveStatus::HodApproved) {
            return Err(LeaveError::InvalidState(format!(
                "Leave request can no longer be withdrawn (status: {})",
                request.status
            )));
        }

        self.transition(&request, Transition::Withdrawn(Utc::now()), None)
            .await
    }

    fn accrues(&self, category: LeaveCategory) -> bool {
        match category {
            LeaveCategory::Regular => true,
            LeaveCategory::Od => self.policy.accrue_od_leave,
        }
    }

    fn parse_decision(
        input: &DecisionInput,
        decider_field: &str,
    ) -> Result<(String, DecisionOutcome), LeaveError> {
        let decider_id = present(&input.decider_employee_id)
            .ok_or_else(|| {
                LeaveError::Validation(format!("Missing required fields: {decider_field}"))
            })?
            .to_string();
        let outcome = present(&input.decision)
            .and_then(|raw| DecisionOutcome::from_str(raw).ok())
            .ok_or_else(|| {
                LeaveError::Validation("Invalid decision. Allowed: Approved, Rejected".into())
            })?;
        Ok((decider_id, outcome))
    }

    /// Writes `transition` (and `accrual`, if any) guarded by the status that
    /// was validated. A lost race is reported as `InvalidState` against the
    /// fresh status.
    async fn transition(
        &self,
        request: &LeaveRequest,
        transition: Transition,
        accrual: Option<&Accrual>,
    ) -> Result<LeaveRequest, LeaveError> {
        let applied = self
            .store
            .apply_transition(request.id, request.status, &transition, accrual)
            .await?;

        if !applied {
            let current = self.get(request.id).await?;
            warn!(
                leave_id = request.id,
                expected = %request.status,
                current = %current.status,
                "Leave request changed before decision was written"
            );
            return Err(LeaveError::InvalidState(format!(
                "Leave request was already processed (status: {})",
                current.status
            )));
        }

        let mut updated = request.clone();
        transition.apply_to(&mut updated);
        info!(
            leave_id = updated.id,
            employee_id = %updated.employee_id,
            from = %request.status,
            to = %updated.status,
            "Leave request transitioned"
        );
        Ok(updated)
    }

    /* =========================
    Queries
    ========================= */

    pub async fn get(&self, leave_id: LeaveId) -> Result<LeaveRequest, LeaveError> {
        self.store
            .get_by_id(leave_id)
            .await?
            .ok_or_else(|| LeaveError::NotFound("Leave request not found".into()))
    }

    pub async fn hod_queue(&self, department: &str) -> Result<Vec<LeaveRequest>, LeaveError> {
        let department = DepartmentId::normalize(department)
            .ok_or_else(|| LeaveError::Validation("Department is required".into()))?;
        Ok(self
            .store
            .list_by_filter(&access_filter::hod_view(&department))
            .await?)
    }

    pub async fn principal_queue(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self
            .store
            .list_by_filter(&access_filter::principal_actionable())
            .await?)
    }

    pub async fn principal_history(&self) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self
            .store
            .list_by_filter(&access_filter::principal_all())
            .await?)
    }

    pub async fn my_leaves(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, LeaveError> {
        Ok(self.store.list_by_employee(employee_id.trim()).await?)
    }

    pub async fn summary(&self, employee_id: &str) -> Result<LeaveSummary, LeaveError> {
        self.accumulator.summary(employee_id.trim()).await
    }
}
