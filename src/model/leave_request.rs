use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::model::department::DepartmentId;

pub type LeaveId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum LeaveCategory {
    Regular,
    #[serde(rename = "OD")]
    #[strum(serialize = "OD")]
    Od,
}

/// Leave types for both categories. Each variant belongs to exactly one
/// category, see [`LeaveType::category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum LeaveType {
    #[serde(rename = "Sick Leave")]
    #[strum(to_string = "Sick Leave", serialize = "Sick")]
    Sick,
    #[serde(rename = "Casual Leave")]
    #[strum(to_string = "Casual Leave", serialize = "Casual")]
    Casual,
    #[serde(rename = "Earned Leave")]
    #[strum(to_string = "Earned Leave", serialize = "Earned")]
    Earned,
    #[serde(rename = "Sabbatical Leave")]
    #[strum(to_string = "Sabbatical Leave", serialize = "Sabbatical")]
    Sabbatical,
    #[serde(rename = "Comp Off")]
    #[strum(to_string = "Comp Off", serialize = "CompOff", serialize = "Compensatory Off")]
    CompOff,
    #[strum(to_string = "Conference")]
    Conference,
    #[strum(to_string = "Workshop")]
    Workshop,
    #[serde(rename = "Official Duty")]
    #[strum(to_string = "Official Duty", serialize = "OfficialDuty")]
    OfficialDuty,
}

impl LeaveType {
    pub fn category(&self) -> LeaveCategory {
        match self {
            LeaveType::Sick
            | LeaveType::Casual
            | LeaveType::Earned
            | LeaveType::Sabbatical
            | LeaveType::CompOff => LeaveCategory::Regular,
            LeaveType::Conference | LeaveType::Workshop | LeaveType::OfficialDuty => {
                LeaveCategory::Od
            }
        }
    }

    pub fn allowed_for(category: LeaveCategory) -> &'static [LeaveType] {
        match category {
            LeaveCategory::Regular => &[
                LeaveType::Sick,
                LeaveType::Casual,
                LeaveType::Earned,
                LeaveType::Sabbatical,
                LeaveType::CompOff,
            ],
            LeaveCategory::Od => &[
                LeaveType::Conference,
                LeaveType::Workshop,
                LeaveType::OfficialDuty,
            ],
        }
    }
}

/// Organizational class of the requester. Drives the HOD bypass rules and is
/// not the same thing as the reviewer role held in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum RequesterClass {
    Faculty,
    /// Class coordinator.
    #[serde(rename = "cc")]
    #[strum(serialize = "cc")]
    Cc,
    #[serde(rename = "HOD")]
    #[strum(serialize = "HOD")]
    Hod,
    Principal,
    Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum DurationGranularity {
    #[serde(rename = "Full Day")]
    #[strum(to_string = "Full Day", serialize = "FullDay")]
    FullDay,
    #[serde(rename = "Half Day")]
    #[strum(to_string = "Half Day", serialize = "HalfDay")]
    HalfDay,
}

/// Workflow state. `HodApproved` is not terminal: it means "awaiting Principal".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum LeaveStatus {
    Pending,
    #[serde(rename = "HODApproved")]
    #[strum(serialize = "HODApproved")]
    HodApproved,
    #[serde(rename = "HODRejected")]
    #[strum(serialize = "HODRejected")]
    HodRejected,
    PrincipalApproved,
    PrincipalRejected,
    Withdrawn,
}

impl LeaveStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LeaveStatus::HodRejected
                | LeaveStatus::PrincipalApproved
                | LeaveStatus::PrincipalRejected
                | LeaveStatus::Withdrawn
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub decider_employee_id: String,
    pub outcome: DecisionOutcome,
    pub comment: Option<String>,
    pub decided_at: DateTime<Utc>,
}

/// HOD stage of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "record")]
pub enum HodDecision {
    /// The requester skips HOD review entirely.
    NotApplicable,
    Pending,
    Decided(DecisionRecord),
}

impl HodDecision {
    pub fn stage(&self) -> HodStage {
        match self {
            HodDecision::NotApplicable => HodStage::NotApplicable,
            HodDecision::Pending => HodStage::Pending,
            HodDecision::Decided(_) => HodStage::Decided,
        }
    }

    pub fn record(&self) -> Option<&DecisionRecord> {
        match self {
            HodDecision::Decided(record) => Some(record),
            _ => None,
        }
    }
}

/// Flat tag of [`HodDecision`], as persisted in the `hod_stage` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum HodStage {
    NotApplicable,
    Pending,
    Decided,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "record")]
pub enum PrincipalDecision {
    Pending,
    Decided(DecisionRecord),
}

impl PrincipalDecision {
    pub fn record(&self) -> Option<&DecisionRecord> {
        match self {
            PrincipalDecision::Decided(record) => Some(record),
            PrincipalDecision::Pending => None,
        }
    }
}

/// Event metadata carried only by OD leave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OdDetails {
    pub event_name: String,
    pub location: String,
    pub approval_letter: Option<String>,
}

/// A validated request that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: String,
    pub requester_name: String,
    pub department: DepartmentId,
    pub category: LeaveCategory,
    pub leave_type: LeaveType,
    pub requester_class: RequesterClass,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: DurationGranularity,
    pub reason: String,
    pub contact: Option<String>,
    pub attachment_ref: Option<String>,
    pub od: Option<OdDetails>,
    pub leave_days: u32,
    pub status: LeaveStatus,
    pub hod_decision: HodDecision,
    pub created_at: DateTime<Utc>,
}

impl NewLeaveRequest {
    pub fn into_request(self, id: LeaveId) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: self.employee_id,
            requester_name: self.requester_name,
            department: self.department,
            category: self.category,
            leave_type: self.leave_type,
            requester_class: self.requester_class,
            start_date: self.start_date,
            end_date: self.end_date,
            duration: self.duration,
            reason: self.reason,
            contact: self.contact,
            attachment_ref: self.attachment_ref,
            od: self.od,
            leave_days: self.leave_days,
            status: self.status,
            hod_decision: self.hod_decision,
            principal_decision: PrincipalDecision::Pending,
            withdrawn_at: None,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    pub id: LeaveId,
    pub employee_id: String,
    pub requester_name: String,
    pub department: DepartmentId,
    pub category: LeaveCategory,
    pub leave_type: LeaveType,
    pub requester_class: RequesterClass,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: DurationGranularity,
    pub reason: String,
    pub contact: Option<String>,
    pub attachment_ref: Option<String>,
    pub od: Option<OdDetails>,
    pub leave_days: u32,
    pub status: LeaveStatus,
    pub hod_decision: HodDecision,
    pub principal_decision: PrincipalDecision,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn bypasses_hod(&self) -> bool {
        self.hod_decision == HodDecision::NotApplicable
    }

    /// (year, month) bucket the request accrues into.
    pub fn accrual_period(&self) -> (i32, u32) {
        (self.start_date.year(), self.start_date.month())
    }
}

/// A status change written with an optimistic precondition on the current
/// status.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    HodDecided(DecisionRecord),
    PrincipalDecided(DecisionRecord),
    Withdrawn(DateTime<Utc>),
}

impl Transition {
    pub fn target_status(&self) -> LeaveStatus {
        match self {
            Transition::HodDecided(record) => match record.outcome {
                DecisionOutcome::Approved => LeaveStatus::HodApproved,
                DecisionOutcome::Rejected => LeaveStatus::HodRejected,
            },
            Transition::PrincipalDecided(record) => match record.outcome {
                DecisionOutcome::Approved => LeaveStatus::PrincipalApproved,
                DecisionOutcome::Rejected => LeaveStatus::PrincipalRejected,
            },
            Transition::Withdrawn(_) => LeaveStatus::Withdrawn,
        }
    }

    /// Applies the change to an in-memory record. Callers check the
    /// precondition first.
    pub fn apply_to(&self, request: &mut LeaveRequest) {
        request.status = self.target_status();
        match self {
            Transition::HodDecided(record) => {
                request.hod_decision = HodDecision::Decided(record.clone());
            }
            Transition::PrincipalDecided(record) => {
                request.principal_decision = PrincipalDecision::Decided(record.clone());
            }
            Transition::Withdrawn(at) => request.withdrawn_at = Some(*at),
        }
    }
}

/// Inclusive day count between two dates; `None` when `end` precedes `start`.
pub fn inclusive_leave_days(start: NaiveDate, end: NaiveDate) -> Option<u32> {
    let span = end.signed_duration_since(start).num_days();
    if span < 0 {
        return None;
    }
    u32::try_from(span + 1).ok()
}
