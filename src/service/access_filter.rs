//! Role-scoped query predicates. Pure values: nothing here touches storage.

use crate::model::department::DepartmentId;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, RequesterClass};

/// Requester classes that never pass through a HOD queue.
pub const HOD_EXEMPT_CLASSES: [RequesterClass; 2] = [RequesterClass::Hod, RequesterClass::Staff];

/// Requester classes whose `Pending` requests are listed for the Principal.
pub const PRINCIPAL_DIRECT_CLASSES: [RequesterClass; 3] = [
    RequesterClass::Hod,
    RequesterClass::Staff,
    RequesterClass::Principal,
];

/// Predicate over leave requests. Evaluated in memory with
/// [`LeaveFilter::matches`] or rendered to SQL by the MySQL store.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveFilter {
    All(Vec<LeaveFilter>),
    Any(Vec<LeaveFilter>),
    Department(DepartmentId),
    Employee(String),
    StatusIn(Vec<LeaveStatus>),
    ClassIn(Vec<RequesterClass>),
    ClassNotIn(Vec<RequesterClass>),
}

impl LeaveFilter {
    pub fn matches(&self, request: &LeaveRequest) -> bool {
        match self {
            LeaveFilter::All(filters) => filters.iter().all(|f| f.matches(request)),
            LeaveFilter::Any(filters) => filters.iter().any(|f| f.matches(request)),
            LeaveFilter::Department(department) => &request.department == department,
            LeaveFilter::Employee(employee_id) => &request.employee_id == employee_id,
            LeaveFilter::StatusIn(statuses) => statuses.contains(&request.status),
            LeaveFilter::ClassIn(classes) => classes.contains(&request.requester_class),
            LeaveFilter::ClassNotIn(classes) => !classes.contains(&request.requester_class),
        }
    }
}

/// Everything filed in the HOD's department, any status, except requesters
/// that bypass HOD review.
pub fn hod_view(department: &DepartmentId) -> LeaveFilter {
    LeaveFilter::All(vec![
        LeaveFilter::Department(department.clone()),
        LeaveFilter::ClassNotIn(HOD_EXEMPT_CLASSES.to_vec()),
    ])
}

/// Requests awaiting a Principal decision.
pub fn principal_actionable() -> LeaveFilter {
    LeaveFilter::Any(vec![
        LeaveFilter::StatusIn(vec![LeaveStatus::HodApproved]),
        LeaveFilter::All(vec![
            LeaveFilter::StatusIn(vec![LeaveStatus::Pending]),
            LeaveFilter::ClassIn(PRINCIPAL_DIRECT_CLASSES.to_vec()),
        ]),
    ])
}

/// Actionable requests plus the Principal's decided history.
pub fn principal_all() -> LeaveFilter {
    LeaveFilter::Any(vec![
        principal_actionable(),
        LeaveFilter::StatusIn(vec![
            LeaveStatus::PrincipalApproved,
            LeaveStatus::PrincipalRejected,
        ]),
    ])
}

pub fn self_view(employee_id: &str) -> LeaveFilter {
    LeaveFilter::Employee(employee_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::*;
    use chrono::{NaiveDate, Utc};

    fn request(class: RequesterClass, status: LeaveStatus, department: &str) -> LeaveRequest {
        let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        LeaveRequest {
            id: 1,
            employee_id: "EMP001".into(),
            requester_name: "Asha".into(),
            department: DepartmentId::normalize(department).unwrap(),
            category: LeaveCategory::Regular,
            leave_type: LeaveType::Sick,
            requester_class: class,
            start_date: date,
            end_date: date,
            duration: DurationGranularity::FullDay,
            reason: "fever".into(),
            contact: None,
            attachment_ref: None,
            od: None,
            leave_days: 1,
            status,
            hod_decision: HodDecision::Pending,
            principal_decision: PrincipalDecision::Pending,
            withdrawn_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn hod_view_is_department_scoped_and_excludes_bypass_classes() {
        let cse = DepartmentId::normalize("CSE").unwrap();
        let view = hod_view(&cse);

        assert!(view.matches(&request(RequesterClass::Faculty, LeaveStatus::Pending, "cse")));
        assert!(view.matches(&request(RequesterClass::Cc, LeaveStatus::PrincipalApproved, "CSE")));
        assert!(!view.matches(&request(RequesterClass::Faculty, LeaveStatus::Pending, "ECE")));
        assert!(!view.matches(&request(RequesterClass::Hod, LeaveStatus::Pending, "CSE")));
        assert!(!view.matches(&request(RequesterClass::Staff, LeaveStatus::HodApproved, "CSE")));
    }

    #[test]
    fn principal_actionable_covers_hod_approved_and_direct_pending() {
        let view = principal_actionable();

        assert!(view.matches(&request(RequesterClass::Faculty, LeaveStatus::HodApproved, "CSE")));
        assert!(view.matches(&request(RequesterClass::Staff, LeaveStatus::Pending, "CSE")));
        assert!(view.matches(&request(RequesterClass::Principal, LeaveStatus::Pending, "CSE")));
        assert!(!view.matches(&request(RequesterClass::Faculty, LeaveStatus::Pending, "CSE")));
        assert!(!view.matches(&request(RequesterClass::Faculty, LeaveStatus::PrincipalApproved, "CSE")));
    }

    #[test]
    fn principal_all_adds_decided_history_only() {
        let view = principal_all();

        assert!(view.matches(&request(RequesterClass::Faculty, LeaveStatus::PrincipalApproved, "CSE")));
        assert!(view.matches(&request(RequesterClass::Hod, LeaveStatus::PrincipalRejected, "CSE")));
        assert!(view.matches(&request(RequesterClass::Faculty, LeaveStatus::HodApproved, "CSE")));
        assert!(!view.matches(&request(RequesterClass::Faculty, LeaveStatus::HodRejected, "CSE")));
        assert!(!view.matches(&request(RequesterClass::Faculty, LeaveStatus::Withdrawn, "CSE")));
    }

    #[test]
    fn self_view_matches_only_the_employee() {
        let view = self_view("EMP001");
        let mut other = request(RequesterClass::Faculty, LeaveStatus::Pending, "CSE");
        assert!(view.matches(&other));
        other.employee_id = "EMP002".into();
        assert!(!view.matches(&other));
    }
}
