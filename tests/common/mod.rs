#![allow(dead_code)]

use std::sync::Arc;

use campus_erp::model::department::DepartmentId;
use campus_erp::model::employee::{DirectoryEntry, OrgRole};
use campus_erp::model::leave_request::RequesterClass;
use campus_erp::service::{DecisionEngine, DecisionInput, LeaveApplication, LeavePolicy, OdApplication};
use campus_erp::store::memory::{MemoryDirectory, MemoryLedgerStore, MemoryLeaveStore};

pub struct Harness {
    pub engine: DecisionEngine,
    pub store: Arc<MemoryLeaveStore>,
    pub ledger: Arc<MemoryLedgerStore>,
}

fn entry(id: &str, department: &str, class: RequesterClass, role: Option<OrgRole>) -> DirectoryEntry {
    DirectoryEntry {
        employee_id: id.to_string(),
        name: format!("{id} name"),
        department: DepartmentId::normalize(department).unwrap(),
        employee_type: class,
        role,
    }
}

/// CSE and ECE faculty, staff, both HODs, and the Principal.
pub fn directory() -> MemoryDirectory {
    MemoryDirectory::with_entries([
        entry("FAC001", "CSE", RequesterClass::Faculty, None),
        entry("CC001", "Computer Science and Engineering", RequesterClass::Cc, None),
        entry("STF001", "CSE", RequesterClass::Staff, None),
        entry("FAC101", "ECE", RequesterClass::Faculty, None),
        entry("HOD001", "cse", RequesterClass::Hod, Some(OrgRole::Hod)),
        entry("HOD101", "ECE", RequesterClass::Hod, Some(OrgRole::Hod)),
        entry("PRN001", "Administration", RequesterClass::Principal, Some(OrgRole::Principal)),
    ])
}

pub fn harness_with(policy: LeavePolicy) -> Harness {
    let ledger = Arc::new(MemoryLedgerStore::default());
    let store = Arc::new(MemoryLeaveStore::new(ledger.clone()));
    let engine = DecisionEngine::new(store.clone(), ledger.clone(), Arc::new(directory()), policy);
    Harness {
        engine,
        store,
        ledger,
    }
}

pub fn harness() -> Harness {
    harness_with(LeavePolicy::default())
}

pub fn application(employee_id: &str, leave_type: &str, start: &str, end: &str) -> LeaveApplication {
    LeaveApplication {
        employee_id: Some(employee_id.to_string()),
        requester_name: Some("Asha".to_string()),
        leave_type: Some(leave_type.to_string()),
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        leave_duration: Some("Full Day".to_string()),
        reason: Some("Personal".to_string()),
        ..Default::default()
    }
}

pub fn od_application() -> OdApplication {
    OdApplication {
        event_name: Some("Rust Workshop".to_string()),
        location: Some("Chennai".to_string()),
        approval_letter: None,
    }
}

pub fn decision(decider: &str, outcome: &str) -> DecisionInput {
    DecisionInput {
        decider_employee_id: Some(decider.to_string()),
        decision: Some(outcome.to_string()),
        comment: None,
    }
}
