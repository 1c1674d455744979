use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::model::department::DepartmentId;
use crate::model::leave_request::RequesterClass;

/// Reviewer role held in the employee directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[strum(ascii_case_insensitive)]
pub enum OrgRole {
    #[serde(rename = "HOD")]
    #[strum(serialize = "HOD")]
    Hod,
    Principal,
}

/// An employee as resolved by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub employee_id: String,
    pub name: String,
    pub department: DepartmentId,
    pub employee_type: RequesterClass,
    pub role: Option<OrgRole>,
}

impl DirectoryEntry {
    pub fn is_hod(&self) -> bool {
        self.role == Some(OrgRole::Hod) || self.employee_type == RequesterClass::Hod
    }

    pub fn is_principal(&self) -> bool {
        self.role == Some(OrgRole::Principal) || self.employee_type == RequesterClass::Principal
    }
}
