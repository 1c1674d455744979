use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical department identifier. Raw names from requests and the employee
/// directory go through [`DepartmentId::normalize`] before any comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartmentId(String);

/// Abbreviations and common spellings mapped to their canonical name.
static DEPARTMENT_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("cse", "computer science and engineering"),
        ("cs", "computer science and engineering"),
        ("computer science", "computer science and engineering"),
        ("computer science engineering", "computer science and engineering"),
        ("ece", "electronics and communication engineering"),
        ("electronics and communication", "electronics and communication engineering"),
        ("eee", "electrical and electronics engineering"),
        ("electrical and electronics", "electrical and electronics engineering"),
        ("it", "information technology"),
        ("mech", "mechanical engineering"),
        ("mechanical", "mechanical engineering"),
        ("civil", "civil engineering"),
        ("s and h", "science and humanities"),
        ("sh", "science and humanities"),
        ("mba", "management studies"),
        ("mca", "computer applications"),
    ])
});

const PREFIXES: [&str; 3] = ["department of ", "dept of ", "dept. of "];
const SUFFIXES: [&str; 3] = [" department", " dept", " dept."];

impl DepartmentId {
    /// Returns `None` for blank input.
    pub fn normalize(raw: &str) -> Option<Self> {
        let mut name = raw
            .replace('&', " and ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        for prefix in PREFIXES {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest.to_string();
            }
        }
        for suffix in SUFFIXES {
            if let Some(rest) = name.strip_suffix(suffix) {
                name = rest.to_string();
            }
        }

        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let canonical = DEPARTMENT_ALIASES.get(name).copied().unwrap_or(name);
        Some(DepartmentId(canonical.to_string()))
    }

    /// Wraps a value that is already canonical, e.g. read back from storage.
    pub fn from_canonical(value: impl Into<String>) -> Self {
        DepartmentId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepartmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
