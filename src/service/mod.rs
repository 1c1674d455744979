pub mod access_filter;
pub mod decision_engine;
pub mod summary_accumulator;

pub use decision_engine::{DecisionEngine, DecisionInput, LeaveApplication, LeavePolicy, OdApplication};
