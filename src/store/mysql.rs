use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use std::str::FromStr;

use crate::error::StoreError;
use crate::model::department::DepartmentId;
use crate::model::leave_request::{
    DecisionOutcome, DecisionRecord, DurationGranularity, HodDecision, HodStage, LeaveCategory,
    LeaveId, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, OdDetails, PrincipalDecision,
    RequesterClass, Transition,
};
use crate::model::leave_summary::{Accrual, LeaveSummary, MonthlyLeave, YearlyLeave};
use crate::service::access_filter::{self, LeaveFilter};
use crate::store::{LedgerStore, LeaveStore};

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, requester_name, department, category, leave_type, requester_class,
    start_date, end_date, duration, reason, contact, attachment_ref,
    event_name, location, approval_letter, leave_days, status,
    hod_stage, hod_decider, hod_outcome, hod_comment, hod_decided_at,
    principal_decider, principal_outcome, principal_comment, principal_decided_at,
    withdrawn_at, created_at
"#;

/// Renders `filter` as a SQL condition, pushing bind values in order.
fn render_filter(filter: &LeaveFilter, args: &mut Vec<String>) -> String {
    fn in_list<T: AsRef<str>>(
        column: &str,
        negate: bool,
        values: &[T],
        args: &mut Vec<String>,
    ) -> String {
        if values.is_empty() {
            return if negate { "1=1".into() } else { "1=0".into() };
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        args.extend(values.iter().map(|v| v.as_ref().to_string()));
        let op = if negate { "NOT IN" } else { "IN" };
        format!("{column} {op} ({placeholders})")
    }

    fn joined(filters: &[LeaveFilter], sep: &str, empty: &str, args: &mut Vec<String>) -> String {
        if filters.is_empty() {
            return empty.into();
        }
        let parts: Vec<String> = filters
            .iter()
            .map(|f| format!("({})", render_filter(f, args)))
            .collect();
        parts.join(sep)
    }

    match filter {
        LeaveFilter::All(filters) => joined(filters, " AND ", "1=1", args),
        LeaveFilter::Any(filters) => joined(filters, " OR ", "1=0", args),
        LeaveFilter::Department(department) => {
            args.push(department.as_str().to_string());
            "department = ?".into()
        }
        LeaveFilter::Employee(employee_id) => {
            args.push(employee_id.clone());
            "employee_id = ?".into()
        }
        LeaveFilter::StatusIn(statuses) => in_list("status", false, statuses, args),
        LeaveFilter::ClassIn(classes) => in_list("requester_class", false, classes, args),
        LeaveFilter::ClassNotIn(classes) => in_list("requester_class", true, classes, args),
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: String,
    requester_name: String,
    department: String,
    category: String,
    leave_type: String,
    requester_class: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration: String,
    reason: String,
    contact: Option<String>,
    attachment_ref: Option<String>,
    event_name: Option<String>,
    location: Option<String>,
    approval_letter: Option<String>,
    leave_days: u32,
    status: String,
    hod_stage: String,
    hod_decider: Option<String>,
    hod_outcome: Option<String>,
    hod_comment: Option<String>,
    hod_decided_at: Option<DateTime<Utc>>,
    principal_decider: Option<String>,
    principal_outcome: Option<String>,
    principal_comment: Option<String>,
    principal_decided_at: Option<DateTime<Utc>>,
    withdrawn_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

fn parse<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    T::from_str(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value:?}")))
}

fn decision_record(
    prefix: &str,
    decider: Option<String>,
    outcome: Option<String>,
    comment: Option<String>,
    decided_at: Option<DateTime<Utc>>,
) -> Result<Option<DecisionRecord>, StoreError> {
    match (decider, outcome, decided_at) {
        (Some(decider_employee_id), Some(outcome), Some(decided_at)) => Ok(Some(DecisionRecord {
            decider_employee_id,
            outcome: parse::<DecisionOutcome>(&format!("{prefix}_outcome"), &outcome)?,
            comment,
            decided_at,
        })),
        (None, None, None) => Ok(None),
        _ => Err(StoreError::Corrupt(format!("partial {prefix} decision"))),
    }
}

impl LeaveRow {
    fn into_request(self) -> Result<LeaveRequest, StoreError> {
        let hod_record = decision_record(
            "hod",
            self.hod_decider,
            self.hod_outcome,
            self.hod_comment,
            self.hod_decided_at,
        )?;
        let hod_decision = match (parse::<HodStage>("hod_stage", &self.hod_stage)?, hod_record) {
            (HodStage::NotApplicable, None) => HodDecision::NotApplicable,
            (HodStage::Pending, None) => HodDecision::Pending,
            (HodStage::Decided, Some(record)) => HodDecision::Decided(record),
            (stage, _) => {
                return Err(StoreError::Corrupt(format!(
                    "hod_stage {stage} disagrees with hod decision columns"
                )));
            }
        };

        let principal_decision = match decision_record(
            "principal",
            self.principal_decider,
            self.principal_outcome,
            self.principal_comment,
            self.principal_decided_at,
        )? {
            Some(record) => PrincipalDecision::Decided(record),
            None => PrincipalDecision::Pending,
        };

        let category = parse::<LeaveCategory>("category", &self.category)?;
        let od = match (category, self.event_name, self.location) {
            (LeaveCategory::Od, Some(event_name), Some(location)) => Some(OdDetails {
                event_name,
                location,
                approval_letter: self.approval_letter,
            }),
            (LeaveCategory::Od, _, _) => {
                return Err(StoreError::Corrupt(format!("OD leave {} without event", self.id)));
            }
            (LeaveCategory::Regular, _, _) => None,
        };

        Ok(LeaveRequest {
            id: self.id,
            employee_id: self.employee_id,
            requester_name: self.requester_name,
            department: DepartmentId::from_canonical(self.department),
            category,
            leave_type: parse::<LeaveType>("leave_type", &self.leave_type)?,
            requester_class: parse::<RequesterClass>("requester_class", &self.requester_class)?,
            start_date: self.start_date,
            end_date: self.end_date,
            duration: parse::<DurationGranularity>("duration", &self.duration)?,
            reason: self.reason,
            contact: self.contact,
            attachment_ref: self.attachment_ref,
            od,
            leave_days: self.leave_days,
            status: parse::<LeaveStatus>("status", &self.status)?,
            hod_decision,
            principal_decision,
            withdrawn_at: self.withdrawn_at,
            created_at: self.created_at,
        })
    }
}

fn into_requests(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRequest>, StoreError> {
    rows.into_iter().map(LeaveRow::into_request).collect()
}

/// Leave records in the `leave_requests` table.
#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn create(&self, request: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let (event_name, location, approval_letter) = match &request.od {
            Some(od) => (
                Some(od.event_name.as_str()),
                Some(od.location.as_str()),
                od.approval_letter.as_deref(),
            ),
            None => (None, None, None),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, requester_name, department, category, leave_type, requester_class,
                 start_date, end_date, duration, reason, contact, attachment_ref,
                 event_name, location, approval_letter, leave_days, status, hod_stage, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.employee_id)
        .bind(&request.requester_name)
        .bind(request.department.as_str())
        .bind(request.category.as_ref())
        .bind(request.leave_type.to_string())
        .bind(request.requester_class.as_ref())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.duration.to_string())
        .bind(&request.reason)
        .bind(request.contact.as_deref())
        .bind(request.attachment_ref.as_deref())
        .bind(event_name)
        .bind(location)
        .bind(approval_letter)
        .bind(request.leave_days)
        .bind(request.status.as_ref())
        .bind(request.hod_decision.stage().as_ref())
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;

        Ok(request.into_request(result.last_insert_id()))
    }

    async fn get_by_id(&self, id: LeaveId) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRow::into_request).transpose()
    }

    async fn list_by_filter(&self, filter: &LeaveFilter) -> Result<Vec<LeaveRequest>, StoreError> {
        let mut args = Vec::new();
        let where_sql = render_filter(filter, &mut args);
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE {where_sql} ORDER BY created_at DESC, id DESC"
        );
        tracing::debug!(sql = %sql, "Listing leave requests");

        let mut query = sqlx::query_as::<_, LeaveRow>(&sql);
        for arg in args {
            query = query.bind(arg);
        }

        into_requests(query.fetch_all(&self.pool).await?)
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
        let target = transition.target_status();
        let mut tx = self.pool.begin().await?;

        let result = match transition {
            Transition::HodDecided(record) => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = ?, hod_stage = 'Decided', hod_decider = ?, hod_outcome = ?,
                        hod_comment = ?, hod_decided_at = ?
                    WHERE id = ?
                    AND status = ?
                    AND hod_stage = 'Pending'
                    "#,
                )
                .bind(target.as_ref())
                .bind(&record.decider_employee_id)
                .bind(record.outcome.as_ref())
                .bind(record.comment.as_deref())
                .bind(record.decided_at)
                .bind(id)
                .bind(expected.as_ref())
                .execute(&mut *tx)
                .await?
            }
            Transition::PrincipalDecided(record) => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = ?, principal_decider = ?, principal_outcome = ?,
                        principal_comment = ?, principal_decided_at = ?
                    WHERE id = ?
                    AND status = ?
                    "#,
                )
                .bind(target.as_ref())
                .bind(&record.decider_employee_id)
                .bind(record.outcome.as_ref())
                .bind(record.comment.as_deref())
                .bind(record.decided_at)
                .bind(id)
                .bind(expected.as_ref())
                .execute(&mut *tx)
                .await?
            }
            Transition::Withdrawn(at) => {
                sqlx::query(
                    r#"
                    UPDATE leave_requests
                    SET status = ?, withdrawn_at = ?
                    WHERE id = ?
                    AND status = ?
                    "#,
                )
                .bind(target.as_ref())
                .bind(*at)
                .bind(id)
                .bind(expected.as_ref())
                .execute(&mut *tx)
                .await?
            }
        };

        if result.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        if let Some(accrual) = accrual {
            book_accrual(&mut *tx, accrual).await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

/// Upsert-increments the `(year, month)` and `year` buckets. Runs inside the
/// caller's transaction.
async fn book_accrual(conn: &mut MySqlConnection, accrual: &Accrual) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO leave_summary_monthly (employee_id, year, month, days)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE days = days + VALUES(days)
        "#,
    )
    .bind(&accrual.employee_id)
    .bind(accrual.year)
    .bind(accrual.month)
    .bind(accrual.days)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO leave_summary_yearly (employee_id, year, days)
        VALUES (?, ?, ?)
        ON DUPLICATE KEY UPDATE days = days + VALUES(days)
        "#,
    )
    .bind(&accrual.employee_id)
    .bind(accrual.year)
    .bind(accrual.days)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[derive(FromRow)]
struct MonthlyRow {
    year: i32,
    month: u32,
    days: u32,
}

#[derive(FromRow)]
struct YearlyRow {
    year: i32,
    days: u32,
}

/// Ledger in `leave_summary_monthly` / `leave_summary_yearly`. Rows are
/// written by [`MySqlLeaveStore`] together with the approval.
#[derive(Clone)]
pub struct MySqlLedgerStore {
    pool: MySqlPool,
}

impl MySqlLedgerStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for MySqlLedgerStore {
    async fn summary(&self, employee_id: &str) -> Result<Option<LeaveSummary>, StoreError> {
        let monthly = sqlx::query_as::<_, MonthlyRow>(
            r#"
            SELECT year, month, days
            FROM leave_summary_monthly
            WHERE employee_id = ?
            ORDER BY year, month
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        let yearly = sqlx::query_as::<_, YearlyRow>(
            r#"
            SELECT year, days
            FROM leave_summary_yearly
            WHERE employee_id = ?
            ORDER BY year
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        if monthly.is_empty() && yearly.is_empty() {
            return Ok(None);
        }

        Ok(Some(LeaveSummary {
            employee_id: employee_id.to_string(),
            monthly_leaves: monthly
                .into_iter()
                .map(|row| MonthlyLeave {
                    year: row.year,
                    month: row.month,
                    days: row.days,
                })
                .collect(),
            yearly_leaves: yearly
                .into_iter()
                .map(|row| YearlyLeave {
                    year: row.year,
                    days: row.days,
                })
                .collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::RequesterClass;
    use crate::service::access_filter::{hod_view, principal_actionable};

    #[test]
    fn renders_hod_view_with_binds_in_order() {
        let mut args = Vec::new();
        let sql = render_filter(&hod_view(&DepartmentId::normalize("CSE").unwrap()), &mut args);

        assert_eq!(sql, "(department = ?) AND (requester_class NOT IN (?, ?))");
        assert_eq!(
            args,
            vec!["computer science and engineering", "HOD", "Staff"]
        );
    }

    #[test]
    fn renders_principal_actionable_view() {
        let mut args = Vec::new();
        let sql = render_filter(&principal_actionable(), &mut args);

        assert_eq!(
            sql,
            "(status IN (?)) OR ((status IN (?)) AND (requester_class IN (?, ?, ?)))"
        );
        assert_eq!(
            args,
            vec!["HODApproved", "Pending", "HOD", "Staff", "Principal"]
        );
    }

    #[test]
    fn empty_lists_render_constant_conditions() {
        let mut args = Vec::new();
        assert_eq!(render_filter(&LeaveFilter::StatusIn(vec![]), &mut args), "1=0");
        assert_eq!(
            render_filter(&LeaveFilter::ClassNotIn(Vec::<RequesterClass>::new()), &mut args),
            "1=1"
        );
        assert!(args.is_empty());
    }
}
