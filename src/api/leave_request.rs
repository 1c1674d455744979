use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LeaveError;
use crate::model::leave_request::{DecisionOutcome, DecisionRecord, LeaveId, LeaveRequest};
use crate::model::leave_summary::LeaveSummary;
use crate::service::{DecisionEngine, DecisionInput, LeaveApplication, OdApplication};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeave {
    #[schema(example = "EMP001")]
    pub employee_id: Option<String>,
    #[schema(example = "Asha")]
    pub first_name: Option<String>,
    /// Used only when the employee is unknown to the directory
    #[schema(example = "CSE")]
    pub department: Option<String>,
    /// Used only when the employee is unknown to the directory
    #[serde(alias = "employeeType")]
    #[schema(example = "Faculty")]
    pub requester_class: Option<String>,
    #[schema(example = "Sick Leave")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-01-10", format = "date")]
    pub start_date: Option<String>,
    #[schema(example = "2026-01-12", format = "date")]
    pub end_date: Option<String>,
    #[schema(example = "Full Day")]
    pub leave_duration: Option<String>,
    #[schema(example = "Fever")]
    pub reason: Option<String>,
    #[schema(example = "+91 98765 43210")]
    pub contact: Option<String>,
    /// Reference returned by the attachment store
    pub attachment: Option<String>,
}

impl From<ApplyLeave> for LeaveApplication {
    fn from(value: ApplyLeave) -> Self {
        LeaveApplication {
            employee_id: value.employee_id,
            requester_name: value.first_name,
            department: value.department,
            requester_class: value.requester_class,
            leave_type: value.leave_type,
            start_date: value.start_date,
            end_date: value.end_date,
            leave_duration: value.leave_duration,
            reason: value.reason,
            contact: value.contact,
            attachment_ref: value.attachment,
        }
    }
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyOdLeave {
    #[serde(flatten)]
    pub leave: ApplyLeave,
    #[schema(example = "National Conference on Networks")]
    pub event_name: Option<String>,
    #[schema(example = "Chennai")]
    pub location: Option<String>,
    /// Reference returned by the attachment store
    pub approval_letter: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HodDecisionBody {
    #[schema(example = "Approved")]
    pub decision: Option<String>,
    pub comment: Option<String>,
    #[schema(example = "HOD001")]
    pub hod_employee_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalDecisionBody {
    #[schema(example = "Approved")]
    pub decision: Option<String>,
    pub comment: Option<String>,
    #[schema(example = "PRN001")]
    pub principal_employee_id: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawBody {
    #[schema(example = "EMP001")]
    pub employee_id: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecisionView {
    pub decider_employee_id: String,
    #[schema(example = "Approved")]
    pub outcome: String,
    pub comment: Option<String>,
    #[schema(example = "2026-01-10T09:30:00Z", format = "date-time", value_type = String)]
    pub decided_at: DateTime<Utc>,
}

impl From<&DecisionRecord> for DecisionView {
    fn from(record: &DecisionRecord) -> Self {
        DecisionView {
            decider_employee_id: record.decider_employee_id.clone(),
            outcome: record.outcome.to_string(),
            comment: record.comment.clone(),
            decided_at: record.decided_at,
        }
    }
}

/// Leave request as exposed over HTTP. Undecided stages are reported as an
/// explicit `null`.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: LeaveId,
    #[schema(example = "EMP001")]
    pub employee_id: String,
    #[schema(example = "Asha")]
    pub requester_name: String,
    #[schema(example = "computer science and engineering")]
    pub department: String,
    #[schema(example = "Regular")]
    pub category: String,
    #[schema(example = "Sick Leave")]
    pub leave_type: String,
    #[schema(example = "Faculty")]
    pub requester_class: String,
    #[schema(example = "2026-01-10", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-12", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Full Day")]
    pub leave_duration: String,
    pub reason: String,
    pub contact: Option<String>,
    pub attachment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_letter: Option<String>,
    #[schema(example = 3)]
    pub leave_days: u32,
    #[schema(example = "Pending")]
    pub status: String,
    /// `false` when the requester bypasses HOD review
    pub requires_hod_approval: bool,
    pub hod_decision: Option<DecisionView>,
    pub principal_decision: Option<DecisionView>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub withdrawn_at: Option<DateTime<Utc>>,
    #[schema(example = "2026-01-09T08:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<LeaveRequest> for LeaveResponse {
    fn from(request: LeaveRequest) -> Self {
        let requires_hod_approval = !request.bypasses_hod();
        let hod_decision = request.hod_decision.record().map(DecisionView::from);
        let principal_decision = request.principal_decision.record().map(DecisionView::from);
        let (event_name, location, approval_letter) = match request.od {
            Some(od) => (Some(od.event_name), Some(od.location), od.approval_letter),
            None => (None, None, None),
        };

        LeaveResponse {
            id: request.id,
            requires_hod_approval,
            hod_decision,
            principal_decision,
            employee_id: request.employee_id,
            requester_name: request.requester_name,
            department: request.department.to_string(),
            category: request.category.to_string(),
            leave_type: request.leave_type.to_string(),
            requester_class: request.requester_class.to_string(),
            start_date: request.start_date,
            end_date: request.end_date,
            leave_duration: request.duration.to_string(),
            reason: request.reason,
            contact: request.contact,
            attachment: request.attachment_ref,
            event_name,
            location,
            approval_letter,
            leave_days: request.leave_days,
            status: request.status.to_string(),
            withdrawn_at: request.withdrawn_at,
            created_at: request.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub total: usize,
}

impl From<Vec<LeaveRequest>> for LeaveListResponse {
    fn from(requests: Vec<LeaveRequest>) -> Self {
        let data: Vec<LeaveResponse> = requests.into_iter().map(LeaveResponse::from).collect();
        LeaveListResponse {
            total: data.len(),
            data,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveMessageResponse {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    pub leave: LeaveResponse,
}

fn message(text: &str, leave: LeaveRequest) -> HttpResponse {
    HttpResponse::Ok().json(LeaveMessageResponse {
        message: text.to_string(),
        leave: leave.into(),
    })
}

fn outcome_word(record: Option<&DecisionRecord>) -> &'static str {
    match record.map(|r| r.outcome) {
        Some(DecisionOutcome::Approved) => "approved",
        Some(DecisionOutcome::Rejected) => "rejected",
        None => "updated",
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyLeaveView {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 3)]
    pub days: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct YearlyLeaveView {
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 3)]
    pub days: u32,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveSummaryResponse {
    #[schema(example = "EMP001")]
    pub employee_id: String,
    pub monthly_leaves: Vec<MonthlyLeaveView>,
    pub yearly_leaves: Vec<YearlyLeaveView>,
}

impl From<LeaveSummary> for LeaveSummaryResponse {
    fn from(summary: LeaveSummary) -> Self {
        LeaveSummaryResponse {
            employee_id: summary.employee_id,
            monthly_leaves: summary
                .monthly_leaves
                .into_iter()
                .map(|m| MonthlyLeaveView {
                    year: m.year,
                    month: m.month,
                    days: m.days,
                })
                .collect(),
            yearly_leaves: summary
                .yearly_leaves
                .into_iter()
                .map(|y| YearlyLeaveView {
                    year: y.year,
                    days: y.days,
                })
                .collect(),
        }
    }
}

/* =========================
Apply for leave
========================= */
/// Submit a regular leave request
#[utoipa::path(
    post,
    path = "/api/leave/apply",
    request_body(content = ApplyLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request submitted", body = LeaveMessageResponse),
        (status = 400, description = "Missing or invalid field", body = Object, example = json!({
            "message": "Missing required fields: reason"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn apply_leave(
    engine: web::Data<DecisionEngine>,
    payload: web::Json<ApplyLeave>,
) -> Result<impl Responder, LeaveError> {
    let leave = engine.create(payload.into_inner().into(), None).await?;
    Ok(message("Leave request submitted", leave))
}

/// Submit an OD (on duty) leave request
#[utoipa::path(
    post,
    path = "/api/leave/odleave/apply",
    request_body(content = ApplyOdLeave, content_type = "application/json"),
    responses(
        (status = 200, description = "OD leave request submitted", body = LeaveMessageResponse),
        (status = 400, description = "Missing or invalid field", body = Object, example = json!({
            "message": "Missing required fields: eventName, location"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn apply_od_leave(
    engine: web::Data<DecisionEngine>,
    payload: web::Json<ApplyOdLeave>,
) -> Result<impl Responder, LeaveError> {
    let ApplyOdLeave {
        leave,
        event_name,
        location,
        approval_letter,
    } = payload.into_inner();
    let od = OdApplication {
        event_name,
        location,
        approval_letter,
    };

    let leave = engine.create(leave.into(), Some(od)).await?;
    Ok(message("OD leave request submitted", leave))
}

/* =========================
HOD review
========================= */
/// Leave requests of a department, as seen by its HOD
#[utoipa::path(
    get,
    path = "/api/leave/hod/{department}",
    params(
        ("department" = String, Path, description = "Department name or abbreviation")
    ),
    responses(
        (status = 200, description = "HOD queue", body = LeaveListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn hod_leaves(
    engine: web::Data<DecisionEngine>,
    path: web::Path<String>,
) -> Result<impl Responder, LeaveError> {
    let leaves = engine.hod_queue(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(leaves)))
}

/// Record the HOD decision on a leave request
#[utoipa::path(
    put,
    path = "/api/leave/hod/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(content = HodDecisionBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Decision recorded", body = LeaveMessageResponse),
        (status = 400, description = "Invalid input or leave not pending HOD approval", body = Object, example = json!({
            "message": "Leave request is not pending HOD approval (status: HODApproved)"
        })),
        (status = 401, description = "Decider is not a HOD"),
        (status = 403, description = "HOD of another department"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn hod_decision(
    engine: web::Data<DecisionEngine>,
    path: web::Path<LeaveId>,
    payload: web::Json<HodDecisionBody>,
) -> Result<impl Responder, LeaveError> {
    let body = payload.into_inner();
    let input = DecisionInput {
        decider_employee_id: body.hod_employee_id,
        decision: body.decision,
        comment: body.comment,
    };

    let leave = engine.apply_hod_decision(path.into_inner(), input).await?;
    let text = format!(
        "Leave request {} by HOD",
        outcome_word(leave.hod_decision.record())
    );
    Ok(message(&text, leave))
}

/* =========================
Principal review
========================= */
/// Requests awaiting a Principal decision
#[utoipa::path(
    get,
    path = "/api/leave/principal",
    responses(
        (status = 200, description = "Principal queue", body = LeaveListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn principal_leaves(
    engine: web::Data<DecisionEngine>,
) -> Result<impl Responder, LeaveError> {
    let leaves = engine.principal_queue().await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(leaves)))
}

/// Requests awaiting a Principal decision plus decided history
#[utoipa::path(
    get,
    path = "/api/leave/principal/all",
    responses(
        (status = 200, description = "Principal queue and history", body = LeaveListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn principal_all_leaves(
    engine: web::Data<DecisionEngine>,
) -> Result<impl Responder, LeaveError> {
    let leaves = engine.principal_history().await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(leaves)))
}

/// Record the Principal decision on a leave request
#[utoipa::path(
    put,
    path = "/api/leave/principal/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(content = PrincipalDecisionBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Decision recorded", body = LeaveMessageResponse),
        (status = 400, description = "Invalid input or HOD approval outstanding", body = Object, example = json!({
            "message": "Leave request requires HOD approval first"
        })),
        (status = 401, description = "Decider is not the Principal"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn principal_decision(
    engine: web::Data<DecisionEngine>,
    path: web::Path<LeaveId>,
    payload: web::Json<PrincipalDecisionBody>,
) -> Result<impl Responder, LeaveError> {
    let body = payload.into_inner();
    let input = DecisionInput {
        decider_employee_id: body.principal_employee_id,
        decision: body.decision,
        comment: body.comment,
    };

    let leave = engine.apply_principal_decision(path.into_inner(), input).await?;
    let text = format!(
        "Leave request {} by Principal",
        outcome_word(leave.principal_decision.record())
    );
    Ok(message(&text, leave))
}

/* =========================
Requester views
========================= */
/// Withdraw a leave request that is still awaiting review
#[utoipa::path(
    put,
    path = "/api/leave/withdraw/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request")
    ),
    request_body(content = WithdrawBody, content_type = "application/json"),
    responses(
        (status = 200, description = "Leave request withdrawn", body = LeaveMessageResponse),
        (status = 400, description = "Leave request already decided"),
        (status = 403, description = "Not the requester"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave"
)]
pub async fn withdraw_leave(
    engine: web::Data<DecisionEngine>,
    path: web::Path<LeaveId>,
    payload: web::Json<WithdrawBody>,
) -> Result<impl Responder, LeaveError> {
    let leave = engine
        .withdraw(path.into_inner(), payload.into_inner().employee_id)
        .await?;
    Ok(message("Leave request withdrawn", leave))
}

/// Approved leave days of an employee by month and year
#[utoipa::path(
    get,
    path = "/api/leave/summary/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Leave summary", body = LeaveSummaryResponse),
        (status = 404, description = "No approved leave yet", body = Object, example = json!({
            "message": "Leave summary not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn leave_summary(
    engine: web::Data<DecisionEngine>,
    path: web::Path<String>,
) -> Result<impl Responder, LeaveError> {
    let summary = engine.summary(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveSummaryResponse::from(summary)))
}

/// All leave requests filed by an employee
#[utoipa::path(
    get,
    path = "/api/leave/my-leaves/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Leave requests of the employee", body = LeaveListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn my_leaves(
    engine: web::Data<DecisionEngine>,
    path: web::Path<String>,
) -> Result<impl Responder, LeaveError> {
    let leaves = engine.my_leaves(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse::from(leaves)))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    engine: web::Data<DecisionEngine>,
    path: web::Path<LeaveId>,
) -> Result<impl Responder, LeaveError> {
    let leave = engine.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(LeaveResponse::from(leave)))
}

/// Registers the `/leave` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            .service(web::resource("/apply").route(web::post().to(apply_leave)))
            .service(web::resource("/odleave/apply").route(web::post().to(apply_od_leave)))
            // numeric ids only; department names never are
            .service(
                web::resource("/hod/{leave_id:\\d+}").route(web::put().to(hod_decision)),
            )
            .service(web::resource("/hod/{department}").route(web::get().to(hod_leaves)))
            .service(web::resource("/principal").route(web::get().to(principal_leaves)))
            .service(web::resource("/principal/all").route(web::get().to(principal_all_leaves)))
            .service(
                web::resource("/principal/{leave_id:\\d+}")
                    .route(web::put().to(principal_decision)),
            )
            .service(
                web::resource("/withdraw/{leave_id:\\d+}").route(web::put().to(withdraw_leave)),
            )
            .service(web::resource("/summary/{employee_id}").route(web::get().to(leave_summary)))
            .service(web::resource("/my-leaves/{employee_id}").route(web::get().to(my_leaves)))
            .service(web::resource("/{leave_id:\\d+}").route(web::get().to(get_leave))),
    );
}
