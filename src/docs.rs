use crate::api::leave_request::{
    ApplyLeave, ApplyOdLeave, DecisionView, HodDecisionBody, LeaveListResponse,
    LeaveMessageResponse, LeaveResponse, LeaveSummaryResponse, MonthlyLeaveView,
    PrincipalDecisionBody, WithdrawBody, YearlyLeaveView,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus ERP Leave API",
        version = "1.0.0",
        description = r#"
## College ERP: Leave and OD-leave approval

Requests move through a two-stage review:

- **HOD** reviews requests from their own department
- **Principal** gives the final decision

Which requests skip HOD review depends on the category:

- *Regular leave*: everyone except Faculty and class coordinators (cc) goes straight to the Principal
- *OD leave*: only HOD and Staff requesters go straight to the Principal; everyone else, the Principal included, waits for HOD review

Approved regular leave is booked into a per-employee monthly and yearly ledger.

### 📦 Response Format
- JSON bodies; every failure is `{"message": "..."}`
- `400` invalid input or illegal transition, `401` wrong reviewer role,
  `403` wrong department or requester, `404` unknown id

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::apply_leave,
        crate::api::leave_request::apply_od_leave,
        crate::api::leave_request::hod_leaves,
        crate::api::leave_request::hod_decision,
        crate::api::leave_request::principal_leaves,
        crate::api::leave_request::principal_all_leaves,
        crate::api::leave_request::principal_decision,
        crate::api::leave_request::withdraw_leave,
        crate::api::leave_request::leave_summary,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::get_leave
    ),
    components(
        schemas(
            ApplyLeave,
            ApplyOdLeave,
            HodDecisionBody,
            PrincipalDecisionBody,
            WithdrawBody,
            DecisionView,
            LeaveResponse,
            LeaveListResponse,
            LeaveMessageResponse,
            LeaveSummaryResponse,
            MonthlyLeaveView,
            YearlyLeaveView
        )
    ),
    tags(
        (name = "Leave", description = "Leave and OD-leave approval workflow"),
    )
)]
pub struct ApiDoc;
