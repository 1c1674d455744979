use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure of a leave workflow operation. Every variant maps to one HTTP
/// status and is rendered as `{"message": ...}`.
#[derive(Debug, Display, PartialEq, Eq)]
pub enum LeaveError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Unauthorized(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    InvalidState(String),
    /// Storage or other genuine fault. The detail is logged, never returned.
    #[display(fmt = "Server error")]
    Internal(String),
}

impl std::error::Error for LeaveError {}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) | LeaveError::InvalidState(_) => StatusCode::BAD_REQUEST,
            LeaveError::NotFound(_) => StatusCode::NOT_FOUND,
            LeaveError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            LeaveError::Forbidden(_) => StatusCode::FORBIDDEN,
            LeaveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

/// Storage-layer failure.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    /// A persisted value could not be mapped back onto the domain model.
    #[display(fmt = "corrupt record: {}", _0)]
    Corrupt(String),
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(err) => Some(err),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Database(value)
    }
}

impl From<StoreError> for LeaveError {
    fn from(value: StoreError) -> Self {
        tracing::error!(error = %value, "Leave store failure");
        LeaveError::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn statuses_follow_error_taxonomy() {
        let cases = [
            (LeaveError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (LeaveError::InvalidState("x".into()), StatusCode::BAD_REQUEST),
            (LeaveError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (LeaveError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (LeaveError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (LeaveError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error:?}");
        }
    }

    #[actix_web::test]
    async fn internal_details_stay_out_of_the_body() {
        let response = LeaveError::Internal("connection refused".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "message": "Server error" }));
    }
}
