use crate::{api::leave_request, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, web};
use serde_json::json;

/// Helper to build a per-IP limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("milliseconds_per_request and burst_size are non-zero");
    Governor::new(&cfg)
}

/// Malformed JSON bodies answer with the same `{message}` shape as every
/// other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let message = format!("Invalid request body: {err}");
        InternalError::from_response(err, HttpResponse::BadRequest().json(json!({ "message": message })))
            .into()
    })
}

/// Path ids that do not fit a leave id can never match a request.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        InternalError::from_response(
            err,
            HttpResponse::NotFound().json(json!({ "message": "Leave request not found" })),
        )
        .into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let leave_limiter = build_limiter(config.rate_leave_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(leave_limiter) // rate limiting
            .app_data(json_config())
            .app_data(path_config())
            .configure(leave_request::configure),
    );
}
