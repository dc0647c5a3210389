//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn domain failures into consistent JSON responses and status
//! codes.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal("Internal server error");
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        // Do not leak implementation details to clients.
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::Value;

    #[rstest]
    #[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
    #[case(Error::unauthorized("who"), StatusCode::UNAUTHORIZED)]
    #[case(Error::forbidden("no"), StatusCode::FORBIDDEN)]
    #[case(Error::not_found("gone"), StatusCode::NOT_FOUND)]
    #[case(Error::conflict("clash"), StatusCode::CONFLICT)]
    #[case(Error::service_unavailable("later"), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
    fn each_code_maps_to_its_status(#[case] error: Error, #[case] expected: StatusCode) {
        assert_eq!(error.status_code(), expected);
    }

    #[actix_web::test]
    async fn internal_errors_are_redacted_in_the_body() {
        let error = Error::internal("secret database detail");
        let response = error.error_response();
        let body = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body bytes");
        let value: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(
            value.get("message").and_then(Value::as_str),
            Some("Internal server error")
        );
    }

    #[actix_web::test]
    async fn client_errors_keep_their_message_and_details() {
        let error = Error::invalid_request("name must not be empty")
            .with_details(serde_json::json!({"field": "name"}));
        let response = error.error_response();
        let body = actix_web::body::to_bytes(response.into_body())
            .await
            .expect("body bytes");
        let value: Value = serde_json::from_slice(&body).expect("json body");
        assert_eq!(
            value.get("message").and_then(Value::as_str),
            Some("name must not be empty")
        );
        assert_eq!(value["details"]["field"], "name");
    }
}
