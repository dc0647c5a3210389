//! Shared validation helpers for inbound HTTP adapters.

use serde_json::json;

use crate::domain::AttributeId;
use crate::domain::Error;

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidId,
    InvalidFlag,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::InvalidFlag => "invalid_flag",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

fn invalid_value_error(
    field: FieldName,
    code: ErrorCode,
    value: &str,
    message: String,
) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "value": value,
        "code": code.as_str(),
    }))
}

/// Parse a comma-separated id list query parameter.
///
/// Any non-numeric token fails the whole request with a 400 carrying the
/// offending value, rather than being silently dropped.
pub(crate) fn parse_id_list(raw: &str, field: FieldName) -> Result<Vec<AttributeId>, Error> {
    raw.split(',')
        .map(str::trim)
        .map(|token| {
            token.parse::<AttributeId>().map_err(|_| {
                invalid_value_error(
                    field,
                    ErrorCode::InvalidId,
                    token,
                    format!("{} must be a comma-separated list of ids", field.as_str()),
                )
            })
        })
        .collect()
}

/// Parse a `0`/`1` query flag.
pub(crate) fn parse_flag(raw: &str, field: FieldName) -> Result<bool, Error> {
    match raw {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(invalid_value_error(
            field,
            ErrorCode::InvalidFlag,
            other,
            format!("{} must be 0 or 1", field.as_str()),
        )),
    }
}
