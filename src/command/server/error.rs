use std::fmt;

use hyper::StatusCode;
use serde_json::json;
use tracing::debug;

use crate::{audit, policy};

#[derive(Debug, PartialEq)]
pub enum Error {
    Initialization(String),
    Execution(String),
    // mappable to classical HTTP responses
    PolicyInvalid(String),
    InvalidArgument(String),
    NotFound(String),
    Unsupported(String),
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Initialization(err) | Error::Execution(err) => write!(f, "{err}"),
            Error::PolicyInvalid(err) => write!(f, "Invalid policy: {err}"),
            Error::InvalidArgument(err) => write!(f, "Invalid argument: {err}"),
            Error::NotFound(err) => write!(f, "Not Found: {err}"),
            Error::Unsupported(err) => write!(f, "Unsupported: {err}"),
            Error::Internal(err) => write!(f, "Internal Server Error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<policy::Error> for Error {
    fn from(error: policy::Error) -> Self {
        debug!("Policy error: {error}");
        Error::PolicyInvalid(error.to_string())
    }
}

impl From<audit::Error> for Error {
    fn from(error: audit::Error) -> Self {
        match error {
            audit::Error::InvalidArgument(msg) => Error::InvalidArgument(msg),
            audit::Error::InvalidPattern(msg) => Error::Internal(msg),
        }
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::PolicyInvalid(_) | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unsupported(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::Initialization(_) | Error::Execution(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::PolicyInvalid(_) => "POLICY_INVALID",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Unsupported(_) => "UNSUPPORTED",
            Error::Initialization(_) | Error::Execution(_) | Error::Internal(_) => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }

    pub fn as_json(&self, request_id: Option<&String>) -> serde_json::Value {
        let message = match self {
            Error::Initialization(msg)
            | Error::Execution(msg)
            | Error::PolicyInvalid(msg)
            | Error::InvalidArgument(msg)
            | Error::NotFound(msg)
            | Error::Unsupported(msg)
            | Error::Internal(msg) => msg.as_str(),
        };

        if let Some(request_id) = request_id {
            json!({
                "errors": [{
                    "code": self.code(),
                    "message": message,
                    "detail": { "request_id": request_id }
                }]
            })
        } else {
            json!({
                "errors": [{
                    "code": self.code(),
                    "message": message,
                }]
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = Error::Initialization("Some init error".to_string());
        assert_eq!(format!("{error}"), "Some init error");

        let error = Error::PolicyInvalid("unexpected end of stream".to_string());
        assert_eq!(format!("{error}"), "Invalid policy: unexpected end of stream");

        let error = Error::InvalidArgument("bad timestamp".to_string());
        assert_eq!(format!("{error}"), "Invalid argument: bad timestamp");

        let error = Error::NotFound("Item not found".to_string());
        assert_eq!(format!("{error}"), "Not Found: Item not found");

        let error = Error::Unsupported("DELETE /audit".to_string());
        assert_eq!(format!("{error}"), "Unsupported: DELETE /audit");

        let error = Error::Internal("Unexpected error".to_string());
        assert_eq!(
            format!("{error}"),
            "Internal Server Error: Unexpected error"
        );
    }

    #[test]
    fn test_status_code_mapping() {
        let test_cases = vec![
            (
                StatusCode::BAD_REQUEST,
                "POLICY_INVALID",
                Error::PolicyInvalid(String::new()),
            ),
            (
                StatusCode::BAD_REQUEST,
                "INVALID_ARGUMENT",
                Error::InvalidArgument(String::new()),
            ),
            (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                Error::NotFound(String::new()),
            ),
            (
                StatusCode::METHOD_NOT_ALLOWED,
                "UNSUPPORTED",
                Error::Unsupported(String::new()),
            ),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                Error::Initialization(String::new()),
            ),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                Error::Execution(String::new()),
            ),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                Error::Internal(String::new()),
            ),
        ];

        for (expected_status, expected_code, error) in test_cases {
            assert_eq!(error.status_code(), expected_status);
            assert_eq!(error.code(), expected_code);
        }
    }

    #[test]
    fn test_as_json_without_request_id() {
        let error = Error::NotFound("unknown route: GET /nope".to_string());
        let json = error.as_json(None);

        assert_eq!(json["errors"][0]["code"], "NOT_FOUND");
        assert_eq!(json["errors"][0]["message"], "unknown route: GET /nope");
        assert!(json["errors"][0].get("detail").is_none());
    }

    #[test]
    fn test_as_json_with_request_id() {
        let error = Error::InvalidArgument("Missing parameter".to_string());
        let request_id = Some("req-12345".to_string());
        let json = error.as_json(request_id.as_ref());

        assert_eq!(json["errors"].as_array().unwrap().len(), 1);
        assert_eq!(json["errors"][0]["code"], "INVALID_ARGUMENT");
        assert_eq!(json["errors"][0]["message"], "Missing parameter");
        assert_eq!(json["errors"][0]["detail"]["request_id"], "req-12345");
    }

    #[test]
    fn test_from_policy_error() {
        let parse_error = policy::parse_security_details("<policies>").unwrap_err();
        let error: Error = parse_error.into();

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(error.code(), "POLICY_INVALID");
        assert!(matches!(error, Error::PolicyInvalid(msg) if msg.contains("well-formed")));
    }

    #[test]
    fn test_from_audit_error() {
        let error: Error = audit::Error::InvalidArgument("user id".to_string()).into();
        assert_eq!(error, Error::InvalidArgument("user id".to_string()));

        let error: Error = audit::Error::InvalidPattern("(".to_string()).into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
