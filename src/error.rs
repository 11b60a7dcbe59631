use std::fmt;
use std::time::Duration;

use miette::Diagnostic;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use time::OffsetDateTime;
use tracing_error::SpanTrace;

use crate::utils::{
    date_format::lexoffice_datetime_format_option, serde_helpers::null_as_default,
};

/// A single issue of a [`LegacyErrorResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(rename = "i18nKey", deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub r#type: String,
}

/// The error format used by the older endpoints (contacts, files, profile).
///
/// ```json
/// {
///     "requestId": "3fb21ee4-ad26-4e2f-82af-a1197af02d08",
///     "IssueList": [
///         {"i18nKey": "invalid_value", "source": "company and person", "type": "validation_failure"},
///         {"i18nKey": "missing_entity", "source": "company.name", "type": "validation_failure"}
///     ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyErrorResponse {
    #[serde(rename = "requestId", deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(rename = "IssueList", deserialize_with = "null_as_default")]
    pub issue_list: Vec<Issue>,
}

impl fmt::Display for LegacyErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issue_list.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", issue.key, issue.source)?;
            if !issue.r#type.is_empty() {
                write!(f, " ({})", issue.r#type)?;
            }
        }
        Ok(())
    }
}

/// A field level violation of an [`ErrorResponse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetail {
    #[serde(deserialize_with = "null_as_default")]
    pub violation: String,
    #[serde(deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
}

/// The regular error format used by the newer endpoints (invoices, event subscriptions).
///
/// ```json
/// {
///     "timestamp": "2017-05-11T17:12:31.233+02:00",
///     "status": 406,
///     "error": "Not Acceptable",
///     "path": "/v1/invoices",
///     "traceId": "90d78d0777be",
///     "message": "Validation failed for request. Please see details list for specific causes.",
///     "details": [
///         {
///             "violation": "NOTNULL",
///             "field": "lineItems[0].unitPrice.taxRatePercentage",
///             "message": "darf nicht leer sein"
///         }
///     ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ErrorResponse {
    #[serde(
        with = "lexoffice_datetime_format_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(deserialize_with = "null_as_default")]
    pub trace_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub details: Vec<ErrorDetail>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if self.details.is_empty() {
            return Ok(());
        }

        f.write_str(" (")?;
        for (i, detail) in self.details.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", detail.field, detail.message)?;
            if !detail.violation.is_empty() {
                write!(f, " ({})", detail.violation)?;
            }
        }
        f.write_str(")")
    }
}

/// A decoded error body returned by the API alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorPayload {
    Legacy(LegacyErrorResponse),
    Regular(ErrorResponse),
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy(response) => response.fmt(f),
            Self::Regular(response) => response.fmt(f),
        }
    }
}

impl From<LegacyErrorResponse> for ErrorPayload {
    fn from(response: LegacyErrorResponse) -> Self {
        Self::Legacy(response)
    }
}

impl From<ErrorResponse> for ErrorPayload {
    fn from(response: ErrorResponse) -> Self {
        Self::Regular(response)
    }
}

/// An error body shape an endpoint family answers with on failure.
pub trait ApiErrorBody: DeserializeOwned + fmt::Display + Into<ErrorPayload> {}

impl ApiErrorBody for LegacyErrorResponse {}

impl ApiErrorBody for ErrorResponse {}

/// Errors that can occur when interacting with the lexoffice API.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("error making request: {0}")]
    #[diagnostic(
        code(lexoffice_rs::request_error),
        help("Check your network connection and lexoffice API availability")
    )]
    Request(#[source] reqwest::Error),

    #[error("request did not complete within {0:?}")]
    #[diagnostic(
        code(lexoffice_rs::timeout),
        help("Increase the client timeout or lower the configured rate")
    )]
    Timeout(Duration),

    #[error("error decoding response: {0}")]
    #[diagnostic(
        code(lexoffice_rs::deserialization_error),
        help("The API returned data in an unexpected format")
    )]
    DeserializationError(#[source] serde_json::Error, Option<String>),

    /// The API answered with a non-2xx status. `payload` holds the decoded error body
    /// when it matched the shape expected for the endpoint.
    #[error("unexpected status {status} from {url}")]
    #[diagnostic(
        code(lexoffice_rs::unexpected_status),
        help("Review the error details returned by the lexoffice API")
    )]
    Status {
        status: StatusCode,
        url: String,
        payload: Option<ErrorPayload>,
        response_body: Option<String>,
    },

    #[error("error writing response body: {0}")]
    #[diagnostic(code(lexoffice_rs::io_error))]
    Io(#[source] std::io::Error),

    #[error("endpoint could not be parsed as a URL")]
    #[diagnostic(
        code(lexoffice_rs::invalid_endpoint),
        help("Check that the API endpoint URL is correctly formatted")
    )]
    InvalidEndpoint,

    #[error("invalid base url: {0}")]
    #[diagnostic(
        code(lexoffice_rs::invalid_base_url),
        help("The base url must be an absolute http(s) url such as https://api.lexoffice.io")
    )]
    InvalidBaseUrl(String),

    #[error("access token is not a valid header value")]
    #[diagnostic(
        code(lexoffice_rs::invalid_token),
        help("Make sure the API key contains no control characters or line breaks")
    )]
    InvalidToken,

    #[error("invalid rate of {0} operations per second")]
    #[diagnostic(
        code(lexoffice_rs::invalid_rate),
        help("The rate must be at least 1 and at most 1000000000 operations per second")
    )]
    InvalidRate(u32),

    #[error("environment variable {0} is not set or invalid")]
    #[diagnostic(code(lexoffice_rs::missing_env))]
    MissingEnv(&'static str),

    /// An endpoint operation failed. `details` is the rendered error payload, empty
    /// when the API did not answer with a recognizable error body.
    #[error("{operation} ({details}): {source}")]
    #[diagnostic(code(lexoffice_rs::operation_failed))]
    Operation {
        operation: &'static str,
        details: String,
        #[source]
        source: Box<Error>,
        span_trace: SpanTrace,
    },
}

impl Error {
    /// Wraps the error with the name of the failed operation and the rendered error payload.
    #[must_use]
    pub fn context(self, operation: &'static str) -> Self {
        let details = self.payload().map(ToString::to_string).unwrap_or_default();
        error!(operation, error = %self, "lexoffice operation failed");
        Self::Operation {
            operation,
            details,
            source: Box::new(self),
            span_trace: SpanTrace::capture(),
        }
    }

    /// The decoded error payload, if the API returned one.
    #[must_use]
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Status { payload, .. } => payload.as_ref(),
            Self::Operation { source, .. } => source.payload(),
            _ => None,
        }
    }

    /// The HTTP status of a failed response.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status(),
            Self::Operation { source, .. } => source.status_code(),
            _ => None,
        }
    }

    /// The span trace captured when an operation failure was wrapped.
    #[must_use]
    pub fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            Self::Operation { span_trace, .. } => Some(span_trace),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::DeserializationError(e, None)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Type alias for results from this crate.
pub type Result<O> = std::result::Result<O, Error>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn issue(key: &str, source: &str, r#type: &str) -> Issue {
        Issue {
            key: key.to_string(),
            source: source.to_string(),
            r#type: r#type.to_string(),
        }
    }

    #[test]
    fn legacy_renders_single_issue() {
        let response = LegacyErrorResponse {
            request_id: "75d4dad6".to_string(),
            issue_list: vec![issue(
                "missing_entity",
                "company.taxNumber",
                "validation_failure",
            )],
        };
        assert_eq!(
            response.to_string(),
            "missing_entity: company.taxNumber (validation_failure)"
        );
    }

    #[test]
    fn legacy_joins_issues_and_omits_empty_type() {
        let response = LegacyErrorResponse {
            request_id: String::new(),
            issue_list: vec![
                issue("invalid_value", "company and person", "validation_failure"),
                issue("missing_entity", "company.name", ""),
            ],
        };
        assert_eq!(
            response.to_string(),
            "invalid_value: company and person (validation_failure), missing_entity: company.name"
        );
    }

    #[test]
    fn legacy_without_issues_renders_empty() {
        assert_eq!(LegacyErrorResponse::default().to_string(), "");
    }

    #[test]
    fn regular_renders_message_and_details() {
        let response = ErrorResponse {
            message: "Validation failed".to_string(),
            details: vec![ErrorDetail {
                violation: "NOTNULL".to_string(),
                field: "x".to_string(),
                message: "darf nicht leer sein".to_string(),
            }],
            ..ErrorResponse::default()
        };
        assert_eq!(
            response.to_string(),
            "Validation failed (x: darf nicht leer sein (NOTNULL))"
        );
    }

    #[test]
    fn regular_without_details_renders_message_only() {
        let response = ErrorResponse {
            message: "Not Found".to_string(),
            ..ErrorResponse::default()
        };
        assert_eq!(response.to_string(), "Not Found");
    }

    #[test]
    fn regular_omits_empty_violation() {
        let response = ErrorResponse {
            message: "Validation failed".to_string(),
            details: vec![
                ErrorDetail {
                    violation: String::new(),
                    field: "a".to_string(),
                    message: "first".to_string(),
                },
                ErrorDetail {
                    violation: "NOTNULL".to_string(),
                    field: "b".to_string(),
                    message: "second".to_string(),
                },
            ],
            ..ErrorResponse::default()
        };
        assert_eq!(
            response.to_string(),
            "Validation failed (a: first, b: second (NOTNULL))"
        );
    }

    #[test]
    fn regular_response_deserializes() {
        let response: ErrorResponse = serde_json::from_value(json!({
            "timestamp": "2017-05-11T17:12:31.233+02:00",
            "status": 406,
            "error": "Not Acceptable",
            "path": "/v1/invoices",
            "traceId": "90d78d0777be",
            "message": "Validation failed for request. Please see details list for specific causes.",
            "details": [
                {
                    "violation": "NOTNULL",
                    "field": "lineItems[0].unitPrice.taxRatePercentage",
                    "message": "darf nicht leer sein"
                }
            ]
        }))
        .unwrap();

        assert_eq!(response.status, 406);
        assert_eq!(response.trace_id, "90d78d0777be");
        assert_eq!(response.timestamp.unwrap().millisecond(), 233);
        assert_eq!(response.details.len(), 1);
    }

    #[test]
    fn legacy_tolerates_null_fields() {
        let response: LegacyErrorResponse = serde_json::from_str(
            r#"{"requestId":null,"IssueList":[{"i18nKey":"missing_entity","source":"name","type":null}]}"#,
        )
        .unwrap();
        assert!(response.request_id.is_empty());
        assert_eq!(response.to_string(), "missing_entity: name");

        let empty: LegacyErrorResponse =
            serde_json::from_str(r#"{"requestId":"x","IssueList":null}"#).unwrap();
        assert!(empty.issue_list.is_empty());
    }

    #[test]
    fn regular_tolerates_null_fields() {
        let response: ErrorResponse = serde_json::from_str(
            r#"{"timestamp":null,"status":null,"traceId":null,"message":"Not Found","details":null}"#,
        )
        .unwrap();
        assert_eq!(response.status, 0);
        assert!(response.details.is_empty());
        assert_eq!(response.to_string(), "Not Found");

        let detail: ErrorResponse = serde_json::from_str(
            r#"{"message":"Validation failed","details":[{"violation":null,"field":"x","message":"darf nicht leer sein"}]}"#,
        )
        .unwrap();
        assert_eq!(
            detail.to_string(),
            "Validation failed (x: darf nicht leer sein)"
        );
    }

    #[test]
    fn mismatched_shape_leaves_fields_empty() {
        let response: ErrorResponse = serde_json::from_value(json!({
            "requestId": "3fb21ee4",
            "IssueList": []
        }))
        .unwrap();
        assert_eq!(response, ErrorResponse::default());
        assert_eq!(response.to_string(), "");
    }

    #[test]
    fn context_embeds_rendered_payload() {
        let inner = Error::Status {
            status: StatusCode::BAD_REQUEST,
            url: "http://localhost/v1/contacts".to_string(),
            payload: Some(ErrorPayload::Legacy(LegacyErrorResponse {
                request_id: String::new(),
                issue_list: vec![issue("missing_entity", "company.name", "validation_failure")],
            })),
            response_body: None,
        };

        let error = inner.context("error creating contact");
        assert_eq!(
            error.to_string(),
            "error creating contact (missing_entity: company.name (validation_failure)): \
             unexpected status 400 Bad Request from http://localhost/v1/contacts"
        );
        assert_eq!(error.status_code(), Some(StatusCode::BAD_REQUEST));
        assert!(error.span_trace().is_some());
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn context_without_payload_has_empty_details() {
        let error = Error::InvalidEndpoint.context("error getting contact");
        assert_eq!(
            error.to_string(),
            "error getting contact (): endpoint could not be parsed as a URL"
        );
        assert!(error.payload().is_none());
    }
}
