use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt;

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Decode,
    ProviderStatus,
    NoRoute,
    SurgeComputation,
    FareComputation,
    InvalidInput,
}

#[derive(Debug)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: i32,
    pub message: String,
    provider_status: Option<String>,
    source: Option<Cause>,
}

impl Error {
    fn new(kind: ErrorKind, code: i32, message: String) -> Self {
        Self {
            kind,
            code,
            message,
            provider_status: None,
            source: None,
        }
    }

    fn with_source(mut self, source: impl Into<Cause>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The literal `status` reported by the provider, for `ProviderStatus` errors.
    pub fn provider_status(&self) -> Option<&str> {
        self.provider_status.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        configuration_error("environment variable error").with_source(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        transport_error(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        decode_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.kind {
            ErrorKind::Transport | ErrorKind::Decode | ErrorKind::ProviderStatus => {
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            ErrorKind::NoRoute => (StatusCode::UNPROCESSABLE_ENTITY, self.message.clone()),
            ErrorKind::InvalidInput => (StatusCode::BAD_REQUEST, self.message.clone()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            ),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub fn configuration_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Configuration, 1, message.into())
}

pub fn transport_error(err: reqwest::Error) -> Error {
    Error::new(ErrorKind::Transport, 3, "provider request failed".into())
        .with_source(err.without_url())
}

pub fn http_status_error(status_code: u16) -> Error {
    Error::new(
        ErrorKind::Transport,
        3,
        format!("provider responded with HTTP {}", status_code),
    )
}

pub fn provider_status_error(status: &str) -> Error {
    let mut err = Error::new(
        ErrorKind::ProviderStatus,
        4,
        format!("provider returned status {}", status),
    );
    err.provider_status = Some(status.to_string());
    err
}

pub fn decode_error(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Decode, 6, "failed to parse provider response".into()).with_source(err)
}

pub fn surge_computation_error(cause: impl Into<Cause>) -> Error {
    Error::new(
        ErrorKind::SurgeComputation,
        7,
        "failed to calculate surge".into(),
    )
    .with_source(cause)
}

pub fn fare_computation_error(cause: impl Into<Cause>) -> Error {
    Error::new(
        ErrorKind::FareComputation,
        8,
        "failed to calculate fare".into(),
    )
    .with_source(cause)
}

pub fn invalid_input_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidInput, 101, message.into())
}

pub fn no_route_error(detail: Option<&str>) -> Error {
    let message = match detail {
        Some(status) => format!("no distance or duration data found ({})", status),
        None => "no distance or duration data found".into(),
    };

    Error::new(ErrorKind::NoRoute, 102, message)
}

#[test]
fn provider_status_is_preserved() {
    let err = provider_status_error("OVER_QUERY_LIMIT");

    assert_eq!(err.kind, ErrorKind::ProviderStatus);
    assert_eq!(err.provider_status(), Some("OVER_QUERY_LIMIT"));
    assert!(err.to_string().contains("OVER_QUERY_LIMIT"));
}

#[test]
fn wrapped_cause_is_exposed() {
    use std::error::Error as _;

    let err = surge_computation_error("demand data unavailable");

    assert_eq!(err.kind, ErrorKind::SurgeComputation);
    assert_eq!(err.source().unwrap().to_string(), "demand data unavailable");
    assert_eq!(
        err.to_string(),
        "failed to calculate surge: demand data unavailable"
    );
}

#[test]
fn decode_failures_convert_from_serde() {
    let err: Error = serde_json::from_str::<serde_json::Value>("{not json")
        .unwrap_err()
        .into();

    assert_eq!(err.kind, ErrorKind::Decode);
    assert_eq!(err.code, 6);
}

#[test]
fn response_status_codes() {
    assert_eq!(
        no_route_error(None).into_response().status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        provider_status_error("ZERO_RESULTS").into_response().status(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        configuration_error("missing key").into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        invalid_input_error("bad body").into_response().status(),
        StatusCode::BAD_REQUEST
    );
}
