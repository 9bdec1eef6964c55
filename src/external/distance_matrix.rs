use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    config::Config,
    entities::Coordinates,
    error::{
        configuration_error, decode_error, http_status_error, no_route_error,
        provider_status_error, transport_error, Error,
    },
};

const MATRIX_PATH: &str = "/maps/api/distancematrix/json";
const BODY_EXCERPT_LEN: usize = 512;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    #[serde(default)]
    pub origin_addresses: Vec<String>,
    #[serde(default)]
    pub destination_addresses: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Element {
    pub status: Option<String>,
    pub distance: Option<Measure>,
    pub duration: Option<Measure>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Measure {
    pub text: Option<String>,
    pub value: f64,
}

/// Distance and travel time of a single origin-destination pair, in provider units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Leg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl Response {
    pub fn from_body(body: &str) -> Result<Self, Error> {
        serde_json::from_str(body).map_err(|err| {
            tracing::error!(
                error = %err,
                body = excerpt(body),
                "failed to parse distance matrix response"
            );
            decode_error(err)
        })
    }

    /// Only the first element of the first row is consulted.
    pub fn first_leg(&self) -> Result<Leg, Error> {
        if self.status != "OK" {
            tracing::warn!(status = %self.status, "distance matrix returned an error status");
            return Err(provider_status_error(&self.status));
        }

        let element = self
            .rows
            .first()
            .and_then(|row| row.elements.first())
            .ok_or_else(|| {
                tracing::warn!("distance matrix returned no rows or elements");
                no_route_error(None)
            })?;

        if let Some(status) = element.status.as_deref().filter(|&s| s != "OK") {
            tracing::warn!(status, "distance matrix element has no route");
            return Err(no_route_error(Some(status)));
        }

        match (&element.distance, &element.duration) {
            (Some(distance), Some(duration)) => Ok(Leg {
                distance_meters: distance.value,
                duration_seconds: duration.value,
            }),
            _ => {
                tracing::warn!("distance matrix element is missing distance or duration");
                Err(no_route_error(None))
            }
        }
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
pub trait DistanceMatrix {
    async fn fetch(&self, origin: Coordinates, destination: Coordinates)
        -> Result<Response, Error>;
}

pub type DynDistanceMatrix = Arc<dyn DistanceMatrix + Send + Sync>;

/// distancematrix.ai client. The inner `reqwest::Client` pools connections
/// for every caller sharing this value.
pub struct Client {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl Client {
    pub fn new(config: &Config) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(configuration_error("distance matrix API key is empty"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().map_err(|err| {
            tracing::error!(error = %err, "failed to build HTTP client");
            configuration_error("failed to build HTTP client")
        })?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl DistanceMatrix for Client {
    #[tracing::instrument(skip(self))]
    async fn fetch(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> Result<Response, Error> {
        let url = format!("{}{}", self.api_base, MATRIX_PATH);
        let origins: String = origin.into();
        let destinations: String = destination.into();

        tracing::debug!(%origins, %destinations, "requesting distance matrix");

        let res = self
            .http
            .get(url)
            .query(&[("origins", origins)])
            .query(&[("destinations", destinations)])
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| {
                let err = err.without_url();
                tracing::error!(error = %err, "distance matrix request failed");
                transport_error(err)
            })?;

        let status_code = res.status();
        let body = res.text().await?;

        if !status_code.is_success() {
            tracing::error!(
                status = status_code.as_u16(),
                body = excerpt(&body),
                "distance matrix returned a non-success HTTP status"
            );
            return Err(http_status_error(status_code.as_u16()));
        }

        Response::from_body(&body)
    }
}

#[cfg(test)]
const SCENARIO_A: &str = r#"{
    "destination_addresses": ["MG Road, Bengaluru"],
    "origin_addresses": ["Indiranagar, Bengaluru"],
    "rows": [{
        "elements": [{
            "distance": {"text": "5.0 km", "value": 5000},
            "duration": {"text": "10 mins", "value": 600},
            "status": "OK"
        }]
    }],
    "status": "OK"
}"#;

#[test]
fn first_leg_reads_first_element() {
    let response = Response::from_body(SCENARIO_A).unwrap();

    assert_eq!(
        response.first_leg().unwrap(),
        Leg {
            distance_meters: 5000.0,
            duration_seconds: 600.0
        }
    );
}

#[test]
fn only_first_row_and_element_are_consulted() {
    let body = r#"{
        "rows": [
            {"elements": [
                {"distance": {"value": 1200.5}, "duration": {"value": 90}},
                {"distance": {"value": 99999}, "duration": {"value": 99999}}
            ]},
            {"elements": [{"distance": {"value": 7}, "duration": {"value": 7}}]}
        ],
        "status": "OK"
    }"#;

    let leg = Response::from_body(body).unwrap().first_leg().unwrap();

    assert_eq!(leg.distance_meters, 1200.5);
    assert_eq!(leg.duration_seconds, 90.0);
}

#[test]
fn non_ok_status_is_a_provider_status_error() {
    use crate::error::ErrorKind;

    // rows are still present, status wins
    let mut body: serde_json::Value = serde_json::from_str(SCENARIO_A).unwrap();
    body["status"] = "OVER_QUERY_LIMIT".into();
    let err = Response::from_body(&body.to_string())
        .unwrap()
        .first_leg()
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::ProviderStatus);
    assert_eq!(err.provider_status(), Some("OVER_QUERY_LIMIT"));

    let err = Response::from_body(r#"{"status": "REQUEST_DENIED"}"#)
        .unwrap()
        .first_leg()
        .unwrap_err();

    assert_eq!(err.provider_status(), Some("REQUEST_DENIED"));
}

#[test]
fn empty_rows_or_elements_are_no_route() {
    use crate::error::ErrorKind;

    for body in [
        r#"{"rows": [], "status": "OK"}"#,
        r#"{"status": "OK"}"#,
        r#"{"rows": [{"elements": []}], "status": "OK"}"#,
    ] {
        let err = Response::from_body(body).unwrap().first_leg().unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoRoute, "{}", body);
    }
}

#[test]
fn element_without_route_is_no_route() {
    use crate::error::ErrorKind;

    let body = r#"{"rows": [{"elements": [{"status": "ZERO_RESULTS"}]}], "status": "OK"}"#;
    let err = Response::from_body(body).unwrap().first_leg().unwrap_err();

    assert_eq!(err.kind, ErrorKind::NoRoute);
    assert!(err.message.contains("ZERO_RESULTS"));
}

#[test]
fn malformed_bodies_are_decode_errors() {
    use crate::error::ErrorKind;

    for body in [
        "<html>502 Bad Gateway</html>",
        r#"{"rows": []}"#,
        r#"{"rows": [{"elements": [{"distance": {"value": "far"}}]}], "status": "OK"}"#,
    ] {
        let err = Response::from_body(body).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Decode, "{}", body);
    }
}

#[test]
fn empty_key_is_rejected_before_any_request() {
    use crate::error::ErrorKind;

    let err = Client::new(&Config::new("")).err().unwrap();
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[tokio::test]
async fn sends_coordinates_and_key_as_query() {
    use crate::test_support::spawn_provider;
    use axum::http::StatusCode;

    let provider = spawn_provider(StatusCode::OK, SCENARIO_A).await;
    let mut config = Config::new("test-key");
    config.api_base = provider.base_url.clone();

    let client = Client::new(&config).unwrap();
    let response = client
        .fetch(
            Coordinates::new(12.9715987, 77.5945627),
            Coordinates::new(12.97, 77.6),
        )
        .await
        .unwrap();

    assert_eq!(response.status, "OK");
    assert_eq!(response.origin_addresses, vec!["Indiranagar, Bengaluru"]);

    let requests = provider.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["origins"], "12.971599,77.594563");
    assert_eq!(requests[0]["destinations"], "12.970000,77.600000");
    assert_eq!(requests[0]["key"], "test-key");
}

#[tokio::test]
async fn malformed_body_from_provider_is_a_decode_error() {
    use crate::error::ErrorKind;
    use crate::test_support::spawn_provider;
    use axum::http::StatusCode;

    let provider = spawn_provider(StatusCode::OK, "not json at all").await;
    let mut config = Config::new("test-key");
    config.api_base = provider.base_url.clone();

    let err = Client::new(&config)
        .unwrap()
        .fetch(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Decode);
}

#[tokio::test]
async fn http_failure_status_is_a_transport_error() {
    use crate::error::ErrorKind;
    use crate::test_support::spawn_provider;
    use axum::http::StatusCode;

    let provider = spawn_provider(StatusCode::SERVICE_UNAVAILABLE, "upstream down").await;
    let mut config = Config::new("test-key");
    config.api_base = provider.base_url.clone();

    let err = Client::new(&config)
        .unwrap()
        .fetch(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Transport);
    assert!(err.message.contains("503"));
}

#[tokio::test]
async fn unreachable_provider_is_a_transport_error() {
    use crate::error::ErrorKind;
    use crate::test_support::closed_port_url;

    let mut config = Config::new("test-key");
    config.api_base = closed_port_url();

    let err = Client::new(&config)
        .unwrap()
        .fetch(Coordinates::new(0.0, 0.0), Coordinates::new(1.0, 1.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Transport);
    assert!(!err.to_string().contains("test-key"));
}
