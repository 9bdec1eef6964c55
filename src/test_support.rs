//! Test doubles for the distance matrix provider and the pricing model.

use async_trait::async_trait;
use axum::{extract::Query, http::StatusCode, routing::get, Router};
use std::collections::HashMap;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::{
    entities::{Coordinates, VehicleType},
    error::{fare_computation_error, surge_computation_error, Error},
    external::distance_matrix::{DistanceMatrix, Response},
    pricing::PricingProvider,
};

type Requests = Arc<Mutex<Vec<HashMap<String, String>>>>;

/// Provider body with a single element.
pub fn matrix_body(status: &str, distance_meters: f64, duration_seconds: f64) -> String {
    serde_json::json!({
        "destination_addresses": ["destination"],
        "origin_addresses": ["origin"],
        "rows": [{
            "elements": [{
                "distance": { "text": "", "value": distance_meters },
                "duration": { "text": "", "value": duration_seconds },
                "status": "OK"
            }]
        }],
        "status": status,
    })
    .to_string()
}

/// Local HTTP peer answering every distance matrix request with a fixed response.
pub struct StubProvider {
    pub base_url: String,
    requests: Requests,
}

impl StubProvider {
    /// Query parameters of every request received so far.
    pub fn requests(&self) -> Vec<HashMap<String, String>> {
        self.requests.lock().unwrap().clone()
    }
}

pub async fn spawn_provider(status: StatusCode, body: &str) -> StubProvider {
    let requests: Requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();
    let body = body.to_string();

    let app = Router::new().route(
        "/maps/api/distancematrix/json",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let recorded = recorded.clone();
            let body = body.clone();
            async move {
                recorded.lock().unwrap().push(params);
                (status, body)
            }
        }),
    );

    StubProvider {
        base_url: spawn_app(app),
        requests,
    }
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub fn spawn_app(app: Router) -> String {
    let server = axum::Server::bind(&SocketAddr::from(([127, 0, 0, 1], 0)))
        .serve(app.into_make_service());
    let base_url = format!("http://{}", server.local_addr());

    tokio::spawn(server);

    base_url
}

/// Base URL of a port nothing listens on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{}", addr)
}

/// `DistanceMatrix` decoding a canned body, without any network.
pub struct CannedMatrix {
    body: String,
    calls: AtomicUsize,
}

impl CannedMatrix {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DistanceMatrix for CannedMatrix {
    async fn fetch(&self, _: Coordinates, _: Coordinates) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Response::from_body(&self.body)
    }
}

/// `PricingProvider` returning fixed outcomes and recording its calls.
pub struct SpyPricing {
    surge: Result<f64, &'static str>,
    fare: Result<f64, &'static str>,
    surge_calls: AtomicUsize,
    fare_calls: Mutex<Vec<(f64, VehicleType, f64)>>,
}

impl SpyPricing {
    pub fn new(surge: Result<f64, &'static str>, fare: Result<f64, &'static str>) -> Self {
        Self {
            surge,
            fare,
            surge_calls: AtomicUsize::new(0),
            fare_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn surge_calls(&self) -> usize {
        self.surge_calls.load(Ordering::SeqCst)
    }

    pub fn fare_calls(&self) -> Vec<(f64, VehicleType, f64)> {
        self.fare_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PricingProvider for SpyPricing {
    async fn surge(&self) -> Result<f64, Error> {
        self.surge_calls.fetch_add(1, Ordering::SeqCst);
        self.surge.map_err(|cause| surge_computation_error(cause))
    }

    fn fare(
        &self,
        distance_km: f64,
        vehicle_type: &VehicleType,
        surge: f64,
    ) -> Result<f64, Error> {
        self.fare_calls
            .lock()
            .unwrap()
            .push((distance_km, vehicle_type.clone(), surge));
        self.fare.map_err(|cause| fare_computation_error(cause))
    }
}
