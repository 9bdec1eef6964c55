use super::Engine;

use async_trait::async_trait;

use crate::{
    api::EstimateAPI,
    entities::{Coordinates, Estimate, VehicleType},
    error::{fare_computation_error, surge_computation_error, Error, ErrorKind},
};

#[async_trait]
impl EstimateAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn estimate(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        vehicle_type: VehicleType,
    ) -> Result<Estimate, Error> {
        let leg = self.matrix.fetch(origin, destination).await?.first_leg()?;

        let distance_km = leg.distance_meters / 1000.0;
        let duration_min = leg.duration_seconds / 60.0;

        let surge = self.pricing.surge().await.map_err(|err| match err.kind {
            ErrorKind::SurgeComputation => err,
            _ => surge_computation_error(err),
        })?;

        if !surge.is_finite() || surge < 0.0 {
            return Err(surge_computation_error(format!(
                "surge multiplier {} is not a valid multiplier",
                surge
            )));
        }

        let fare = self
            .pricing
            .fare(distance_km, &vehicle_type, surge)
            .map_err(|err| match err.kind {
                ErrorKind::FareComputation => err,
                _ => fare_computation_error(err),
            })?;

        tracing::info!(distance_km, duration_min, surge, fare, "estimate computed");

        Ok(Estimate::new(distance_km, duration_min, fare))
    }
}

#[cfg(test)]
fn engine_with(
    matrix: crate::test_support::CannedMatrix,
    pricing: crate::test_support::SpyPricing,
) -> (
    Engine,
    std::sync::Arc<crate::test_support::CannedMatrix>,
    std::sync::Arc<crate::test_support::SpyPricing>,
) {
    use std::sync::Arc;

    let matrix = Arc::new(matrix);
    let pricing = Arc::new(pricing);
    let engine = Engine::with_collaborators(matrix.clone(), pricing.clone());

    (engine, matrix, pricing)
}

#[test]
fn scenario_a_converts_units_and_prices_the_trip() {
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    let (engine, matrix, pricing) = engine_with(
        CannedMatrix::new(matrix_body("OK", 5000.0, 600.0)),
        SpyPricing::new(Ok(1.0), Ok(10.0)),
    );

    let estimate = block_on(engine.estimate(
        Coordinates::new(12.9716, 77.5946),
        Coordinates::new(12.9352, 77.6245),
        "car".into(),
    ))
    .unwrap();

    assert_eq!(estimate, Estimate::new(5.0, 10.0, 10.0));
    assert_eq!(matrix.calls(), 1);
    assert_eq!(pricing.fare_calls(), vec![(5.0, VehicleType::new("car"), 1.0)]);
}

#[test]
fn fare_is_passed_through_for_the_surge_actually_returned() {
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    let (engine, _, pricing) = engine_with(
        CannedMatrix::new(matrix_body("OK", 12345.0, 1337.0)),
        SpyPricing::new(Ok(1.75), Ok(421.37)),
    );

    let estimate = block_on(engine.estimate_between(0.0, 0.0, 0.1, 0.1, "suv")).unwrap();

    assert_eq!(estimate.distance_km, 12345.0 / 1000.0);
    assert_eq!(estimate.duration_min, 1337.0 / 60.0);
    assert_eq!(estimate.fare, 421.37);
    assert_eq!(
        pricing.fare_calls(),
        vec![(12.345, VehicleType::new("suv"), 1.75)]
    );
}

#[test]
fn scenario_b_provider_status_is_surfaced() {
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    let (engine, _, pricing) = engine_with(
        CannedMatrix::new(matrix_body("OVER_QUERY_LIMIT", 5000.0, 600.0)),
        SpyPricing::new(Ok(1.0), Ok(10.0)),
    );

    let err = block_on(engine.estimate_between(0.0, 0.0, 1.0, 1.0, "car")).unwrap_err();

    assert_eq!(err.kind, ErrorKind::ProviderStatus);
    assert!(err.to_string().contains("OVER_QUERY_LIMIT"));
    assert_eq!(pricing.surge_calls(), 0);
    assert!(pricing.fare_calls().is_empty());
}

#[test]
fn scenario_c_empty_rows_is_no_route() {
    use crate::test_support::{CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    let (engine, _, pricing) = engine_with(
        CannedMatrix::new(r#"{"rows": [], "status": "OK"}"#),
        SpyPricing::new(Ok(1.0), Ok(10.0)),
    );

    let err = block_on(engine.estimate_between(0.0, 0.0, 1.0, 1.0, "car")).unwrap_err();

    assert_eq!(err.kind, ErrorKind::NoRoute);
    assert!(pricing.fare_calls().is_empty());
}

#[test]
fn decode_failure_is_surfaced() {
    use crate::test_support::{CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    let (engine, _, _) = engine_with(
        CannedMatrix::new(r#"{"rows": "nope"}"#),
        SpyPricing::new(Ok(1.0), Ok(10.0)),
    );

    let err = block_on(engine.estimate_between(0.0, 0.0, 1.0, 1.0, "car")).unwrap_err();

    assert_eq!(err.kind, ErrorKind::Decode);
}

#[test]
fn surge_failure_skips_the_fare_model() {
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use std::error::Error as _;
    use tokio_test::block_on;

    let (engine, _, pricing) = engine_with(
        CannedMatrix::new(matrix_body("OK", 5000.0, 600.0)),
        SpyPricing::new(Err("demand data unavailable"), Ok(10.0)),
    );

    let err = block_on(engine.estimate_between(0.0, 0.0, 1.0, 1.0, "car")).unwrap_err();

    assert_eq!(err.kind, ErrorKind::SurgeComputation);
    assert!(err.source().is_some());
    assert_eq!(pricing.surge_calls(), 1);
    assert!(pricing.fare_calls().is_empty());
}

#[test]
fn invalid_surge_value_is_a_surge_error() {
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    for surge in [-0.5, f64::NAN, f64::INFINITY] {
        let (engine, _, pricing) = engine_with(
            CannedMatrix::new(matrix_body("OK", 5000.0, 600.0)),
            SpyPricing::new(Ok(surge), Ok(10.0)),
        );

        let err = block_on(engine.estimate_between(0.0, 0.0, 1.0, 1.0, "car")).unwrap_err();

        assert_eq!(err.kind, ErrorKind::SurgeComputation);
        assert!(pricing.fare_calls().is_empty());
    }
}

#[test]
fn fare_failure_is_surfaced() {
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use tokio_test::block_on;

    let (engine, _, pricing) = engine_with(
        CannedMatrix::new(matrix_body("OK", 5000.0, 600.0)),
        SpyPricing::new(Ok(2.0), Err("fare table offline")),
    );

    let err = block_on(engine.estimate_between(0.0, 0.0, 1.0, 1.0, "car")).unwrap_err();

    assert_eq!(err.kind, ErrorKind::FareComputation);
    assert!(err.to_string().contains("fare table offline"));
    assert_eq!(pricing.fare_calls().len(), 1);
}

#[tokio::test]
async fn estimates_through_the_http_client() {
    use crate::{config::Config, test_support::{matrix_body, spawn_provider}};
    use axum::http::StatusCode;

    let provider = spawn_provider(StatusCode::OK, &matrix_body("OK", 8200.0, 1260.0)).await;
    let mut config = Config::new("test-key");
    config.api_base = provider.base_url.clone();
    config.surge_multiplier = 2.0;

    let engine = Engine::new(&config).unwrap();
    let estimate = engine
        .estimate_between(12.9716, 77.5946, 12.9352, 77.6245, "car")
        .await
        .unwrap();

    // car: max(50, 25 + 12 * 8.2) * 2
    assert_eq!(estimate.distance_km, 8.2);
    assert_eq!(estimate.duration_min, 21.0);
    assert!((estimate.fare - 246.8).abs() < 1e-9);
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn scenario_d_missing_key_fails_before_any_request() {
    use crate::{config::Config, test_support::{matrix_body, spawn_provider}};
    use axum::http::StatusCode;

    let provider = spawn_provider(StatusCode::OK, &matrix_body("OK", 5000.0, 600.0)).await;

    let err = Config::from_lookup(|_| Err(std::env::VarError::NotPresent)).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);

    let mut config = Config::new("");
    config.api_base = provider.base_url.clone();

    let err = Engine::new(&config).err().unwrap();
    assert_eq!(err.kind, ErrorKind::Configuration);
    assert!(provider.requests().is_empty());
}
