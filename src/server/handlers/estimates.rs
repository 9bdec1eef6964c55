use axum::extract::{
    rejection::{JsonRejection, QueryRejection},
    Extension, Json, Query,
};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::entities::{Coordinates, Estimate, VehicleType};
use crate::error::{invalid_input_error, Error};

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    origin: Coordinates,
    destination: Coordinates,
    vehicle_type: VehicleType,
}

#[derive(Serialize, Deserialize)]
pub struct FindParams {
    origin_lat: f64,
    origin_lng: f64,
    destination_lat: f64,
    destination_lng: f64,
    vehicle_type: String,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    params: Result<Json<CreateParams>, JsonRejection>,
) -> Result<Json<Estimate>, Error> {
    let Json(params) = params.map_err(|rejection| invalid_input_error(rejection.to_string()))?;

    let estimate = api
        .estimate(params.origin, params.destination, params.vehicle_type)
        .await?;

    Ok(estimate.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    params: Result<Query<FindParams>, QueryRejection>,
) -> Result<Json<Estimate>, Error> {
    let Query(params) = params.map_err(|rejection| invalid_input_error(rejection.to_string()))?;

    let estimate = api
        .estimate_between(
            params.origin_lat,
            params.origin_lng,
            params.destination_lat,
            params.destination_lng,
            &params.vehicle_type,
        )
        .await?;

    Ok(estimate.into())
}

#[test]
fn create_returns_the_estimate() {
    use crate::engine::Engine;
    use crate::test_support::{matrix_body, CannedMatrix, SpyPricing};
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = Engine::with_collaborators(
        Arc::new(CannedMatrix::new(matrix_body("OK", 5000.0, 600.0))),
        Arc::new(SpyPricing::new(Ok(1.0), Ok(10.0))),
    );
    let api = Arc::new(engine) as DynAPI;

    let params = CreateParams {
        origin: Coordinates::new(12.9716, 77.5946),
        destination: Coordinates::new(12.9352, 77.6245),
        vehicle_type: "car".into(),
    };

    let Json(estimate) = block_on(create(Extension(api), Ok(Json(params)))).unwrap();

    assert_eq!(estimate, Estimate::new(5.0, 10.0, 10.0));
}

#[test]
fn find_surfaces_no_route_as_unprocessable() {
    use crate::engine::Engine;
    use crate::test_support::{CannedMatrix, SpyPricing};
    use axum::{http::StatusCode, response::IntoResponse};
    use std::sync::Arc;
    use tokio_test::block_on;

    let engine = Engine::with_collaborators(
        Arc::new(CannedMatrix::new(r#"{"rows": [{"elements": []}], "status": "OK"}"#)),
        Arc::new(SpyPricing::new(Ok(1.0), Ok(10.0))),
    );
    let api = Arc::new(engine) as DynAPI;

    let params = FindParams {
        origin_lat: 0.0,
        origin_lng: 0.0,
        destination_lat: 1.0,
        destination_lng: 1.0,
        vehicle_type: "car".into(),
    };

    let err = block_on(find(Extension(api), Ok(Query(params)))).err().unwrap();

    assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
}
