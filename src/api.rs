use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Coordinates, Estimate, VehicleType};
use crate::error::Error;

#[async_trait]
pub trait EstimateAPI {
    async fn estimate(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        vehicle_type: VehicleType,
    ) -> Result<Estimate, Error>;

    async fn estimate_between(
        &self,
        origin_lat: f64,
        origin_lng: f64,
        destination_lat: f64,
        destination_lng: f64,
        vehicle_type: &str,
    ) -> Result<Estimate, Error> {
        self.estimate(
            Coordinates::new(origin_lat, origin_lng),
            Coordinates::new(destination_lat, destination_lng),
            vehicle_type.into(),
        )
        .await
    }
}

pub trait API: EstimateAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
