use async_trait::async_trait;
use std::collections::HashMap;

use super::PricingProvider;
use crate::entities::VehicleType;
use crate::error::{fare_computation_error, surge_computation_error, Error};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rate {
    pub min_fare: f64,
    pub base_fare: f64,
    pub per_km: f64,
}

impl Rate {
    pub fn new(min_fare: f64, base_fare: f64, per_km: f64) -> Self {
        Self {
            min_fare,
            base_fare,
            per_km,
        }
    }

    pub fn price(&self, distance_km: f64) -> f64 {
        self.min_fare.max(self.base_fare + self.per_km * distance_km)
    }
}

/// Static per-category rates with a fixed surge multiplier.
#[derive(Clone, Debug)]
pub struct RateCard {
    rates: HashMap<VehicleType, Rate>,
    surge: f64,
}

impl RateCard {
    pub fn new(surge: f64) -> Self {
        Self {
            rates: HashMap::new(),
            surge,
        }
    }

    pub fn with_surge(mut self, surge: f64) -> Self {
        self.surge = surge;
        self
    }

    pub fn with_rate(mut self, vehicle_type: impl Into<VehicleType>, rate: Rate) -> Self {
        self.rates.insert(vehicle_type.into(), rate);
        self
    }

    pub fn rate(&self, vehicle_type: &VehicleType) -> Option<&Rate> {
        self.rates.get(vehicle_type)
    }
}

impl Default for RateCard {
    fn default() -> Self {
        Self::new(1.0)
            .with_rate("bike", Rate::new(20.0, 10.0, 5.0))
            .with_rate("auto", Rate::new(30.0, 15.0, 8.0))
            .with_rate("car", Rate::new(50.0, 25.0, 12.0))
            .with_rate("suv", Rate::new(80.0, 40.0, 18.0))
    }
}

#[async_trait]
impl PricingProvider for RateCard {
    async fn surge(&self) -> Result<f64, Error> {
        if !self.surge.is_finite() || self.surge < 0.0 {
            return Err(surge_computation_error(format!(
                "configured surge {} is not a valid multiplier",
                self.surge
            )));
        }

        Ok(self.surge)
    }

    #[tracing::instrument(skip(self))]
    fn fare(
        &self,
        distance_km: f64,
        vehicle_type: &VehicleType,
        surge: f64,
    ) -> Result<f64, Error> {
        let rate = self.rate(vehicle_type).ok_or_else(|| {
            tracing::warn!(vehicle_type = vehicle_type.as_str(), "no rate for vehicle type");
            fare_computation_error(format!("unknown vehicle type {}", vehicle_type))
        })?;

        Ok(rate.price(distance_km) * surge)
    }
}

#[test]
fn short_trips_pay_the_minimum_fare() {
    let rate = Rate::new(50.0, 25.0, 12.0);

    assert_eq!(rate.price(0.0), 50.0);
    assert_eq!(rate.price(2.0), 50.0);
    assert_eq!(rate.price(10.0), 145.0);
}

#[test]
fn fare_applies_surge() {
    let card = RateCard::default();

    let fare = card.fare(10.0, &"car".into(), 1.5).unwrap();
    assert_eq!(fare, 217.5);
}

#[test]
fn unknown_vehicle_type_is_a_fare_error() {
    use crate::error::ErrorKind;

    let err = RateCard::default()
        .fare(3.0, &"hovercraft".into(), 1.0)
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FareComputation);
    assert!(err.to_string().contains("hovercraft"));
}

#[test]
fn surge_is_reported_as_configured() {
    use tokio_test::block_on;

    assert_eq!(block_on(RateCard::new(1.25).surge()).unwrap(), 1.25);
    assert!(block_on(RateCard::new(-1.0).surge()).is_err());
}
