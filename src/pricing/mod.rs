//! Pricing collaborators consumed by the estimator.
//!
//! The estimator asks a [`PricingProvider`] for the current surge multiplier
//! and then for the fare of a trip. Both steps may fail; the estimator never
//! substitutes a default for either.

mod rate_card;

pub use rate_card::{Rate, RateCard};

use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::VehicleType;
use crate::error::Error;

#[async_trait]
pub trait PricingProvider {
    /// Current multiplier applied to the base fare. Expected to be finite and non-negative.
    async fn surge(&self) -> Result<f64, Error>;

    /// Final fare for a trip of `distance_km` in the given category.
    fn fare(&self, distance_km: f64, vehicle_type: &VehicleType, surge: f64)
        -> Result<f64, Error>;
}

pub type DynPricing = Arc<dyn PricingProvider + Send + Sync>;
