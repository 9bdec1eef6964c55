mod estimate_api;

use std::sync::Arc;

use crate::{
    api::API,
    config::Config,
    error::Error,
    external::distance_matrix::{self, DynDistanceMatrix},
    pricing::{DynPricing, RateCard},
};

pub struct Engine {
    matrix: DynDistanceMatrix,
    pricing: DynPricing,
}

impl Engine {
    #[tracing::instrument(name = "Engine::new", skip_all)]
    pub fn new(config: &Config) -> Result<Self, Error> {
        let matrix = distance_matrix::Client::new(config)?;
        let pricing = RateCard::default().with_surge(config.surge_multiplier);

        Ok(Self::with_collaborators(Arc::new(matrix), Arc::new(pricing)))
    }

    pub fn with_collaborators(matrix: DynDistanceMatrix, pricing: DynPricing) -> Self {
        Self { matrix, pricing }
    }
}

impl API for Engine {}

#[test]
fn new_engine_requires_api_key() {
    use crate::error::ErrorKind;

    let err = Engine::new(&Config::new("")).err().unwrap();
    assert_eq!(err.kind, ErrorKind::Configuration);

    assert!(Engine::new(&Config::new("key")).is_ok());
}
