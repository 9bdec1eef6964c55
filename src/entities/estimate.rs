use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub distance_km: f64,
    pub duration_min: f64,
    pub fare: f64,
}

impl Estimate {
    pub fn new(distance_km: f64, duration_min: f64, fare: f64) -> Self {
        Self {
            distance_km,
            duration_min,
            fare,
        }
    }
}
