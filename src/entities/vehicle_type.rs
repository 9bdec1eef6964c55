use std::fmt;

use serde::{Deserialize, Serialize};

/// Fare category tag. Opaque to the estimator and handed to the pricing model as is.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleType(String);

impl VehicleType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VehicleType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for VehicleType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[test]
fn serializes_as_a_bare_string() {
    let vehicle_type: VehicleType = serde_json::from_str(r#""suv""#).unwrap();

    assert_eq!(vehicle_type.as_str(), "suv");
    assert_eq!(serde_json::to_string(&vehicle_type).unwrap(), r#""suv""#);
}
