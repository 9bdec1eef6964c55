use serde::{Deserialize, Serialize};

/// A point in signed decimal degrees. Values are not range checked here; the
/// provider is the one to reject them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// six decimals keeps roughly 0.1 m of precision
impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        format!("{:.6},{:.6}", coordinates.lat, coordinates.lng)
    }
}

#[test]
fn formats_with_six_decimals() {
    let origin: String = Coordinates::new(12.9715987, 77.5945627).into();
    assert_eq!(origin, "12.971599,77.594563");

    let destination: String = Coordinates::new(-33.8, 151.0).into();
    assert_eq!(destination, "-33.800000,151.000000");
}

#[test]
fn out_of_range_values_pass_through() {
    let bogus: String = Coordinates::new(123.0, -200.5).into();
    assert_eq!(bogus, "123.000000,-200.500000");
}
