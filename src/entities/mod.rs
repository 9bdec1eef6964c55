mod coordinates;
mod estimate;
mod vehicle_type;

pub use coordinates::Coordinates;
pub use estimate::Estimate;
pub use vehicle_type::VehicleType;
