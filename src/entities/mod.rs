mod bid;
mod estimate;
mod location;
mod message;
mod ride;

pub use bid::{Bid, Status as BidStatus};
pub use estimate::Estimate;
pub use location::{Coordinates, DriverLocation, PositionReport, VehicleType};
pub use message::ChatMessage;
pub use ride::{Ride, RideId, RideSpec, Status as RideStatus};
