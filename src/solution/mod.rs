//! Final routing plan and per-stop itinerary.

mod itinerary;

pub use itinerary::{PlannedRoute, RoutingPlan, StopRecord};
