//! External collaborators: routing protocol and timer service
pub mod routing;
pub mod simulated;
pub mod timer;

pub use self::routing::{interval_from_ms, RoutingInstance, RoutingProtocol};
pub use self::simulated::SimulatedRouting;
pub use self::timer::{TimerService, TokioTimer};
