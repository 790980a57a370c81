//! Phase state machine module
pub mod driver;
pub mod phase;

pub use self::driver::{Driver, RunReport};
pub use self::phase::Phase;
