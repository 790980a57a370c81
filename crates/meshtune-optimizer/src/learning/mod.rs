//! Learning phase module
pub mod adapter;
pub mod q_table;
pub mod state;

pub use self::adapter::{EpisodeReport, RlAdapter, RlParams};
pub use self::q_table::QTable;
pub use self::state::{SimulationState, StateSummary};
