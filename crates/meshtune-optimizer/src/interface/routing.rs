//! Narrow surface of the routing protocol the controller depends on

use std::time::Duration;

use async_trait::async_trait;
use meshtune_common::Result;
use serde::{Deserialize, Serialize};

/// Active routing instance as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingInstance {
    /// RPL instance identifier
    pub instance_id: u8,
    /// DODAG version the node joined
    pub dag_version: u8,
}

/// Routing protocol collaborator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutingProtocol: Send {
    /// Bring up the routing stack
    async fn initialize(&mut self) -> Result<()>;

    /// Active instance, if the node has joined one
    fn instance(&mut self) -> Option<RoutingInstance>;

    /// Apply the radio duty-cycle channel-check interval
    async fn set_channel_check_interval(&mut self, interval: Duration) -> Result<()>;
}

/// Interval in milliseconds as a `Duration`
pub fn interval_from_ms(interval_ms: f64) -> Duration {
    Duration::from_secs_f64(interval_ms.max(0.0) / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_ms() {
        assert_eq!(interval_from_ms(125.0), Duration::from_millis(125));
        assert_eq!(interval_from_ms(15.625), Duration::from_micros(15_625));
        assert_eq!(interval_from_ms(-1.0), Duration::ZERO);
    }
}
