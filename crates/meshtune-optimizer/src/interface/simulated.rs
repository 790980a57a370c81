//! In-memory routing protocol
//!
//! Stands in for the RPL stack: the DODAG is "joined" after a configurable
//! number of instance queries, and every applied interval is recorded.

use std::time::Duration;

use async_trait::async_trait;
use meshtune_common::{MeshtuneError, Result};
use tracing::{debug, info};

use super::routing::{RoutingInstance, RoutingProtocol};

#[derive(Debug, Clone)]
pub struct SimulatedRouting {
    initialized: bool,
    /// `instance()` calls answered with `None` before the instance appears
    ready_after: u32,
    queries: u32,
    instance: RoutingInstance,
    applied: Vec<Duration>,
}

impl Default for SimulatedRouting {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SimulatedRouting {
    pub fn new(ready_after: u32) -> Self {
        Self {
            initialized: false,
            ready_after,
            queries: 0,
            instance: RoutingInstance {
                instance_id: 30,
                dag_version: 240,
            },
            applied: Vec::new(),
        }
    }

    /// Never exposes an instance
    pub fn never_ready() -> Self {
        Self::new(u32::MAX)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Every interval applied so far, oldest first
    pub fn applied(&self) -> &[Duration] {
        &self.applied
    }

    /// Interval currently in effect
    pub fn current_interval(&self) -> Option<Duration> {
        self.applied.last().copied()
    }

    pub fn queries(&self) -> u32 {
        self.queries
    }
}

#[async_trait]
impl RoutingProtocol for SimulatedRouting {
    async fn initialize(&mut self) -> Result<()> {
        self.initialized = true;
        info!(
            instance_id = self.instance.instance_id,
            ready_after = self.ready_after,
            "Simulated routing initialized"
        );
        Ok(())
    }

    fn instance(&mut self) -> Option<RoutingInstance> {
        if !self.initialized {
            return None;
        }
        self.queries = self.queries.saturating_add(1);
        (self.queries > self.ready_after).then_some(self.instance)
    }

    async fn set_channel_check_interval(&mut self, interval: Duration) -> Result<()> {
        if !self.initialized {
            return Err(MeshtuneError::Routing(
                "routing stack not initialized".to_string(),
            ));
        }
        debug!(interval_ms = interval.as_secs_f64() * 1000.0, "Channel check interval set");
        self.applied.push(interval);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requires_initialize() {
        let mut routing = SimulatedRouting::default();
        assert!(routing.instance().is_none());
        assert!(routing
            .set_channel_check_interval(Duration::from_millis(125))
            .await
            .is_err());

        routing.initialize().await.unwrap();
        assert!(routing.instance().is_some());
    }

    #[tokio::test]
    async fn test_instance_appears_after_queries() {
        let mut routing = SimulatedRouting::new(2);
        routing.initialize().await.unwrap();
        assert!(routing.instance().is_none());
        assert!(routing.instance().is_none());
        assert_eq!(routing.instance().map(|i| i.instance_id), Some(30));
        assert_eq!(routing.queries(), 3);
    }

    #[tokio::test]
    async fn test_records_applied_intervals() {
        let mut routing = SimulatedRouting::default();
        routing.initialize().await.unwrap();
        routing
            .set_channel_check_interval(Duration::from_millis(125))
            .await
            .unwrap();
        routing
            .set_channel_check_interval(Duration::from_millis(90))
            .await
            .unwrap();
        assert_eq!(routing.applied().len(), 2);
        assert_eq!(routing.current_interval(), Some(Duration::from_millis(90)));
    }

    #[tokio::test]
    async fn test_never_ready() {
        let mut routing = SimulatedRouting::never_ready();
        routing.initialize().await.unwrap();
        for _ in 0..10 {
            assert!(routing.instance().is_none());
        }
    }
}
