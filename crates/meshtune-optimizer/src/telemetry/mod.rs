//! Telemetry output
//!
//! The driver reports phase transitions, generation milestones, the applied
//! interval, each episode and status lines through a [`TelemetrySink`].

pub mod exporter;

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::controller::Phase;
use crate::genetic::GenerationReport;
use crate::learning::EpisodeReport;

pub use self::exporter::PrometheusTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// Something worth reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryEvent {
    PhaseEntered { phase: Phase },
    Generation(GenerationReport),
    Configured { interval_ms: f64, fitness: f64 },
    Episode { interval_ms: f64, report: EpisodeReport },
    Status { level: StatusLevel, message: String },
}

impl TelemetryEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Status {
            level: StatusLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::Status {
            level: StatusLevel::Warn,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Status {
            level: StatusLevel::Error,
            message: message.into(),
        }
    }
}

pub trait TelemetrySink: Send {
    fn record(&mut self, event: &TelemetryEvent);
}

/// Human-readable progress lines through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::PhaseEntered { phase } => info!(%phase, "Entering phase"),
            TelemetryEvent::Generation(r) => info!(
                "Generation {}: best interval {:.3}ms, fitness {:.4} ({} improvements{})",
                r.generation,
                r.best_interval_ms,
                r.best_fitness,
                r.improvements,
                if r.mutated { ", mutated" } else { "" }
            ),
            TelemetryEvent::Configured {
                interval_ms,
                fitness,
            } => info!(
                "Applied channel check interval {:.3}ms (fitness {:.4})",
                interval_ms, fitness
            ),
            TelemetryEvent::Episode {
                interval_ms,
                report,
            } => info!(
                "Episode {}: interval {:.3}ms, {}, topology {}",
                report.episode, interval_ms, report.metrics, report.topology
            ),
            TelemetryEvent::Status { level, message } => match level {
                StatusLevel::Info => info!("{}", message),
                StatusLevel::Warn => warn!("{}", message),
                StatusLevel::Error => error!("{}", message),
            },
        }
    }
}

/// Forwards every event to each inner sink
#[derive(Default)]
pub struct FanoutTelemetry {
    sinks: Vec<Box<dyn TelemetrySink>>,
}

impl FanoutTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for FanoutTelemetry {
    fn record(&mut self, event: &TelemetryEvent) {
        for sink in self.sinks.iter_mut() {
            sink.record(event);
        }
    }
}

/// Keeps events in memory; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct RecordingTelemetry {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub fn phases(&self) -> Vec<Phase> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::PhaseEntered { phase } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    pub fn episodes(&self) -> Vec<EpisodeReport> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Episode { report, .. } => Some(report.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn generations(&self) -> Vec<GenerationReport> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Generation(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }

    /// Status messages at `level`
    pub fn statuses(&self, level: StatusLevel) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TelemetryEvent::Status { level: l, message } if *l == level => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record(&mut self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_clones_share_buffer() {
        let recorder = RecordingTelemetry::new();
        let mut sink = recorder.clone();
        sink.record(&TelemetryEvent::PhaseEntered { phase: Phase::Init });
        sink.record(&TelemetryEvent::warn("instance missing"));

        assert_eq!(recorder.events().len(), 2);
        assert_eq!(recorder.phases(), vec![Phase::Init]);
        assert_eq!(recorder.statuses(StatusLevel::Warn), vec!["instance missing"]);
        assert!(recorder.statuses(StatusLevel::Error).is_empty());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = RecordingTelemetry::new();
        let b = RecordingTelemetry::new();
        let mut fanout = FanoutTelemetry::new()
            .with(a.clone())
            .with(b.clone())
            .with(TracingTelemetry);
        assert_eq!(fanout.len(), 3);

        fanout.record(&TelemetryEvent::info("hello"));
        assert_eq!(a.events().len(), 1);
        assert_eq!(b.events().len(), 1);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = TelemetryEvent::Configured {
            interval_ms: 100.0,
            fitness: 40.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "configured");
        assert_eq!(json["interval_ms"], 100.0);
    }
}
