//! Prometheus metrics for the controller

use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

use super::{StatusLevel, TelemetryEvent, TelemetrySink};

/// Gauges and counters fed from telemetry events
#[derive(Clone)]
pub struct PrometheusTelemetry {
    pub apc_mw: Gauge,
    pub pdr: Gauge,
    pub latency_ms: Gauge,
    pub best_fitness: Gauge,
    pub channel_check_interval_ms: Gauge,
    pub q_value: Gauge,
    pub generations_total: IntCounter,
    pub episodes_total: IntCounter,
    pub errors_total: IntCounter,
}

impl PrometheusTelemetry {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            apc_mw: Gauge::new("meshtune_apc_mw", "Average power consumption (mW)")?,
            pdr: Gauge::new("meshtune_pdr", "Packet delivery ratio")?,
            latency_ms: Gauge::new("meshtune_latency_ms", "End-to-end latency (ms)")?,
            best_fitness: Gauge::new("meshtune_best_fitness", "Best search fitness (lower is better)")?,
            channel_check_interval_ms: Gauge::new(
                "meshtune_channel_check_interval_ms",
                "Applied channel check interval (ms)",
            )?,
            q_value: Gauge::new("meshtune_q_value", "Last updated Q value")?,
            generations_total: IntCounter::new(
                "meshtune_generations_total",
                "Search generations reported",
            )?,
            episodes_total: IntCounter::new("meshtune_episodes_total", "Learning episodes run")?,
            errors_total: IntCounter::new("meshtune_errors_total", "Error status lines emitted")?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.apc_mw.clone()))?;
        registry.register(Box::new(self.pdr.clone()))?;
        registry.register(Box::new(self.latency_ms.clone()))?;
        registry.register(Box::new(self.best_fitness.clone()))?;
        registry.register(Box::new(self.channel_check_interval_ms.clone()))?;
        registry.register(Box::new(self.q_value.clone()))?;
        registry.register(Box::new(self.generations_total.clone()))?;
        registry.register(Box::new(self.episodes_total.clone()))?;
        registry.register(Box::new(self.errors_total.clone()))?;
        Ok(())
    }
}

impl TelemetrySink for PrometheusTelemetry {
    fn record(&mut self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::PhaseEntered { .. } => {}
            TelemetryEvent::Generation(r) => {
                self.generations_total.inc();
                self.best_fitness.set(r.best_fitness);
            }
            TelemetryEvent::Configured {
                interval_ms,
                fitness,
            } => {
                self.channel_check_interval_ms.set(*interval_ms);
                self.best_fitness.set(*fitness);
            }
            TelemetryEvent::Episode {
                interval_ms,
                report,
            } => {
                self.episodes_total.inc();
                self.channel_check_interval_ms.set(*interval_ms);
                self.apc_mw.set(report.metrics.apc);
                self.pdr.set(report.metrics.pdr);
                self.latency_ms.set(report.metrics.latency);
                self.q_value.set(report.q_value);
            }
            TelemetryEvent::Status { level, .. } => {
                if *level == StatusLevel::Error {
                    self.errors_total.inc();
                }
            }
        }
    }
}

/// Render a registry in the text exposition format
pub fn render(registry: &Registry) -> prometheus::Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_render() {
        let registry = Registry::new();
        let mut sink = PrometheusTelemetry::new().unwrap();
        sink.register(&registry).unwrap();

        sink.record(&TelemetryEvent::Configured {
            interval_ms: 110.5,
            fitness: 40.1,
        });
        sink.record(&TelemetryEvent::error("timer stuck"));

        assert_eq!(sink.channel_check_interval_ms.get(), 110.5);
        assert_eq!(sink.errors_total.get(), 1);

        let text = render(&registry).unwrap();
        assert!(text.contains("meshtune_channel_check_interval_ms 110.5"));
        assert!(text.contains("meshtune_errors_total 1"));
    }

    #[test]
    fn test_double_register_fails() {
        let registry = Registry::new();
        let sink = PrometheusTelemetry::new().unwrap();
        sink.register(&registry).unwrap();
        assert!(sink.register(&registry).is_err());
    }
}
