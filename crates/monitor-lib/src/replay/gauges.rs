//! Per-status gauges fed by the replay loop

use prometheus::{Gauge, Registry};
use serde::Serialize;

/// Gauges holding the most recently replayed count per status
#[derive(Clone)]
pub struct TransactionGauges {
    approved: Gauge,
    denied: Gauge,
    failed: Gauge,
    reversed: Gauge,
}

/// Point-in-time copy of the gauge values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeSnapshot {
    pub approved: f64,
    pub denied: f64,
    pub failed: f64,
    pub reversed: f64,
}

impl TransactionGauges {
    /// Create the gauges and register them on `registry`
    pub fn register(registry: &Registry) -> prometheus::Result<Self> {
        let gauges = Self {
            approved: Gauge::new(
                "transactions_approved_total",
                "Number of transactions approved in the last minute.",
            )?,
            denied: Gauge::new(
                "transactions_denied_total",
                "Number of transactions declined in the last minute.",
            )?,
            failed: Gauge::new(
                "transactions_failed_total",
                "Number of failed transactions in the last minute.",
            )?,
            reversed: Gauge::new(
                "transactions_reversed_total",
                "Number of transactions reversed in the last minute.",
            )?,
        };

        registry.register(Box::new(gauges.approved.clone()))?;
        registry.register(Box::new(gauges.denied.clone()))?;
        registry.register(Box::new(gauges.failed.clone()))?;
        registry.register(Box::new(gauges.reversed.clone()))?;

        Ok(gauges)
    }

    /// Apply one replayed row
    ///
    /// The matching gauge is set (reversal labels accumulate into the
    /// reversed gauge) and every other gauge drops back to zero. The reversed
    /// gauge only resets when the status is not a reversal of any kind.
    pub fn apply(&self, status: &str, count: f64) {
        match status {
            "approved" => self.approved.set(count),
            "denied" => self.denied.set(count),
            "failed" => self.failed.set(count),
            "reversed" | "backend_reversed" => self.reversed.add(count),
            _ => {}
        }

        if status != "approved" {
            self.approved.set(0.0);
        }
        if status != "denied" {
            self.denied.set(0.0);
        }
        if status != "failed" {
            self.failed.set(0.0);
        }
        if !status.contains("reversed") {
            self.reversed.set(0.0);
        }
    }

    pub fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot {
            approved: self.approved.get(),
            denied: self.denied.get(),
            failed: self.failed.get(),
            reversed: self.reversed.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauges() -> TransactionGauges {
        TransactionGauges::register(&Registry::new()).unwrap()
    }

    #[test]
    fn test_only_current_status_is_nonzero() {
        let gauges = gauges();
        gauges.apply("approved", 120.0);
        gauges.apply("denied", 4.0);

        let snapshot = gauges.snapshot();
        assert_eq!(snapshot.approved, 0.0);
        assert_eq!(snapshot.denied, 4.0);
        assert_eq!(snapshot.failed, 0.0);
        assert_eq!(snapshot.reversed, 0.0);
    }

    #[test]
    fn test_consecutive_reversals_accumulate() {
        let gauges = gauges();
        gauges.apply("reversed", 2.0);
        gauges.apply("backend_reversed", 3.0);
        assert_eq!(gauges.snapshot().reversed, 5.0);

        gauges.apply("failed", 1.0);
        let snapshot = gauges.snapshot();
        assert_eq!(snapshot.reversed, 0.0);
        assert_eq!(snapshot.failed, 1.0);
    }

    #[test]
    fn test_unknown_status_resets_everything() {
        let gauges = gauges();
        gauges.apply("failed", 9.0);
        gauges.apply("refunded", 7.0);

        let snapshot = gauges.snapshot();
        assert_eq!(snapshot.failed, 0.0);
        assert_eq!(snapshot.approved, 0.0);
        assert_eq!(snapshot.reversed, 0.0);
    }

    #[test]
    fn test_double_registration_fails() {
        let registry = Registry::new();
        TransactionGauges::register(&registry).unwrap();
        assert!(TransactionGauges::register(&registry).is_err());
    }

    #[test]
    fn test_gauges_exposed_by_registry() {
        let registry = Registry::new();
        let gauges = TransactionGauges::register(&registry).unwrap();
        gauges.apply("denied", 3.0);

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|f| f.get_name().to_string())
            .collect();
        assert!(names.contains(&"transactions_denied_total".to_string()));
        assert_eq!(names.len(), 4);
    }
}
