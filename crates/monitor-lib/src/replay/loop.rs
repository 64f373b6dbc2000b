//! Replay loop
//!
//! Walks the transaction log one row per step interval, pushing each row
//! into the gauges, and starts over at the end of the file. A missing file is
//! retried until shutdown.

use super::TransactionGauges;
use crate::health::{Component, HealthRegistry};
use crate::observability::StructuredLogger;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Configuration for the replay loop
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Transaction log to replay
    pub path: PathBuf,
    /// Delay between rows; one row stands for one minute of history
    pub step_interval: Duration,
    /// Delay before retrying an unreadable or empty log
    pub retry_interval: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/data/transactions.csv"),
            step_interval: Duration::from_secs(1),
            retry_interval: Duration::from_secs(10),
        }
    }
}

/// How a single pass over the log ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PassOutcome {
    /// Reached the end of the log after replaying this many rows
    Completed(u64),
    /// Shutdown was requested mid-pass
    Shutdown,
}

/// Replays the transaction log into [`TransactionGauges`] forever
pub struct ReplayLoop {
    gauges: TransactionGauges,
    config: ReplayConfig,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl ReplayLoop {
    pub fn new(gauges: TransactionGauges, config: ReplayConfig) -> Self {
        Self {
            gauges,
            config,
            logger: StructuredLogger::new("transaction-exporter"),
            health: None,
        }
    }

    /// Report replay health into a registry
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!(
            path = %self.config.path.display(),
            step_ms = self.config.step_interval.as_millis() as u64,
            "Starting transaction replay"
        );

        loop {
            let contents = match tokio::fs::read(&self.config.path).await {
                Ok(contents) => contents,
                Err(e) => {
                    warn!(
                        path = %self.config.path.display(),
                        error = %e,
                        retry_secs = self.config.retry_interval.as_secs(),
                        "Failed to open transaction log, retrying"
                    );
                    self.report(Some(format!("cannot open transaction log: {}", e)))
                        .await;
                    if wait_or_shutdown(self.config.retry_interval, &mut shutdown).await {
                        break;
                    }
                    continue;
                }
            };

            self.report(None).await;

            match self.replay_pass(&contents, &mut shutdown).await {
                PassOutcome::Shutdown => break,
                PassOutcome::Completed(0) => {
                    warn!(
                        path = %self.config.path.display(),
                        "Transaction log has no rows to replay"
                    );
                    if let Some(health) = &self.health {
                        health
                            .set_degraded(Component::Replay, "transaction log has no rows")
                            .await;
                    }
                    if wait_or_shutdown(self.config.retry_interval, &mut shutdown).await {
                        break;
                    }
                }
                PassOutcome::Completed(rows) => {
                    self.logger
                        .log_replay_restart(&self.config.path.display().to_string(), rows);
                }
            }
        }

        info!("Shutting down transaction replay");
    }

    /// Replay every row of `contents` once
    pub(crate) async fn replay_pass(
        &self,
        contents: &[u8],
        shutdown: &mut broadcast::Receiver<()>,
    ) -> PassOutcome {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(contents);

        let mut replayed = 0u64;
        for row in reader.records() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "Error reading transaction log row");
                    continue;
                }
            };

            let (status, count) = match parse_replay_row(&row) {
                Ok(parsed) => parsed,
                Err(reason) => {
                    warn!(reason = %reason, "Skipping transaction log row");
                    continue;
                }
            };

            self.gauges.apply(&status, count);
            replayed += 1;
            debug!(status = %status, count = count, "Updated transaction gauge");

            if wait_or_shutdown(self.config.step_interval, shutdown).await {
                return PassOutcome::Shutdown;
            }
        }

        PassOutcome::Completed(replayed)
    }

    async fn report(&self, failure: Option<String>) {
        if let Some(health) = &self.health {
            match failure {
                Some(message) => health.set_unhealthy(Component::Replay, message).await,
                None => health.set_healthy(Component::Replay).await,
            }
        }
    }
}

/// Lower-cased status and count of one row
fn parse_replay_row(row: &csv::StringRecord) -> Result<(String, f64), String> {
    let status = row
        .get(1)
        .ok_or_else(|| format!("expected 3 fields, found {}", row.len()))?
        .to_lowercase();
    let raw_count = row
        .get(2)
        .ok_or_else(|| format!("expected 3 fields, found {}", row.len()))?;
    let count = raw_count
        .parse::<f64>()
        .map_err(|e| format!("invalid count '{}': {}", raw_count, e))?;

    Ok((status, count))
}

/// Sleep for `duration`; returns true if shutdown fired first
async fn wait_or_shutdown(duration: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.recv() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn replay_loop(path: PathBuf) -> (ReplayLoop, TransactionGauges) {
        let gauges = TransactionGauges::register(&Registry::new()).unwrap();
        let config = ReplayConfig {
            path,
            step_interval: Duration::ZERO,
            retry_interval: Duration::from_millis(10),
        };
        (ReplayLoop::new(gauges.clone(), config), gauges)
    }

    #[tokio::test]
    async fn test_pass_replays_every_valid_row() {
        let (replay, gauges) = replay_loop(PathBuf::from("unused.csv"));
        let (_tx, mut rx) = broadcast::channel(1);

        let log = "timestamp,status,count\n\
                   2025-07-12 13:00:00,Approved,120\n\
                   2025-07-12 13:00:00,denied,not-a-number\n\
                   2025-07-12 13:00:00,REVERSED,2\n\
                   2025-07-12 13:00:00,backend_reversed,1\n";

        let outcome = replay.replay_pass(log.as_bytes(), &mut rx).await;
        assert_eq!(outcome, PassOutcome::Completed(3));

        let snapshot = gauges.snapshot();
        assert_eq!(snapshot.reversed, 3.0);
        assert_eq!(snapshot.approved, 0.0);
    }

    #[tokio::test]
    async fn test_pass_stops_on_shutdown() {
        let (replay, _gauges) = replay_loop(PathBuf::from("unused.csv"));
        let (tx, mut rx) = broadcast::channel(1);
        tx.send(()).unwrap();

        let log = "timestamp,status,count\n2025-07-12 13:00:00,failed,2\n";
        let outcome = replay.replay_pass(log.as_bytes(), &mut rx).await;
        assert_eq!(outcome, PassOutcome::Shutdown);
    }

    #[tokio::test]
    async fn test_missing_file_retries_until_shutdown() {
        let health = HealthRegistry::new();
        let (replay, _gauges) = replay_loop(PathBuf::from("/no/such/transactions.csv"));
        let replay = replay.with_health(health.clone());
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(replay.run(rx));
        tokio::time::sleep(Duration::from_millis(30)).await;

        let components = health.health().await.components;
        assert_eq!(
            components[&Component::Replay].status,
            crate::health::ComponentStatus::Unhealthy
        );

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("replay loop should stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_replays_file_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,status,count").unwrap();
        writeln!(file, "2025-07-12 13:00:00,failed,6").unwrap();

        let (mut replay, gauges) = replay_loop(file.path().to_path_buf());
        replay.config.step_interval = Duration::from_millis(5);
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(replay.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(gauges.snapshot().failed, 6.0);
    }

    #[tokio::test]
    async fn test_empty_log_degrades_replay_health() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,status,count").unwrap();

        let health = HealthRegistry::new();
        let (mut replay, _gauges) = replay_loop(file.path().to_path_buf());
        replay.config.retry_interval = Duration::from_secs(5);
        let replay = replay.with_health(health.clone());
        let (tx, rx) = broadcast::channel(1);

        let handle = tokio::spawn(replay.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let components = health.health().await.components;
        assert_eq!(
            components[&Component::Replay].status,
            crate::health::ComponentStatus::Degraded
        );

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_parse_replay_row_lowercases_status() {
        let row = csv::StringRecord::from(vec!["2025-07-12 13:00:00", "DENIED", "4"]);
        assert_eq!(parse_replay_row(&row).unwrap(), ("denied".to_string(), 4.0));

        let short = csv::StringRecord::from(vec!["2025-07-12 13:00:00", "denied"]);
        assert!(parse_replay_row(&short).is_err());
    }
}
