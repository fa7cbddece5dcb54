//! The station's control loop.
//!
//! Each cycle samples the sensor and records the reading, then idles for the
//! read interval. Failed cycles (no valid reading, or a storage error) count
//! toward a consecutive-failure budget; a recorded reading resets it. The
//! loop aborts once the budget is spent.

use std::{process::ExitCode, time::Duration};

use crate::{
    config::PollingConfig,
    recorder::ReadingRecorder,
    sampler::{ReadingSampler, SampleError},
    sensor::SensorDriver,
    shutdown::Shutdown,
    storage::{RecordResult, StorageError, StorageSink},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// `consecutive_failures` cycles in a row failed.
    Aborted { consecutive_failures: u32 },
    /// Shutdown was requested between cycles.
    Cancelled,
}

impl LoopOutcome {
    /// Both outcomes are orderly shutdowns; an abort is reported through the
    /// error-level event emitted by [`PollingLoop::run`].
    pub fn exit_code(self) -> ExitCode {
        match self {
            LoopOutcome::Aborted { .. } | LoopOutcome::Cancelled => ExitCode::SUCCESS,
        }
    }
}

#[derive(Debug)]
enum Cycle {
    Recorded(RecordResult),
    SampleFailed(SampleError),
    StoreFailed(StorageError),
}

pub struct PollingLoop<D, S> {
    sampler: ReadingSampler<D>,
    recorder: ReadingRecorder<S>,
    read_interval: Duration,
    repeat_limit: u32,
    sleep_after_failure: bool,
    consecutive_failures: u32,
}

impl<D: SensorDriver, S: StorageSink> PollingLoop<D, S> {
    pub fn new(
        sampler: ReadingSampler<D>,
        recorder: ReadingRecorder<S>,
        config: &PollingConfig,
    ) -> Self {
        Self {
            sampler,
            recorder,
            read_interval: config.read_interval(),
            repeat_limit: config.repeat_limit,
            sleep_after_failure: config.sleep_after_failure,
            consecutive_failures: 0,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn sampler(&self) -> &ReadingSampler<D> {
        &self.sampler
    }

    pub fn recorder(&self) -> &ReadingRecorder<S> {
        &self.recorder
    }

    fn is_exhausted(&self) -> bool {
        self.consecutive_failures >= self.repeat_limit
    }

    /// Polls until the failure budget runs out or `shutdown` fires.
    pub async fn run(&mut self, shutdown: &mut Shutdown) -> LoopOutcome {
        tracing::info!(
            interval_secs = self.read_interval.as_secs(),
            repeat_limit = self.repeat_limit,
            "polling started"
        );

        loop {
            if self.is_exhausted() {
                tracing::error!(
                    failures = self.consecutive_failures,
                    "stopped reading after {} failed attempts",
                    self.consecutive_failures
                );
                return LoopOutcome::Aborted {
                    consecutive_failures: self.consecutive_failures,
                };
            }

            if shutdown.is_triggered() {
                tracing::info!("polling cancelled");
                return LoopOutcome::Cancelled;
            }

            let cycle = self.cycle().await;

            if self.is_exhausted() {
                continue;
            }

            if !matches!(cycle, Cycle::Recorded(_)) && !self.sleep_after_failure {
                continue;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.read_interval) => {}
                _ = shutdown.triggered() => {}
            }
        }
    }

    /// One Sampling -> Recording pass, updating the failure counter.
    async fn cycle(&mut self) -> Cycle {
        let cycle = match self.sampler.sample().await {
            Ok(reading) => match self.recorder.record(reading).await {
                Ok(result) => Cycle::Recorded(result),
                Err(e) => Cycle::StoreFailed(e),
            },
            Err(e) => Cycle::SampleFailed(e),
        };

        match &cycle {
            Cycle::Recorded(result) => {
                self.consecutive_failures = 0;
                tracing::debug!(row_id = result.row_id, "cycle complete");
            }
            Cycle::SampleFailed(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "invalid reading, skipping cycle"
                );
            }
            Cycle::StoreFailed(e) => {
                self.consecutive_failures += 1;
                tracing::warn!(
                    error = %e,
                    failures = self.consecutive_failures,
                    "failed to record reading"
                );
            }
        }

        cycle
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use dht::Measurement;

    use super::*;
    use crate::{config::TableName, reading::PersistenceRecord};

    struct Scripted {
        script: VecDeque<Option<Measurement>>,
        calls: usize,
    }

    impl SensorDriver for Scripted {
        fn read(&mut self) -> Option<Measurement> {
            self.calls += 1;
            self.script.pop_front().flatten()
        }
    }

    /// Fails the inserts whose index (0-based) is listed.
    #[derive(Default)]
    struct Flaky {
        attempts: usize,
        fail_on: Vec<usize>,
        written: Vec<PersistenceRecord>,
    }

    impl StorageSink for Flaky {
        async fn insert(
            &mut self,
            _table: &TableName,
            record: &PersistenceRecord,
        ) -> Result<RecordResult, StorageError> {
            let attempt = self.attempts;
            self.attempts += 1;
            if self.fail_on.contains(&attempt) {
                return Err(StorageError::Database(sqlx::Error::WorkerCrashed));
            }
            self.written.push(record.clone());
            Ok(RecordResult {
                rows_written: 1,
                row_id: self.written.len() as u64,
            })
        }
    }

    const VALID: Option<Measurement> = Some(Measurement {
        temperature: 20,
        humidity: 50,
        valid: true,
    });
    const INVALID: Option<Measurement> = Some(Measurement {
        temperature: 0,
        humidity: 0,
        valid: false,
    });

    fn polling(
        script: impl IntoIterator<Item = Option<Measurement>>,
        sink: Flaky,
        repeat_limit: u32,
    ) -> PollingLoop<Scripted, Flaky> {
        let config = PollingConfig {
            max_retries: 1,
            repeat_limit,
            ..Default::default()
        };
        PollingLoop::new(
            ReadingSampler::new(
                Scripted {
                    script: script.into_iter().collect(),
                    calls: 0,
                },
                config.max_retries,
            ),
            ReadingRecorder::new(sink, TableName::new("readings").unwrap()),
            &config,
        )
    }

    #[test]
    fn aborted_and_cancelled_exit_cleanly() {
        let success = format!("{:?}", ExitCode::SUCCESS);
        let aborted = LoopOutcome::Aborted {
            consecutive_failures: 10,
        };

        assert_eq!(format!("{:?}", aborted.exit_code()), success);
        assert_eq!(format!("{:?}", LoopOutcome::Cancelled.exit_code()), success);
    }

    #[tokio::test]
    async fn counter_tracks_consecutive_failures() {
        // sample fail, store fail, sample fail, success, sample fail
        let sink = Flaky {
            fail_on: vec![0],
            ..Default::default()
        };
        let mut polling = polling([INVALID, VALID, None, VALID, INVALID], sink, 10);

        let mut seen = Vec::new();
        for _ in 0..5 {
            polling.cycle().await;
            seen.push(polling.consecutive_failures());
        }

        assert_eq!(seen, [1, 2, 3, 0, 1]);
        assert_eq!(polling.recorder().sink().written.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failures_abort_the_loop() {
        let sink = Flaky {
            fail_on: vec![0, 1, 2],
            ..Default::default()
        };
        let mut polling = polling([VALID; 5], sink, 3);
        let (_trigger, mut shutdown) = crate::shutdown::channel();

        let outcome = polling.run(&mut shutdown).await;

        assert_eq!(
            outcome,
            LoopOutcome::Aborted {
                consecutive_failures: 3
            }
        );
        assert_eq!(polling.recorder().sink().attempts, 3);
        assert!(polling.recorder().sink().written.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn aborted_loop_does_not_resume() {
        let mut polling = polling([], Flaky::default(), 2);
        let (_trigger, mut shutdown) = crate::shutdown::channel();

        assert_eq!(
            polling.run(&mut shutdown).await,
            LoopOutcome::Aborted {
                consecutive_failures: 2
            }
        );
        assert_eq!(polling.sampler().driver().calls, 2);

        assert_eq!(
            polling.run(&mut shutdown).await,
            LoopOutcome::Aborted {
                consecutive_failures: 2
            }
        );
        assert_eq!(polling.sampler().driver().calls, 2);
        assert_eq!(polling.recorder().sink().attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycles_retry_immediately_when_configured() {
        let config = PollingConfig {
            max_retries: 1,
            repeat_limit: 3,
            sleep_after_failure: false,
            ..Default::default()
        };
        let mut polling = PollingLoop::new(
            ReadingSampler::new(
                Scripted {
                    script: VecDeque::new(),
                    calls: 0,
                },
                1,
            ),
            ReadingRecorder::new(Flaky::default(), TableName::new("readings").unwrap()),
            &config,
        );
        let (_trigger, mut shutdown) = crate::shutdown::channel();
        let start = tokio::time::Instant::now();

        polling.run(&mut shutdown).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(polling.sampler().driver().calls, 3);
    }
}
