use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use nutriplan_core::TenantId;
use nutriplan_forecast::{
    ForecastScheduler, ForecastingConfig, LocalForecastScheduler, SeriesReader,
    TenantForecastReport,
};

const MAX_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Sink for forecast reports (presentation/persistence live behind it).
pub trait InsightSink: Send + Sync + 'static {
    fn emit(&self, tenant_id: TenantId, report: TenantForecastReport);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInsightSink {
    inner: Mutex<Vec<(TenantId, TenantForecastReport)>>,
}

impl InMemoryInsightSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<(TenantId, TenantForecastReport)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InsightSink for InMemoryInsightSink {
    fn emit(&self, tenant_id: TenantId, report: TenantForecastReport) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((tenant_id, report));
    }
}

/// Settings for a per-tenant background forecaster.
#[derive(Debug, Clone)]
pub struct ForecastRunner {
    /// Time between scheduled runs, measured from the end of the last run.
    pub interval: Duration,
    /// Consecutive failed runs retried before waiting for the next interval.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub engine: ForecastingConfig,
}

impl Default for ForecastRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            engine: ForecastingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Trigger,
    Shutdown,
}

/// Owns a running forecaster thread.
///
/// Dropping the handle stops the thread and waits for it, same as
/// [`ForecastRunnerHandle::shutdown`].
#[derive(Debug)]
pub struct ForecastRunnerHandle {
    control: mpsc::Sender<Control>,
    join: Option<thread::JoinHandle<()>>,
}

impl ForecastRunnerHandle {
    /// Ask for a fresh forecast, e.g. after new monthly aggregates land.
    ///
    /// Requests queued while a run is in progress collapse into one run.
    pub fn trigger(&self) {
        let _ = self.control.send(Control::Trigger);
    }

    /// Stop the runner and wait for its thread to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.control.send(Control::Shutdown);
        let _ = join.join();
    }
}

impl Drop for ForecastRunnerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl ForecastRunner {
    /// Spawn a thread that forecasts `tenant_id` on startup, every `interval`
    /// and on [`ForecastRunnerHandle::trigger`].
    ///
    /// Failed runs are logged and retried with doubling delays (at most
    /// `max_retries` in a row); they never reach the caller.
    pub fn spawn_for_tenant<R, S>(
        &self,
        name: &'static str,
        tenant_id: TenantId,
        reader: Arc<R>,
        sink: Arc<S>,
    ) -> std::io::Result<ForecastRunnerHandle>
    where
        R: SeriesReader + 'static,
        S: InsightSink + 'static,
    {
        let (control_tx, control_rx) = mpsc::channel();
        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run_tenant(name, tenant_id, &cfg, &control_rx, &*reader, &*sink))?;

        Ok(ForecastRunnerHandle {
            control: control_tx,
            join: Some(join),
        })
    }
}

fn run_tenant<R, S>(
    name: &'static str,
    tenant_id: TenantId,
    cfg: &ForecastRunner,
    control: &mpsc::Receiver<Control>,
    reader: &R,
    sink: &S,
) where
    R: SeriesReader,
    S: InsightSink,
{
    info!(
        runner = name,
        tenant = %tenant_id,
        algorithm = cfg.engine.algorithm.as_str(),
        horizon = cfg.engine.effective_horizon(),
        "forecast runner started"
    );

    let scheduler =
        LocalForecastScheduler::for_tenant(tenant_id).with_config(cfg.engine.clone());
    let mut next_run = Instant::now();
    let mut failures: u32 = 0;

    loop {
        let wait = next_run.saturating_duration_since(Instant::now());
        match control.recv_timeout(wait) {
            Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Ok(Control::Trigger) => {
                if stop_requested_while_draining(control) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        match scheduler.forecast_tenant(reader, tenant_id) {
            Ok(report) => {
                failures = 0;
                next_run = Instant::now() + cfg.interval;
                info!(
                    runner = name,
                    tenant = %tenant_id,
                    budget = report.forecast.budget.prediction,
                    beneficiaries = report.forecast.beneficiaries.prediction,
                    quality = report.forecast.quality.prediction,
                    budget_data = %report.data_quality.budget.recommendation,
                    "tenant forecast emitted"
                );
                sink.emit(tenant_id, report);
            }
            Err(e) => {
                failures += 1;
                let delay = if failures <= cfg.max_retries {
                    retry_delay(cfg.base_backoff, failures)
                } else {
                    failures = 0;
                    cfg.interval
                };
                warn!(
                    runner = name,
                    tenant = %tenant_id,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "tenant forecast failed"
                );
                next_run = Instant::now() + delay;
            }
        }
    }

    info!(runner = name, tenant = %tenant_id, "forecast runner stopped");
}

/// Collapse queued triggers into the run about to start. Returns `true` if a
/// shutdown was queued behind them (or the handle is gone).
fn stop_requested_while_draining(control: &mpsc::Receiver<Control>) -> bool {
    loop {
        match control.try_recv() {
            Ok(Control::Trigger) => {}
            Ok(Control::Shutdown) | Err(TryRecvError::Disconnected) => return true,
            Err(TryRecvError::Empty) => return false,
        }
    }
}

/// `base * 2^(attempt - 1)`, capped at [`MAX_RETRY_DELAY`].
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(MAX_RETRY_DELAY)
}
