use std::f64::consts::PI;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::SimulationError;
use super::statistics::{ReturnStatistics, mean, quantile};
use super::types::{Plan, PlanKind, SimulationParams, SimulationResult, TRADING_DAYS_PER_YEAR};

/// Trading days between recorded path points (about one month).
pub const PATH_SAMPLE_INTERVAL_DAYS: u32 = 21;
pub const MAX_VISUALIZED_PATHS: usize = 100;
/// Paths between progress updates and cooperative yields.
pub const PROGRESS_INTERVAL: u32 = 10;

/// Runs `simulations` paths to completion without yielding.
pub fn run_simulation<R: Rng + ?Sized>(
    params: &SimulationParams,
    stats: &ReturnStatistics,
    simulations: u32,
    rng: &mut R,
) -> SimulationResult {
    let runner = PathRunner::new(params, stats);
    let mut collector = PathCollector::new(simulations);
    for _ in 0..simulations {
        let (path, final_value) = runner.run_path(rng);
        collector.push(path, final_value);
    }
    collector.finish()
}

/// Cooperative Monte Carlo runner. One run at a time; progress is published on
/// a watch channel while a run is in flight.
#[derive(Debug)]
pub struct MonteCarloSimulator {
    busy: AtomicBool,
    progress: watch::Sender<f64>,
    // Token of the run holding `busy`. Claimed and cleared under this lock.
    current_cancel: Mutex<Option<CancellationToken>>,
}

impl Default for MonteCarloSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl MonteCarloSimulator {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(0.0);
        Self {
            busy: AtomicBool::new(false),
            progress,
            current_cancel: Mutex::new(None),
        }
    }

    /// Completion percentage of the in-flight run, 0 when idle.
    pub fn progress(&self) -> watch::Receiver<f64> {
        self.progress.subscribe()
    }

    pub fn current_progress(&self) -> f64 {
        *self.progress.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Cancels the in-flight run, if any. Returns whether a run was signalled.
    pub fn cancel_current(&self) -> bool {
        match self.lock_current_cancel().as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn lock_current_cancel(&self) -> std::sync::MutexGuard<'_, Option<CancellationToken>> {
        self.current_cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Same result as [`run_simulation`], but yields to the runtime every
    /// [`PROGRESS_INTERVAL`] paths and stops early once `cancel` fires.
    pub async fn simulate<R: Rng + ?Sized>(
        &self,
        params: &SimulationParams,
        stats: &ReturnStatistics,
        simulations: u32,
        rng: &mut R,
        cancel: &CancellationToken,
    ) -> Result<SimulationResult, SimulationError> {
        let _guard = BusyGuard::acquire(self, cancel)?;
        let runner = PathRunner::new(params, stats);
        let mut collector = PathCollector::new(simulations);

        for sim in 0..simulations {
            let (path, final_value) = runner.run_path(rng);
            collector.push(path, final_value);

            if sim % PROGRESS_INTERVAL == 0 || sim + 1 == simulations {
                let completed = sim + 1;
                self.progress
                    .send_replace(f64::from(completed) * 100.0 / f64::from(simulations));
                debug!(completed, simulations, "monte carlo progress");

                tokio::task::yield_now().await;
                if cancel.is_cancelled() {
                    return Err(SimulationError::Cancelled {
                        completed,
                        requested: simulations,
                    });
                }
            }
        }

        Ok(collector.finish())
    }
}

struct BusyGuard<'a> {
    simulator: &'a MonteCarloSimulator,
}

impl<'a> BusyGuard<'a> {
    fn acquire(
        simulator: &'a MonteCarloSimulator,
        cancel: &CancellationToken,
    ) -> Result<Self, SimulationError> {
        let mut current = simulator.lock_current_cancel();
        simulator
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SimulationError::Reentrancy)?;
        *current = Some(cancel.clone());
        simulator.progress.send_replace(0.0);
        Ok(Self { simulator })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut current = self.simulator.lock_current_cancel();
        *current = None;
        self.simulator.progress.send_replace(0.0);
        self.simulator.busy.store(false, Ordering::Release);
    }
}

/// Draws from Normal(mean, std_dev) with the Box-Muller transform.
pub fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        return mean;
    }
    // (0, 1] keeps the logarithm finite.
    let u1 = 1.0 - rng.gen_range(0.0_f64..1.0);
    let u2 = rng.gen_range(0.0_f64..1.0);
    let z0 = (-2.0 * f64::ln(u1)).sqrt() * (2.0 * PI * u2).cos();
    mean + std_dev * z0
}

struct PathRunner {
    initial_value: f64,
    daily_flow_by_year: Vec<f64>,
    total_days: u32,
    mean: f64,
    std_dev: f64,
}

impl PathRunner {
    fn new(params: &SimulationParams, stats: &ReturnStatistics) -> Self {
        let years = params.horizon_years();
        Self {
            initial_value: params.initial_investment,
            daily_flow_by_year: (0..years)
                .map(|year| daily_plan_flow(&params.plans, year))
                .collect(),
            total_days: years.saturating_mul(TRADING_DAYS_PER_YEAR),
            mean: stats.mean_daily_return,
            std_dev: stats.std_dev_daily_return,
        }
    }

    fn run_path<R: Rng + ?Sized>(&self, rng: &mut R) -> (Vec<f64>, f64) {
        let mut value = self.initial_value;
        let points = (self.total_days / PATH_SAMPLE_INTERVAL_DAYS) as usize + 2;
        let mut path = Vec::with_capacity(points);
        path.push(value);

        for day in 0..self.total_days {
            let year = (day / TRADING_DAYS_PER_YEAR) as usize;
            value += self.daily_flow_by_year[year];
            value *= 1.0 + sample_normal(rng, self.mean, self.std_dev);

            if day % PATH_SAMPLE_INTERVAL_DAYS == 0 {
                path.push(value);
            }
        }

        (path, value)
    }
}

fn daily_plan_flow(plans: &[Plan], year: u32) -> f64 {
    let days = f64::from(TRADING_DAYS_PER_YEAR);
    let active = || plans.iter().filter(move |plan| plan.is_active(year));

    let daily_salary: f64 = active()
        .filter_map(|plan| plan.adjusted_monthly_salary(year))
        .map(|monthly| monthly * 12.0 / days)
        .sum();

    let transfers: f64 = active()
        .map(|plan| match plan.kind {
            PlanKind::Salary { .. } => 0.0,
            PlanKind::Savings {
                is_percentage: false,
            } => plan.amount / days,
            PlanKind::Savings {
                is_percentage: true,
            } => daily_salary * (plan.amount / 100.0),
            PlanKind::Withdrawal => -plan.amount / days,
        })
        .sum();

    daily_salary + transfers
}

struct PathCollector {
    final_values: Vec<f64>,
    paths: Vec<Vec<f64>>,
    stride: usize,
}

impl PathCollector {
    fn new(simulations: u32) -> Self {
        let simulations = simulations as usize;
        Self {
            final_values: Vec::with_capacity(simulations),
            paths: Vec::with_capacity(simulations.min(MAX_VISUALIZED_PATHS)),
            stride: (simulations / MAX_VISUALIZED_PATHS).max(1),
        }
    }

    fn push(&mut self, path: Vec<f64>, final_value: f64) {
        let index = self.final_values.len();
        if index % self.stride == 0 && self.paths.len() < MAX_VISUALIZED_PATHS {
            self.paths.push(path);
        }
        self.final_values.push(final_value);
    }

    fn finish(mut self) -> SimulationResult {
        self.final_values.sort_by(|a, b| a.total_cmp(b));
        SimulationResult {
            mean_final_value: mean(&self.final_values).ok(),
            percentile5: quantile(&self.final_values, 0.05).ok(),
            percentile95: quantile(&self.final_values, 0.95).ok(),
            final_values: self.final_values,
            paths: self.paths,
        }
    }
}
