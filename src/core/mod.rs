mod error;
mod plans;
mod projection;
mod simulation;
mod statistics;
mod types;

pub use error::{SimulationError, StatisticsError};
pub use plans::PlanSet;
pub use projection::{invested_amount, project};
pub use simulation::{
    MAX_VISUALIZED_PATHS, MonteCarloSimulator, PATH_SAMPLE_INTERVAL_DAYS, PROGRESS_INTERVAL,
    run_simulation, sample_normal,
};
pub use statistics::{ReturnStatistics, mean, quantile, sample_std_dev};
pub use types::{
    CompoundingOrder, EventKind, FinancialEvent, KID_EXPENSE_YEARS, Plan, PlanId, PlanKind,
    PlanType, ProjectionParams, SimulationParams, SimulationResult, TRADING_DAYS_PER_YEAR,
    YearlyResult,
};
