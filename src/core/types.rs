use serde::Serialize;

/// Trading days in one simulated year.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Years a child adds to household expenses.
pub const KID_EXPENSE_YEARS: u32 = 18;

pub type PlanId = u32;

/// Type-specific behaviour of a plan.
///
/// Fields that only make sense for one plan type live inside that variant, so a
/// withdrawal can never carry a yearly increase and a salary can never be a
/// percentage.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PlanKind {
    /// Monthly salary, optionally compounding by `yearly_increase` percent per
    /// year since the plan started.
    Salary { yearly_increase: Option<f64> },
    /// Monthly fixed amount, or a percentage of the year's positive cash flow.
    Savings { is_percentage: bool },
    /// Percentage of the investment balance moved to cash each year.
    Withdrawal,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PlanType {
    Salary,
    Savings,
    Withdrawal,
}

impl PlanKind {
    pub fn plan_type(self) -> PlanType {
        match self {
            PlanKind::Salary { .. } => PlanType::Salary,
            PlanKind::Savings { .. } => PlanType::Savings,
            PlanKind::Withdrawal => PlanType::Withdrawal,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Plan {
    pub id: PlanId,
    pub kind: PlanKind,
    pub amount: f64,
    pub start_year: u32,
    pub duration: u32,
}

impl Plan {
    pub fn is_active(&self, year: u32) -> bool {
        year >= self.start_year && year - self.start_year < self.duration
    }

    /// First year after the plan has ended.
    pub fn end_year(&self) -> u32 {
        self.start_year.saturating_add(self.duration)
    }

    /// Monthly salary in `year` after compounding the yearly increase from the
    /// plan's own start year. `None` for non-salary plans.
    pub fn adjusted_monthly_salary(&self, year: u32) -> Option<f64> {
        let PlanKind::Salary { yearly_increase } = self.kind else {
            return None;
        };
        let elapsed = i32::try_from(year.saturating_sub(self.start_year)).unwrap_or(i32::MAX);
        Some(match yearly_increase {
            Some(increase) => self.amount * (1.0 + increase / 100.0).powi(elapsed),
            None => self.amount,
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventKind {
    Kid,
}

/// A life event perturbing expenses and salaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FinancialEvent {
    pub kind: EventKind,
    pub year: u32,
    pub monthly_expense_increase: f64,
    pub salary_reduction_percent: f64,
    pub salary_reduction_years: u32,
}

impl FinancialEvent {
    /// A child born in `year` with the default cost and parental-leave profile.
    pub fn kid(year: u32) -> Self {
        Self {
            kind: EventKind::Kid,
            year,
            monthly_expense_increase: 500.0,
            salary_reduction_percent: 20.0,
            salary_reduction_years: 3,
        }
    }

    pub fn adds_expenses(&self, year: u32) -> bool {
        match self.kind {
            EventKind::Kid => year >= self.year && year - self.year < KID_EXPENSE_YEARS,
        }
    }

    pub fn reduces_salary(&self, year: u32) -> bool {
        match self.kind {
            EventKind::Kid => year >= self.year && year - self.year < self.salary_reduction_years,
        }
    }
}

/// When yearly interest is credited relative to that year's plan transfers.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CompoundingOrder {
    /// Interest first, so withdrawals and savings act on the grown balance.
    #[default]
    BeforeTransactions,
    /// Withdrawals and savings first, then interest on the resulting balance.
    AfterTransactions,
}

#[derive(Clone, Debug)]
pub struct ProjectionParams {
    pub initial_investment: f64,
    pub initial_cash: f64,
    pub monthly_expenses: f64,
    pub interest_rate: f64,
    pub plans: Vec<Plan>,
    pub events: Vec<FinancialEvent>,
    pub years: u32,
    pub compounding: CompoundingOrder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyResult {
    pub year: u32,
    pub investment_balance: f64,
    pub cash_balance: f64,
    pub net_investments: f64,
    pub baseline_investments: f64,
}

#[derive(Clone, Debug)]
pub struct SimulationParams {
    pub initial_investment: f64,
    pub plans: Vec<Plan>,
    /// Explicit horizon; derived from the plans when `None`.
    pub years: Option<u32>,
}

impl SimulationParams {
    /// Simulated horizon: the explicit override, else the latest plan end, else
    /// one year.
    pub fn horizon_years(&self) -> u32 {
        self.years
            .or_else(|| self.plans.iter().map(Plan::end_year).max())
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub final_values: Vec<f64>,
    pub mean_final_value: Option<f64>,
    pub percentile5: Option<f64>,
    pub percentile95: Option<f64>,
    pub paths: Vec<Vec<f64>>,
}
