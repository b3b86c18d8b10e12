//! JSON request payloads and their conversion into engine parameters.
//!
//! Every field is optional and falls back to the planner defaults. Plan and
//! event rows are decoded leniently: rows the engines cannot interpret are
//! dropped with a warning instead of failing the whole request.

use serde::Deserialize;
use tracing::warn;

use crate::core::{
    CompoundingOrder, FinancialEvent, Plan, PlanKind, PlanSet, ProjectionParams,
    SimulationParams,
};

pub const DEFAULT_SIMULATIONS: u32 = 1_000;
pub const MAX_SIMULATIONS: u32 = 100_000;
pub const MAX_YEARS: u32 = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    pub id: u32,
    #[serde(rename = "type")]
    pub plan_type: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub is_percentage: Option<bool>,
    #[serde(default)]
    pub start_year: i64,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub yearly_increase: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    pub year: i64,
    pub monthly_expense_increase: Option<f64>,
    pub salary_reduction_percent: Option<f64>,
    pub salary_reduction_years: Option<i64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiCompoundingOrder {
    #[serde(alias = "beforeTransactions", alias = "before_transactions")]
    BeforeTransactions,
    #[serde(alias = "afterTransactions", alias = "after_transactions")]
    AfterTransactions,
}

impl From<ApiCompoundingOrder> for CompoundingOrder {
    fn from(value: ApiCompoundingOrder) -> Self {
        match value {
            ApiCompoundingOrder::BeforeTransactions => CompoundingOrder::BeforeTransactions,
            ApiCompoundingOrder::AfterTransactions => CompoundingOrder::AfterTransactions,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectPayload {
    pub initial_investment: Option<f64>,
    pub initial_cash: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub interest_rate: Option<f64>,
    pub plans: Option<Vec<PlanPayload>>,
    pub events: Option<Vec<EventPayload>>,
    pub years: Option<u32>,
    pub compounding: Option<ApiCompoundingOrder>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulatePayload {
    pub initial_investment: Option<f64>,
    pub plans: Option<Vec<PlanPayload>>,
    pub simulations: Option<u32>,
    pub seed: Option<u64>,
    pub years: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SimulateRequest {
    pub params: SimulationParams,
    pub simulations: u32,
    pub seed: Option<u64>,
}

pub fn default_projection_params() -> ProjectionParams {
    ProjectionParams {
        initial_investment: 1_000.0,
        initial_cash: 5_000.0,
        monthly_expenses: 2_000.0,
        interest_rate: 0.05,
        plans: Vec::new(),
        events: Vec::new(),
        years: 25,
        compounding: CompoundingOrder::BeforeTransactions,
    }
}

pub fn default_simulation_params() -> SimulationParams {
    SimulationParams {
        initial_investment: 50_000.0,
        plans: Vec::new(),
        years: None,
    }
}

pub fn projection_params_from_payload(payload: ProjectPayload) -> Result<ProjectionParams, String> {
    let mut params = default_projection_params();

    if let Some(v) = payload.initial_investment {
        params.initial_investment = v;
    }
    if let Some(v) = payload.initial_cash {
        params.initial_cash = v;
    }
    if let Some(v) = payload.monthly_expenses {
        params.monthly_expenses = v;
    }
    if let Some(v) = payload.interest_rate {
        params.interest_rate = v;
    }
    if let Some(v) = payload.years {
        params.years = v;
    }
    if let Some(v) = payload.compounding {
        params.compounding = v.into();
    }
    if let Some(rows) = payload.plans {
        params.plans = plans_from_rows(rows);
    }
    if let Some(rows) = payload.events {
        params.events = rows.into_iter().filter_map(event_from_row).collect();
    }

    check_finite("initialInvestment", params.initial_investment)?;
    check_finite("initialCash", params.initial_cash)?;
    check_finite("monthlyExpenses", params.monthly_expenses)?;
    check_finite("interestRate", params.interest_rate)?;
    if params.years > MAX_YEARS {
        return Err(format!("years must be <= {MAX_YEARS}"));
    }

    Ok(params)
}

pub fn simulate_request_from_payload(payload: SimulatePayload) -> Result<SimulateRequest, String> {
    let mut params = default_simulation_params();

    if let Some(v) = payload.initial_investment {
        params.initial_investment = v;
    }
    if let Some(rows) = payload.plans {
        params.plans = plans_from_rows(rows);
    }
    params.years = payload.years;

    check_finite("initialInvestment", params.initial_investment)?;
    let simulations = payload.simulations.unwrap_or(DEFAULT_SIMULATIONS);
    if simulations > MAX_SIMULATIONS {
        return Err(format!("simulations must be <= {MAX_SIMULATIONS}"));
    }
    if params.horizon_years() > MAX_YEARS {
        return Err(format!("simulated horizon must be <= {MAX_YEARS} years"));
    }

    Ok(SimulateRequest {
        params,
        simulations,
        seed: payload.seed,
    })
}

fn check_finite(name: &str, value: f64) -> Result<(), String> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(format!("{name} must be a finite number"))
    }
}

fn plans_from_rows(rows: Vec<PlanPayload>) -> Vec<Plan> {
    let mut set = PlanSet::new();
    for plan in rows.into_iter().filter_map(plan_from_row) {
        let id = plan.id;
        if !set.insert(plan) {
            warn!(plan_id = id, "ignoring plan with duplicate id");
        }
    }
    set.into_plans()
}

/// Builds an engine plan, reading only the fields that belong to its type.
fn plan_from_row(row: PlanPayload) -> Option<Plan> {
    let kind = match row.plan_type.as_str() {
        "salary" => PlanKind::Salary {
            yearly_increase: row.yearly_increase,
        },
        "savings" => PlanKind::Savings {
            is_percentage: row.is_percentage.unwrap_or(false),
        },
        "withdrawal" => PlanKind::Withdrawal,
        other => {
            warn!(plan_id = row.id, plan_type = other, "ignoring plan with unknown type");
            return None;
        }
    };

    let Ok(start_year) = u32::try_from(row.start_year) else {
        warn!(
            plan_id = row.id,
            start_year = row.start_year,
            "ignoring plan with out-of-range start year"
        );
        return None;
    };

    Some(Plan {
        id: row.id,
        kind,
        amount: row.amount,
        start_year,
        duration: u32::try_from(row.duration.max(0)).unwrap_or(u32::MAX),
    })
}

fn event_from_row(row: EventPayload) -> Option<FinancialEvent> {
    if row.event_type != "kid" {
        warn!(event_type = %row.event_type, "ignoring event with unknown type");
        return None;
    }
    let Ok(year) = u32::try_from(row.year) else {
        warn!(year = row.year, "ignoring event with out-of-range year");
        return None;
    };

    let mut event = FinancialEvent::kid(year);
    if let Some(v) = row.monthly_expense_increase {
        event.monthly_expense_increase = v;
    }
    if let Some(v) = row.salary_reduction_percent {
        event.salary_reduction_percent = v;
    }
    if let Some(v) = row.salary_reduction_years {
        event.salary_reduction_years = u32::try_from(v.max(0)).unwrap_or(u32::MAX);
    }
    Some(event)
}
