use super::types::{
    CompoundingOrder, FinancialEvent, Plan, PlanKind, ProjectionParams, YearlyResult,
};

#[derive(Debug)]
struct Balances {
    investments: f64,
    cash: f64,
    baseline: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct TransferTotals {
    invested: f64,
    withdrawn: f64,
}

/// Runs the yearly state machine and returns `years + 1` snapshots, each taken
/// before that year's flows are applied.
pub fn project(params: &ProjectionParams) -> Vec<YearlyResult> {
    let mut balances = Balances {
        investments: params.initial_investment,
        cash: params.initial_cash,
        baseline: params.initial_investment,
    };
    let growth = 1.0 + params.interest_rate;
    let mut results = Vec::with_capacity(params.years as usize + 1);

    for year in 0..=params.years {
        let mut snapshot = YearlyResult {
            year,
            investment_balance: balances.investments,
            cash_balance: balances.cash,
            net_investments: 0.0,
            baseline_investments: balances.baseline,
        };

        let yearly_expenses = yearly_expenses(params.monthly_expenses, &params.events, year);
        let yearly_income = yearly_income(&params.plans, &params.events, year);
        let yearly_cashflow = yearly_income - yearly_expenses;
        balances.cash += yearly_cashflow;

        if params.compounding == CompoundingOrder::BeforeTransactions {
            balances.investments *= growth;
        }
        balances.baseline *= growth;

        let mut totals = TransferTotals::default();
        apply_withdrawals(&params.plans, year, &mut balances, &mut totals);
        apply_savings(&params.plans, year, yearly_cashflow, &mut balances, &mut totals);

        if params.compounding == CompoundingOrder::AfterTransactions {
            balances.investments *= growth;
        }

        snapshot.net_investments = totals.invested - totals.withdrawn;
        results.push(snapshot);
    }

    results
}

pub fn invested_amount(initial_investment: f64, results: &[YearlyResult]) -> f64 {
    initial_investment + results.iter().map(|r| r.net_investments).sum::<f64>()
}

fn yearly_expenses(monthly_expenses: f64, events: &[FinancialEvent], year: u32) -> f64 {
    let event_monthly: f64 = events
        .iter()
        .filter(|event| event.adds_expenses(year))
        .map(|event| event.monthly_expense_increase)
        .sum();
    monthly_expenses * 12.0 + event_monthly * 12.0
}

fn yearly_income(plans: &[Plan], events: &[FinancialEvent], year: u32) -> f64 {
    plans
        .iter()
        .filter(|plan| plan.is_active(year))
        .filter_map(|plan| plan.adjusted_monthly_salary(year))
        .map(|salary| reduced_salary(salary, events, year) * 12.0)
        .sum()
}

fn reduced_salary(monthly_salary: f64, events: &[FinancialEvent], year: u32) -> f64 {
    events
        .iter()
        .filter(|event| event.reduces_salary(year))
        .fold(monthly_salary, |salary, event| {
            salary * (1.0 - event.salary_reduction_percent / 100.0)
        })
}

fn apply_withdrawals(
    plans: &[Plan],
    year: u32,
    balances: &mut Balances,
    totals: &mut TransferTotals,
) {
    for plan in plans {
        if plan.kind != PlanKind::Withdrawal || !plan.is_active(year) {
            continue;
        }
        let amount = balances.investments * (plan.amount / 100.0);
        balances.investments -= amount;
        balances.cash += amount;
        totals.withdrawn += amount;
    }
}

fn apply_savings(
    plans: &[Plan],
    year: u32,
    yearly_cashflow: f64,
    balances: &mut Balances,
    totals: &mut TransferTotals,
) {
    for plan in plans {
        let PlanKind::Savings { is_percentage } = plan.kind else {
            continue;
        };
        if !plan.is_active(year) {
            continue;
        }
        let amount = savings_amount(plan.amount, is_percentage, yearly_cashflow);
        if amount > 0.0 {
            balances.investments += amount;
            balances.cash -= amount;
            totals.invested += amount;
        }
    }
}

fn savings_amount(amount: f64, is_percentage: bool, yearly_cashflow: f64) -> f64 {
    if !is_percentage {
        return amount * 12.0;
    }
    if yearly_cashflow > 0.0 {
        yearly_cashflow * (amount / 100.0)
    } else {
        0.0
    }
}
