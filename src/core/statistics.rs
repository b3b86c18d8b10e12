use serde::Serialize;

use super::error::StatisticsError;
use super::types::TRADING_DAYS_PER_YEAR;

/// Daily return distribution derived from a historical price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnStatistics {
    pub mean_daily_return: f64,
    pub std_dev_daily_return: f64,
    /// Number of daily returns the moments were computed from.
    pub sample_count: usize,
}

impl ReturnStatistics {
    /// Derives simple daily returns from `prices` ordered oldest to newest.
    pub fn from_prices(prices: &[f64]) -> Result<Self, StatisticsError> {
        if prices.len() < 2 {
            return Err(StatisticsError::InsufficientData {
                found: prices.len(),
            });
        }

        let returns: Vec<f64> = prices
            .windows(2)
            .map(|pair| (pair[1] - pair[0]) / pair[0])
            .collect();

        Ok(Self {
            mean_daily_return: mean(&returns)?,
            std_dev_daily_return: sample_std_dev(&returns)?,
            sample_count: returns.len(),
        })
    }

    /// Distribution with fixed moments, for callers that already know them.
    pub fn from_moments(mean_daily_return: f64, std_dev_daily_return: f64) -> Self {
        Self {
            mean_daily_return,
            std_dev_daily_return,
            sample_count: 0,
        }
    }

    pub fn annualized_return(&self) -> f64 {
        (1.0 + self.mean_daily_return).powi(TRADING_DAYS_PER_YEAR as i32) - 1.0
    }

    pub fn annualized_volatility(&self) -> f64 {
        self.std_dev_daily_return * f64::from(TRADING_DAYS_PER_YEAR).sqrt()
    }
}

pub fn mean(values: &[f64]) -> Result<f64, StatisticsError> {
    if values.is_empty() {
        return Err(StatisticsError::EmptyInput { what: "mean" });
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with Bessel's correction. A single value has no spread.
pub fn sample_std_dev(values: &[f64]) -> Result<f64, StatisticsError> {
    let m = mean(values)?;
    if values.len() == 1 {
        return Ok(0.0);
    }
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Linear-interpolation quantile of an ascending slice, `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Result<f64, StatisticsError> {
    if sorted.is_empty() {
        return Err(StatisticsError::EmptyInput { what: "quantile" });
    }

    let pos = (sorted.len() - 1) as f64 * q.clamp(0.0, 1.0);
    let base = pos.floor() as usize;
    let rest = pos - base as f64;
    match sorted.get(base + 1) {
        Some(next) => Ok(sorted[base] + rest * (next - sorted[base])),
        None => Ok(sorted[base]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn quantile_interpolates_between_points() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_approx(quantile(&values, 0.5).unwrap(), 2.5);
        assert_approx(quantile(&values, 0.0).unwrap(), 1.0);
        assert_approx(quantile(&values, 1.0).unwrap(), 4.0);
        assert_approx(quantile(&values, 0.05).unwrap(), 1.15);
        assert_approx(quantile(&values, 0.95).unwrap(), 3.85);
    }

    #[test]
    fn quantile_of_single_value_is_that_value() {
        assert_approx(quantile(&[7.5], 0.95).unwrap(), 7.5);
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(
            quantile(&[], 0.5),
            Err(StatisticsError::EmptyInput { what: "quantile" })
        );
        assert_eq!(mean(&[]), Err(StatisticsError::EmptyInput { what: "mean" }));
    }

    #[test]
    fn fewer_than_two_prices_is_insufficient() {
        assert_eq!(
            ReturnStatistics::from_prices(&[]),
            Err(StatisticsError::InsufficientData { found: 0 })
        );
        assert_eq!(
            ReturnStatistics::from_prices(&[100.0]),
            Err(StatisticsError::InsufficientData { found: 1 })
        );
    }

    #[test]
    fn two_prices_give_one_return_without_spread() {
        let stats = ReturnStatistics::from_prices(&[100.0, 110.0]).unwrap();
        assert_approx(stats.mean_daily_return, 0.1);
        assert_approx(stats.std_dev_daily_return, 0.0);
        assert_eq!(stats.sample_count, 1);
    }

    #[test]
    fn constant_series_has_zero_moments() {
        let stats = ReturnStatistics::from_prices(&[50.0; 40]).unwrap();
        assert_eq!(stats.mean_daily_return, 0.0);
        assert_eq!(stats.std_dev_daily_return, 0.0);
        assert_eq!(stats.sample_count, 39);
    }

    #[test]
    fn std_dev_uses_bessel_correction() {
        // +10%, -10%, +10%
        let stats = ReturnStatistics::from_prices(&[100.0, 110.0, 99.0, 108.9]).unwrap();
        let returns = [0.1, -0.1, 0.1];
        let m = returns.iter().sum::<f64>() / 3.0;
        let var = returns.iter().map(|r| (r - m).powi(2)).sum::<f64>() / 2.0;
        assert_approx(stats.mean_daily_return, m);
        assert_approx(stats.std_dev_daily_return, var.sqrt());
    }

    #[test]
    fn annualization_uses_trading_days() {
        let stats = ReturnStatistics::from_moments(0.0004, 0.01);
        assert_approx(stats.annualized_return(), 1.0004_f64.powi(252) - 1.0);
        assert_approx(stats.annualized_volatility(), 0.01 * 252.0_f64.sqrt());
    }

    proptest! {
        #[test]
        fn prop_increasing_prices_have_positive_mean(
            start in 1u32..10_000,
            steps in proptest::collection::vec(1u32..500, 1..60),
        ) {
            let mut prices = vec![start as f64];
            for step in steps {
                let last = prices[prices.len() - 1];
                prices.push(last + step as f64);
            }
            let stats = ReturnStatistics::from_prices(&prices).unwrap();
            prop_assert!(stats.mean_daily_return > 0.0);
            prop_assert!(stats.std_dev_daily_return >= 0.0);
        }

        #[test]
        fn prop_quantile_stays_within_bounds(
            mut values in proptest::collection::vec(-1e6f64..1e6, 1..200),
            q in 0.0f64..=1.0,
        ) {
            values.sort_by(|a, b| a.total_cmp(b));
            let v = quantile(&values, q).unwrap();
            prop_assert!(v >= values[0] - 1e-6);
            prop_assert!(v <= values[values.len() - 1] + 1e-6);
        }
    }
}
