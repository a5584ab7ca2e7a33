//! Return and risk statistics over daily series
//!
//! Conventions follow the usual pandas definitions: percentage change
//! returns, sample standard deviation, compounding for cumulative values.

/// Percentage change between consecutive prices
///
/// A zero price yields a zero return rather than infinity.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| if w[0] == 0.0 { 0.0 } else { w[1] / w[0] - 1.0 })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); zero with fewer than two values
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

/// Weighted sum of per-asset returns, day by day
///
/// The weights apply afresh each day, which is a portfolio rebalanced back
/// to `weights` at every close.
///
/// `asset_returns[i]` is the return series of asset `i`; all series must be
/// the same length.
pub fn portfolio_returns(asset_returns: &[Vec<f64>], weights: &[f64]) -> Vec<f64> {
    let days = asset_returns.iter().map(Vec::len).min().unwrap_or(0);
    (0..days)
        .map(|day| {
            asset_returns
                .iter()
                .zip(weights)
                .map(|(series, w)| series[day] * w)
                .sum()
        })
        .collect()
}

/// Value of `initial` compounded by each return
pub fn cumulative_values(returns: &[f64], initial: f64) -> Vec<f64> {
    returns
        .iter()
        .scan(initial, |value, r| {
            *value *= 1.0 + r;
            Some(*value)
        })
        .collect()
}

/// Compounded return over the whole series
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Scale a total return over `periods` days to a yearly rate
pub fn annualized_return(total: f64, periods: usize, days_per_year: f64) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    (1.0 + total).powf(days_per_year / periods as f64) - 1.0
}

/// Annualised volatility of daily returns
pub fn volatility(returns: &[f64], days_per_year: f64) -> f64 {
    sample_std(returns) * days_per_year.sqrt()
}

/// Annualised Sharpe ratio: (mean × days - rf) / annualised vol
///
/// Zero when the volatility is zero or there are fewer than two returns.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, days_per_year: f64) -> f64 {
    let vol = volatility(returns, days_per_year);
    if returns.len() < 2 || vol == 0.0 {
        return 0.0;
    }
    (mean(returns) * days_per_year - risk_free_rate) / vol
}

/// Deepest peak-to-trough fall of the compounded series, as a negative fraction
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut peak = 1.0_f64;
    let mut worst = 0.0_f64;
    for value in cumulative_values(returns, 1.0) {
        peak = peak.max(value);
        worst = worst.min((value - peak) / peak);
    }
    worst
}

/// Fraction of days with a positive return
pub fn win_rate(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    returns.iter().filter(|r| **r > 0.0).count() as f64 / returns.len() as f64
}

/// Sharpe ratio over a trailing window, aligned with `returns`
///
/// Entries before the first full window, and windows with zero volatility,
/// are `None`.
pub fn rolling_sharpe(returns: &[f64], window: usize, risk_free_rate: f64, days_per_year: f64) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; returns.len()];
    }
    (0..returns.len())
        .map(|end| {
            if end + 1 < window {
                return None;
            }
            let slice = &returns[end + 1 - window..=end];
            let vol = volatility(slice, days_per_year);
            (vol > 0.0).then(|| (mean(slice) * days_per_year - risk_free_rate) / vol)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_daily_returns() {
        let r = daily_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.10).abs() < EPS);
        assert!((r[1] + 0.10).abs() < EPS);
        assert!(daily_returns(&[5.0]).is_empty());
    }

    #[test]
    fn test_sample_std() {
        // 2, 4, 4, 4, 5, 5, 7, 9: sample variance 32/7
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((sample_std(&v) - (32.0_f64 / 7.0).sqrt()).abs() < EPS);
        assert_eq!(sample_std(&[1.0]), 0.0);
    }

    #[test]
    fn test_portfolio_returns_weighted() {
        let assets = vec![vec![0.10, 0.0], vec![0.0, -0.20]];
        let r = portfolio_returns(&assets, &[0.5, 0.5]);
        assert!((r[0] - 0.05).abs() < EPS);
        assert!((r[1] + 0.10).abs() < EPS);
    }

    #[test]
    fn test_portfolio_returns_rebalance_daily() {
        // A doubles on day one, B on day two. Held without rebalancing the
        // pair ends at 2.0x; reset to 50/50 each day it compounds 1.5 * 1.5.
        let assets = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let r = portfolio_returns(&assets, &[0.5, 0.5]);
        assert!((total_return(&r) - 1.25).abs() < EPS);
    }

    #[test]
    fn test_cumulative_and_total() {
        let returns = [0.10, -0.10];
        let values = cumulative_values(&returns, 100_000.0);
        assert!((values[0] - 110_000.0).abs() < 1e-6);
        assert!((values[1] - 99_000.0).abs() < 1e-6);
        assert!((total_return(&returns) + 0.01).abs() < EPS);
    }

    #[test]
    fn test_annualized_return() {
        // Doubling over a full year of 252 days is 100% a year
        assert!((annualized_return(1.0, 252, 252.0) - 1.0).abs() < EPS);
        // 10% over half a year compounds to 21%
        assert!((annualized_return(0.10, 126, 252.0) - 0.21).abs() < EPS);
        assert_eq!(annualized_return(0.5, 0, 252.0), 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        // 1.0 -> 1.2 -> 0.9 -> 1.1: trough 0.9 from peak 1.2 is -25%
        let returns = [0.2, -0.25, 1.1 / 0.9 - 1.0];
        assert!((max_drawdown(&returns) + 0.25).abs() < EPS);
        assert_eq!(max_drawdown(&[0.01, 0.02]), 0.0);
    }

    #[test]
    fn test_win_rate() {
        assert!((win_rate(&[0.01, -0.02, 0.0, 0.03]) - 0.5).abs() < EPS);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn test_sharpe_ratio() {
        let returns = [0.01, -0.005, 0.02, 0.0];
        let expected = (mean(&returns) * 252.0 - 0.05) / (sample_std(&returns) * 252.0_f64.sqrt());
        assert!((sharpe_ratio(&returns, 0.05, 252.0) - expected).abs() < EPS);

        // Flat series and single observations are zero, not NaN
        assert_eq!(sharpe_ratio(&[0.0, 0.0, 0.0], 0.05, 252.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.01], 0.05, 252.0), 0.0);
    }

    #[test]
    fn test_rolling_sharpe_alignment() {
        let returns = [0.01, 0.02, 0.0, 0.0, 0.0];
        let rolling = rolling_sharpe(&returns, 3, 0.0, 252.0);
        assert_eq!(rolling.len(), 5);
        assert!(rolling[0].is_none() && rolling[1].is_none());
        let expected = sharpe_ratio(&returns[0..3], 0.0, 252.0);
        assert!((rolling[2].unwrap() - expected).abs() < EPS);
        // Last window is flat
        assert!(rolling[4].is_none());
    }
}
