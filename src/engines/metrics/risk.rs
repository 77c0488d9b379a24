// src/engines/metrics/risk.rs

pub struct RiskMetrics;

impl RiskMetrics {
    /// Largest peak-to-trough decline as a fraction of the peak.
    pub fn max_drawdown(series: &[f64]) -> f64 {
        let Some(&first) = series.first() else {
            return 0.0;
        };
        let mut max_dd = 0.0;
        let mut peak = first;

        for &value in series.iter() {
            if value > peak {
                peak = value;
            }
            if peak > 0.0 {
                let dd = (peak - value) / peak;
                if dd > max_dd {
                    max_dd = dd;
                }
            }
        }

        max_dd
    }

    pub fn calculate_returns(series: &[f64]) -> Vec<f64> {
        series
            .windows(2)
            .filter(|w| w[0] != 0.0)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect()
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population standard deviation
    pub fn std_dev(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }

        let mean = Self::mean(values);
        let variance = values
            .iter()
            .map(|&v| (v - mean).powi(2))
            .sum::<f64>()
            / values.len() as f64;

        variance.sqrt()
    }

    /// Pearson correlation over the common prefix of both series.
    pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
        let n = a.len().min(b.len());
        if n < 2 {
            return 0.0;
        }
        let (a, b) = (&a[..n], &b[..n]);
        let (mean_a, mean_b) = (Self::mean(a), Self::mean(b));

        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (x, y) in a.iter().zip(b) {
            let (dx, dy) = (x - mean_a, y - mean_b);
            cov += dx * dy;
            var_a += dx * dx;
            var_b += dy * dy;
        }

        if var_a == 0.0 || var_b == 0.0 {
            return 0.0;
        }
        (cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_drawdown() {
        let equity = vec![100.0, 120.0, 90.0, 130.0, 117.0];
        assert!((RiskMetrics::max_drawdown(&equity) - 0.25).abs() < 1e-9);
        assert_eq!(RiskMetrics::max_drawdown(&[]), 0.0);
    }

    #[test]
    fn test_correlation_bounds() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![2.0, 4.0, 6.0, 8.0];
        let c = vec![4.0, 3.0, 2.0, 1.0];
        assert!((RiskMetrics::correlation(&a, &b) - 1.0).abs() < 1e-9);
        assert!((RiskMetrics::correlation(&a, &c) + 1.0).abs() < 1e-9);
        assert_eq!(RiskMetrics::correlation(&a, &[1.0, 1.0, 1.0, 1.0]), 0.0);
    }
}
