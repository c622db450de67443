//! Ordinary least squares trend projection.

use crate::forecaster::Forecaster;
use crate::result::{ForecastResult, Trend};
use crate::series::{HistoricalDataPoint, values};
use crate::stats::mean;

const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

/// Fitted line `value = slope * index + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination in \[0, 1\].
    pub r_squared: f64,
}

impl LinearFit {
    /// Fit over `index = 0..n-1`. Needs at least two values.
    pub fn fit(ys: &[f64]) -> Option<Self> {
        if ys.len() < 2 {
            return None;
        }

        let n = ys.len();
        let x_mean = (n - 1) as f64 / 2.0;
        let y_mean = mean(ys);

        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for (i, y) in ys.iter().enumerate() {
            let x_diff = i as f64 - x_mean;
            numerator += x_diff * (y - y_mean);
            denominator += x_diff * x_diff;
        }

        let slope = numerator / denominator;
        let intercept = y_mean - slope * x_mean;

        let ss_res: f64 = ys
            .iter()
            .enumerate()
            .map(|(i, y)| (y - (slope * i as f64 + intercept)).powi(2))
            .sum();
        let ss_tot: f64 = ys.iter().map(|y| (y - y_mean).powi(2)).sum();

        // A flat series is fitted exactly by a flat line.
        let r_squared = if ss_tot == 0.0 {
            1.0
        } else {
            1.0 - ss_res / ss_tot
        };
        let r_squared = if r_squared.is_finite() {
            r_squared.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Some(Self {
            slope,
            intercept,
            r_squared,
        })
    }

    pub fn at(&self, index: f64) -> f64 {
        self.slope * index + self.intercept
    }
}

#[derive(Debug, Copy, Clone, Default)]
pub struct LinearRegressionForecaster;

impl LinearRegressionForecaster {
    pub fn new() -> Self {
        Self
    }
}

impl Forecaster for LinearRegressionForecaster {
    fn name(&self) -> &'static str {
        "linear_regression"
    }

    fn forecast(&self, series: &[HistoricalDataPoint], periods_ahead: usize) -> ForecastResult {
        let ys = values(series);

        let Some(fit) = LinearFit::fit(&ys) else {
            let last = ys.last().copied().unwrap_or(0.0);
            return ForecastResult::new(last, MIN_CONFIDENCE, Trend::Stable, periods_ahead)
                .with_factor("Insufficient historical data");
        };

        let n = ys.len();
        let prediction = fit.at((n - 1) as f64 + periods_ahead as f64);
        let confidence = fit.r_squared.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE);

        let mut result =
            ForecastResult::new(prediction, confidence, Trend::classify(fit.slope), periods_ahead)
                .with_accuracy(fit.r_squared);

        if fit.slope.abs() > 0.05 {
            result.push_factor("Strong trend detected");
        }
        if fit.r_squared > 0.7 {
            result.push_factor("High predictability");
        }
        if n > 12 {
            result.push_factor("Sufficient historical data");
        }
        result
    }
}
