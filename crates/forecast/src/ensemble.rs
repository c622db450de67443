//! Confidence-weighted blend of linear regression and Holt smoothing.

use crate::exponential_smoothing::ExponentialSmoothingForecaster;
use crate::forecaster::Forecaster;
use crate::linear_regression::LinearRegressionForecaster;
use crate::result::{ForecastResult, Trend};
use crate::series::HistoricalDataPoint;

/// Penalty applied to the best member confidence so the blend never overclaims.
const ENSEMBLE_CONFIDENCE_PENALTY: f64 = 0.9;

#[derive(Debug, Copy, Clone, Default)]
pub struct EnsembleForecaster {
    linear: LinearRegressionForecaster,
    smoothing: ExponentialSmoothingForecaster,
}

impl EnsembleForecaster {
    pub fn new(
        linear: LinearRegressionForecaster,
        smoothing: ExponentialSmoothingForecaster,
    ) -> Self {
        Self { linear, smoothing }
    }
}

impl Forecaster for EnsembleForecaster {
    fn name(&self) -> &'static str {
        "ensemble"
    }

    fn forecast(&self, series: &[HistoricalDataPoint], periods_ahead: usize) -> ForecastResult {
        let lr = self.linear.forecast(series, periods_ahead);
        let es = self.smoothing.forecast(series, periods_ahead);

        let total = lr.confidence + es.confidence;
        let (w_lr, w_es) = if total > 0.0 {
            (lr.confidence / total, es.confidence / total)
        } else {
            (0.5, 0.5)
        };

        let prediction = w_lr * lr.prediction + w_es * es.prediction;
        let confidence = lr.confidence.max(es.confidence) * ENSEMBLE_CONFIDENCE_PENALTY;

        let mut result =
            ForecastResult::new(prediction, confidence, vote(&[lr.trend, es.trend]), periods_ahead)
                .with_factor("Ensemble of linear regression and exponential smoothing");

        for factor in lr.factors.iter().chain(&es.factors) {
            if !result.factors.contains(factor) {
                result.push_factor(factor.clone());
            }
        }
        if let Some(accuracy) = lr.accuracy.or(es.accuracy) {
            result = result.with_accuracy(accuracy);
        }
        result
    }
}

/// A strict majority wins; otherwise the first variant in `Trend`'s order.
///
/// With two members this means any disagreement resolves to `Stable`.
fn vote(trends: &[Trend]) -> Trend {
    let count = |t: Trend| trends.iter().filter(|&&x| x == t).count();
    [Trend::Up, Trend::Down]
        .into_iter()
        .find(|t| count(*t) * 2 > trends.len())
        .unwrap_or(Trend::Stable)
}
