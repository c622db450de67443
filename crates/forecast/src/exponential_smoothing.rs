//! Holt double exponential smoothing (level + trend) with a naive seasonality scan.

use serde::{Deserialize, Serialize};

use crate::forecaster::Forecaster;
use crate::result::{ForecastResult, Trend};
use crate::series::{HistoricalDataPoint, values};
use crate::stats::{mean, stddev_population};

const MIN_CONFIDENCE: f64 = 0.2;
const MAX_CONFIDENCE: f64 = 0.9;
const MAX_SEASONAL_LAG: usize = 12;
/// Number of trailing observations used to judge volatility.
const VOLATILITY_WINDOW: usize = 6;

/// Strongest lagged self-product found in a series.
///
/// `strength` is the mean of `v[i] * v[i + period]`; it is not normalized, so
/// it scales with the magnitude of the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub period: usize,
    pub strength: f64,
}

impl Seasonality {
    /// Scans lags `1..=min(12, n/2)`; `None` when no lag fits.
    pub fn detect(ys: &[f64]) -> Option<Self> {
        let max_lag = MAX_SEASONAL_LAG.min(ys.len() / 2);
        let mut best: Option<Self> = None;

        for lag in 1..=max_lag {
            let pairs = ys.len() - lag;
            let strength = ys
                .iter()
                .zip(&ys[lag..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / pairs as f64;

            if !strength.is_finite() {
                continue;
            }
            if best.is_none_or(|b| strength > b.strength) {
                best = Some(Self {
                    period: lag,
                    strength,
                });
            }
        }
        best
    }
}

/// Holt smoothing forecaster.
///
/// The seasonality scan only contributes commentary; it does not feed back
/// into the smoothing weights.
#[derive(Debug, Copy, Clone)]
pub struct ExponentialSmoothingForecaster {
    alpha: f64,
    beta: f64,
    detect_seasonality: bool,
}

impl Default for ExponentialSmoothingForecaster {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            beta: 0.1,
            detect_seasonality: true,
        }
    }
}

impl ExponentialSmoothingForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seasonality(mut self, enabled: bool) -> Self {
        self.detect_seasonality = enabled;
        self
    }

    /// Final `(level, trend)` after smoothing the whole series (needs ≥ 2 values).
    pub fn smooth(&self, ys: &[f64]) -> Option<(f64, f64)> {
        if ys.len() < 2 {
            return None;
        }
        let mut level = ys[0];
        let mut trend = ys[1] - ys[0];

        for &v in &ys[1..] {
            let new_level = self.alpha * v + (1.0 - self.alpha) * (level + trend);
            trend = self.beta * (new_level - level) + (1.0 - self.beta) * trend;
            level = new_level;
        }
        Some((level, trend))
    }
}

impl Forecaster for ExponentialSmoothingForecaster {
    fn name(&self) -> &'static str {
        "exponential_smoothing"
    }

    fn forecast(&self, series: &[HistoricalDataPoint], periods_ahead: usize) -> ForecastResult {
        let ys = values(series);

        let smoothed = if ys.len() < 3 { None } else { self.smooth(&ys) };
        let Some((level, trend)) = smoothed else {
            let last = ys.last().copied().unwrap_or(0.0);
            return ForecastResult::new(last, MIN_CONFIDENCE, Trend::Stable, periods_ahead)
                .with_factor("Limited historical data for exponential smoothing");
        };

        let prediction = level + trend * periods_ahead as f64;
        let confidence = volatility_confidence(&ys, level);

        let mut result =
            ForecastResult::new(prediction, confidence, Trend::classify(trend), periods_ahead);

        let seasonality = if self.detect_seasonality {
            Seasonality::detect(&ys)
        } else {
            None
        };
        if seasonality.is_some_and(|s| s.strength > 0.3) {
            result.push_factor("Seasonal pattern detected");
        }
        if trend.abs() > 0.05 {
            result.push_factor("Strong trend component");
        }
        result.push_factor("Exponential smoothing applied");
        result
    }
}

fn volatility_confidence(ys: &[f64], level: f64) -> f64 {
    if level == 0.0 {
        return MIN_CONFIDENCE;
    }
    let recent = &ys[ys.len().saturating_sub(VOLATILITY_WINDOW)..];
    let std = stddev_population(recent, mean(recent));
    let confidence = 1.0 - std / level.abs();

    if confidence.is_finite() {
        confidence.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
    } else {
        MIN_CONFIDENCE
    }
}
