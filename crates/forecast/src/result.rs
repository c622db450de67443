use serde::{Deserialize, Serialize};
use thiserror::Error;

use nutriplan_core::{DomainError, TenantId};

/// Slope magnitude below which a series is considered flat.
pub(crate) const TREND_THRESHOLD: f64 = 0.01;

/// Direction of a forecast.
///
/// The declared order (`Stable < Up < Down`) is significant: when sub-forecasts
/// disagree with no majority, the ensemble picks the smallest variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Stable,
    Up,
    Down,
}

impl Trend {
    pub(crate) fn classify(slope: f64) -> Self {
        if slope > TREND_THRESHOLD {
            Trend::Up
        } else if slope < -TREND_THRESHOLD {
            Trend::Down
        } else {
            Trend::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Stable => "stable",
            Trend::Up => "up",
            Trend::Down => "down",
        }
    }
}

impl core::fmt::Display for Trend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single forecast.
///
/// `prediction` is never negative and `confidence` always lies in \[0, 1\];
/// both are enforced by the constructor and [`ForecastResult::set_prediction`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub prediction: f64,

    /// Self-assessed reliability in \[0, 1\] (not a statistical interval).
    pub confidence: f64,

    pub trend: Trend,

    /// Human label for the horizon, e.g. `"30 days"`.
    pub timeframe: String,

    /// Short explanations, in the order they were derived.
    pub factors: Vec<String>,

    /// Goodness-of-fit in \[0, 1\], when the algorithm has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

impl ForecastResult {
    pub fn new(prediction: f64, confidence: f64, trend: Trend, periods_ahead: usize) -> Self {
        let mut result = Self {
            prediction: 0.0,
            confidence: unit_interval(confidence),
            trend,
            timeframe: timeframe_label(periods_ahead),
            factors: Vec::new(),
            accuracy: None,
        };
        result.set_prediction(prediction);
        result
    }

    pub fn with_factor(mut self, factor: impl Into<String>) -> Self {
        self.factors.push(factor.into());
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(unit_interval(accuracy));
        self
    }

    /// Replace the prediction, clamping negative or non-finite values to 0.
    pub fn set_prediction(&mut self, prediction: f64) {
        self.prediction = if prediction.is_finite() {
            prediction.max(0.0)
        } else {
            0.0
        };
    }

    pub fn push_factor(&mut self, factor: impl Into<String>) {
        self.factors.push(factor.into());
    }
}

/// `periods_ahead` monthly periods rendered as days (30 per period).
pub fn timeframe_label(periods_ahead: usize) -> String {
    format!("{} days", periods_ahead.saturating_mul(30))
}

fn unit_interval(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    #[error("tenant scope violation (tenant {0} not allowed by scheduler)")]
    ScopeViolation(TenantId),

    #[error("failed to read series: {0}")]
    ReadFailed(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
