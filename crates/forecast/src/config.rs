//! Engine configuration.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::result::ForecastError;

/// Longest projection an engine will make (ten years of monthly periods).
pub const MAX_HORIZON: usize = 120;

/// Algorithm backing every forecast of an engine instance.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    LinearRegression,
    ExponentialSmoothing,
    #[default]
    Ensemble,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::LinearRegression => "linear_regression",
            Algorithm::ExponentialSmoothing => "exponential_smoothing",
            Algorithm::Ensemble => "ensemble",
        }
    }
}

impl core::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear_regression" | "linear" => Ok(Algorithm::LinearRegression),
            "exponential_smoothing" | "holt" => Ok(Algorithm::ExponentialSmoothing),
            "ensemble" => Ok(Algorithm::Ensemble),
            other => Err(ForecastError::InvalidConfig(format!(
                "unknown forecasting algorithm '{other}'"
            ))),
        }
    }
}

/// Immutable per-engine settings.
///
/// `trend_strength` and `confidence_level` are carried through to reports for
/// the presentation layer; they do not change the numeric forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastingConfig {
    pub algorithm: Algorithm,
    /// Run the seasonality scan (commentary only).
    pub seasonality: bool,
    pub trend_strength: f64,
    pub confidence_level: f64,
    /// Monthly periods ahead to project, in `1..=MAX_HORIZON`.
    #[serde(deserialize_with = "deserialize_horizon")]
    pub horizon: usize,
}

impl Default for ForecastingConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Ensemble,
            seasonality: true,
            trend_strength: 0.5,
            confidence_level: 0.95,
            horizon: 1,
        }
    }
}

impl ForecastingConfig {
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_seasonality(mut self, seasonality: bool) -> Self {
        self.seasonality = seasonality;
        self
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = clamp_horizon(horizon);
        self
    }

    /// Horizon actually used for projections.
    pub fn effective_horizon(&self) -> usize {
        clamp_horizon(self.horizon)
    }

    /// Read overrides from `FORECAST_*` environment variables.
    ///
    /// Malformed values are logged and ignored (the default is kept).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ForecastingConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("FORECAST_ALGORITHM") {
            match raw.parse::<Algorithm>() {
                Ok(a) => cfg.algorithm = a,
                Err(e) => warn!(error = %e, "ignoring FORECAST_ALGORITHM"),
            }
        }
        if let Some(raw) = lookup("FORECAST_SEASONALITY") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => cfg.seasonality = true,
                "0" | "false" | "no" | "off" => cfg.seasonality = false,
                other => warn!(value = other, "ignoring FORECAST_SEASONALITY"),
            }
        }
        if let Some(v) = parse_finite(&lookup, "FORECAST_TREND_STRENGTH") {
            cfg.trend_strength = v;
        }
        if let Some(v) = parse_finite(&lookup, "FORECAST_CONFIDENCE_LEVEL") {
            if (0.0..=1.0).contains(&v) {
                cfg.confidence_level = v;
            } else {
                warn!(value = v, "FORECAST_CONFIDENCE_LEVEL must lie in [0, 1]; ignoring");
            }
        }
        if let Some(raw) = lookup("FORECAST_HORIZON") {
            match raw.trim().parse::<usize>() {
                Ok(h) if (1..=MAX_HORIZON).contains(&h) => cfg.horizon = h,
                _ => warn!(
                    value = %raw,
                    max = MAX_HORIZON,
                    "FORECAST_HORIZON must be an integer in 1..=max; ignoring"
                ),
            }
        }
        cfg
    }
}

fn clamp_horizon(horizon: usize) -> usize {
    horizon.clamp(1, MAX_HORIZON)
}

fn deserialize_horizon<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    usize::deserialize(deserializer).map(clamp_horizon)
}

fn parse_finite<F>(lookup: &F, key: &str) -> Option<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(key, value = %raw, "expected a finite number; ignoring");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn defaults_to_ensemble() {
        let cfg = ForecastingConfig::default();
        assert_eq!(cfg.algorithm, Algorithm::Ensemble);
        assert!(cfg.seasonality);
        assert_eq!(cfg.horizon, 1);
    }

    #[test]
    fn algorithm_parses_common_spellings() {
        assert_eq!(
            "linear-regression".parse::<Algorithm>().unwrap(),
            Algorithm::LinearRegression
        );
        assert_eq!(
            " Exponential_Smoothing ".parse::<Algorithm>().unwrap(),
            Algorithm::ExponentialSmoothing
        );
        assert!(matches!(
            "arima".parse::<Algorithm>(),
            Err(ForecastError::InvalidConfig(_))
        ));
    }

    #[test]
    fn lookup_overrides_valid_values() {
        let cfg = ForecastingConfig::from_lookup(lookup_from(&[
            ("FORECAST_ALGORITHM", "linear_regression"),
            ("FORECAST_SEASONALITY", "off"),
            ("FORECAST_TREND_STRENGTH", "0.8"),
            ("FORECAST_CONFIDENCE_LEVEL", "0.9"),
            ("FORECAST_HORIZON", "3"),
        ]));
        assert_eq!(cfg.algorithm, Algorithm::LinearRegression);
        assert!(!cfg.seasonality);
        assert_eq!(cfg.trend_strength, 0.8);
        assert_eq!(cfg.confidence_level, 0.9);
        assert_eq!(cfg.horizon, 3);
    }

    #[test]
    fn lookup_ignores_malformed_values() {
        let cfg = ForecastingConfig::from_lookup(lookup_from(&[
            ("FORECAST_ALGORITHM", "prophet"),
            ("FORECAST_SEASONALITY", "maybe"),
            ("FORECAST_TREND_STRENGTH", "NaN"),
            ("FORECAST_CONFIDENCE_LEVEL", "1.5"),
            ("FORECAST_HORIZON", "0"),
        ]));
        assert_eq!(cfg, ForecastingConfig::default());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: ForecastingConfig =
            serde_json::from_str(r#"{ "algorithm": "exponential_smoothing" }"#).unwrap();
        assert_eq!(cfg.algorithm, Algorithm::ExponentialSmoothing);
        assert_eq!(cfg.confidence_level, 0.95);
    }

    #[test]
    fn horizon_is_bounded_from_every_source() {
        let cfg = ForecastingConfig::from_lookup(lookup_from(&[(
            "FORECAST_HORIZON",
            "18446744073709551615",
        )]));
        assert_eq!(cfg.horizon, 1);

        let cfg: ForecastingConfig =
            serde_json::from_str(r#"{ "horizon": 18446744073709551615 }"#).unwrap();
        assert_eq!(cfg.horizon, MAX_HORIZON);

        let cfg: ForecastingConfig = serde_json::from_str(r#"{ "horizon": 0 }"#).unwrap();
        assert_eq!(cfg.horizon, 1);

        assert_eq!(
            ForecastingConfig::default().with_horizon(usize::MAX).horizon,
            MAX_HORIZON
        );

        let cfg = ForecastingConfig {
            horizon: usize::MAX,
            ..ForecastingConfig::default()
        };
        assert_eq!(cfg.effective_horizon(), MAX_HORIZON);
    }
}
