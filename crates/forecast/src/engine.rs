//! Forecasting façade: algorithm selection, domain adjustments and multivariate reports.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{Algorithm, ForecastingConfig};
use crate::ensemble::EnsembleForecaster;
use crate::exponential_smoothing::ExponentialSmoothingForecaster;
use crate::factors::{
    BeneficiaryFactors, BudgetFactors, CorrelationFactors, DomainFactors, QualityFactors,
};
use crate::forecaster::Forecaster;
use crate::linear_regression::LinearRegressionForecaster;
use crate::result::ForecastResult;
use crate::series::HistoricalDataPoint;

/// Upper bound of the quality score scale.
pub const MAX_QUALITY_SCORE: f64 = 100.0;

/// Quality points added per unit of each improvement factor.
const STAFF_TRAINING_POINTS: f64 = 5.0;
const EQUIPMENT_UPGRADE_POINTS: f64 = 3.0;
const PROCESS_IMPROVEMENT_POINTS: f64 = 4.0;

/// Coefficients at or below this magnitude produce no commentary.
const CORRELATION_THRESHOLD: f64 = 0.3;

/// The three tenant series forecast together.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultivariateSeries<'a> {
    pub budget: &'a [HistoricalDataPoint],
    pub beneficiaries: &'a [HistoricalDataPoint],
    pub quality: &'a [HistoricalDataPoint],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultivariateForecast {
    pub budget: ForecastResult,
    pub beneficiaries: ForecastResult,
    pub quality: ForecastResult,
    /// Commentary only; never feeds back into the predictions.
    pub correlation_insights: Vec<String>,
}

/// Forecasting engine bound to one immutable configuration.
///
/// Stateless across calls: safe to share between threads and tenants.
#[derive(Debug, Clone)]
pub struct ForecastingEngine {
    config: ForecastingConfig,
    linear: LinearRegressionForecaster,
    smoothing: ExponentialSmoothingForecaster,
    ensemble: EnsembleForecaster,
}

impl Default for ForecastingEngine {
    fn default() -> Self {
        Self::new(ForecastingConfig::default())
    }
}

impl ForecastingEngine {
    pub fn new(config: ForecastingConfig) -> Self {
        let linear = LinearRegressionForecaster::new();
        let smoothing =
            ExponentialSmoothingForecaster::new().with_seasonality(config.seasonality);
        Self {
            config,
            linear,
            smoothing,
            ensemble: EnsembleForecaster::new(linear, smoothing),
        }
    }

    pub fn config(&self) -> &ForecastingConfig {
        &self.config
    }

    fn forecaster(&self) -> &dyn Forecaster {
        match self.config.algorithm {
            Algorithm::LinearRegression => &self.linear,
            Algorithm::ExponentialSmoothing => &self.smoothing,
            Algorithm::Ensemble => &self.ensemble,
        }
    }

    /// Unadjusted forecast from the configured algorithm.
    pub fn forecast(&self, series: &[HistoricalDataPoint]) -> ForecastResult {
        self.forecaster().forecast(series, self.config.effective_horizon())
    }

    /// Budget: inflation → seasonal multiplier → program expansion, all multiplicative.
    pub fn forecast_budget(
        &self,
        series: &[HistoricalDataPoint],
        factors: Option<&BudgetFactors>,
    ) -> ForecastResult {
        let mut result = self.forecast(series);
        let f = factors.copied().unwrap_or_default();

        if let Some(rate) = f.inflation_rate {
            result.set_prediction(result.prediction * (1.0 + rate));
            result.push_factor(format!("Inflation adjustment: {:.1}%", rate * 100.0));
        }
        if let Some(multiplier) = f.seasonal_multiplier {
            result.set_prediction(result.prediction * multiplier);
            result.push_factor(format!(
                "Seasonal adjustment: {:.1}%",
                (multiplier - 1.0) * 100.0
            ));
        }
        if let Some(expansion) = f.program_expansion {
            result.set_prediction(result.prediction * (1.0 + expansion));
            result.push_factor(format!("Program expansion: {:.1}%", expansion * 100.0));
        }

        self.trace("budget", series, &result);
        result
    }

    /// Beneficiaries: population growth → enrollment → dropout, rounded to a whole count.
    ///
    /// Rounding is half away from zero, which for non-negative counts is half-up.
    pub fn forecast_beneficiaries(
        &self,
        series: &[HistoricalDataPoint],
        factors: Option<&BeneficiaryFactors>,
    ) -> ForecastResult {
        let mut result = self.forecast(series);
        let f = factors.copied().unwrap_or_default();

        if let Some(growth) = f.population_growth {
            result.set_prediction(result.prediction * (1.0 + growth));
            result.push_factor(format!("Population growth: {:.1}%", growth * 100.0));
        }
        if let Some(enrollment) = f.enrollment_rate {
            result.set_prediction(result.prediction * (1.0 + enrollment));
            result.push_factor(format!(
                "Enrollment rate adjustment: {:.1}%",
                enrollment * 100.0
            ));
        }
        if let Some(dropout) = f.dropout_rate {
            result.set_prediction(result.prediction * (1.0 - dropout));
            result.push_factor(format!("Dropout rate: {:.1}%", dropout * 100.0));
        }
        result.set_prediction(result.prediction.round());

        self.trace("beneficiaries", series, &result);
        result
    }

    /// Quality: additive point adjustments, capped at [`MAX_QUALITY_SCORE`].
    pub fn forecast_quality(
        &self,
        series: &[HistoricalDataPoint],
        factors: Option<&QualityFactors>,
    ) -> ForecastResult {
        let mut result = self.forecast(series);
        let f = factors.copied().unwrap_or_default();

        let adjustments = [
            ("Staff training", f.staff_training, STAFF_TRAINING_POINTS),
            ("Equipment upgrade", f.equipment_upgrade, EQUIPMENT_UPGRADE_POINTS),
            ("Process improvement", f.process_improvement, PROCESS_IMPROVEMENT_POINTS),
        ];
        for (label, score, points_per_unit) in adjustments {
            if let Some(score) = score {
                let points = score * points_per_unit;
                result.set_prediction(result.prediction + points);
                result.push_factor(format!("{label}: {points:+.1} points"));
            }
        }
        result.set_prediction(result.prediction.min(MAX_QUALITY_SCORE));

        self.trace("quality", series, &result);
        result
    }

    /// Independent budget / beneficiaries / quality forecasts plus correlation commentary.
    pub fn forecast_multivariate(
        &self,
        series: MultivariateSeries<'_>,
        correlation: Option<&CorrelationFactors>,
    ) -> MultivariateForecast {
        let factors = DomainFactors {
            correlation: correlation.copied(),
            ..DomainFactors::default()
        };
        self.forecast_multivariate_with(series, &factors)
    }

    /// Like [`ForecastingEngine::forecast_multivariate`], applying per-domain factors.
    pub fn forecast_multivariate_with(
        &self,
        series: MultivariateSeries<'_>,
        factors: &DomainFactors,
    ) -> MultivariateForecast {
        MultivariateForecast {
            budget: self.forecast_budget(series.budget, factors.budget.as_ref()),
            beneficiaries: self
                .forecast_beneficiaries(series.beneficiaries, factors.beneficiaries.as_ref()),
            quality: self.forecast_quality(series.quality, factors.quality.as_ref()),
            correlation_insights: factors
                .correlation
                .as_ref()
                .map(correlation_insights)
                .unwrap_or_default(),
        }
    }

    fn trace(&self, domain: &'static str, series: &[HistoricalDataPoint], result: &ForecastResult) {
        debug!(
            domain,
            algorithm = self.config.algorithm.as_str(),
            points = series.len(),
            prediction = result.prediction,
            confidence = result.confidence,
            trend = result.trend.as_str(),
            "forecast computed"
        );
    }
}

fn correlation_insights(c: &CorrelationFactors) -> Vec<String> {
    let pairs = [
        ("Budget", "beneficiary count", c.budget_beneficiaries),
        ("Budget", "quality score", c.budget_quality),
        ("Beneficiary count", "quality score", c.beneficiaries_quality),
    ];

    pairs
        .into_iter()
        .filter_map(|(a, b, r)| {
            let r = r.filter(|r| r.is_finite() && r.abs() > CORRELATION_THRESHOLD)?;
            let relation = if r > 0.0 {
                "move together"
            } else {
                "move in opposite directions"
            };
            Some(format!("{a} and {b} {relation} (r = {r:.2})"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_HORIZON;
    use crate::result::Trend;
    use chrono::{Months, NaiveDate};
    use proptest::prelude::*;

    fn series(vals: &[f64]) -> Vec<HistoricalDataPoint> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        vals.iter()
            .enumerate()
            .map(|(i, v)| HistoricalDataPoint::new(start + Months::new(i as u32), *v))
            .collect()
    }

    fn linear_engine() -> ForecastingEngine {
        ForecastingEngine::new(
            ForecastingConfig::default().with_algorithm(Algorithm::LinearRegression),
        )
    }

    #[test]
    fn algorithm_selection_follows_config() {
        let data = series(&[10.0, 12.0, 15.0, 14.0, 18.0]);
        let lr = LinearRegressionForecaster::new().forecast(&data, 1);
        let es = ExponentialSmoothingForecaster::new().forecast(&data, 1);
        let ens = EnsembleForecaster::default().forecast(&data, 1);

        assert_eq!(linear_engine().forecast(&data), lr);
        let es_engine = ForecastingEngine::new(
            ForecastingConfig::default().with_algorithm(Algorithm::ExponentialSmoothing),
        );
        assert_eq!(es_engine.forecast(&data), es);
        assert_eq!(ForecastingEngine::default().forecast(&data), ens);
    }

    #[test]
    fn budget_factors_apply_in_order_and_are_reported() {
        let data = series(&[100.0, 100.0, 100.0]);
        let factors = BudgetFactors {
            inflation_rate: Some(0.1),
            seasonal_multiplier: Some(1.2),
            program_expansion: Some(0.5),
        };
        let r = linear_engine().forecast_budget(&data, Some(&factors));

        assert!((r.prediction - 100.0 * 1.1 * 1.2 * 1.5).abs() < 1e-9);
        let tail: Vec<&str> = r.factors[r.factors.len() - 3..]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(
            tail,
            vec![
                "Inflation adjustment: 10.0%",
                "Seasonal adjustment: 20.0%",
                "Program expansion: 50.0%",
            ]
        );
    }

    #[test]
    fn absent_factors_leave_base_forecast_untouched() {
        let data = series(&[100.0, 110.0, 120.0]);
        let engine = linear_engine();
        assert_eq!(
            engine.forecast_budget(&data, Some(&BudgetFactors::default())),
            engine.forecast(&data)
        );
    }

    #[test]
    fn beneficiaries_apply_dropout_and_round() {
        let data = series(&[1000.0, 1000.0, 1000.0]);
        let factors = BeneficiaryFactors {
            population_growth: Some(0.02),
            enrollment_rate: Some(0.05),
            dropout_rate: Some(0.1),
        };
        let r = linear_engine().forecast_beneficiaries(&data, Some(&factors));

        // 1000 * 1.02 * 1.05 * 0.9 = 963.9
        assert_eq!(r.prediction, 964.0);
        assert!(r.factors.iter().any(|f| f == "Dropout rate: 10.0%"));
    }

    #[test]
    fn beneficiaries_round_half_up() {
        let data = series(&[10.5, 10.5]);
        let r = linear_engine().forecast_beneficiaries(&data, None);
        assert_eq!(r.prediction, 11.0);
    }

    #[test]
    fn quality_is_additive_and_capped() {
        let data = series(&[80.0, 80.0, 80.0]);
        let engine = linear_engine();

        let modest = QualityFactors {
            staff_training: Some(1.0),
            equipment_upgrade: Some(1.0),
            process_improvement: None,
        };
        let r = engine.forecast_quality(&data, Some(&modest));
        assert!((r.prediction - 88.0).abs() < 1e-9);
        assert!(r.factors.iter().any(|f| f == "Staff training: +5.0 points"));
        assert!(r.factors.iter().any(|f| f == "Equipment upgrade: +3.0 points"));

        let big = QualityFactors {
            staff_training: Some(2.0),
            equipment_upgrade: Some(2.0),
            process_improvement: Some(2.0),
        };
        let r = engine.forecast_quality(&data, Some(&big));
        assert_eq!(r.prediction, 100.0);
    }

    #[test]
    fn multivariate_runs_domains_independently() {
        let budget = series(&[100.0, 110.0, 120.0, 130.0]);
        let beneficiaries = series(&[50.0, 52.0, 54.0, 56.0]);
        let quality = series(&[70.0, 72.0, 71.0, 73.0]);
        let engine = ForecastingEngine::default();

        let correlation = CorrelationFactors {
            budget_beneficiaries: Some(0.85),
            budget_quality: Some(-0.45),
            beneficiaries_quality: Some(0.1),
        };
        let mv = engine.forecast_multivariate(
            MultivariateSeries {
                budget: &budget,
                beneficiaries: &beneficiaries,
                quality: &quality,
            },
            Some(&correlation),
        );

        assert_eq!(mv.budget, engine.forecast_budget(&budget, None));
        assert_eq!(mv.beneficiaries, engine.forecast_beneficiaries(&beneficiaries, None));
        assert_eq!(mv.quality, engine.forecast_quality(&quality, None));
        assert_eq!(
            mv.correlation_insights,
            vec![
                "Budget and beneficiary count move together (r = 0.85)",
                "Budget and quality score move in opposite directions (r = -0.45)",
            ]
        );
    }

    #[test]
    fn oversized_configured_horizon_is_capped() {
        let cfg: ForecastingConfig = serde_json::from_str(
            r#"{ "algorithm": "linear_regression", "horizon": 18446744073709551615 }"#,
        )
        .unwrap();
        let r = ForecastingEngine::new(cfg).forecast_budget(&series(&[1.0, 2.0, 3.0]), None);
        assert_eq!(r.timeframe, format!("{} days", MAX_HORIZON * 30));
        assert!((r.prediction - (3.0 + MAX_HORIZON as f64)).abs() < 1e-9);
    }

    #[test]
    fn multivariate_without_correlation_has_no_insights() {
        let mv = ForecastingEngine::default()
            .forecast_multivariate(MultivariateSeries::default(), None);
        assert!(mv.correlation_insights.is_empty());
        assert_eq!(mv.budget.trend, Trend::Stable);
        assert_eq!(mv.beneficiaries.prediction, 0.0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: beneficiary forecasts are whole, non-negative counts.
        #[test]
        fn beneficiary_forecast_is_a_whole_count(
            vals in prop::collection::vec(0.0f64..100_000.0, 0..18),
            growth in -0.5f64..0.5,
            dropout in 0.0f64..1.0,
        ) {
            let factors = BeneficiaryFactors {
                population_growth: Some(growth),
                enrollment_rate: None,
                dropout_rate: Some(dropout),
            };
            let r = ForecastingEngine::default()
                .forecast_beneficiaries(&series(&vals), Some(&factors));
            prop_assert!(r.prediction >= 0.0);
            prop_assert_eq!(r.prediction.fract(), 0.0);
        }

        /// Property: quality forecasts never leave the 0..=100 scale.
        #[test]
        fn quality_forecast_stays_on_scale(
            vals in prop::collection::vec(0.0f64..100.0, 0..18),
            training in 0.0f64..10.0,
        ) {
            let factors = QualityFactors {
                staff_training: Some(training),
                ..QualityFactors::default()
            };
            let r = ForecastingEngine::default()
                .forecast_quality(&series(&vals), Some(&factors));
            prop_assert!((0.0..=MAX_QUALITY_SCORE).contains(&r.prediction));
        }
    }
}
