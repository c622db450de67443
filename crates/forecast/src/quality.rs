//! Data-quality scoring of a historical series, independent of forecasting.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::series::HistoricalDataPoint;
use crate::stats::{mean, stddev_population};

/// Monthly points needed for full completeness.
const FULL_HISTORY_POINTS: f64 = 6.0;
/// Age (days) at which recency reaches zero.
const RECENCY_WINDOW_DAYS: f64 = 30.0;

const CONSISTENCY_FALLBACK: f64 = 0.5;
const CONSISTENCY_NON_POSITIVE_MEAN: f64 = 0.3;

/// First matching advice for a report (see [`DataQualityAssessor::assess_at`]).
///
/// Serialized as its human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Recommendation {
    NoData,
    InsufficientData,
    NeedMoreData,
    TooVolatile,
    Outdated,
    NeedsFrequentUpdates,
    Good,
}

impl Recommendation {
    const ALL: [Recommendation; 7] = [
        Recommendation::NoData,
        Recommendation::InsufficientData,
        Recommendation::NeedMoreData,
        Recommendation::TooVolatile,
        Recommendation::Outdated,
        Recommendation::NeedsFrequentUpdates,
        Recommendation::Good,
    ];

    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::NoData => "No historical data available",
            Recommendation::InsufficientData => {
                "Insufficient historical data. Collect at least 6 months for reliable forecasts"
            }
            Recommendation::NeedMoreData => {
                "Need more historical data to improve forecast accuracy"
            }
            Recommendation::TooVolatile => {
                "Data too volatile for reliable forecasting. Review outliers and data entry"
            }
            Recommendation::Outdated => "Data outdated. Record the latest monthly figures",
            Recommendation::NeedsFrequentUpdates => "Data needs more frequent updates",
            Recommendation::Good => "Good",
        }
    }
}

impl core::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<Recommendation> for String {
    fn from(r: Recommendation) -> Self {
        r.message().to_string()
    }
}

impl TryFrom<String> for Recommendation {
    type Error = String;

    fn try_from(message: String) -> Result<Self, Self::Error> {
        Recommendation::ALL
            .into_iter()
            .find(|r| r.message() == message)
            .ok_or_else(|| format!("unknown data quality recommendation '{message}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataQualityReport {
    pub completeness: f64,
    pub consistency: f64,
    pub recency: f64,
    pub recommendation: Recommendation,
}

impl DataQualityReport {
    fn empty() -> Self {
        Self {
            completeness: 0.0,
            consistency: 0.0,
            recency: 0.0,
            recommendation: Recommendation::NoData,
        }
    }
}

/// Scores completeness, consistency and recency of a series.
#[derive(Debug, Copy, Clone, Default)]
pub struct DataQualityAssessor;

impl DataQualityAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Assess against today's UTC date.
    pub fn assess(&self, series: &[HistoricalDataPoint]) -> DataQualityReport {
        self.assess_at(series, Utc::now().date_naive())
    }

    /// Assess as of `today`.
    pub fn assess_at(&self, series: &[HistoricalDataPoint], today: NaiveDate) -> DataQualityReport {
        let Some(latest) = series.iter().map(|p| p.date).max() else {
            return DataQualityReport::empty();
        };

        let completeness = clamp01((series.len() as f64 / FULL_HISTORY_POINTS).min(1.0));
        let consistency = clamp01(consistency(series));

        let age_days = (today - latest).num_days() as f64;
        let recency = clamp01((1.0 - age_days / RECENCY_WINDOW_DAYS).max(0.0));

        DataQualityReport {
            completeness,
            consistency,
            recency,
            recommendation: recommend(completeness, consistency, recency),
        }
    }
}

fn consistency(series: &[HistoricalDataPoint]) -> f64 {
    let valid: Vec<f64> = series
        .iter()
        .map(|p| p.value)
        .filter(|v| v.is_finite())
        .collect();

    if valid.len() < 2 {
        return CONSISTENCY_FALLBACK;
    }

    let m = mean(&valid);
    if !m.is_finite() {
        return CONSISTENCY_FALLBACK;
    }
    if m <= 0.0 {
        return CONSISTENCY_NON_POSITIVE_MEAN;
    }

    let std = stddev_population(&valid, m);
    if std == 0.0 {
        return 1.0;
    }
    let score = (1.0 - std / m).max(0.0);
    if score.is_finite() {
        score
    } else {
        CONSISTENCY_FALLBACK
    }
}

fn recommend(completeness: f64, consistency: f64, recency: f64) -> Recommendation {
    if completeness < 0.3 {
        Recommendation::InsufficientData
    } else if completeness < 0.5 {
        Recommendation::NeedMoreData
    } else if consistency < 0.3 {
        Recommendation::TooVolatile
    } else if recency < 0.3 {
        Recommendation::Outdated
    } else if recency < 0.5 {
        Recommendation::NeedsFrequentUpdates
    } else {
        Recommendation::Good
    }
}

fn clamp01(x: f64) -> f64 {
    if x.is_finite() { x.clamp(0.0, 1.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, Months};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    /// `vals` ending `age_days` before `today()`, one month apart.
    fn series_ending(vals: &[f64], age_days: u64) -> Vec<HistoricalDataPoint> {
        let last = today() - Days::new(age_days);
        let n = vals.len() as u32;
        vals.iter()
            .enumerate()
            .map(|(i, v)| HistoricalDataPoint::new(last - Months::new(n - 1 - i as u32), *v))
            .collect()
    }

    #[test]
    fn empty_series_scores_zero() {
        let r = DataQualityAssessor::new().assess(&[]);
        assert_eq!(r.completeness, 0.0);
        assert_eq!(r.consistency, 0.0);
        assert_eq!(r.recency, 0.0);
        assert_eq!(r.recommendation.to_string(), "No historical data available");
    }

    #[test]
    fn report_json_carries_the_recommendation_text() {
        let json = serde_json::to_value(DataQualityAssessor::new().assess(&[])).unwrap();
        assert_eq!(json["recommendation"], "No historical data available");

        let vals = [10.0; 6];
        let report = DataQualityAssessor::new().assess_at(&series_ending(&vals, 0), today());
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains(r#""recommendation":"Good""#));
        let back: DataQualityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);

        let unknown = serde_json::from_str::<Recommendation>(r#""no_data""#);
        assert!(unknown.is_err());
    }

    #[test]
    fn full_recent_history_is_good() {
        let vals: Vec<f64> = (0..12).map(|i| 1000.0 + (i % 2) as f64 * 10.0).collect();
        let r = DataQualityAssessor::new().assess_at(&series_ending(&vals, 1), today());

        assert_eq!(r.completeness, 1.0);
        assert!((r.recency - (1.0 - 1.0 / 30.0)).abs() < 1e-12);
        assert!(r.consistency > 0.99);
        assert_eq!(r.recommendation, Recommendation::Good);
        assert_eq!(r.recommendation.to_string(), "Good");
    }

    #[test]
    fn completeness_scales_with_point_count() {
        let r = DataQualityAssessor::new().assess_at(&series_ending(&[10.0], 0), today());
        assert!((r.completeness - 1.0 / 6.0).abs() < 1e-12);
        assert_eq!(r.consistency, 0.5);
        assert_eq!(r.recommendation, Recommendation::InsufficientData);
        assert!(r.recommendation.to_string().starts_with("Insufficient historical data"));

        let r = DataQualityAssessor::new()
            .assess_at(&series_ending(&[10.0, 11.0], 0), today());
        assert_eq!(r.recommendation, Recommendation::NeedMoreData);
        assert!(r.recommendation.to_string().starts_with("Need more historical data"));
    }

    #[test]
    fn volatile_series_is_flagged() {
        let r = DataQualityAssessor::new()
            .assess_at(&series_ending(&[1.0, 100.0, 1.0, 100.0, 1.0, 100.0], 0), today());
        assert!(r.consistency < 0.3);
        assert_eq!(r.recommendation, Recommendation::TooVolatile);
    }

    #[test]
    fn non_positive_mean_uses_fixed_consistency() {
        let r = DataQualityAssessor::new()
            .assess_at(&series_ending(&[-5.0, -3.0, 0.0, -1.0, -2.0, -4.0], 0), today());
        assert_eq!(r.consistency, 0.3);
    }

    #[test]
    fn stale_data_lowers_recency() {
        let vals = [10.0; 6];
        let r = DataQualityAssessor::new().assess_at(&series_ending(&vals, 60), today());
        assert_eq!(r.recency, 0.0);
        assert_eq!(r.recommendation, Recommendation::Outdated);

        let r = DataQualityAssessor::new().assess_at(&series_ending(&vals, 18), today());
        assert!((r.recency - 0.4).abs() < 1e-12);
        assert_eq!(r.recommendation, Recommendation::NeedsFrequentUpdates);
    }

    #[test]
    fn future_dated_points_cap_recency_at_one() {
        let mut s = series_ending(&[10.0; 6], 0);
        s.push(HistoricalDataPoint::new(today() + Days::new(10), 10.0));
        let r = DataQualityAssessor::new().assess_at(&s, today());
        assert_eq!(r.recency, 1.0);
    }

    #[test]
    fn overflowing_statistics_fall_back_to_half_consistency() {
        let r = DataQualityAssessor::new().assess_at(&series_ending(&[1e308; 6], 0), today());
        assert_eq!(r.consistency, 0.5);
        assert_eq!(r.completeness, 1.0);
    }

    #[test]
    fn non_finite_values_are_ignored_for_consistency() {
        let mut s = series_ending(&[10.0; 6], 0);
        s[2].value = f64::NAN;
        s[3].value = f64::INFINITY;
        let r = DataQualityAssessor::new().assess_at(&s, today());
        assert_eq!(r.consistency, 1.0);
    }
}
