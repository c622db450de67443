//! Historical series: canonical data points and normalization of raw records.
//!
//! Two ingestion paths exist:
//! - [`SeriesBuilder::normalize`] accepts loosely-shaped JSON records and coerces
//!   them best-effort (never fails).
//! - [`SeriesBuilder::from_points`] accepts typed domain points and validates them,
//!   rejecting the whole series on the first invalid point.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use nutriplan_core::{DomainError, DomainResult};

/// One `(date, value)` observation of a monthly aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataPoint {
    pub date: NaiveDate,
    pub value: f64,

    /// Remaining fields of the source record (free-form).
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, JsonValue>,
}

impl HistoricalDataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: JsonValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Observed values of a series, in order.
pub fn values(series: &[HistoricalDataPoint]) -> Vec<f64> {
    series.iter().map(|p| p.value).collect()
}

/// A typed, per-domain record that can enter a series after validation.
pub trait SeriesPoint {
    /// Validate and convert into the canonical point shape.
    fn to_data_point(&self) -> DomainResult<HistoricalDataPoint>;
}

/// Monthly procurement spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPoint {
    pub month: NaiveDate,
    pub amount: f64,
}

/// Monthly count of active beneficiaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryPoint {
    pub month: NaiveDate,
    pub active_count: u64,
}

/// Monthly food-quality score (QC pass rate or feedback rating, 0..=100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityPoint {
    pub month: NaiveDate,
    pub score: f64,
}

impl SeriesPoint for BudgetPoint {
    fn to_data_point(&self) -> DomainResult<HistoricalDataPoint> {
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(DomainError::validation(format!(
                "budget amount for {} must be a finite non-negative number (got {})",
                self.month, self.amount
            )));
        }
        Ok(HistoricalDataPoint::new(self.month, self.amount)
            .with_metadata("kind", "budget".into()))
    }
}

impl SeriesPoint for BeneficiaryPoint {
    fn to_data_point(&self) -> DomainResult<HistoricalDataPoint> {
        Ok(HistoricalDataPoint::new(self.month, self.active_count as f64)
            .with_metadata("kind", "beneficiaries".into()))
    }
}

impl SeriesPoint for QualityPoint {
    fn to_data_point(&self) -> DomainResult<HistoricalDataPoint> {
        if !self.score.is_finite() || !(0.0..=100.0).contains(&self.score) {
            return Err(DomainError::validation(format!(
                "quality score for {} must lie in 0..=100 (got {})",
                self.month, self.score
            )));
        }
        Ok(HistoricalDataPoint::new(self.month, self.score)
            .with_metadata("kind", "quality".into()))
    }
}

/// Normalizes records into a canonical, date-ordered series.
#[derive(Debug, Copy, Clone, Default)]
pub struct SeriesBuilder;

impl SeriesBuilder {
    /// Best-effort normalization of JSON records.
    ///
    /// - `date`: ISO date (`YYYY-MM-DD`) or timestamp string; records without a
    ///   parseable date are dropped.
    /// - value: `value`, else `value_field`, else `0` (numbers or numeric strings;
    ///   non-finite values count as missing).
    /// - every other field lands in `metadata`.
    ///
    /// Output is sorted ascending; for duplicate dates the last record wins.
    pub fn normalize(records: &[JsonValue], value_field: &str) -> Vec<HistoricalDataPoint> {
        let mut points: Vec<HistoricalDataPoint> = Vec::with_capacity(records.len());
        let mut dropped = 0usize;

        for record in records {
            let Some(fields) = record.as_object() else {
                dropped += 1;
                continue;
            };
            let Some(date) = fields.get("date").and_then(parse_date) else {
                dropped += 1;
                continue;
            };

            let value = coerce_number(fields.get("value"))
                .or_else(|| coerce_number(fields.get(value_field)))
                .unwrap_or(0.0);

            let metadata: Map<String, JsonValue> = fields
                .iter()
                .filter(|(k, _)| {
                    !matches!(k.as_str(), "date" | "value") && k.as_str() != value_field
                })
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();

            points.push(HistoricalDataPoint {
                date,
                value,
                metadata,
            });
        }

        if dropped > 0 {
            debug!(dropped, kept = points.len(), "dropped records without a usable date");
        }

        sort_dedup_last_wins(points)
    }

    /// Build a series from typed domain points.
    ///
    /// Unlike [`SeriesBuilder::normalize`] this validates: an invalid point or a
    /// repeated month rejects the whole series.
    pub fn from_points<P: SeriesPoint>(points: &[P]) -> DomainResult<Vec<HistoricalDataPoint>> {
        let mut series = points
            .iter()
            .map(SeriesPoint::to_data_point)
            .collect::<DomainResult<Vec<_>>>()?;

        series.sort_by_key(|p| p.date);
        if let Some(w) = series.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(DomainError::invariant(format!(
                "duplicate month {} in series",
                w[0].date
            )));
        }
        Ok(series)
    }
}

fn sort_dedup_last_wins(mut points: Vec<HistoricalDataPoint>) -> Vec<HistoricalDataPoint> {
    // Stable sort keeps input order among equal dates.
    points.sort_by_key(|p| p.date);

    let mut out: Vec<HistoricalDataPoint> = Vec::with_capacity(points.len());
    for p in points {
        match out.last_mut() {
            Some(last) if last.date == p.date => *last = p,
            _ => out.push(p),
        }
    }
    out
}

fn parse_date(value: &JsonValue) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|dt| dt.date())
        .ok()
}

fn coerce_number(value: Option<&JsonValue>) -> Option<f64> {
    let n = match value? {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}
