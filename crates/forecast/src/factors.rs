//! External factors: non-historical knowledge applied on top of a base forecast.
//!
//! Every field is optional; an absent factor means "no adjustment". Callers are
//! responsible for passing finite numbers.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::series::HistoricalDataPoint;
use crate::stats::pearson;

/// Fewest shared dates needed before a correlation is estimated.
const MIN_ALIGNED_POINTS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetFactors {
    /// Expected price inflation as a fraction (0.03 = 3%).
    pub inflation_rate: Option<f64>,
    /// Calendar-month multiplier (1.1 = 10% above baseline).
    pub seasonal_multiplier: Option<f64>,
    /// Planned program growth as a fraction.
    pub program_expansion: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeneficiaryFactors {
    pub population_growth: Option<f64>,
    pub enrollment_rate: Option<f64>,
    pub dropout_rate: Option<f64>,
}

/// Improvement scores; each adds a fixed number of quality points per unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityFactors {
    pub staff_training: Option<f64>,
    pub equipment_upgrade: Option<f64>,
    pub process_improvement: Option<f64>,
}

/// Pairwise correlation coefficients between the three tenant metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationFactors {
    pub budget_beneficiaries: Option<f64>,
    pub budget_quality: Option<f64>,
    pub beneficiaries_quality: Option<f64>,
}

impl CorrelationFactors {
    /// Pearson coefficients over date-aligned points of each pair.
    ///
    /// A pair with fewer than three shared dates, or a flat side, stays `None`.
    pub fn estimate(
        budget: &[HistoricalDataPoint],
        beneficiaries: &[HistoricalDataPoint],
        quality: &[HistoricalDataPoint],
    ) -> Self {
        Self {
            budget_beneficiaries: aligned_pearson(budget, beneficiaries),
            budget_quality: aligned_pearson(budget, quality),
            beneficiaries_quality: aligned_pearson(beneficiaries, quality),
        }
    }
}

/// All factor dictionaries for one tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainFactors {
    pub budget: Option<BudgetFactors>,
    pub beneficiaries: Option<BeneficiaryFactors>,
    pub quality: Option<QualityFactors>,
    pub correlation: Option<CorrelationFactors>,
}

fn aligned_pearson(a: &[HistoricalDataPoint], b: &[HistoricalDataPoint]) -> Option<f64> {
    let by_date: BTreeMap<NaiveDate, f64> = a.iter().map(|p| (p.date, p.value)).collect();
    let (xs, ys): (Vec<f64>, Vec<f64>) = b
        .iter()
        .filter_map(|p| by_date.get(&p.date).map(|x| (*x, p.value)))
        .unzip();

    if xs.len() < MIN_ALIGNED_POINTS {
        return None;
    }
    pearson(&xs, &ys)
}
