use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use nutriplan_core::TenantId;

use crate::config::{Algorithm, ForecastingConfig};
use crate::engine::{ForecastingEngine, MultivariateForecast, MultivariateSeries};
use crate::factors::{CorrelationFactors, DomainFactors};
use crate::quality::{DataQualityAssessor, DataQualityReport};
use crate::result::ForecastError;
use crate::series::HistoricalDataPoint;

/// A tenant-scoped forecasting unit.
///
/// Jobs consume snapshots supplied by callers (infra/workers); this crate stays
/// storage-agnostic.
pub trait ForecastJob: Send + Sync + 'static {
    type Input: Send + Sync + 'static;
    type Output: Send + 'static;

    /// The tenant this job belongs to (tenant-safe execution model).
    fn tenant_id(&self) -> TenantId;

    /// The snapshot the job will run on.
    fn input(&self) -> &Self::Input;

    /// Execute the job. Must not mutate any shared state.
    fn run(&self) -> Result<Self::Output, ForecastError>;
}

/// Snapshot of one tenant's monthly series and external factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantSeries {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub budget: Vec<HistoricalDataPoint>,
    #[serde(default)]
    pub beneficiaries: Vec<HistoricalDataPoint>,
    #[serde(default)]
    pub quality: Vec<HistoricalDataPoint>,
    #[serde(default)]
    pub factors: DomainFactors,
}

impl TenantSeries {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            budget: Vec::new(),
            beneficiaries: Vec::new(),
            quality: Vec::new(),
            factors: DomainFactors::default(),
        }
    }

    pub fn with_budget(mut self, series: Vec<HistoricalDataPoint>) -> Self {
        self.budget = series;
        self
    }

    pub fn with_beneficiaries(mut self, series: Vec<HistoricalDataPoint>) -> Self {
        self.beneficiaries = series;
        self
    }

    pub fn with_quality(mut self, series: Vec<HistoricalDataPoint>) -> Self {
        self.quality = series;
        self
    }

    pub fn with_factors(mut self, factors: DomainFactors) -> Self {
        self.factors = factors;
        self
    }

    fn as_multivariate(&self) -> MultivariateSeries<'_> {
        MultivariateSeries {
            budget: &self.budget,
            beneficiaries: &self.beneficiaries,
            quality: &self.quality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesQuality {
    pub budget: DataQualityReport,
    pub beneficiaries: DataQualityReport,
    pub quality: DataQualityReport,
}

/// Everything the presentation layer needs for one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantForecastReport {
    pub tenant_id: TenantId,
    pub generated_on: NaiveDate,
    pub algorithm: Algorithm,
    pub trend_strength: f64,
    pub confidence_level: f64,
    pub forecast: MultivariateForecast,
    pub data_quality: SeriesQuality,
}

/// Multivariate forecast plus per-series quality assessment for one tenant.
///
/// When the snapshot carries no correlation factors they are estimated from
/// the series themselves.
#[derive(Debug, Clone)]
pub struct TenantForecastJob {
    tenant_id: TenantId,
    input: TenantSeries,
    engine: ForecastingEngine,
    today: Option<NaiveDate>,
}

impl TenantForecastJob {
    pub fn new(tenant_id: TenantId, input: TenantSeries) -> Self {
        Self {
            tenant_id,
            input,
            engine: ForecastingEngine::default(),
            today: None,
        }
    }

    pub fn with_config(mut self, config: ForecastingConfig) -> Self {
        self.engine = ForecastingEngine::new(config);
        self
    }

    /// Pin the assessment date (defaults to today's UTC date).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }
}

impl ForecastJob for TenantForecastJob {
    type Input = TenantSeries;
    type Output = TenantForecastReport;

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn input(&self) -> &Self::Input {
        &self.input
    }

    fn run(&self) -> Result<TenantForecastReport, ForecastError> {
        if self.input.tenant_id != self.tenant_id {
            return Err(ForecastError::InvalidInput(
                "tenant_id mismatch between job and series snapshot".to_string(),
            ));
        }

        let input = &self.input;
        let mut factors = input.factors;
        if factors.correlation.is_none() {
            factors.correlation = Some(CorrelationFactors::estimate(
                &input.budget,
                &input.beneficiaries,
                &input.quality,
            ));
        }

        let forecast = self
            .engine
            .forecast_multivariate_with(input.as_multivariate(), &factors);

        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let assessor = DataQualityAssessor::new();
        let data_quality = SeriesQuality {
            budget: assessor.assess_at(&input.budget, today),
            beneficiaries: assessor.assess_at(&input.beneficiaries, today),
            quality: assessor.assess_at(&input.quality, today),
        };

        let config = self.engine.config();
        debug!(
            tenant = %self.tenant_id,
            algorithm = config.algorithm.as_str(),
            insights = forecast.correlation_insights.len(),
            "tenant forecast job finished"
        );

        Ok(TenantForecastReport {
            tenant_id: self.tenant_id,
            generated_on: today,
            algorithm: config.algorithm,
            trend_strength: config.trend_strength,
            confidence_level: config.confidence_level,
            forecast,
            data_quality,
        })
    }
}
