//! `nutriplan-forecast`
//!
//! **Responsibility:** time-series forecasting for tenant budget, beneficiary
//! and food-quality metrics.
//!
//! This crate is intentionally **pure**:
//! - It performs no IO and holds no shared mutable state.
//! - Series arrive as `(date, value)` points from the data-access layer.
//! - It emits forecast results and quality reports, not domain events.

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod exponential_smoothing;
pub mod factors;
pub mod forecaster;
pub mod job;
pub mod linear_regression;
pub mod quality;
pub mod result;
pub mod scheduler;
pub mod series;
pub mod stats;

pub use config::{Algorithm, ForecastingConfig, MAX_HORIZON};
pub use engine::{ForecastingEngine, MultivariateForecast, MultivariateSeries};
pub use ensemble::EnsembleForecaster;
pub use exponential_smoothing::{ExponentialSmoothingForecaster, Seasonality};
pub use factors::{
    BeneficiaryFactors, BudgetFactors, CorrelationFactors, DomainFactors, QualityFactors,
};
pub use forecaster::Forecaster;
pub use job::{ForecastJob, SeriesQuality, TenantForecastJob, TenantForecastReport, TenantSeries};
pub use linear_regression::{LinearFit, LinearRegressionForecaster};
pub use quality::{DataQualityAssessor, DataQualityReport, Recommendation};
pub use result::{ForecastError, ForecastResult, Trend};
pub use scheduler::{ForecastScheduler, LocalForecastScheduler, SeriesReader, TenantScope};
pub use series::{
    BeneficiaryPoint, BudgetPoint, HistoricalDataPoint, QualityPoint, SeriesBuilder, SeriesPoint,
};
