//! Background forecasting for tenants.
//!
//! A runner re-forecasts one tenant on a fixed interval or when triggered,
//! reading snapshots through a [`nutriplan_forecast::SeriesReader`] and
//! handing reports to an [`InsightSink`]. Read and job failures stay inside
//! the runner thread.

pub mod reader;
pub mod runner;

pub use reader::InMemorySeriesReader;
pub use runner::{ForecastRunner, ForecastRunnerHandle, InMemoryInsightSink, InsightSink};
