//! `nutriplan-infra` — runtime wiring around the pure forecasting crate.
//!
//! Readers stand in for the data-access layer, sinks for the presentation
//! layer; runners own their thread and are started/stopped explicitly.

pub mod forecast;

pub use forecast::{
    ForecastRunner, ForecastRunnerHandle, InMemoryInsightSink, InMemorySeriesReader, InsightSink,
};
