use crate::result::ForecastResult;
use crate::series::HistoricalDataPoint;

/// A forecasting algorithm.
///
/// Implementations are pure functions of their input: no IO, no interior
/// mutability, same input ⇒ bit-identical output. They never fail; insufficient
/// or degenerate data yields a documented low-confidence fallback result.
pub trait Forecaster: Send + Sync {
    /// Stable identifier of the algorithm (matches the config name).
    fn name(&self) -> &'static str;

    /// Project the series `periods_ahead` monthly periods past its last point.
    fn forecast(&self, series: &[HistoricalDataPoint], periods_ahead: usize) -> ForecastResult;
}
