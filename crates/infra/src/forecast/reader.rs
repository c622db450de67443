use std::collections::HashMap;
use std::sync::RwLock;

use nutriplan_core::TenantId;
use nutriplan_forecast::{ForecastError, SeriesReader, TenantSeries};

/// In-memory series source for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySeriesReader {
    inner: RwLock<HashMap<TenantId, TenantSeries>>,
}

impl InMemorySeriesReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the snapshot for its tenant.
    pub fn upsert(&self, series: TenantSeries) -> Result<(), ForecastError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| ForecastError::ReadFailed("series store lock poisoned".to_string()))?;
        map.insert(series.tenant_id, series);
        Ok(())
    }
}

impl SeriesReader for InMemorySeriesReader {
    fn get_series(&self, tenant_id: TenantId) -> Result<TenantSeries, ForecastError> {
        let map = self
            .inner
            .read()
            .map_err(|_| ForecastError::ReadFailed("series store lock poisoned".to_string()))?;
        map.get(&tenant_id)
            .cloned()
            .ok_or_else(|| ForecastError::ReadFailed(format!("no series for tenant {tenant_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_upserted_snapshot_and_errors_for_unknown_tenant() {
        let reader = InMemorySeriesReader::new();
        let tenant_id = TenantId::new();
        reader.upsert(TenantSeries::new(tenant_id)).unwrap();

        assert_eq!(reader.get_series(tenant_id).unwrap().tenant_id, tenant_id);
        assert!(matches!(
            reader.get_series(TenantId::new()),
            Err(ForecastError::ReadFailed(_))
        ));
    }
}
