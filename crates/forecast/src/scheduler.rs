//! Tenant-scoped execution of forecast jobs.

use nutriplan_core::TenantId;

use crate::config::ForecastingConfig;
use crate::job::{ForecastJob, TenantForecastJob, TenantForecastReport, TenantSeries};
use crate::result::ForecastError;

/// Tenants a scheduler will forecast for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TenantScope {
    /// Shared worker serving every tenant.
    Any,
    Tenant(TenantId),
}

impl TenantScope {
    pub fn allows(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::Any => true,
            TenantScope::Tenant(t) => *t == tenant_id,
        }
    }

    pub fn check(&self, tenant_id: TenantId) -> Result<(), ForecastError> {
        if self.allows(tenant_id) {
            Ok(())
        } else {
            Err(ForecastError::ScopeViolation(tenant_id))
        }
    }
}

/// Source of tenant series (the data-access layer, outside this crate).
pub trait SeriesReader: Send + Sync {
    fn get_series(&self, tenant_id: TenantId) -> Result<TenantSeries, ForecastError>;
}

/// Runs forecast jobs for the tenants in its scope.
pub trait ForecastScheduler: Send + Sync + 'static {
    fn scope(&self) -> TenantScope;

    /// Engine settings for jobs this scheduler builds itself.
    fn config(&self) -> &ForecastingConfig;

    fn run<J: ForecastJob>(&self, job: J) -> Result<J::Output, ForecastError> {
        self.scope().check(job.tenant_id())?;
        job.run()
    }

    /// Read the tenant's current snapshot and forecast it.
    ///
    /// Out-of-scope tenants are refused before the reader is touched.
    fn forecast_tenant<R>(
        &self,
        reader: &R,
        tenant_id: TenantId,
    ) -> Result<TenantForecastReport, ForecastError>
    where
        R: SeriesReader + ?Sized,
    {
        self.scope().check(tenant_id)?;
        let series = reader.get_series(tenant_id)?;
        self.run(TenantForecastJob::new(tenant_id, series).with_config(self.config().clone()))
    }
}

/// Runs jobs on the calling thread.
#[derive(Debug, Clone)]
pub struct LocalForecastScheduler {
    scope: TenantScope,
    config: ForecastingConfig,
}

impl LocalForecastScheduler {
    pub fn new(scope: TenantScope) -> Self {
        Self {
            scope,
            config: ForecastingConfig::default(),
        }
    }

    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self::new(TenantScope::Tenant(tenant_id))
    }

    pub fn with_config(mut self, config: ForecastingConfig) -> Self {
        self.config = config;
        self
    }
}

impl ForecastScheduler for LocalForecastScheduler {
    fn scope(&self) -> TenantScope {
        self.scope
    }

    fn config(&self) -> &ForecastingConfig {
        &self.config
    }
}
