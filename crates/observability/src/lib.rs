//! Tracing/logging setup shared by forecasting workers and their hosts.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize with human-readable output instead of JSON (local development).
pub fn init_pretty() {
    tracing::init_pretty();
}

/// Tracing configuration (filters, formatters).
pub mod tracing;
