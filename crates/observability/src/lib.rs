//! Tracing and logging setup shared by the stockledger binaries.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide tracing with the `info` default filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Initialize process-wide tracing with `filter` as the fallback directive.
pub fn init_with_filter(filter: &str) {
    tracing::init(filter);
}
