//! Trait abstraction for telemetry fetching to enable testing

use async_trait::async_trait;

use super::snapshot::RawSnapshot;

/// Trait for anything that can produce one telemetry snapshot per call
#[async_trait]
pub trait TelemetrySource: Send {
    /// Fetch a single snapshot
    ///
    /// Returns `None` for every kind of failure (unreachable, timeout,
    /// non-200, malformed body). Implementations must bound their own
    /// waiting time.
    async fn fetch(&mut self) -> Option<RawSnapshot>;

    /// Human readable description for log messages
    fn describe(&self) -> String {
        "telemetry source".to_string()
    }
}
