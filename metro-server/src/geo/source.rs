//! Position fixes from a geolocation source.

use std::future::Future;
use std::time::Duration;

use crate::domain::Position;

/// Default time allowed for a position fix.
pub const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(5);

/// Options passed to the geolocation source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: DEFAULT_FIX_TIMEOUT,
        }
    }
}

/// Why no position fix was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixError {
    /// The source could not produce a position
    #[error("position unavailable: {0}")]
    Unavailable(String),

    /// No fix within the allowed time
    #[error("no position fix within {0:?}")]
    Timeout(Duration),
}

/// Anything that can produce a single position fix.
pub trait GeolocationSource: Send + Sync {
    fn get_fix(&self, options: FixOptions)
    -> impl Future<Output = Result<Position, FixError>> + Send;
}

/// Ask `source` for a fix, giving up after `options.timeout`.
pub async fn locate<G: GeolocationSource>(
    source: &G,
    options: FixOptions,
) -> Result<Position, FixError> {
    match tokio::time::timeout(options.timeout, source.get_fix(options)).await {
        Ok(fix) => fix,
        Err(_) => Err(FixError::Timeout(options.timeout)),
    }
}

/// A position reported by the caller, e.g. coordinates sent by a client.
///
/// `None` means the caller had no fix to give.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportedFix(pub Option<Position>);

impl GeolocationSource for ReportedFix {
    async fn get_fix(&self, _options: FixOptions) -> Result<Position, FixError> {
        self.0
            .ok_or_else(|| FixError::Unavailable("no coordinates reported".to_string()))
    }
}
