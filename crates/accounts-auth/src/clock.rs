//! Injectable clock.

use std::fmt;
use std::sync::Arc;

use time::OffsetDateTime;

/// Source of "now" for timestamps written by storage backends.
///
/// Cheap to clone; the wrapped function is shared.
#[derive(Clone)]
pub struct DateProvider(Arc<dyn Fn() -> OffsetDateTime + Send + Sync>);

impl DateProvider {
    /// Wrap an arbitrary clock function.
    pub fn new(f: impl Fn() -> OffsetDateTime + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// A clock that always returns `at`.
    #[must_use]
    pub fn fixed(at: OffsetDateTime) -> Self {
        Self::new(move || at)
    }

    /// Current time according to this provider.
    #[must_use]
    pub fn now(&self) -> OffsetDateTime {
        (self.0)()
    }

    /// Current time as milliseconds since the Unix epoch.
    #[must_use]
    pub fn now_millis(&self) -> i64 {
        to_unix_millis(self.now())
    }
}

impl Default for DateProvider {
    fn default() -> Self {
        Self::new(OffsetDateTime::now_utc)
    }
}

impl fmt::Debug for DateProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DateProvider").field(&"<fn>").finish()
    }
}

/// Convert a timestamp to milliseconds since the Unix epoch.
#[must_use]
pub fn to_unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Convert milliseconds since the Unix epoch back into a timestamp.
///
/// Returns `None` when the value is outside the representable range.
#[must_use]
pub fn from_unix_millis(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}
