//! TTL Module
//!
//! Normalizes the accepted time-to-live inputs into a single duration.

use chrono::Duration;

/// Number of weeks an "infinite" TTL is mapped to.
///
/// Stores schedule expiry by absolute time, so forever has to be finite.
pub const FOREVER_WEEKS: i64 = 20_000;

// == Ttl ==
/// A time-to-live as given by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Ttl {
    /// Seconds, possibly fractional or negative
    Seconds(f64),
    /// An explicit duration, possibly negative
    Duration(Duration),
    /// Never expire (in practice: [`FOREVER_WEEKS`])
    #[default]
    Infinite,
}

impl Ttl {
    // == Normalize ==
    /// Converts the input into a canonical duration.
    ///
    /// Zero and negative inputs pass through unchanged; the resulting entry is
    /// already expired when stored. Infinite float input is the same as
    /// [`Ttl::Infinite`], NaN is treated as zero.
    pub fn normalize(self) -> Duration {
        match self {
            Ttl::Seconds(secs) if secs.is_nan() => Duration::zero(),
            Ttl::Seconds(secs) if secs.is_infinite() && secs > 0.0 => forever(),
            Ttl::Seconds(secs) => Duration::microseconds((secs * 1_000_000.0).round() as i64),
            Ttl::Duration(duration) => duration,
            Ttl::Infinite => forever(),
        }
    }

    /// Parses `inf`/`infinite` or a number of seconds.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("inf") || input.eq_ignore_ascii_case("infinite") {
            return Some(Ttl::Infinite);
        }
        input.parse::<f64>().ok().map(Ttl::from)
    }
}

/// The duration used for entries that should never expire.
pub fn forever() -> Duration {
    Duration::weeks(FOREVER_WEEKS)
}

// == Conversions ==
impl From<f64> for Ttl {
    fn from(secs: f64) -> Self {
        if secs.is_infinite() && secs > 0.0 {
            Ttl::Infinite
        } else {
            Ttl::Seconds(secs)
        }
    }
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Duration(Duration::microseconds(secs.saturating_mul(1_000_000)))
    }
}

impl From<i32> for Ttl {
    fn from(secs: i32) -> Self {
        Ttl::from(i64::from(secs))
    }
}

impl From<u32> for Ttl {
    fn from(secs: u32) -> Self {
        Ttl::from(i64::from(secs))
    }
}

impl From<Duration> for Ttl {
    fn from(duration: Duration) -> Self {
        Ttl::Duration(duration)
    }
}

impl From<std::time::Duration> for Ttl {
    fn from(duration: std::time::Duration) -> Self {
        Duration::from_std(duration)
            .map(Ttl::Duration)
            .unwrap_or(Ttl::Infinite)
    }
}
