use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Source of the current time
///
/// Bid admission reads the time through this, so tests can move it.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type SharedTimeSource = Arc<dyn TimeSource + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    pub fn new_shared() -> SharedTimeSource {
        Arc::new(Self)
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Error, Debug)]
#[error("invalid closing time {input:?} (expected RFC 3339, e.g. 2023-02-09T21:15:00-05:00): {source}")]
pub struct ClockError {
    input: String,
    source: chrono::ParseError,
}

/// The single instant after which no bid is admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuctionClock {
    closes_at: DateTime<Utc>,
}

impl AuctionClock {
    pub fn new(closes_at: DateTime<Utc>) -> Self {
        Self { closes_at }
    }

    pub fn parse(input: &str) -> Result<Self, ClockError> {
        DateTime::parse_from_rfc3339(input.trim())
            .map(|closes_at| Self::new(closes_at.with_timezone(&Utc)))
            .map_err(|source| ClockError {
                input: input.to_owned(),
                source,
            })
    }

    pub fn closes_at(&self) -> DateTime<Utc> {
        self.closes_at
    }

    /// Open strictly before the closing instant
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now < self.closes_at
    }
}

#[cfg(test)]
pub use self::mock::MockTimeSource;
