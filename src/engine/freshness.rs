use std::time::Duration;
use std::time::SystemTime;

use tokio::time::Instant;

/// Outcome of the freshness computation for one endpoint.
///
/// The three cases are deliberately distinct: `Untimed` is not "due now",
/// it means the resource is not subject to timed refresh at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// A value is known and no expiry or refresh interval was ever configured
    Untimed,
    /// Eligible for an immediate refresh
    Due,
    /// Still fresh for the given duration
    Fresh(Duration),
}

impl Freshness {
    /// The wait before the next refresh, if the resource is timed at all.
    pub fn wait(&self) -> Option<Duration> {
        match self {
            Freshness::Untimed => None,
            Freshness::Due => Some(Duration::ZERO),
            Freshness::Fresh(d) => Some(*d),
        }
    }
}

/// Snapshot of the freshness-relevant endpoint state
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshnessInputs {
    pub expires_at: Option<SystemTime>,
    pub last_fetch: Option<Instant>,
    pub refresh_interval: Option<Duration>,
    pub has_value: bool,
}

impl FreshnessInputs {
    /// Evaluates freshness at `now` (monotonic, for the refresh interval) and
    /// `wall_now` (wall clock, for `Expires`).
    pub fn evaluate(
        &self,
        now: Instant,
        wall_now: SystemTime,
    ) -> Freshness {
        let expiry_remaining = self
            .expires_at
            .and_then(|expires_at| expires_at.duration_since(wall_now).ok())
            .filter(|d| !d.is_zero());

        let refresh_remaining = match (self.last_fetch, self.refresh_interval) {
            (Some(last_fetch), Some(interval)) => {
                Some(interval.saturating_sub(now.saturating_duration_since(last_fetch)))
            }
            _ => None,
        }
        .filter(|d| !d.is_zero());

        match (expiry_remaining, refresh_remaining) {
            (Some(a), Some(b)) => Freshness::Fresh(a.min(b)),
            (Some(d), None) | (None, Some(d)) => Freshness::Fresh(d),
            (None, None) => {
                if self.has_value && self.expires_at.is_none() && self.refresh_interval.is_none() {
                    Freshness::Untimed
                } else {
                    Freshness::Due
                }
            }
        }
    }
}
