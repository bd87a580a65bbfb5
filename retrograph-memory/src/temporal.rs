//! Temporal decay for reconstructed events
//!
//! Older evidence is less plausible. Weights decay exponentially with the
//! age of an event in months but never drop below [`MIN_WEIGHT`], so old
//! history is discounted without being erased.

use chrono::{DateTime, Utc};

/// Default decay rate per month
pub const DEFAULT_DECAY_RATE: f32 = 0.02;

/// Floor applied to every weight
pub const MIN_WEIGHT: f32 = 0.3;

/// Default age limit in months beyond which commits are skipped
pub const DEFAULT_MAX_MONTHS: f32 = 24.0;

const SECONDS_PER_MONTH: f64 = 30.0 * 24.0 * 60.0 * 60.0;

/// Elapsed months between `timestamp` and `reference`, zero for future events
pub fn months_between(timestamp: DateTime<Utc>, reference: DateTime<Utc>) -> f32 {
    let seconds = (reference - timestamp).num_seconds().max(0) as f64;
    (seconds / SECONDS_PER_MONTH) as f32
}

/// Exponential age weighting for event confidence
#[derive(Debug, Clone, Copy)]
pub struct TemporalWeighter {
    decay_rate: f32,
}

impl TemporalWeighter {
    pub fn new(decay_rate: f32) -> Self {
        Self { decay_rate }
    }

    /// Weight of an event relative to `reference`
    ///
    /// Returns exactly 1.0 at age zero and approaches [`MIN_WEIGHT`] as the
    /// event ages.
    pub fn calculate_weight(&self, timestamp: DateTime<Utc>, reference: DateTime<Utc>) -> f32 {
        let months = months_between(timestamp, reference);
        (-self.decay_rate * months).exp().max(MIN_WEIGHT)
    }

    /// Blend a heuristic confidence with pure recency
    pub fn adjust_confidence(&self, base: f32, weight: f32) -> f32 {
        base * 0.7 + weight * 0.3
    }

    /// True iff the event is strictly older than `max_months` at `reference`
    pub fn is_too_old(
        &self,
        timestamp: DateTime<Utc>,
        reference: DateTime<Utc>,
        max_months: f32,
    ) -> bool {
        months_between(timestamp, reference) > max_months
    }
}

impl Default for TemporalWeighter {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_weight_at_age_zero() {
        let weighter = TemporalWeighter::default();
        let now = Utc::now();
        assert_eq!(weighter.calculate_weight(now, now), 1.0);
    }

    #[test]
    fn test_weight_decays_monotonically() {
        let weighter = TemporalWeighter::default();
        let now = Utc::now();
        let recent = weighter.calculate_weight(now - Duration::days(30), now);
        let older = weighter.calculate_weight(now - Duration::days(300), now);
        assert!(recent < 1.0);
        assert!(older < recent);
        assert!((recent - (-0.02f32).exp()).abs() < 1e-4);
    }

    #[test]
    fn test_weight_never_below_floor() {
        let weighter = TemporalWeighter::default();
        let now = Utc::now();
        let ancient = weighter.calculate_weight(now - Duration::days(365 * 200), now);
        assert_eq!(ancient, MIN_WEIGHT);

        let fast = TemporalWeighter::new(5.0);
        assert_eq!(fast.calculate_weight(now - Duration::days(60), now), MIN_WEIGHT);
    }

    #[test]
    fn test_future_timestamp_weighs_fully() {
        let weighter = TemporalWeighter::default();
        let now = Utc::now();
        assert_eq!(weighter.calculate_weight(now + Duration::days(3), now), 1.0);
    }

    #[test]
    fn test_adjust_confidence_blend() {
        let weighter = TemporalWeighter::default();
        let blended = weighter.adjust_confidence(0.8, 1.0);
        assert!((blended - 0.86).abs() < 1e-6);
    }

    #[test]
    fn test_is_too_old_boundary() {
        let weighter = TemporalWeighter::default();
        let now = Utc::now();

        // 24 months is 720 days
        let exactly = now - Duration::days(720);
        assert!(!weighter.is_too_old(exactly, now, DEFAULT_MAX_MONTHS));

        let just_over = exactly - Duration::hours(1);
        assert!(weighter.is_too_old(just_over, now, DEFAULT_MAX_MONTHS));

        assert!(!weighter.is_too_old(now - Duration::days(10), now, DEFAULT_MAX_MONTHS));
    }
}
