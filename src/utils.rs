use std::time::Duration;

/// Interval between token refills when `capacity` tokens are spread evenly
/// over `period`.
pub fn refill_interval(period: Duration, capacity: u32) -> Duration {
    if capacity == 0 {
        return period;
    }
    period / capacity
}

/// Whole tokens earned over `elapsed` at one token per `interval`
pub fn whole_tokens_for_elapsed(elapsed: Duration, interval: Duration) -> u128 {
    if interval.is_zero() {
        return u128::MAX;
    }
    elapsed.as_nanos() / interval.as_nanos()
}

/// Round to two decimal places (cents)
pub fn round_to_two_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
