//! Arrival time estimation along a route.

use chrono::{DateTime, TimeDelta, Utc};

const NANOS_PER_SECOND: f64 = 1_000_000_000.0;

/// Estimated arrival at `fraction` of the way along a drive of
/// `duration_seconds` that leaves at `departure`.
///
/// The offset is rounded to the nearest nanosecond. Offsets beyond the
/// representable range saturate instead of panicking.
pub fn estimate_arrival(
    departure: DateTime<Utc>,
    duration_seconds: f64,
    fraction: f64,
) -> DateTime<Utc> {
    let offset_ns = (duration_seconds * fraction * NANOS_PER_SECOND).round();
    let saturated = if offset_ns < 0.0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };

    // i64 nanoseconds span about 292 years either way.
    if !offset_ns.is_finite() || offset_ns.abs() >= i64::MAX as f64 {
        return saturated;
    }

    departure
        .checked_add_signed(TimeDelta::nanoseconds(offset_ns as i64))
        .unwrap_or(saturated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn departure() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 6, 30, 0).unwrap()
    }

    #[test]
    fn zero_fraction_is_departure() {
        assert_eq!(estimate_arrival(departure(), 36_000.0, 0.0), departure());
    }

    #[test]
    fn full_fraction_adds_whole_duration() {
        assert_eq!(
            estimate_arrival(departure(), 36_000.0, 1.0),
            departure() + TimeDelta::seconds(36_000)
        );
    }

    #[test]
    fn sixth_of_the_way_is_exact_to_the_second() {
        let eta = estimate_arrival(departure(), 36_000.0, 20.0 / 120.0);
        assert_eq!(eta, departure() + TimeDelta::seconds(6_000));
    }

    #[test]
    fn monotonic_in_fraction() {
        let mut previous = departure();
        for step in 0..=1000 {
            let eta = estimate_arrival(departure(), 12_345.678, f64::from(step) / 1000.0);
            assert!(eta >= previous);
            previous = eta;
        }
    }

    #[test]
    fn sub_millisecond_offsets_are_kept() {
        let eta = estimate_arrival(departure(), 0.000_25, 1.0);
        assert_eq!(eta, departure() + TimeDelta::microseconds(250));

        let eta = estimate_arrival(departure(), 1.5, 1.0 / 3.0);
        assert_eq!(eta, departure() + TimeDelta::milliseconds(500));
    }

    #[test]
    fn offsets_past_three_centuries_saturate() {
        let four_centuries = 400.0 * 365.25 * 86_400.0;
        assert_eq!(
            estimate_arrival(departure(), four_centuries, 1.0),
            DateTime::<Utc>::MAX_UTC
        );
        assert_eq!(
            estimate_arrival(departure(), four_centuries, -1.0),
            DateTime::<Utc>::MIN_UTC
        );
    }

    #[test]
    fn absurd_durations_saturate() {
        assert_eq!(
            estimate_arrival(departure(), f64::MAX, 1.0),
            DateTime::<Utc>::MAX_UTC
        );
    }
}
