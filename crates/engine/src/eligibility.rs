//! Per-unit decisions re-evaluated on every tick.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use havoc_core::parse_timestamp;

/// Whether a unit should be processed at `now`.
///
/// - never processed (absent or empty) → due
/// - unparsable timestamp → not due; bad rows are suppressed, never forced
/// - otherwise due once strictly more than `frequency_minutes` have elapsed
pub fn is_due(frequency_minutes: i32, last_processed: Option<&str>, now: DateTime<Utc>) -> bool {
    let raw = match last_processed {
        None => return true,
        Some(s) if s.is_empty() => return true,
        Some(s) => s,
    };
    match parse_timestamp(raw) {
        Ok(last) => last < now - Duration::minutes(i64::from(frequency_minutes)),
        Err(_) => false,
    }
}

/// One Bernoulli trial: a uniform sample in `[0, 1)` compared against
/// `probability`. Zero never injects, one always does.
pub fn should_inject<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    let sample: f64 = rng.gen();
    probability > 0.0 && sample <= probability
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use havoc_core::format_timestamp;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    // -- is_due ------------------------------------------------------------

    #[test]
    fn exact_interval_is_not_yet_due() {
        for frequency in [1, 5, 17, 60] {
            let last = format_timestamp(noon() - Duration::minutes(frequency));
            assert!(!is_due(frequency as i32, Some(&last), noon()), "frequency {frequency}");
        }
    }

    #[test]
    fn one_second_past_interval_is_due() {
        for frequency in [1, 5, 17, 60] {
            let last = format_timestamp(
                noon() - Duration::minutes(frequency) - Duration::seconds(1),
            );
            assert!(is_due(frequency as i32, Some(&last), noon()), "frequency {frequency}");
        }
    }

    #[test]
    fn never_processed_is_due() {
        for frequency in [1, 30, 60] {
            assert!(is_due(frequency, None, noon()));
            assert!(is_due(frequency, Some(""), noon()));
        }
    }

    #[test]
    fn unparsable_timestamp_is_never_due() {
        for frequency in [1, 30, 60] {
            assert!(!is_due(frequency, Some("yesterday"), noon()));
            assert!(!is_due(frequency, Some("2024-06-01 11:00:00"), noon()));
        }
    }

    #[test]
    fn recent_processing_is_not_due() {
        let last = format_timestamp(noon() - Duration::seconds(30));
        assert!(!is_due(1, Some(&last), noon()));
    }

    #[test]
    fn future_timestamp_is_not_due() {
        let last = format_timestamp(noon() + Duration::hours(1));
        assert!(!is_due(5, Some(&last), noon()));
    }

    // -- should_inject -----------------------------------------------------

    #[test]
    fn zero_probability_never_injects() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..10_000).all(|_| !should_inject(&mut rng, 0.0)));
    }

    #[test]
    fn full_probability_always_injects() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!((0..10_000).all(|_| should_inject(&mut rng, 1.0)));
    }

    #[test]
    fn intermediate_probability_is_roughly_proportional() {
        let mut rng = StdRng::seed_from_u64(42);
        let hits = (0..10_000).filter(|_| should_inject(&mut rng, 0.25)).count();
        assert!((2_000..3_000).contains(&hits), "hits = {hits}");
    }
}
