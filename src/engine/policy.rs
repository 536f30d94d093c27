//! Frequency policy
//!
//! Pure due-time math shared by the scheduler loop and the status query path.
//! Both paths must derive due/not-due from these functions only, so they can
//! never disagree.

use crate::models::Frequency;
use chrono::{DateTime, Duration, Utc};

/// Source of "now", injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Whether a task is due to run right now.
///
/// On-demand tasks are due only on an explicit trigger and never in the
/// periodic scan; periodic tasks are the inverse. A periodic task with no
/// recorded last run is due immediately. Unrecognized labels are never due;
/// the caller is responsible for surfacing the policy violation.
pub fn is_due(
    frequency: &Frequency,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    invoked_on_demand: bool,
) -> bool {
    match frequency {
        Frequency::OnDemand => invoked_on_demand,
        Frequency::Other(_) => false,
        _ => {
            if invoked_on_demand {
                return false;
            }
            match frequency.period() {
                // Boundary inclusive: elapsed == period is due.
                Some(period) => last_run.is_none_or(|last_run| now - last_run >= period),
                None => false,
            }
        }
    }
}

/// Time remaining until a periodic task is next due, floored at zero.
///
/// Zero means "due now". An absent last run reports zero wait, consistent
/// with `is_due` treating it as due immediately. Non-periodic frequencies
/// report zero; callers filter those out before asking.
pub fn time_until_due(
    frequency: &Frequency,
    last_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Duration {
    let Some(period) = frequency.period() else {
        return Duration::zero();
    };
    match last_run {
        None => Duration::zero(),
        Some(last_run) => {
            let remaining = period - (now - last_run);
            remaining.max(Duration::zero())
        }
    }
}

/// Render a wait as `"{d} days {h} hours {m} minutes"`, omitting zero-valued
/// components. All components zero renders the empty string, meaning
/// "due now".
pub fn format_due_in(wait: Duration) -> String {
    let total_minutes = wait.num_minutes().max(0);
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} days", days));
    }
    if hours > 0 {
        parts.push(format!("{} hours", hours));
    }
    if minutes > 0 {
        parts.push(format!("{} minutes", minutes));
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn absent_last_run_is_due_for_every_periodic_frequency() {
        let now = fixed_now();
        for frequency in [
            Frequency::Hourly,
            Frequency::SixHourly,
            Frequency::Daily,
            Frequency::Monthly,
        ] {
            assert!(is_due(&frequency, None, now, false), "{:?}", frequency);
        }
    }

    #[test]
    fn due_boundary_is_inclusive() {
        let now = fixed_now();
        for frequency in [
            Frequency::Hourly,
            Frequency::SixHourly,
            Frequency::Daily,
            Frequency::Monthly,
        ] {
            let period = frequency.period().unwrap();

            let just_under = now - (period - Duration::seconds(1));
            assert!(!is_due(&frequency, Some(just_under), now, false));

            let exactly = now - period;
            assert!(is_due(&frequency, Some(exactly), now, false));
        }
    }

    #[test]
    fn on_demand_is_gated_on_explicit_trigger() {
        let now = fixed_now();
        assert!(!is_due(&Frequency::OnDemand, None, now, false));
        assert!(is_due(&Frequency::OnDemand, None, now, true));
        assert!(is_due(
            &Frequency::OnDemand,
            Some(now - Duration::seconds(5)),
            now,
            true
        ));
    }

    #[test]
    fn periodic_tasks_do_not_fire_in_an_on_demand_pass() {
        let now = fixed_now();
        assert!(!is_due(&Frequency::Hourly, None, now, true));
        assert!(!is_due(
            &Frequency::Daily,
            Some(now - Duration::days(2)),
            now,
            true
        ));
    }

    #[test]
    fn unrecognized_label_is_never_due() {
        let now = fixed_now();
        let weekly = Frequency::Other("weekly".to_string());
        assert!(!is_due(&weekly, None, now, false));
        assert!(!is_due(&weekly, None, now, true));
        assert!(!is_due(&weekly, Some(now - Duration::days(365)), now, false));
    }

    #[test]
    fn time_until_due_is_zero_when_due() {
        let now = fixed_now();
        assert_eq!(
            time_until_due(&Frequency::Hourly, None, now),
            Duration::zero()
        );
        assert_eq!(
            time_until_due(&Frequency::Hourly, Some(now - Duration::hours(2)), now),
            Duration::zero()
        );
    }

    #[test]
    fn time_until_due_reports_remaining_period() {
        let now = fixed_now();
        let last_run = now - Duration::minutes(25);
        assert_eq!(
            time_until_due(&Frequency::Hourly, Some(last_run), now),
            Duration::minutes(35)
        );
        assert_eq!(
            time_until_due(&Frequency::Daily, Some(last_run), now),
            Duration::minutes(24 * 60 - 25)
        );
    }

    #[test]
    fn is_due_and_time_until_due_agree() {
        let now = fixed_now();
        for frequency in [Frequency::Hourly, Frequency::Daily] {
            for last_run in [
                None,
                Some(now - Duration::minutes(30)),
                Some(now - Duration::days(31)),
            ] {
                let due = is_due(&frequency, last_run, now, false);
                let wait = time_until_due(&frequency, last_run, now);
                assert_eq!(due, wait == Duration::zero());
            }
        }
    }

    #[test]
    fn due_in_formatting_omits_zero_components() {
        assert_eq!(format_due_in(Duration::zero()), "");
        assert_eq!(format_due_in(Duration::minutes(35)), "35 minutes");
        assert_eq!(format_due_in(Duration::hours(6)), "6 hours");
        assert_eq!(
            format_due_in(Duration::hours(26) + Duration::minutes(5)),
            "1 days 2 hours 5 minutes"
        );
        assert_eq!(
            format_due_in(Duration::days(2) + Duration::minutes(5)),
            "2 days 5 minutes"
        );
        // Sub-minute waits floor to "due now".
        assert_eq!(format_due_in(Duration::seconds(59)), "");
    }
}
