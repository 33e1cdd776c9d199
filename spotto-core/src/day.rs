use chrono::{DateTime, Local, NaiveDate, Utc};

/// Merchant codes and draw quotas are scoped to the server's local calendar
/// day, not a rolling 24h window.
pub fn local_day(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn same_local_day(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    local_day(a) == local_day(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_same_instant_is_same_day() {
        let now = Utc::now();
        assert!(same_local_day(now, now));
    }

    #[test]
    fn test_two_days_apart_differ() {
        let now = Utc::now();
        assert!(!same_local_day(now, now - Duration::days(2)));
        assert_ne!(local_day(now), local_day(now + Duration::days(2)));
    }
}
