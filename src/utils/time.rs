use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Wall-clock "now" in the office timezone. Everything downstream works in
/// naive local time; conversions happen only at this boundary.
pub fn now_local(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

/// Next occurrence of `at` strictly after `now`, for daily scheduled jobs.
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn next_occurrence_later_today() {
        let at = NaiveTime::from_hms_opt(20, 0, 0).unwrap();
        assert_eq!(next_occurrence(dt(9, 0), at), dt(20, 0));
    }

    #[test]
    fn next_occurrence_rolls_to_tomorrow() {
        let at = NaiveTime::from_hms_opt(20, 0, 0).unwrap();
        let next = next_occurrence(dt(20, 0), at);
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(next.time(), at);
    }
}
