use chrono::{DateTime, Duration, NaiveTime, TimeZone};

/// First instant strictly after `now` whose wall-clock time is `at`.
///
/// Wall-clock times skipped by a DST change move to the following day.
pub fn next_run<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut date = now.date_naive();
    loop {
        if let Some(candidate) = tz.from_local_datetime(&date.and_time(at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        date = date.succ_opt().unwrap_or(date + Duration::days(1));
    }
}

/// Time left until `next`, zero if it already passed.
pub fn wait_until<Tz: TimeZone>(now: &DateTime<Tz>, next: &DateTime<Tz>) -> std::time::Duration {
    next.clone()
        .signed_duration_since(now.clone())
        .to_std()
        .unwrap_or_default()
}
