use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};

const API_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Formats `at` the way the API expects timestamps, in UTC with second precision.
pub(crate) fn format_timestamp<TZ: TimeZone>(at: &DateTime<TZ>) -> String {
    at.with_timezone(&Utc).format(API_DATE_FORMAT).to_string()
}

/// Returns a duration of 24 hours.
pub fn one_day() -> Duration {
    Duration::hours(24)
}

/// Drops minutes, seconds and sub-seconds.
pub fn truncate_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let past_hour = Duration::seconds(at.timestamp().rem_euclid(3600))
        + Duration::nanoseconds(i64::from(at.timestamp_subsec_nanos()));
    at - past_hour
}

/// Returns the current time truncated to the hour.
pub fn current_hour() -> DateTime<Utc> {
    truncate_hour(Utc::now())
}

/// Returns the start of today in the local time zone.
pub fn today_start() -> DateTime<Utc> {
    midnight(&Local, Local::now().date_naive())
}

pub fn yesterday_start() -> DateTime<Utc> {
    today_start() - one_day()
}

/// Same as [`today_start`].
pub fn yesterday_end() -> DateTime<Utc> {
    today_start()
}

/// Returns the first instant of `date` in `tz`.
///
/// When a DST transition skips midnight the day starts when the clocks jump.
pub(crate) fn midnight<TZ: TimeZone>(tz: &TZ, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + Duration::hours(1))).earliest())
        .map_or_else(|| Utc.from_utc_datetime(&midnight), |at| at.with_timezone(&Utc))
}
