use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

/// Resolve an IANA zone name such as `America/Santiago`. Blank means the
/// caller did not ask for one.
pub fn parse_timezone(name: Option<&str>, default: Tz) -> Result<Tz, String> {
    match name.map(str::trim).filter(|name| !name.is_empty()) {
        None => Ok(default),
        Some(name) => name.parse::<Tz>().map_err(|_| {
            debug!("Unknown timezone requested: {}", name);
            format!("Unknown timezone '{}'", name)
        }),
    }
}

pub fn local_today<Z: TimeZone>(timezone: &Z, now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(timezone).date_naive()
}
