use chrono::DateTime;
use chrono::NaiveTime;
use chrono::Offset;
use chrono::TimeZone;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// A tour date, as stored in the content store's `shows` collection. Only
/// `date` is required; everything else is shown when present. Fields we don't
/// know about are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Show {
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Ticket shop url
    #[serde(default)]
    pub tickets: Option<String>,
}

/// Midnight at the start of `now`'s calendar day, in `now`'s time zone.
///
/// Where local midnight doesn't exist (a DST gap), the offset in effect at
/// `now` is used instead.
pub fn start_of_today<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    match now.timezone().from_local_datetime(&midnight).earliest() {
        Some(t) => t.with_timezone(&Utc),
        None => {
            let offset = now.offset().fix();
            let t = midnight - chrono::Duration::seconds(offset.local_minus_utc().into());
            t.and_utc()
        }
    }
}
