use chrono::{DateTime, SecondsFormat, Utc};

/// Current instant, extracted so tests can observe time flow through a narrow seam.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// RFC3339 with a `Z` suffix and no sub-second component, matching the wire format
/// every timestamp field in this service uses.
pub fn format_rfc3339(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}
