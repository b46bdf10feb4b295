/// Opaque identifier ParseHub assigns to a project.
pub type ProjectToken = String;

/// Opaque identifier ParseHub assigns to a run on submission.
pub type RunToken = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse a ParseHub timestamp.
///
/// The API documents its times as UTC but does not always attach an
/// offset, so both RFC 3339 and the bare `YYYY-MM-DDTHH:MM:SS[.fff]` form
/// are accepted. Returns `None` for empty or unparsable input.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&chrono::Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
