use std::time::SystemTime;

/// Converts a `SystemTime` into integer milliseconds since the Unix epoch.
///
/// Times before the epoch collapse to zero.
pub fn timestamp_millis(st: &SystemTime) -> u64 {
    match st.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(duration) => duration.as_millis() as u64,
        Err(_) => 0,
    }
}

/// Integer milliseconds since the Unix epoch for the current wall clock.
pub fn now_millis() -> u64 {
    timestamp_millis(&SystemTime::now())
}
