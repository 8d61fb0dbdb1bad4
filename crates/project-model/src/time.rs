//! Time formatting and unit conversion.

/// Format seconds as `MM:SS.d` (tenths).
pub fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    let tenths = ((seconds % 1.0) * 10.0).floor() as u64;
    format!("{mins:02}:{secs:02}.{tenths}")
}

/// Format seconds as `MM:SS`.
pub fn format_time_short(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{mins:02}:{secs:02}")
}

/// Seconds to whole milliseconds, rounded to nearest.
pub fn secs_to_ms(seconds: f64) -> u64 {
    (seconds.max(0.0) * 1000.0).round() as u64
}
