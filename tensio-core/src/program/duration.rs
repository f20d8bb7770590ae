//! Duration display helpers

use core::fmt::Write;

use heapless::String;

/// Formatted duration text
pub type DurationText = String<12>;

/// Format whole seconds as `m:ss`
///
/// Minutes are not wrapped into hours, so 3725 s reads `62:05`.
pub fn format_duration(total_s: u32) -> DurationText {
    let mut out = DurationText::new();
    // 10 digits + ':' + 2 digits never exceeds the buffer
    let _ = write!(out, "{}:{:02}", total_s / 60, total_s % 60);
    out
}
