//! User-visible status lines.
//!
//! Each installer decision emits one or more prefixed lines consumed by the
//! surrounding UI layer. The markers are a fixed contract: a bold green tick
//! for success, a bold red cross for failure, `[i]` for information. Keep the
//! escape sequences verbatim; downstream tooling matches on them.

/// Success marker: `[✓]` in bold green.
pub const TICK: &str = "[\u{1b}[1;32m\u{2713}\u{1b}[0m]";

/// Failure marker: `[✗]` in bold red.
pub const CROSS: &str = "[\u{1b}[1;31m\u{2717}\u{1b}[0m]";

/// Informational marker.
pub const INFO: &str = "[i]";

/// Emit a success line.
pub fn tick(msg: &str) {
    println!("{} {}", TICK, msg);
}

/// Emit a failure line.
pub fn cross(msg: &str) {
    println!("{} {}", CROSS, msg);
}

/// Emit an informational line.
pub fn info(msg: &str) {
    println!("{} {}", INFO, msg);
}

/// Format a success line without printing it.
pub fn tick_line(msg: &str) -> String {
    format!("{} {}", TICK, msg)
}

/// Format a failure line without printing it.
pub fn cross_line(msg: &str) -> String {
    format!("{} {}", CROSS, msg)
}

/// Format an informational line without printing it.
pub fn info_line(msg: &str) -> String {
    format!("{} {}", INFO, msg)
}
