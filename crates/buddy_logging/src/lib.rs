#![deny(missing_docs)]
//! Shared diagnostic logging for the Barcode Buddy workspace.
//!
//! This crate provides the `buddy_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. Diagnostic logging is
//! separate from the durable scan event log kept by the state store.

use std::cell::Cell;

thread_local! {
    /// Sequence number of the scan currently being processed on this thread.
    static SCAN_SEQ: Cell<u64> = const { Cell::new(0) };
}

/// Marks the start of a new scan on the current thread and returns its number.
pub fn begin_scan() -> u64 {
    SCAN_SEQ.with(|v| {
        let next = v.get().wrapping_add(1);
        v.set(next);
        next
    })
}

/// Returns the sequence number of the current scan, or 0 before the first one.
pub fn current_scan() -> u64 {
    SCAN_SEQ.with(|v| v.get())
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! buddy_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! buddy_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! buddy_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! buddy_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! buddy_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_sequence_increments_per_thread() {
        let before = current_scan();
        let first = begin_scan();
        let second = begin_scan();
        assert_eq!(first, before + 1);
        assert_eq!(second, first + 1);
        assert_eq!(current_scan(), second);
    }
}
