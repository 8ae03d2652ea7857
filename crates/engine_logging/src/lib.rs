#![deny(missing_docs)]
//! Shared logging utilities for the BananaGen workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a thread-local generation attempt tag that the macros prefix to every line,
//! and a minimal test initializer for the global logger.

use std::cell::Cell;

thread_local! {
    /// Generation attempt currently being processed on this thread (0 = none).
    static ATTEMPT: Cell<u64> = const { Cell::new(0) };
}

/// Tags all log lines emitted on this thread with the given generation attempt.
/// Pass 0 to clear the tag.
pub fn set_attempt(attempt: u64) {
    ATTEMPT.with(|v| v.set(attempt));
}

/// Returns the generation attempt tagged on this thread, or 0 if none.
pub fn current_attempt() -> u64 {
    ATTEMPT.with(|v| v.get())
}

/// Runs `f` with the attempt tag set, restoring the previous tag afterwards.
pub fn with_attempt<T>(attempt: u64, f: impl FnOnce() -> T) -> T {
    let previous = current_attempt();
    set_attempt(attempt);
    let out = f();
    set_attempt(previous);
    out
}

/// Prefix inserted by the logging macros, e.g. `"[attempt 3] "`.
#[doc(hidden)]
pub fn attempt_prefix() -> String {
    match current_attempt() {
        0 => String::new(),
        n => format!("[attempt {n}] "),
    }
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        log::trace!("{}{}", $crate::attempt_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        log::info!("{}{}", $crate::attempt_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        log::debug!("{}{}", $crate::attempt_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        log::warn!("{}{}", $crate::attempt_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        log::error!("{}{}", $crate::attempt_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
