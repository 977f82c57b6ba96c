//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro for output that only appears in verbose mode
//!
//! # Example
//!
//! ```ignore
//! log!("build"; "rendered {} pages", count);
//! debug!("store"; "cached {}", path);
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{IsTerminal, Write, stdout},
    sync::{
        OnceLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Whether `debug!` messages are printed
static VERBOSE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Layout Constants
// ============================================================================
//
// Log line format: "[module] message"
//                   ^------^
//                   prefix

/// Length of brackets around module name: "[]"
const BRACKET_LEN: usize = 2;
/// Space after prefix: "[module] " <- this space
const SPACE_AFTER_PREFIX: usize = 1;

/// Calculate total prefix length for a module name.
///
/// Returns: `module.len() + 3` (for `[`, `]`, and trailing space)
#[inline]
const fn calc_prefix_len(module_len: usize) -> usize {
    module_len + BRACKET_LEN + SPACE_AFTER_PREFIX
}

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn get_terminal_width() -> u16 {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120))
}

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when verbose mode is enabled (`--debug`).
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Enable or disable `debug!` output.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

#[inline]
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix.
///
/// Automatically truncates long single-line messages to fit terminal width.
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);
    let width = get_terminal_width() as usize;

    let mut stdout = stdout().lock();
    if stdout.is_terminal() {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    if message.contains('\n') {
        // Multiline messages (template errors, etc.) are never truncated
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let prefix_len = calc_prefix_len(module.len());
        let max_msg_len = width.saturating_sub(prefix_len);
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module_lower {
        "serve" => prefix.bright_blue().bold(),
        "watch" | "reactor" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
#[inline]
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calc_prefix_len() {
        // "content" -> "[content] " = 7 + 2 + 1 = 10
        assert_eq!(calc_prefix_len(7), 10);
        // "" -> "[] "
        assert_eq!(calc_prefix_len(0), 3);
    }

    #[test]
    fn test_truncate_str_fits() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_str_needs_truncation() {
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn test_truncate_str_unicode_boundary() {
        // "你好" is 6 bytes (3 bytes per char)
        assert_eq!(truncate_str("你好", 4), "你");
        assert_eq!(truncate_str("a你b", 3), "a");
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
