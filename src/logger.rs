//! Logging utilities with colored output and a progress bar.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `ProgressBar` for the parallel document batch
//!
//! Everything here writes to stderr, so stdout carries only the report
//! (which may be JSON).
//!
//! # Example
//!
//! ```ignore
//! log!("refresh"; "{} documents", count);
//! log!("warn"; "duplicate id `{}`", id);
//!
//! let progress = ProgressBar::new("refresh", documents.len());
//! progress.inc();
//! progress.finish();
//! ```

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
    tty::IsTty,
};
use std::{
    io::{Write, stderr},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Whether a progress bar currently occupies the last line
static BAR_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Layout Constants
// ============================================================================
//
// Progress bar format: "[refresh] [████░░░░] 42/100"
//                       ^-------^ ^-------^ ^----^
//                       prefix    bar       count

/// Brackets around the module name plus the space after them: "[] "
const PREFIX_OVERHEAD: usize = 3;
/// Bar wrapper plus the space before the count: " [] "
const BAR_OVERHEAD: usize = 4;
const MIN_BAR_WIDTH: usize = 10;
const MAX_BAR_WIDTH: usize = 40;

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

// ============================================================================
// Log Macro
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

/// Log a message with a colored module prefix.
///
/// Single-line messages are truncated to the terminal width.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut err = stderr().lock();
    let tty = err.is_tty();

    let bar_active = BAR_ACTIVE.load(Ordering::SeqCst);
    if tty && bar_active {
        write!(err, "\r").ok();
        execute!(err, Clear(ClearType::CurrentLine)).ok();
    }

    let message = if tty && !message.contains('\n') {
        let max_len = terminal_width().saturating_sub(module.len() + PREFIX_OVERHEAD);
        truncate_str(message, max_len)
    } else {
        message
    };
    writeln!(err, "{prefix} {message}").ok();
    err.flush().ok();
}

/// Apply color to a module prefix based on module type.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold(),
        "warn" => prefix.bright_magenta().bold(),
        "refresh" | "strip" => prefix.bright_green().bold(),
        "check" | "plan" => prefix.bright_blue().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes.
///
/// Ensures the result is valid UTF-8 by finding the nearest character boundary.
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
// Progress Bar
// ============================================================================

/// Single-line progress bar redrawn in place on stderr.
///
/// Safe to update from rayon workers. Drawing is skipped when stderr is not
/// a terminal.
pub struct ProgressBar {
    prefix: ColoredString,
    prefix_len: usize,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
    enabled: bool,
}

impl ProgressBar {
    pub fn new(module: &str, total: usize) -> Self {
        let enabled = total > 1 && stderr().is_tty();
        BAR_ACTIVE.store(enabled, Ordering::SeqCst);

        Self {
            prefix: colorize_prefix(module),
            prefix_len: module.len() + PREFIX_OVERHEAD,
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
            enabled,
        }
    }

    /// Count one finished item and redraw.
    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        if self.enabled {
            self.display(current);
        }
    }

    fn display(&self, current: usize) {
        let _guard = self.lock.lock().ok();

        let count = format!("{current}/{}", self.total);
        let available = terminal_width().saturating_sub(self.prefix_len + BAR_OVERHEAD + count.len());
        let (filled, empty) = bar_split(current, self.total, available.clamp(MIN_BAR_WIDTH, MAX_BAR_WIDTH));

        let mut err = stderr().lock();
        write!(err, "\r").ok();
        execute!(err, Clear(ClearType::CurrentLine)).ok();
        write!(err, "{} [{}{}] {count}", self.prefix, "█".repeat(filled), "░".repeat(empty)).ok();
        err.flush().ok();
    }

    /// Clear the bar line.
    pub fn finish(&self) {
        if !BAR_ACTIVE.swap(false, Ordering::SeqCst) || !self.enabled {
            return;
        }
        let _guard = self.lock.lock().ok();
        let mut err = stderr().lock();
        write!(err, "\r").ok();
        execute!(err, Clear(ClearType::CurrentLine), cursor::MoveToColumn(0)).ok();
        err.flush().ok();
    }
}

impl Drop for ProgressBar {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Filled and empty cell counts of a bar `width` cells wide.
const fn bar_split(current: usize, total: usize, width: usize) -> (usize, usize) {
    let filled = if total > 0 {
        let filled = (current * width) / total;
        if filled > width { width } else { filled }
    } else {
        0
    };
    (filled, width - filled)
}

// ============================================================================
// Tests
// ============================================================================
