//! scl-windows
//!
//! Bar-integrity validation, window enumeration, and the deterministic
//! stratified sampler. Everything in this crate is pure: identical inputs and
//! seed yield byte-identical output.

mod sampler;
mod stats;
mod validate;
mod window;

pub use sampler::{fnv1a32, select_windows};
pub use stats::{window_stats, WindowStats};
pub use validate::{validate_bars, BarValidationError};
pub use window::{enumerate_windows, WindowDef};

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// The tape is shorter than a single window.
    #[error("no windows can be enumerated from {bar_count} bars with duration {duration}")]
    NoWindows { bar_count: usize, duration: usize },

    /// Too many windows were invalidated by bad bars.
    #[error("only {valid} valid windows available, round requires {requested}")]
    InsufficientValidWindows { valid: usize, requested: usize },
}
