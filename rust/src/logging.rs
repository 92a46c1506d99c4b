//! Strategy tracing on stderr, gated by `OptimizerConfig::verbosity`.
//!
//! Arguments are only evaluated when the level is on.
//! - 1 traces what a run commits: greedy takes, brute force and DP chains,
//!   each Monte Carlo improvement, final impact and open count per strategy,
//!   comparator scores.
//! - 2 adds greedy bookkeeping: candidate list sizes and appointments an
//!   interpreter could not fit.
//! - 3 adds search internals: Monte Carlo draws and early stops, DP weight
//!   tables, brute force reachability.

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_ASSIGNMENTS: u8 = 1;
pub const VERBOSITY_CANDIDATES: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Commits and scores.
#[macro_export]
macro_rules! log_assignments {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_ASSIGNMENTS {
            eprintln!($($arg)*);
        }
    };
}

/// Greedy candidate lists and misfits.
#[macro_export]
macro_rules! log_candidates {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CANDIDATES {
            eprintln!($($arg)*);
        }
    };
}

/// Search internals, one line per draw or table.
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}
