//! Shared scheduling state: the assignment ledger, the availability index and
//! the context that bundles them for a strategy run.

mod availability;
mod context;
mod ledger;

pub use availability::{AvailabilityIndex, SearchDirection};
pub use context::SchedulingContext;
pub use ledger::{are_compatible, calc_arrival, Ledger, LedgerError};
