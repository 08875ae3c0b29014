mod check;
mod repair;
mod scan;

pub use check::Checker;
pub use repair::{RepairScheduler, RepairSelector, RetryPolicy};
pub use scan::{ScanSettings, Scanner};
