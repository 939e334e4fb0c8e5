//! Pipeline entry points for monitor operations.
//!
//! - `run_monitor`: Check every product and notify on new availability
//! - `run_check`: Probe a single URL without touching state
//! - `run_validate`: Load and sanity-check configuration

pub mod check;
pub mod monitor;
pub mod transition;
pub mod validate;

pub use check::{CheckReport, run_check};
pub use monitor::{MonitorOptions, RunSummary, run_monitor, run_monitor_at};
pub use transition::{NotificationEvent, Transition, evaluate};
pub use validate::run_validate;
