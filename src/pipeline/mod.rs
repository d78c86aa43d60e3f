//! Pipeline entry points.
//!
//! - `run_cron`: check every source once, notify and persist on change

pub mod cron;

pub use cron::{CronReport, run_cron};
