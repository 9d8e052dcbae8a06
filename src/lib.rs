//! Debounced reachability monitor for a single host.
//!
//! One TCP probe per second is classified into a fixed taxonomy, debounced
//! against transient flaps, and every confirmed state change is appended to a
//! per-host transition log with the time spent in the previous state.

pub mod config;
pub mod error;
pub mod logfile;
pub mod probe;
pub mod tracker;
pub mod worker;

pub use config::{Config, Settings};
pub use error::Error;
pub use probe::Classification;
pub use worker::Monitor;
