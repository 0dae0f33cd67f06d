//! Durable record of which identifiers a run has already attempted.

mod progress;

pub use progress::ProgressStore;
