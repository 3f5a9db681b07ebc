//! Infrastructure adapters.

pub mod time;

pub use time::{ManualClock, SystemClock};
