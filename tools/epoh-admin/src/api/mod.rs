//! Leader protocol client.

mod client;

pub use client::{ApiError, LeaderClient, DEFAULT_REQUEST_TIMEOUT};
