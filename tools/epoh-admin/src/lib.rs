//! # EPOH Admin
//!
//! Operator tooling around a running Leader.
//!
//! | Command  | What it does                                                   |
//! |----------|----------------------------------------------------------------|
//! | `keygen` | Generates a keyring plus one secret key file per identity      |
//! | `fly`    | Simulated UAV: authenticates, then streams telemetry samples   |
//! | `tail`   | Ground-station table of the newest blocks, optionally followed |
//! | `status` | Session state of one client                                    |
//! | `metrics`| Prometheus text from the Leader                                |
//!
//! Everything talks to the Leader over the same line-framed protocol the UAVs
//! use, so the tool needs no extra listener on the Leader side.

pub mod api;
pub mod domain;
pub mod keygen;

pub use api::{ApiError, LeaderClient};
pub use domain::dashboard::{format_row, EventTag, TailCursor, TABLE_HEADER};
pub use domain::flight::{FlightPlan, SimulatedFlight, Waypoint, LANDING_STATUS};
pub use keygen::{generate_deployment, GeneratedDeployment};
