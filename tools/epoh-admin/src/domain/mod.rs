//! Presentation and simulation logic, independent of any connection.

pub mod dashboard;
pub mod flight;
