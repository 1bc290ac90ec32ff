//! Capability interfaces to the hosted points service.

pub mod points_backend;

pub use points_backend::{PointsBackend, SharedPointsBackend};
