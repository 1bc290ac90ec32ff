//! Helpers shared by unit and integration tests.

pub mod app_builder;
pub mod fake_points;

pub use app_builder::create_test_app_builder;
pub use fake_points::InMemoryPointsBackend;
