//! Test helpers for the points backend that do not depend on backend types:
//! one-time test logging and Problem Details assertions.

pub mod logging;
pub mod problem_details;

pub use problem_details::{assert_problem_details, ProblemDetailsLike};
