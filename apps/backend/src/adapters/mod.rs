//! Adapters for external dependencies.

pub mod hosted_rest;
