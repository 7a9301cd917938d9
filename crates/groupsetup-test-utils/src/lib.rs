//! Testing utilities for the Group Setup engine.
//!
//! This crate provides sample data that satisfies every standard step, and a
//! harness that wires an orchestrator to the in-memory backend so suites can
//! drive an enrollment step by step.

pub mod builders;
pub mod data_generators;
pub mod error;

pub use builders::{TestEnrollment, TestEnrollmentBuilder};
pub use error::TestError;
