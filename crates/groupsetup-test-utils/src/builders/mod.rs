//! Builders for test environments.

mod enrollment;

pub use enrollment::{TestEnrollment, TestEnrollmentBuilder};
