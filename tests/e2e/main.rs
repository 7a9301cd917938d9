//! End-to-end enrollment tests.
//!
//! Each test drives a full orchestrator session against the in-memory
//! backend with the standard step modules.

mod offline_packet;
mod online_enrollment;
mod recovery;
