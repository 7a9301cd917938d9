pub mod enrollment_steps;
pub mod offline_steps;
pub mod world;
