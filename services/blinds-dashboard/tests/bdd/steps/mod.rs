//! BDD step definitions for the blinds dashboard

pub mod command_steps;
pub mod dashboard_steps;
pub mod lifecycle_steps;
