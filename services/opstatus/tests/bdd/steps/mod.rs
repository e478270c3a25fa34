//! BDD step definitions for opstatus service

pub mod health_steps;
pub mod maintenance_steps;
pub mod notification_steps;
