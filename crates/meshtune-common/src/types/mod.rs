//! Core data types for meshtune

pub mod metrics;
pub mod topology;
