//! Backend library for the performance review orchestrator: review cycle
//! scheduling, submission deadlines, weighted scoring, and the HTTP
//! surface that exposes them.

pub mod config;
pub mod error;
pub mod infra;
pub mod telemetry;
pub mod workflows;
