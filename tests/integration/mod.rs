//! Integration test modules for WavePlug
//!
//! - engine: lifecycle, reset, reconfiguration and recovery
//! - resynthesis: end-to-end pitch and level checks
//! - routing: process handlers and cross-channel modulation

pub mod engine;
pub mod resynthesis;
pub mod routing;
