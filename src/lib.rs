//! # fanout-rs
//!
//! Bounded concurrent dispatch of outbound calls.
//!
//! A work source (a file of identifiers, or a counted range) feeds a fixed
//! pool of workers; each worker makes one call per item and every item's
//! outcome is tallied by a single aggregator. Ships with two operations:
//! bulk artifact deletion against a registry API, and synthetic load
//! against a feature-flag evaluation service.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod model;
pub mod ops;
pub mod telemetry;
