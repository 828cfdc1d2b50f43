//! # Crest Logger Library
//!
//! Log Automobilista 2 session telemetry from the CREST2 HTTP endpoint.
//!
//! This library provides the core functionality for polling CREST2, detecting
//! session boundaries, normalizing telemetry and writing one JSON array file
//! per session.

pub mod config;
pub mod coordinator;
pub mod crest;
pub mod error;
pub mod message;
pub mod poller;
pub mod telemetry;
