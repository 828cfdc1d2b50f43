//! # Telemetry Module
//!
//! Turns CREST2 snapshots into session logs on disk.
//!
//! This module handles:
//! - Detecting session boundaries and ready/idle game states
//! - Normalizing a subset of snapshot fields into flat records
//! - Streaming each session's records to its own JSON array file

pub mod classifier;
pub mod extractor;
pub mod logger;
pub mod record;

pub use classifier::SessionClassifier;
pub use logger::SessionLog;
pub use record::NormalizedRecord;
