//! Core data model: attachment sequences, size limits and reduction outcomes.

pub mod attachment;
pub mod limit;
pub mod outcome;
