//! Data models for the classroom points tracker.
//!
//! Field names serialize in camelCase to match the browser client.

mod class;
mod student;

pub use class::*;
pub use student::*;
