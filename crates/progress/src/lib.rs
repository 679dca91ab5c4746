//! Course Progression (Layer 2)
//!
//! Derives lesson and module states from a course tree and a learner's
//! completion record, and applies progression operations to that record.

#![warn(missing_docs)]

pub mod error;
pub mod config;
pub mod flatten;
pub mod deriver;
pub mod completion;
pub mod unlock;
pub mod navigation;
pub mod reset;
pub mod service;

#[cfg(test)]
mod fixtures;

pub use error::{EngineError, Result};
pub use config::EngineConfig;
pub use flatten::{flatten, Flattened};
pub use deriver::derive;
pub use unlock::ModuleAdvance;
pub use service::{CourseProgression, ProgressionService};
