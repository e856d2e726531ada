pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod memory;
pub mod mutator;
pub mod orchestrator;
pub mod paths;
pub mod plan;
pub mod probe;
pub mod record;
pub mod types;
pub mod undo;
pub mod windows;

pub use error::{HardenError, Result};
