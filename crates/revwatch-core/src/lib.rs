pub mod config;
pub mod cursor;
pub mod error;
pub mod io;
pub mod mirror;
pub mod notify;
pub mod orchestrator;
pub mod paths;
pub mod pipeline;
pub mod probe;
pub mod remote;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use error::{PipelineError, ProbeError, Result, Step, WatchError};
