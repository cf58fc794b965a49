//! Core business logic modules.

pub mod admission;
pub mod ingest;
pub mod parser;
pub mod pipeline;
pub mod planner;
pub mod scanner;
pub mod stabilizer;
pub mod watcher;
