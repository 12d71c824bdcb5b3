//! Core business logic modules.

pub mod classifier;
pub mod executor;
pub mod exporter;
pub mod history;
pub mod matcher;
pub mod parser;
pub mod planner;
pub mod progress;
pub mod resolver;
pub mod scanner;
