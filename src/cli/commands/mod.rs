//! CLI command implementations.

pub mod apply;
pub mod classify;
pub mod export;
pub mod history;
pub mod plan;
pub mod retry;
pub mod scan;
pub mod search;
