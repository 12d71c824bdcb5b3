//! Data models.

pub mod classify;
pub mod config;
pub mod history;
pub mod media;
pub mod plan;
pub mod progress;
