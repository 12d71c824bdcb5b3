//! Strm Organizer Library
//!
//! Turns an unstructured remote tree of videos and subtitles into a media
//! library, either by moving files into place or by writing `.strm` pointer
//! files. The pipeline is scan → classify (match + resolve) → plan → execute,
//! with every applied operation recorded in a history ledger.

pub mod cli;
pub mod core;
pub mod error;
pub mod generators;
pub mod models;
pub mod preflight;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
