//! Name and path generators.

pub mod filename;
pub mod folder;
pub mod pointer;
