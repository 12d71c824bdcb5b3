//! External capabilities: storage backends and metadata providers.

pub mod local;
pub mod memory;
pub mod metadata;
pub mod storage;
pub mod tmdb;

pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use metadata::{MetadataProvider, StaticMetadata};
pub use storage::{Entry, Storage};
pub use tmdb::TmdbClient;
