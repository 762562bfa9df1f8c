pub mod annotations;
pub mod collection;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod filter;
pub mod identity;
pub mod loader;
pub mod media;
pub mod models;
pub mod pagination;
pub mod selection;
pub mod storage;
pub mod timestamp;
pub mod view;
mod migrations;

pub use annotations::AnnotationStore;
pub use collection::MessageLog;
pub use config::ViewerConfig;
pub use db::{open_store, SqliteStorage};
pub use error::CoreError;
pub use storage::{MemoryStorage, StorageBackend};
pub use view::ThreadView;
