//! Recording library for AudioText - metadata store, loading, and config

mod config;
mod loader;
mod store;

pub use config::Config;
pub use loader::{LoadError, LoadedRecording, RecordingLoader};
pub use store::{Recording, RecordingStore, StoreError};
