//! Model file discovery and loading.

mod loader;

pub use loader::{ModelLocator, ModelType, SEARCH_DIRS};
