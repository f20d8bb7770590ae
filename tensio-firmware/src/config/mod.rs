//! Definition loading
//!
//! Training definitions are stored as TOML text in flash. When nothing
//! usable is stored, the file embedded at build time is used instead.

pub mod loader;

pub use loader::DefinitionsLoader;
