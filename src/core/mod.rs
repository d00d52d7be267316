//! Core resource cache implementation

pub mod budget;
pub mod cache;
pub mod config;
pub mod container;
pub mod handle;
pub mod loader;
pub mod pattern;

pub use cache::{CacheStats, ResourceCache};
