// Video Fields - custom field and schema management for bookmarked videos

// Core types and primitives
pub mod core;

// Field definitions, configs and values
pub mod fields;

// Schemas, bindings and tag resolution
pub mod schemas;

pub mod videos;

// Per-type value editors and optimistic auto-save
pub mod autosave;
pub mod editors;

// Persistence and caching
pub mod infrastructure;

pub mod services;

// HTTP surface and wiring
pub mod app_state;
pub mod config;
pub mod field_interface;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
