//! Tasksync - an offline-first task list client
//!
//! This library keeps a task list usable while disconnected from its server,
//! then reconciles local edits once connectivity returns. Edits land in a local
//! SQLite store flagged dirty or tombstoned; a sync cycle pushes them and pulls
//! the authoritative list back.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`storage`] - Local database and the record store interface
//! * [`backend`] - Remote client abstraction and its HTTP implementation
//! * [`sync`] - The push-then-pull synchronization engine
//! * [`logger`] - Log setup and the in-memory log buffer

/// Remote client abstraction and wire types
pub mod backend;

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// SeaORM entity models for database tables
pub mod entities;

/// Logging setup and in-memory log buffer
pub mod logger;

/// Repository layer for database operations
pub mod repositories;

/// Local storage layer for offline task data
pub mod storage;

/// Synchronization engine for keeping local and remote data in sync
pub mod sync;

// Re-export entity models for convenient access
pub use entities::{pending_note, task};
