//! Constants used throughout the application
//!
//! This module centralizes magic strings, wire formats, and default values
//! to improve maintainability and consistency.

// Server defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_AUTH_HEADER_ENV: &str = "TASKSYNC_AUTH";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 300;

// API paths
pub const API_TASKS_PATH: &str = "/api/tasks";
pub const API_NOTES_PATH: &str = "/api/notes";

// Multipart field names understood by the notes endpoints
pub const FIELD_TASK_ID: &str = "task_id";
pub const FIELD_NOTE_ID: &str = "id";
pub const FIELD_CONTENT: &str = "content";
pub const FIELD_IMAGES: &str = "images";
pub const FIELD_NEW_IMAGES: &str = "new_images";
pub const FIELD_DELETE_IMAGES: &str = "delete_images";

/// MIME type sent for uploaded note images
pub const ATTACHMENT_MIME: &str = "image/jpeg";

/// Timestamp format used on the wire for task dates
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Priority given to tasks created without one
pub const DEFAULT_PRIORITY: &str = "Normal";

// File names
pub const CONFIG_FILE_NAME: &str = "tasksync.toml";
pub const APP_DIR_NAME: &str = "tasksync";
pub const LOG_FILE_NAME: &str = "tasksync.log";

// Status messages
pub const STATUS_SYNCED: &str = "✅ Synced";
pub const STATUS_OFFLINE: &str = "📴 Operating offline";
pub const STATUS_SYNC_IN_PROGRESS: &str = "🔄 Sync already in progress";
pub const CONFIG_GENERATED: &str = "✅ Default configuration written to";
