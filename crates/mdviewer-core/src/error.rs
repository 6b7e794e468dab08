//! Application error types

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Tab Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Maximum {max} tabs allowed")]
    TabLimit { max: usize },

    #[error("Tab not found: {id}")]
    TabNotFound { id: String },

    #[error("No active tab")]
    NoActiveTab,

    // ─────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Corrupt snapshot: {message}")]
    CorruptSnapshot { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Editor surface error: {message}")]
    Surface { message: String },

    #[error("Confirmation dialog failed: {message}")]
    Confirmation { message: String },

    #[error("Failed to read {path}: {message}")]
    FileRead { path: PathBuf, message: String },

    #[error("Failed to write {path}: {message}")]
    FileWrite { path: PathBuf, message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    // ─────────────────────────────────────────────────────────────
    // Component Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Component '{component}' failed: {message}")]
    Component { component: String, message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn tab_not_found(id: impl Into<String>) -> Self {
        Self::TabNotFound { id: id.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn corrupt_snapshot(message: impl Into<String>) -> Self {
        Self::CorruptSnapshot {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn surface(message: impl Into<String>) -> Self {
        Self::Surface {
            message: message.into(),
        }
    }

    pub fn confirmation(message: impl Into<String>) -> Self {
        Self::Confirmation {
            message: message.into(),
        }
    }

    pub fn file_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileRead {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::FileWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = Error::TabLimit { max: 50 };
        assert_eq!(err.to_string(), "Maximum 50 tabs allowed");

        let err = Error::storage("disk full");
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_file_errors_include_path() {
        let err = Error::file_read("/notes/a.md", "permission denied");
        assert!(err.to_string().contains("/notes/a.md"));
        assert!(err.to_string().contains("permission denied"));

        let err = Error::file_write("/notes/b.md", "read-only");
        assert!(err.to_string().contains("/notes/b.md"));
    }

    #[test]
    fn test_component_error() {
        let err = Error::component("TabManager", "init failed");
        assert_eq!(err.to_string(), "Component 'TabManager' failed: init failed");
    }
}
