//! Configuration types for the markdown viewer
//!
//! Defines:
//! - `Settings` - Global application settings
//! - `TabSettings`, `EditorSettings`, `StorageSettings` - sections of `config.toml`

use std::path::PathBuf;

use mdviewer_core::ViewMode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tab_collection::MAX_TABS;

/// Global settings from `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub tabs: TabSettings,

    #[serde(default)]
    pub editor: EditorSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// Tab limits and session restore
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TabSettings {
    /// Hard cap on open tabs
    #[serde(default = "default_max_tabs")]
    pub max_tabs: usize,

    /// Open-tab count at which the user is warned
    #[serde(default = "default_warn_threshold")]
    pub warn_threshold: usize,

    /// Reopen the previous session's tabs on startup
    #[serde(default = "default_true")]
    pub restore_session: bool,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self {
            max_tabs: default_max_tabs(),
            warn_threshold: default_warn_threshold(),
            restore_session: true,
        }
    }
}

impl TabSettings {
    /// Configured cap, kept within `1..=MAX_TABS`
    pub fn effective_max_tabs(&self) -> usize {
        let clamped = self.max_tabs.clamp(1, MAX_TABS);
        if clamped != self.max_tabs {
            warn!(
                "tabs.max_tabs = {} is outside 1..={}, using {}",
                self.max_tabs, MAX_TABS, clamped
            );
        }
        clamped
    }

    /// Warning threshold clamped to the tab cap
    pub fn effective_warn_threshold(&self) -> usize {
        self.warn_threshold.min(self.max_tabs.clamp(1, MAX_TABS))
    }
}

/// Editor defaults
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EditorSettings {
    /// Layout used at startup
    #[serde(default)]
    pub default_mode: ViewMode,

    /// Content of documents created with "new file"
    #[serde(default = "default_template")]
    pub new_document_template: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_mode: ViewMode::default(),
            new_document_template: default_template(),
        }
    }
}

/// Where session state is kept
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// State directory; empty means the platform data directory
    #[serde(default)]
    pub state_dir: PathBuf,
}

fn default_max_tabs() -> usize {
    MAX_TABS
}

fn default_warn_threshold() -> usize {
    45
}

fn default_template() -> String {
    "# New Document\n\nStart writing your markdown here...".to_string()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.tabs.max_tabs, 50);
        assert_eq!(settings.tabs.warn_threshold, 45);
        assert!(settings.tabs.restore_session);
        assert_eq!(settings.editor.default_mode, ViewMode::Preview);
        assert!(settings.editor.new_document_template.starts_with("# New Document"));
        assert_eq!(settings.storage.state_dir, PathBuf::new());
    }

    #[test]
    fn test_partial_toml() {
        let settings: Settings = toml::from_str(
            r#"
            [tabs]
            max_tabs = 10

            [editor]
            default_mode = "split"
            "#,
        )
        .unwrap();

        assert_eq!(settings.tabs.max_tabs, 10);
        assert_eq!(settings.tabs.warn_threshold, 45);
        assert_eq!(settings.tabs.effective_warn_threshold(), 10);
        assert_eq!(settings.editor.default_mode, ViewMode::Split);
    }

    #[test]
    fn test_max_tabs_clamped_to_hard_limit() {
        let settings: Settings = toml::from_str("[tabs]\nmax_tabs = 60\n").unwrap();
        assert_eq!(settings.tabs.effective_max_tabs(), MAX_TABS);
        assert_eq!(settings.tabs.effective_warn_threshold(), 45);

        let settings: Settings = toml::from_str("[tabs]\nmax_tabs = 0\n").unwrap();
        assert_eq!(settings.tabs.effective_max_tabs(), 1);
        assert_eq!(settings.tabs.effective_warn_threshold(), 1);
    }
}
