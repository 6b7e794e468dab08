//! Headless mode - JSON event output for scripting and E2E testing
//!
//! The headless runner drives the tab manager from line commands on stdin and
//! reports every state change as structured JSON on stdout, so test scripts
//! never have to scrape a UI.
//!
//! # Event Format
//!
//! Events are output as NDJSON (newline-delimited JSON), one event per line.
//! Each event has an "event" field indicating its type, along with event-specific data.
//!
//! # Example Output
//!
//! ```json
//! {"event":"tab_activated","tab_id":"tab-1","file_name":"untitled.md","timestamp":1704700001000}
//! {"event":"tab_created","tab_id":"tab-1","file_name":"untitled.md","timestamp":1704700001000}
//! {"event":"mode_changed","from":"preview","to":"split","timestamp":1704700002000}
//! ```

pub mod runner;

use chrono::Utc;
use mdviewer_app::{AppEvent, Tab};
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

/// One row of a `list` response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSummary {
    pub tab_id: String,
    pub title: String,
    pub path: Option<String>,
    pub dirty: bool,
    pub active: bool,
}

impl From<&Tab> for TabSummary {
    fn from(tab: &Tab) -> Self {
        Self {
            tab_id: tab.id().to_string(),
            title: tab.title(),
            path: tab.file_path().map(|p| p.display().to_string()),
            dirty: tab.is_dirty(),
            active: tab.is_active(),
        }
    }
}

/// Events emitted in headless mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Startup finished; commands are accepted from here on
    Ready {
        tabs: usize,
        mode: String,
        timestamp: i64,
    },

    TabCreated {
        tab_id: String,
        file_name: String,
        timestamp: i64,
    },

    TabRemoved {
        tab_id: String,
        index: usize,
        timestamp: i64,
    },

    TabActivated {
        tab_id: String,
        file_name: String,
        timestamp: i64,
    },

    AllTabsClosed { count: usize, timestamp: i64 },

    TabContentUpdated {
        tab_id: String,
        dirty: bool,
        timestamp: i64,
    },

    TabSaved {
        tab_id: String,
        path: Option<String>,
        timestamp: i64,
    },

    /// Tab rehydrated from the previous session
    TabRestored {
        tab_id: String,
        file_name: String,
        timestamp: i64,
    },

    ModeChanged {
        from: String,
        to: String,
        timestamp: i64,
    },

    FileOpened {
        tab_id: String,
        path: String,
        timestamp: i64,
    },

    FileSaved {
        tab_id: String,
        path: String,
        timestamp: i64,
    },

    FileReloaded { tab_id: String, timestamp: i64 },

    TabLimitWarning {
        count: usize,
        max: usize,
        timestamp: i64,
    },

    Exported { path: String, timestamp: i64 },

    /// A close was cancelled because unsaved changes were not discarded
    CloseDeclined {
        tab_id: Option<String>,
        timestamp: i64,
    },

    /// Response to the `list` command
    TabList {
        tabs: Vec<TabSummary>,
        active: Option<String>,
        timestamp: i64,
    },

    /// A command failed; the session keeps running
    Error { message: String, timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // Write to stdout with newline (NDJSON format)
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Translate a bus event. Lifecycle and view-only events have no headless
    /// counterpart.
    pub fn from_app_event(event: &AppEvent) -> Option<Self> {
        let timestamp = Self::now();
        let converted = match event {
            AppEvent::TabCreated { tab } => Self::TabCreated {
                tab_id: tab.id().to_string(),
                file_name: tab.file_name().to_string(),
                timestamp,
            },
            AppEvent::TabRemoved { tab, index } => Self::TabRemoved {
                tab_id: tab.id().to_string(),
                index: *index,
                timestamp,
            },
            AppEvent::TabActivated { tab } => Self::TabActivated {
                tab_id: tab.id().to_string(),
                file_name: tab.file_name().to_string(),
                timestamp,
            },
            AppEvent::AllTabsClosed { closed_tabs } => Self::AllTabsClosed {
                count: closed_tabs.len(),
                timestamp,
            },
            AppEvent::TabContentUpdated { tab } => Self::TabContentUpdated {
                tab_id: tab.id().to_string(),
                dirty: tab.is_dirty(),
                timestamp,
            },
            AppEvent::TabSaved { tab } => Self::TabSaved {
                tab_id: tab.id().to_string(),
                path: tab.file_path().map(|p| p.display().to_string()),
                timestamp,
            },
            AppEvent::TabRestored { tab } => Self::TabRestored {
                tab_id: tab.id().to_string(),
                file_name: tab.file_name().to_string(),
                timestamp,
            },
            AppEvent::ModeChanged { from, to } => Self::ModeChanged {
                from: from.to_string(),
                to: to.to_string(),
                timestamp,
            },
            AppEvent::FileOpened { tab_id, path } => Self::FileOpened {
                tab_id: tab_id.to_string(),
                path: path.display().to_string(),
                timestamp,
            },
            AppEvent::FileSaved { tab_id, path } => Self::FileSaved {
                tab_id: tab_id.to_string(),
                path: path.display().to_string(),
                timestamp,
            },
            AppEvent::FileReloaded { tab_id } => Self::FileReloaded {
                tab_id: tab_id.to_string(),
                timestamp,
            },
            AppEvent::TabLimitWarning { count, max } => Self::TabLimitWarning {
                count: *count,
                max: *max,
                timestamp,
            },
            AppEvent::Exported { path } => Self::Exported {
                path: path.display().to_string(),
                timestamp,
            },
            AppEvent::TabViewUpdated { .. }
            | AppEvent::Initialized { .. }
            | AppEvent::Updated { .. }
            | AppEvent::Destroyed { .. } => return None,
        };
        Some(converted)
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn ready(tabs: usize, mode: impl Into<String>) -> Self {
        Self::Ready {
            tabs,
            mode: mode.into(),
            timestamp: Self::now(),
        }
    }

    pub fn close_declined(tab_id: Option<String>) -> Self {
        Self::CloseDeclined {
            tab_id,
            timestamp: Self::now(),
        }
    }

    pub fn tab_list(tabs: &[Tab]) -> Self {
        let summaries: Vec<TabSummary> = tabs.iter().map(TabSummary::from).collect();
        let active = summaries
            .iter()
            .find(|s| s.active)
            .map(|s| s.tab_id.clone());
        Self::TabList {
            tabs: summaries,
            active,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Self::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdviewer_app::{MemoryStore, TabManager};

    fn to_json(event: &HeadlessEvent) -> serde_json::Value {
        serde_json::to_value(event).unwrap()
    }

    #[test]
    fn test_ready_serialization() {
        let json = to_json(&HeadlessEvent::ready(2, "preview"));
        assert_eq!(json["event"], "ready");
        assert_eq!(json["tabs"], 2);
        assert_eq!(json["mode"], "preview");
        assert!(json["timestamp"].is_i64());
    }

    #[test]
    fn test_error_serialization() {
        let json = to_json(&HeadlessEvent::error("boom"));
        assert_eq!(json["event"], "error");
        assert_eq!(json["message"], "boom");
    }

    #[test]
    fn test_from_app_event() {
        let mut tabs = TabManager::new(MemoryStore::new());
        let id = tabs.open_file_in_tab("/x/a.md", "a").unwrap();
        let tab = tabs.get_tab(&id).unwrap().clone();

        let event = HeadlessEvent::from_app_event(&AppEvent::TabCreated { tab: tab.clone() })
            .unwrap();
        let json = to_json(&event);
        assert_eq!(json["event"], "tab_created");
        assert_eq!(json["tab_id"], "tab-1");
        assert_eq!(json["file_name"], "a.md");

        assert!(HeadlessEvent::from_app_event(&AppEvent::TabViewUpdated { tab }).is_none());
    }

    #[test]
    fn test_tab_list_marks_active() {
        let mut tabs = TabManager::new(MemoryStore::new());
        tabs.create_new_tab("a").unwrap();
        let b = tabs.open_file_in_tab("/x/b.md", "b").unwrap();

        let json = to_json(&HeadlessEvent::tab_list(&tabs.get_all_tabs()));

        assert_eq!(json["event"], "tab_list");
        assert_eq!(json["active"], b.as_str());
        assert_eq!(json["tabs"][1]["path"], "/x/b.md");
        assert_eq!(json["tabs"][0]["path"], serde_json::Value::Null);
    }
}
