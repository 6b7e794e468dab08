//! Events published on the component bus
//!
//! Every component publishes [`AppEvent`] values under a topic string
//! (`"tab-created"`, `"mode-changed"`, ...). Events bubbled from a child are
//! re-published on the parent under `"<child name>:<topic>"`.

use std::path::PathBuf;

use mdviewer_core::ViewMode;

use crate::tab::{Tab, TabId};

/// Topic names, shared by publishers and subscribers
pub mod topics {
    pub const TAB_CREATED: &str = "tab-created";
    pub const TAB_REMOVED: &str = "tab-removed";
    pub const TAB_ACTIVATED: &str = "tab-activated";
    pub const ALL_TABS_CLOSED: &str = "all-tabs-closed";
    pub const TAB_CONTENT_UPDATED: &str = "tab-content-updated";
    pub const TAB_SAVED: &str = "tab-saved";
    pub const TAB_RESTORED: &str = "tab-restored";
    pub const TAB_VIEW_UPDATED: &str = "tab-view-updated";
    pub const MODE_CHANGED: &str = "mode-changed";
    pub const FILE_OPENED: &str = "file-opened";
    pub const FILE_SAVED: &str = "file-saved";
    pub const FILE_RELOADED: &str = "file-reloaded";
    pub const TAB_LIMIT_WARNING: &str = "tab-limit-warning";
    pub const EXPORTED: &str = "exported";
    pub const INITIALIZED: &str = "initialized";
    pub const UPDATED: &str = "updated";
    pub const DESTROYED: &str = "destroyed";
}

/// Payloads carried on the component bus.
///
/// Tab payloads are snapshots taken at emission time; listeners never hold a
/// reference into the collection.
#[derive(Debug, Clone)]
pub enum AppEvent {
    // ─────────────────────────────────────────────────────────
    // Tab Collection
    // ─────────────────────────────────────────────────────────
    TabCreated { tab: Tab },
    TabRemoved { tab: Tab, index: usize },
    TabActivated { tab: Tab },
    AllTabsClosed { closed_tabs: Vec<Tab> },

    // ─────────────────────────────────────────────────────────
    // Tab Manager
    // ─────────────────────────────────────────────────────────
    TabContentUpdated { tab: Tab },
    TabSaved { tab: Tab },
    /// Emitted once per tab during startup rehydration
    TabRestored { tab: Tab },
    /// Cursor, scroll or editor view-state changed
    TabViewUpdated { tab: Tab },

    // ─────────────────────────────────────────────────────────
    // Controllers
    // ─────────────────────────────────────────────────────────
    ModeChanged { from: ViewMode, to: ViewMode },
    FileOpened { tab_id: TabId, path: PathBuf },
    FileSaved { tab_id: TabId, path: PathBuf },
    FileReloaded { tab_id: TabId },
    TabLimitWarning { count: usize, max: usize },
    Exported { path: PathBuf },

    // ─────────────────────────────────────────────────────────
    // Component Lifecycle
    // ─────────────────────────────────────────────────────────
    Initialized { component: String },
    Updated { component: String },
    Destroyed { component: String },
}

impl AppEvent {
    /// Topic this event is published under
    pub fn name(&self) -> &'static str {
        match self {
            Self::TabCreated { .. } => topics::TAB_CREATED,
            Self::TabRemoved { .. } => topics::TAB_REMOVED,
            Self::TabActivated { .. } => topics::TAB_ACTIVATED,
            Self::AllTabsClosed { .. } => topics::ALL_TABS_CLOSED,
            Self::TabContentUpdated { .. } => topics::TAB_CONTENT_UPDATED,
            Self::TabSaved { .. } => topics::TAB_SAVED,
            Self::TabRestored { .. } => topics::TAB_RESTORED,
            Self::TabViewUpdated { .. } => topics::TAB_VIEW_UPDATED,
            Self::ModeChanged { .. } => topics::MODE_CHANGED,
            Self::FileOpened { .. } => topics::FILE_OPENED,
            Self::FileSaved { .. } => topics::FILE_SAVED,
            Self::FileReloaded { .. } => topics::FILE_RELOADED,
            Self::TabLimitWarning { .. } => topics::TAB_LIMIT_WARNING,
            Self::Exported { .. } => topics::EXPORTED,
            Self::Initialized { .. } => topics::INITIALIZED,
            Self::Updated { .. } => topics::UPDATED,
            Self::Destroyed { .. } => topics::DESTROYED,
        }
    }

    /// The tab carried by this event, if any
    pub fn tab(&self) -> Option<&Tab> {
        match self {
            Self::TabCreated { tab }
            | Self::TabRemoved { tab, .. }
            | Self::TabActivated { tab }
            | Self::TabContentUpdated { tab }
            | Self::TabSaved { tab }
            | Self::TabRestored { tab }
            | Self::TabViewUpdated { tab } => Some(tab),
            _ => None,
        }
    }

    /// Whether this event reflects a change to the tab collection that must
    /// be written to durable storage
    pub fn changes_tabs(&self) -> bool {
        matches!(
            self,
            Self::TabCreated { .. }
                | Self::TabRemoved { .. }
                | Self::TabActivated { .. }
                | Self::AllTabsClosed { .. }
        )
    }
}
