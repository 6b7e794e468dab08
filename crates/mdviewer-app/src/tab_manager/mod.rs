//! Tab Manager: orchestration and persistence on top of the tab collection
//!
//! The manager owns the [`TabCollection`] and is the only code that mutates
//! it. Every collection event is re-emitted on the manager's own bus and then
//! written through to the [`KeyValueStore`] under [`TABS_KEY`]. The in-memory
//! collection stays authoritative; a failed write is logged and the session
//! carries on.

use std::path::{Path, PathBuf};

use mdviewer_core::prelude::*;
use serde_json::Value;

use crate::component::{BubbledEvent, Component, ComponentBase};
use crate::event::AppEvent;
use crate::services::Confirmer;
use crate::storage::{KeyValueStore, TABS_KEY};
use crate::tab::{Tab, TabId, TabOptions};
use crate::tab_collection::{CollectionSnapshot, TabCollection, MAX_TABS};


/// Number of tabs reachable through index shortcuts
pub const INDEX_SHORTCUT_TABS: usize = 5;

const UNSAVED_TITLE: &str = "Unsaved Changes";

/// Result of a close request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The user declined to discard unsaved changes
    Declined,
    NotFound,
}

impl CloseOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, CloseOutcome::Closed)
    }
}

/// Owns the open tabs and keeps durable storage in sync with them
pub struct TabManager {
    base: ComponentBase,
    collection: TabCollection,
    store: Box<dyn KeyValueStore>,
    restore_on_init: bool,
}

impl std::fmt::Debug for TabManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TabManager")
            .field("base", &self.base)
            .field("collection", &self.collection)
            .field("restore_on_init", &self.restore_on_init)
            .finish()
    }
}

impl TabManager {
    pub const NAME: &'static str = "TabManager";

    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self::with_max_tabs(store, MAX_TABS)
    }

    pub fn with_max_tabs(store: impl KeyValueStore + 'static, max_tabs: usize) -> Self {
        let mut base = ComponentBase::new(Self::NAME);
        let mut collection = TabCollection::with_max_tabs(max_tabs);
        base.adopt(collection.base_mut());
        Self {
            base,
            collection,
            store: Box::new(store),
            restore_on_init: true,
        }
    }

    /// Whether `init()` rehydrates the persisted session
    pub fn restore_session(mut self, restore: bool) -> Self {
        self.restore_on_init = restore;
        self
    }

    // ─────────────────────────────────────────────────────────
    // Tab lifecycle
    // ─────────────────────────────────────────────────────────

    /// Open a new untitled tab with `content`
    pub fn create_new_tab(&mut self, content: impl Into<String>) -> Result<TabId> {
        let result = self.collection.create_tab(TabOptions::untitled(content));
        self.pump();
        let id = result?;
        info!("Created new tab {}", id);
        Ok(id)
    }

    /// Open `path` in a tab. If a tab already shows that path it is activated
    /// instead and `content` is ignored.
    pub fn open_file_in_tab(
        &mut self,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
    ) -> Result<TabId> {
        let path = path.into();
        if let Some(existing) = self.collection.find_tab_by_path(&path) {
            let id = existing.id().clone();
            debug!("{:?} already open in {}, activating", path, id);
            self.collection.set_active_tab(&id);
            self.pump();
            return Ok(id);
        }

        let result = self
            .collection
            .create_tab(TabOptions::for_file(path.clone(), content));
        self.pump();
        let id = result?;
        info!("Opened {:?} in {}", path, id);
        Ok(id)
    }

    /// Close a tab, asking `confirmer` first when it has unsaved changes
    pub async fn close_tab<C: Confirmer>(
        &mut self,
        id: &TabId,
        confirmer: &C,
    ) -> Result<CloseOutcome> {
        let Some(tab) = self.collection.get_tab(id) else {
            return Ok(CloseOutcome::NotFound);
        };

        if tab.is_dirty() {
            let message = format!(
                "Close \"{}\" without saving changes?",
                tab.display_name()
            );
            if !confirmer.confirm(UNSAVED_TITLE, &message).await? {
                debug!("Close of {} declined", id);
                return Ok(CloseOutcome::Declined);
            }
        }

        let removed = self.collection.remove_tab(id);
        self.pump();
        Ok(if removed {
            CloseOutcome::Closed
        } else {
            CloseOutcome::NotFound
        })
    }

    /// Close every tab. A single confirmation covers all dirty tabs; declining
    /// it leaves every tab open.
    pub async fn close_all_tabs<C: Confirmer>(&mut self, confirmer: &C) -> Result<CloseOutcome> {
        let dirty = self.collection.get_dirty_tabs();
        if !dirty.is_empty() {
            let names: Vec<&str> = dirty.iter().map(Tab::display_name).collect();
            let message = format!(
                "Close {} unsaved file(s) ({}) without saving?",
                dirty.len(),
                names.join(", ")
            );
            if !confirmer.confirm(UNSAVED_TITLE, &message).await? {
                debug!("Close all declined ({} dirty)", dirty.len());
                return Ok(CloseOutcome::Declined);
            }
        }

        let closed = self.collection.close_all_tabs();
        self.pump();
        info!("Closed {} tabs", closed.len());
        Ok(CloseOutcome::Closed)
    }

    // ─────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────

    pub fn switch_to_tab(&mut self, id: &TabId) -> bool {
        let switched = self.collection.set_active_tab(id);
        self.pump();
        switched
    }

    /// Activate the tab after the active one in the current order (wraps)
    pub fn switch_to_next_tab(&mut self) -> bool {
        self.switch_relative(1)
    }

    /// Activate the tab before the active one in the current order (wraps)
    pub fn switch_to_previous_tab(&mut self) -> bool {
        self.switch_relative(-1)
    }

    fn switch_relative(&mut self, step: isize) -> bool {
        let len = self.collection.len();
        if len < 2 {
            return false;
        }
        let current = self
            .collection
            .active_tab_id()
            .and_then(|id| self.collection.position(id))
            .unwrap_or(len - 1);
        let target = (current as isize + step).rem_euclid(len as isize) as usize;
        let id = self.collection.tabs()[target].id().clone();
        self.switch_to_tab(&id)
    }

    /// Activate the `n`th tab (1-based) in the current order. Only the first
    /// [`INDEX_SHORTCUT_TABS`] tabs are addressable.
    pub fn switch_to_tab_index(&mut self, n: usize) -> bool {
        if n == 0 || n > INDEX_SHORTCUT_TABS {
            return false;
        }
        match self.collection.tabs().get(n - 1) {
            Some(tab) => {
                let id = tab.id().clone();
                self.switch_to_tab(&id)
            }
            None => false,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Per-tab forwarders
    // ─────────────────────────────────────────────────────────

    /// Replace a tab's buffer from user editing. Returns false if the tab does
    /// not exist. Identical content changes nothing and emits nothing.
    pub fn update_tab_content(&mut self, id: &TabId, content: &str) -> bool {
        let Some(tab) = self.collection.get_tab_mut(id) else {
            return false;
        };
        if tab.set_content(content) {
            let tab = tab.clone();
            self.publish(AppEvent::TabContentUpdated { tab });
        }
        true
    }

    /// Replace a tab's buffer from disk, leaving it clean
    pub fn reload_tab_content(&mut self, id: &TabId, content: &str) -> bool {
        let Some(tab) = self.collection.get_tab_mut(id) else {
            return false;
        };
        tab.load_content(content);
        let tab = tab.clone();
        self.publish(AppEvent::TabContentUpdated { tab });
        true
    }

    /// Clear the dirty flag, adopting `path` as the tab's location if given
    pub fn mark_tab_saved(&mut self, id: &TabId, path: Option<&Path>) -> bool {
        let Some(tab) = self.collection.get_tab_mut(id) else {
            return false;
        };
        tab.mark_saved(path);
        let tab = tab.clone();
        self.publish(AppEvent::TabSaved { tab });
        true
    }

    /// Record the cursor. Line and column are 1-based.
    pub fn update_tab_cursor(&mut self, id: &TabId, line: u32, col: u32) -> bool {
        if line == 0 || col == 0 {
            debug!("Rejected cursor {}:{} for {}", line, col, id);
            return false;
        }
        let Some(tab) = self.collection.get_tab_mut(id) else {
            return false;
        };
        tab.set_cursor_position(line, col);
        let tab = tab.clone();
        self.publish(AppEvent::TabViewUpdated { tab });
        true
    }

    /// Store the editor surface's opaque view-state
    pub fn save_tab_editor_state(&mut self, id: &TabId, view_state: Value) -> bool {
        let Some(tab) = self.collection.get_tab_mut(id) else {
            return false;
        };
        tab.set_editor_view_state(view_state);
        let tab = tab.clone();
        self.publish(AppEvent::TabViewUpdated { tab });
        true
    }

    /// Record scroll offsets. `None` leaves an offset unchanged; negative or
    /// non-finite offsets are rejected.
    pub fn update_tab_scroll(
        &mut self,
        id: &TabId,
        editor: Option<f64>,
        preview: Option<f64>,
    ) -> bool {
        let valid = |offset: Option<f64>| offset.map_or(true, |v| v.is_finite() && v >= 0.0);
        if !valid(editor) || !valid(preview) {
            debug!("Rejected scroll {:?}/{:?} for {}", editor, preview, id);
            return false;
        }
        let Some(tab) = self.collection.get_tab_mut(id) else {
            return false;
        };
        tab.set_scroll_position(editor, preview);
        let tab = tab.clone();
        self.publish(AppEvent::TabViewUpdated { tab });
        true
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_active_tab(&self) -> Option<&Tab> {
        self.collection.get_active_tab()
    }

    pub fn get_tab(&self, id: &TabId) -> Option<&Tab> {
        self.collection.get_tab(id)
    }

    pub fn get_all_tabs(&self) -> Vec<Tab> {
        self.collection.get_all_tabs()
    }

    pub fn get_dirty_tabs(&self) -> Vec<Tab> {
        self.collection.get_dirty_tabs()
    }

    pub fn get_tabs_count(&self) -> usize {
        self.collection.len()
    }

    pub fn has_tabs(&self) -> bool {
        self.collection.has_tabs()
    }

    pub fn max_tabs(&self) -> usize {
        self.collection.max_tabs()
    }

    pub fn find_tab_by_path(&self, path: &Path) -> Option<&Tab> {
        self.collection.find_tab_by_path(path)
    }

    pub fn tab_titles(&self) -> Vec<String> {
        self.collection.tab_titles()
    }

    pub fn collection(&self) -> &TabCollection {
        &self.collection
    }

    // ─────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────

    /// Write the full collection snapshot to the store
    pub fn persist(&self) -> Result<()> {
        let json = serde_json::to_string(&self.collection.to_snapshot())?;
        self.store.set(TABS_KEY, &json)
    }

    /// Rehydrate the collection from the store.
    ///
    /// Corrupt data is discarded (the key is removed) and the collection starts
    /// empty; only store read failures are returned as errors.
    pub fn load(&mut self) -> Result<()> {
        let Some(raw) = self.store.get(TABS_KEY)? else {
            debug!("No persisted tabs");
            return Ok(());
        };

        let restored = serde_json::from_str::<CollectionSnapshot>(&raw)
            .map_err(Error::from)
            .and_then(|snapshot| self.collection.from_snapshot(snapshot));

        if let Err(e) = restored {
            warn!("Discarding corrupt tab snapshot: {}", e);
            if let Err(e) = self.store.remove(TABS_KEY) {
                warn!("Failed to clear corrupt tab snapshot: {}", e);
            }
            return Ok(());
        }

        for tab in self.collection.get_all_tabs() {
            self.base.emit(AppEvent::TabRestored { tab });
        }

        if self.collection.active_tab_id().is_none() {
            if let Some(last) = self.collection.tabs().last() {
                let id = last.id().clone();
                self.collection.set_active_tab(&id);
            }
        } else if let Some(tab) = self.collection.get_active_tab().cloned() {
            self.base.emit(AppEvent::TabActivated { tab });
        }
        self.pump();

        info!("Restored {} tabs", self.collection.len());
        Ok(())
    }

    /// Remove the persisted snapshot without touching open tabs
    pub fn clear_persisted(&self) -> Result<()> {
        self.store.remove(TABS_KEY)
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist tabs: {}", e);
        }
    }

    /// Emit a manager-level event and write the new state through
    fn publish(&mut self, event: AppEvent) {
        self.base.emit(event);
        self.persist_or_warn();
    }

    /// Re-emit bubbled collection events, persisting after each one's
    /// listeners have run
    fn pump(&mut self) {
        for BubbledEvent { event, .. } in self.base.drain_bubbled() {
            let persist = event.changes_tabs();
            self.base.emit(event);
            if persist {
                self.persist_or_warn();
            }
        }
    }
}

impl Component for TabManager {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    async fn on_init(&mut self) -> Result<()> {
        if self.restore_on_init {
            self.load()?;
        }
        Ok(())
    }

    fn on_destroy(&mut self) -> Result<()> {
        self.persist()
    }

    fn destroy_children(&mut self) {
        self.collection.destroy();
        self.base.drain_bubbled();
    }
}
