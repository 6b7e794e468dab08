//! Ordered, capacity-bounded collection of open tabs
//!
//! Invariants held after every operation:
//! - tab ids are unique
//! - `active_tab_id`, when set, resolves to exactly one tab and that tab is
//!   the only one with `is_active() == true`
//! - `len() <= max_tabs()`
//! - the most recently activated tab is the last element

use std::collections::HashSet;
use std::path::Path;

use mdviewer_core::prelude::*;
use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentBase};
use crate::event::AppEvent;
use crate::tab::{Tab, TabId, TabOptions, TabSnapshot, UNTITLED_FILE_NAME};

/// Default maximum number of open tabs
pub const MAX_TABS: usize = 50;

/// Persisted form of a [`TabCollection`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSnapshot {
    pub tabs: Vec<TabSnapshot>,
    #[serde(default)]
    pub active_tab_id: Option<TabId>,
    #[serde(default)]
    pub next_id_counter: u64,
}

/// Ordered set of tabs with a single active pointer
#[derive(Debug)]
pub struct TabCollection {
    base: ComponentBase,
    tabs: Vec<Tab>,
    active_tab_id: Option<TabId>,
    next_id: u64,
    max_tabs: usize,
}

impl Default for TabCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl TabCollection {
    pub const NAME: &'static str = "TabCollection";

    pub fn new() -> Self {
        Self::with_max_tabs(MAX_TABS)
    }

    /// Collection with a lower cap. Values outside `1..=MAX_TABS` are clamped.
    pub fn with_max_tabs(max_tabs: usize) -> Self {
        let max_tabs = max_tabs.clamp(1, MAX_TABS);
        Self {
            base: ComponentBase::new(Self::NAME),
            tabs: Vec::new(),
            active_tab_id: None,
            next_id: 1,
            max_tabs,
        }
    }

    pub fn max_tabs(&self) -> usize {
        self.max_tabs
    }

    // ─────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────

    /// Create a tab, append it and make it active
    pub fn create_tab(&mut self, mut options: TabOptions) -> Result<TabId> {
        if self.tabs.len() >= self.max_tabs {
            return Err(Error::TabLimit {
                max: self.max_tabs,
            });
        }

        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| Error::component(Self::NAME, "tab id counter exhausted"))?;
        let id = TabId::from_counter(self.next_id);
        self.next_id = next_id;

        if options.file_name.is_none() {
            options.file_name = Some(self.next_untitled_name());
        }

        self.tabs.push(Tab::new(id.clone(), options));
        self.set_active_tab(&id);

        if let Some(tab) = self.get_tab(&id).cloned() {
            debug!("Created {} ({})", id, tab.file_name());
            self.base.emit(AppEvent::TabCreated { tab });
        }
        Ok(id)
    }

    /// Remove a tab. Returns false if no tab has that id.
    ///
    /// When the active tab is removed, the tab that slid into its slot becomes
    /// active (or the new last tab, if the removed tab was last).
    pub fn remove_tab(&mut self, id: &TabId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        let mut tab = self.tabs.remove(index);
        tab.set_active(false);

        if self.active_tab_id.as_ref() == Some(id) {
            self.active_tab_id = None;
            if !self.tabs.is_empty() {
                let new_index = index.min(self.tabs.len() - 1);
                let next_id = self.tabs[new_index].id().clone();
                self.set_active_tab(&next_id);
            }
        }

        debug!("Removed {} at index {}", id, index);
        self.base.emit(AppEvent::TabRemoved { tab, index });
        true
    }

    /// Activate a tab, moving it to the end of the order
    pub fn set_active_tab(&mut self, id: &TabId) -> bool {
        if self.position(id).is_none() {
            return false;
        }

        if let Some(current) = self.active_tab_id.take() {
            if let Some(tab) = self.get_tab_mut(&current) {
                tab.set_active(false);
            }
        }

        self.move_tab_to_end(id);

        let Some(tab) = self.tabs.last_mut() else {
            return false;
        };
        tab.set_active(true);
        let tab = tab.clone();
        self.active_tab_id = Some(id.clone());

        self.base.emit(AppEvent::TabActivated { tab });
        true
    }

    /// Move a tab to the most-recent position. No-op if already last.
    fn move_tab_to_end(&mut self, id: &TabId) -> bool {
        match self.position(id) {
            Some(index) if index + 1 < self.tabs.len() => {
                let tab = self.tabs.remove(index);
                self.tabs.push(tab);
                true
            }
            _ => false,
        }
    }

    /// Remove every tab unconditionally. Returns the removed tabs.
    pub fn close_all_tabs(&mut self) -> Vec<Tab> {
        let mut closed_tabs = std::mem::take(&mut self.tabs);
        for tab in closed_tabs.iter_mut() {
            tab.set_active(false);
        }
        self.active_tab_id = None;

        debug!("Closed all {} tabs", closed_tabs.len());
        self.base.emit(AppEvent::AllTabsClosed {
            closed_tabs: closed_tabs.clone(),
        });
        closed_tabs
    }

    pub(crate) fn get_tab_mut(&mut self, id: &TabId) -> Option<&mut Tab> {
        self.tabs.iter_mut().find(|tab| tab.id() == id)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_tab(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.id() == id)
    }

    pub fn get_active_tab(&self) -> Option<&Tab> {
        self.active_tab_id.as_ref().and_then(|id| self.get_tab(id))
    }

    pub fn active_tab_id(&self) -> Option<&TabId> {
        self.active_tab_id.as_ref()
    }

    /// Defensive copy of all tabs in order
    pub fn get_all_tabs(&self) -> Vec<Tab> {
        self.tabs.clone()
    }

    /// Borrowing view of all tabs in order
    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn get_dirty_tabs(&self) -> Vec<Tab> {
        self.tabs.iter().filter(|tab| tab.is_dirty()).cloned().collect()
    }

    pub fn find_tab_by_path(&self, path: &Path) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.file_path() == Some(path))
    }

    pub fn position(&self, id: &TabId) -> Option<usize> {
        self.tabs.iter().position(|tab| tab.id() == id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn has_tabs(&self) -> bool {
        !self.tabs.is_empty()
    }

    /// Tab strip titles in order
    pub fn tab_titles(&self) -> Vec<String> {
        self.tabs.iter().map(Tab::title).collect()
    }

    fn next_untitled_name(&self) -> String {
        let taken: HashSet<&str> = self.tabs.iter().map(Tab::file_name).collect();
        if !taken.contains(UNTITLED_FILE_NAME) {
            return UNTITLED_FILE_NAME.to_string();
        }
        (2..)
            .map(|n| format!("untitled-{}.md", n))
            .find(|name| !taken.contains(name.as_str()))
            .unwrap_or_else(|| UNTITLED_FILE_NAME.to_string())
    }

    // ─────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────

    pub fn to_snapshot(&self) -> CollectionSnapshot {
        CollectionSnapshot {
            tabs: self.tabs.iter().map(Tab::to_snapshot).collect(),
            active_tab_id: self.active_tab_id.clone(),
            next_id_counter: self.next_id,
        }
    }

    /// Replace the collection's contents with a snapshot. Emits no events.
    ///
    /// Duplicate ids and id counters with no room left to grow are rejected
    /// as corruption. Snapshots above capacity keep the most recent tabs. An
    /// active id that does not resolve is treated as none.
    pub fn from_snapshot(&mut self, data: CollectionSnapshot) -> Result<()> {
        let mut seen = HashSet::new();
        if let Some(dup) = data.tabs.iter().find(|t| !seen.insert(&t.id)) {
            return Err(Error::corrupt_snapshot(format!(
                "duplicate tab id {}",
                dup.id
            )));
        }

        let mut tabs: Vec<Tab> = data.tabs.into_iter().map(Tab::from_snapshot).collect();
        if tabs.len() > self.max_tabs {
            warn!(
                "Snapshot holds {} tabs, keeping the {} most recent",
                tabs.len(),
                self.max_tabs
            );
            tabs.drain(..tabs.len() - self.max_tabs);
        }

        let highest = tabs.iter().filter_map(|t| t.id().counter()).max().unwrap_or(0);
        let next_id = highest
            .checked_add(1)
            .map(|floor| data.next_id_counter.max(floor))
            .filter(|next| *next < u64::MAX)
            .ok_or_else(|| {
                Error::corrupt_snapshot(format!(
                    "id counter out of range (highest tab-{}, next {})",
                    highest, data.next_id_counter
                ))
            })?;
        self.next_id = next_id;
        self.tabs = tabs;
        self.active_tab_id = None;

        if let Some(active) = data.active_tab_id {
            match self.get_tab_mut(&active) {
                Some(tab) => {
                    tab.set_active(true);
                    self.active_tab_id = Some(active);
                }
                None => warn!("Snapshot active tab {} not found, ignoring", active),
            }
        }

        Ok(())
    }
}

impl Component for TabCollection {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}
