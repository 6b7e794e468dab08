//! Per-document tab state
//!
//! A [`Tab`] holds everything belonging to one open document: identity,
//! buffer, dirty flag, cursor/scroll positions and the opaque view-state of
//! the editor surface. Tabs are created and owned by the
//! [`TabCollection`](crate::tab_collection::TabCollection); outside code only
//! mutates them through the setters below.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SubsecRound, Utc};
use mdviewer_core::{CursorPosition, ScrollPosition};
use serde::{Deserialize, Deserializer, Serialize};

/// Display name used for documents that were never saved to disk
pub const UNTITLED_FILE_NAME: &str = "untitled.md";

/// Unique identifier for a tab (`tab-<n>`), never reused within a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub(crate) fn from_counter(n: u64) -> Self {
        Self(format!("tab-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric counter encoded in the id, if it follows the `tab-<n>` form
    pub fn counter(&self) -> Option<u64> {
        self.0.strip_prefix("tab-")?.parse().ok()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Options for creating a tab
#[derive(Debug, Clone, Default)]
pub struct TabOptions {
    /// Display name; `None` lets the collection generate an untitled name
    pub file_name: Option<String>,
    pub file_path: Option<PathBuf>,
    pub content: String,
}

impl TabOptions {
    /// An unsaved document with the given content
    pub fn untitled(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// A document loaded from `path`
    pub fn for_file(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            file_name: Some(file_name_from_path(&path)),
            file_path: Some(path),
            content: content.into(),
        }
    }
}

/// Extract the display name from a path, accepting both separator styles
pub fn file_name_from_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    raw.rsplit(|c| c == '/' || c == '\\')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(UNTITLED_FILE_NAME)
        .to_string()
}

fn now() -> DateTime<Utc> {
    // Snapshots store milliseconds; keep in-memory values at the same precision.
    Utc::now().trunc_subsecs(3)
}

/// State of one open document
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    id: TabId,
    file_name: String,
    file_path: Option<PathBuf>,
    content: String,
    is_dirty: bool,
    is_active: bool,
    cursor_position: CursorPosition,
    scroll_position: ScrollPosition,
    editor_view_state: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    loading: bool,
}

impl Tab {
    pub(crate) fn new(id: TabId, options: TabOptions) -> Self {
        let created = now();
        Self {
            id,
            file_name: options
                .file_name
                .unwrap_or_else(|| UNTITLED_FILE_NAME.to_string()),
            file_path: options.file_path,
            content: options.content,
            is_dirty: false,
            is_active: false,
            cursor_position: CursorPosition::default(),
            scroll_position: ScrollPosition::default(),
            editor_view_state: None,
            created_at: created,
            last_modified: created,
            loading: false,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────

    pub fn id(&self) -> &TabId {
        &self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// True while content is being replaced programmatically
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn cursor_position(&self) -> CursorPosition {
        self.cursor_position
    }

    pub fn scroll_position(&self) -> ScrollPosition {
        self.scroll_position
    }

    pub fn editor_view_state(&self) -> Option<&serde_json::Value> {
        self.editor_view_state.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    pub fn display_name(&self) -> &str {
        &self.file_name
    }

    /// Tab strip title with a ` *` marker for unsaved changes
    pub fn title(&self) -> String {
        if self.is_dirty {
            format!("{} *", self.file_name)
        } else {
            self.file_name.clone()
        }
    }

    // ─────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────

    /// Replace the buffer. Returns false (and changes nothing) if `content`
    /// equals the current buffer.
    pub fn set_content(&mut self, content: &str) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content.to_string();
        if !self.loading {
            self.is_dirty = true;
        }
        self.last_modified = now();
        true
    }

    /// Replace the buffer programmatically (open, reload). Leaves the tab clean.
    pub fn load_content(&mut self, content: &str) {
        self.loading = true;
        self.set_content(content);
        self.is_dirty = false;
        self.loading = false;
    }

    /// Clear the dirty flag, optionally adopting a new on-disk location
    pub fn mark_saved(&mut self, path: Option<&Path>) {
        self.is_dirty = false;
        if let Some(path) = path {
            self.file_name = file_name_from_path(path);
            self.file_path = Some(path.to_path_buf());
        }
        self.last_modified = now();
    }

    pub fn set_cursor_position(&mut self, line: u32, col: u32) {
        self.cursor_position = CursorPosition { line, col };
    }

    /// Partial update; `None` leaves the corresponding offset untouched
    pub fn set_scroll_position(&mut self, editor: Option<f64>, preview: Option<f64>) {
        if let Some(editor) = editor {
            self.scroll_position.editor = editor;
        }
        if let Some(preview) = preview {
            self.scroll_position.preview = preview;
        }
    }

    /// Store the editor surface's view-state verbatim
    pub fn set_editor_view_state(&mut self, view_state: serde_json::Value) {
        self.editor_view_state = if view_state.is_null() {
            None
        } else {
            Some(view_state)
        };
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    // ─────────────────────────────────────────────────────────
    // Serialization
    // ─────────────────────────────────────────────────────────

    pub fn to_snapshot(&self) -> TabSnapshot {
        TabSnapshot {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            file_path: self.file_path.clone(),
            content: self.content.clone(),
            is_dirty: self.is_dirty,
            cursor_position: self.cursor_position,
            scroll_position: self.scroll_position,
            editor_view_state: self.editor_view_state.clone(),
            created_at: self.created_at,
            last_modified: self.last_modified,
        }
    }

    /// Rebuild a tab from its persisted form. The tab starts inactive; the
    /// owning collection decides which tab is active.
    pub fn from_snapshot(data: TabSnapshot) -> Self {
        Self {
            id: data.id,
            file_name: data.file_name,
            file_path: data.file_path,
            content: data.content,
            is_dirty: data.is_dirty,
            is_active: false,
            cursor_position: data.cursor_position,
            scroll_position: data.scroll_position,
            editor_view_state: data.editor_view_state.filter(|v| !v.is_null()),
            created_at: data.created_at,
            last_modified: data.last_modified,
            loading: false,
        }
    }
}

/// Millisecond timestamp, with `null` read as the current time
fn millis_or_now<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = chrono::serde::ts_milliseconds_option::deserialize(deserializer)?;
    Ok(millis.unwrap_or_else(now))
}

fn default_file_name() -> String {
    UNTITLED_FILE_NAME.to_string()
}

/// Persisted form of a [`Tab`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub id: TabId,
    #[serde(default = "default_file_name")]
    pub file_name: String,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_dirty: bool,
    #[serde(default)]
    pub cursor_position: CursorPosition,
    #[serde(default)]
    pub scroll_position: ScrollPosition,
    #[serde(default)]
    pub editor_view_state: Option<serde_json::Value>,
    #[serde(
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "millis_or_now",
        default = "now"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        serialize_with = "chrono::serde::ts_milliseconds::serialize",
        deserialize_with = "millis_or_now",
        default = "now"
    )]
    pub last_modified: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tab(content: &str) -> Tab {
        Tab::new(TabId::from_counter(1), TabOptions::untitled(content))
    }

    #[test]
    fn test_new_tab_defaults() {
        let t = tab("hello");
        assert_eq!(t.id().as_str(), "tab-1");
        assert_eq!(t.file_name(), UNTITLED_FILE_NAME);
        assert!(t.file_path().is_none());
        assert!(!t.is_dirty());
        assert!(!t.is_active());
        assert_eq!(t.cursor_position(), CursorPosition { line: 1, col: 1 });
        assert_eq!(t.scroll_position(), ScrollPosition::default());
        assert!(t.editor_view_state().is_none());
    }

    #[test]
    fn test_set_content_marks_dirty_once() {
        let mut t = tab("a");

        assert!(t.set_content("b"));
        assert!(t.is_dirty());
        let modified = t.last_modified();

        // Same content again is a no-op
        assert!(!t.set_content("b"));
        assert_eq!(t.last_modified(), modified);
        assert_eq!(t.content(), "b");
    }

    #[test]
    fn test_set_same_content_does_not_dirty() {
        let mut t = tab("same");
        assert!(!t.set_content("same"));
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_load_content_stays_clean() {
        let mut t = tab("old");
        t.load_content("new from disk");
        assert_eq!(t.content(), "new from disk");
        assert!(!t.is_dirty());
        assert!(!t.is_loading());

        t.set_content("edited");
        t.load_content("reloaded");
        assert!(!t.is_dirty());
    }

    #[test]
    fn test_mark_saved_with_path() {
        let mut t = tab("x");
        t.set_content("y");
        t.mark_saved(Some(Path::new("/notes/todo.md")));

        assert!(!t.is_dirty());
        assert_eq!(t.file_name(), "todo.md");
        assert_eq!(t.file_path(), Some(Path::new("/notes/todo.md")));
    }

    #[test]
    fn test_mark_saved_without_path_keeps_identity() {
        let mut t = Tab::new(
            TabId::from_counter(2),
            TabOptions::for_file("/a/b.md", "body"),
        );
        t.set_content("changed");
        t.mark_saved(None);
        assert!(!t.is_dirty());
        assert_eq!(t.file_name(), "b.md");
    }

    #[test]
    fn test_title_has_dirty_marker() {
        let mut t = tab("x");
        assert_eq!(t.title(), "untitled.md");
        t.set_content("y");
        assert_eq!(t.title(), "untitled.md *");
    }

    #[test]
    fn test_partial_scroll_update() {
        let mut t = tab("");
        t.set_scroll_position(Some(40.0), None);
        t.set_scroll_position(None, Some(12.0));
        assert_eq!(t.scroll_position().editor, 40.0);
        assert_eq!(t.scroll_position().preview, 12.0);
    }

    #[test]
    fn test_null_view_state_is_cleared() {
        let mut t = tab("");
        t.set_editor_view_state(json!({"cursorState": [1, 2]}));
        assert!(t.editor_view_state().is_some());
        t.set_editor_view_state(serde_json::Value::Null);
        assert!(t.editor_view_state().is_none());
    }

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(file_name_from_path(Path::new("/x/a.md")), "a.md");
        assert_eq!(file_name_from_path(Path::new("C:\\docs\\b.md")), "b.md");
        assert_eq!(file_name_from_path(Path::new("/x/dir/")), UNTITLED_FILE_NAME);
        assert_eq!(file_name_from_path(Path::new("plain.md")), "plain.md");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut t = Tab::new(
            TabId::from_counter(7),
            TabOptions::for_file("/x/a.md", "# Title"),
        );
        t.set_content("# Title\n\nbody");
        t.set_cursor_position(3, 5);
        t.set_scroll_position(Some(10.0), Some(20.0));
        t.set_editor_view_state(json!({"folds": [[1, 4]], "scrollTop": 10}));

        let json = serde_json::to_string(&t.to_snapshot()).unwrap();
        let restored = Tab::from_snapshot(serde_json::from_str(&json).unwrap());

        assert_eq!(restored, t);
    }

    #[test]
    fn test_snapshot_wire_format() {
        let t = Tab::new(TabId::from_counter(3), TabOptions::for_file("/x/a.md", "c"));
        let value = serde_json::to_value(t.to_snapshot()).unwrap();

        assert_eq!(value["id"], "tab-3");
        assert_eq!(value["fileName"], "a.md");
        assert_eq!(value["filePath"], "/x/a.md");
        assert_eq!(value["isDirty"], false);
        assert_eq!(value["cursorPosition"], json!({"line": 1, "col": 1}));
        assert_eq!(value["scrollPosition"], json!({"editor": 0.0, "preview": 0.0}));
        assert!(value["editorViewState"].is_null());
        assert!(value["createdAt"].is_i64());
        assert!(value.get("isActive").is_none());
    }

    #[test]
    fn test_snapshot_tolerates_missing_fields() {
        let snap: TabSnapshot = serde_json::from_str(r#"{"id": "tab-9"}"#).unwrap();
        let t = Tab::from_snapshot(snap);
        assert_eq!(t.id().counter(), Some(9));
        assert_eq!(t.file_name(), UNTITLED_FILE_NAME);
        assert_eq!(t.content(), "");
    }

    #[test]
    fn test_snapshot_null_timestamps_default_to_now() {
        let before = Utc::now().trunc_subsecs(3);
        let snap: TabSnapshot = serde_json::from_str(
            r#"{"id": "tab-2", "createdAt": null, "lastModified": 1704700001000}"#,
        )
        .unwrap();

        assert!(snap.created_at >= before);
        assert_eq!(snap.last_modified.timestamp_millis(), 1704700001000);
    }
}
