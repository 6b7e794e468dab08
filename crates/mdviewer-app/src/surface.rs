//! Editor surface and preview pane ports
//!
//! The rich editor is heavyweight, so it is provisioned lazily through a
//! [`SurfaceLoader`]. When provisioning fails the mode controller falls back
//! to a [`PlainTextSurface`], which edits text but keeps no view-state.

use mdviewer_core::prelude::*;
use serde_json::{json, Value};

/// Which editor implementation is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Full editor with view-state support
    Full,
    /// Degraded plain-text editing
    Fallback,
}

/// Text-editing surface shown in code and split modes
#[cfg_attr(test, mockall::automock)]
pub trait EditorSurface: Send {
    fn kind(&self) -> SurfaceKind;

    fn set_value(&mut self, content: &str);

    fn value(&self) -> String;

    /// Opaque view-state (scroll, folds, selection), if the surface has any
    fn save_view_state(&self) -> Option<Value>;

    fn restore_view_state(&mut self, view_state: &Value);

    /// Recompute layout after the container changed size or visibility
    fn layout(&mut self, visible: bool);
}

/// Rendered preview shown in preview and split modes
#[cfg_attr(test, mockall::automock)]
pub trait PreviewPane: Send {
    fn show(&mut self, markdown: &str);

    fn scroll_offset(&self) -> f64;

    fn set_scroll_offset(&mut self, offset: f64);

    fn set_visible(&mut self, visible: bool);
}

/// Provisions the full editor surface
#[trait_variant::make(SurfaceLoader: Send)]
pub trait LocalSurfaceLoader {
    async fn load(&self) -> Result<Box<dyn EditorSurface>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory implementations
// ─────────────────────────────────────────────────────────────────────────────

/// Full surface backed by a string buffer. View-state records the first
/// visible line and the cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferSurface {
    buffer: String,
    top_line: u64,
    cursor: (u64, u64),
    visible: bool,
}

impl BufferSurface {
    pub fn new() -> Self {
        Self {
            cursor: (1, 1),
            ..Default::default()
        }
    }

    pub fn scroll_to_line(&mut self, line: u64) {
        self.top_line = line;
    }

    pub fn set_cursor(&mut self, line: u64, col: u64) {
        self.cursor = (line, col);
    }

    pub fn top_line(&self) -> u64 {
        self.top_line
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl EditorSurface for BufferSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Full
    }

    fn set_value(&mut self, content: &str) {
        self.buffer = content.to_string();
    }

    fn value(&self) -> String {
        self.buffer.clone()
    }

    fn save_view_state(&self) -> Option<Value> {
        Some(json!({
            "topLine": self.top_line,
            "cursor": { "line": self.cursor.0, "col": self.cursor.1 },
        }))
    }

    fn restore_view_state(&mut self, view_state: &Value) {
        if let Some(top) = view_state.get("topLine").and_then(Value::as_u64) {
            self.top_line = top;
        }
        if let Some(cursor) = view_state.get("cursor") {
            let line = cursor.get("line").and_then(Value::as_u64).unwrap_or(1);
            let col = cursor.get("col").and_then(Value::as_u64).unwrap_or(1);
            self.cursor = (line, col);
        }
    }

    fn layout(&mut self, visible: bool) {
        self.visible = visible;
    }
}

/// Degraded surface used when the full editor cannot be provisioned
#[derive(Debug, Clone, Default)]
pub struct PlainTextSurface {
    buffer: String,
}

impl PlainTextSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EditorSurface for PlainTextSurface {
    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Fallback
    }

    fn set_value(&mut self, content: &str) {
        self.buffer = content.to_string();
    }

    fn value(&self) -> String {
        self.buffer.clone()
    }

    fn save_view_state(&self) -> Option<Value> {
        None
    }

    fn restore_view_state(&mut self, _view_state: &Value) {}

    fn layout(&mut self, _visible: bool) {}
}

/// Loader producing a [`BufferSurface`]
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferSurfaceLoader;

impl SurfaceLoader for BufferSurfaceLoader {
    async fn load(&self) -> Result<Box<dyn EditorSurface>> {
        Ok(Box::new(BufferSurface::new()))
    }
}

/// Preview pane that keeps the last shown document in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffscreenPreview {
    source: String,
    scroll: f64,
    visible: bool,
}

impl OffscreenPreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl PreviewPane for OffscreenPreview {
    fn show(&mut self, markdown: &str) {
        self.source = markdown.to_string();
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll = offset.max(0.0);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
