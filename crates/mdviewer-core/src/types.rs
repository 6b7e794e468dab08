//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Layout mode of the main document area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Editor surface only
    Code,
    /// Rendered preview only
    #[default]
    Preview,
    /// Editor and preview side by side
    Split,
}

impl ViewMode {
    /// All modes in cycling order
    pub const ALL: [ViewMode; 3] = [ViewMode::Code, ViewMode::Preview, ViewMode::Split];

    /// Whether this mode mounts the editor surface
    pub fn shows_editor(&self) -> bool {
        matches!(self, ViewMode::Code | ViewMode::Split)
    }

    /// Whether this mode mounts the preview pane
    pub fn shows_preview(&self) -> bool {
        matches!(self, ViewMode::Preview | ViewMode::Split)
    }

    /// Next mode in cycling order (wraps around)
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous mode in cycling order (wraps around)
    pub fn previous(&self) -> Self {
        let idx = Self::ALL.iter().position(|m| m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Code => "code",
            ViewMode::Preview => "preview",
            ViewMode::Split => "split",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(ViewMode::Code),
            "preview" => Ok(ViewMode::Preview),
            "split" => Ok(ViewMode::Split),
            other => Err(Error::config(format!("unknown view mode '{}'", other))),
        }
    }
}

/// 1-based cursor location inside a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct CursorPosition {
    pub line: u32,
    pub col: u32,
}

impl Default for CursorPosition {
    fn default() -> Self {
        Self { line: 1, col: 1 }
    }
}

/// Scroll offsets of the editor surface and preview pane
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct ScrollPosition {
    #[serde(default)]
    pub editor: f64,
    #[serde(default)]
    pub preview: f64,
}
