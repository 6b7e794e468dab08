//! mdviewer-app - Tab management and orchestration for the markdown viewer
//!
//! This crate implements the component lifecycle and event bus, the tab
//! collection with its persistence-aware manager, the mode/layout controller,
//! the file and export controllers, configuration loading, durable storage and
//! the collaborator traits the host application implements.

pub mod component;
pub mod config;
pub mod controllers;
pub mod event;
pub mod mode;
pub mod services;
pub mod storage;
pub mod surface;
pub mod tab;
pub mod tab_collection;
pub mod tab_manager;

// Re-export primary types
pub use component::{Component, ComponentBase, ListenerId};
pub use config::Settings;
pub use controllers::{ExportController, FileController};
pub use event::{topics, AppEvent};
pub use mode::{CycleDirection, ModeChange, ModeController};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TABS_KEY};
pub use surface::{EditorSurface, PreviewPane, SurfaceKind, SurfaceLoader};
pub use tab::{Tab, TabId, TabOptions, TabSnapshot};
pub use tab_collection::{CollectionSnapshot, TabCollection, MAX_TABS};
pub use tab_manager::{CloseOutcome, TabManager};
