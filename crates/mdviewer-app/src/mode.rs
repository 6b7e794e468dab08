//! Mode/Layout controller
//!
//! Switches the document area between code, preview and split layouts. The
//! editor surface is provisioned on the first transition that needs it; if
//! provisioning fails a [`PlainTextSurface`] is mounted instead and the
//! transition still completes.

use std::time::{Duration, Instant};

use mdviewer_core::prelude::*;
use mdviewer_core::ViewMode;

use crate::component::{Component, ComponentBase};
use crate::event::AppEvent;
use crate::surface::{EditorSurface, PlainTextSurface, PreviewPane, SurfaceKind, SurfaceLoader};
use crate::tab::TabId;
use crate::tab_manager::TabManager;

/// Result of a mode change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeChange {
    /// Already in the requested mode
    Unchanged,
    /// An editing layout was requested with no open document
    Refused,
    Changed { from: ViewMode, to: ViewMode },
}

/// Direction for [`ModeController::cycle_mode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDirection {
    Forward,
    Backward,
}

pub struct ModeController<L> {
    base: ComponentBase,
    mode: ViewMode,
    loader: L,
    surface: Option<Box<dyn EditorSurface>>,
    preview: Box<dyn PreviewPane>,
    last_switch: Option<Duration>,
}

impl<L: SurfaceLoader> std::fmt::Debug for ModeController<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode)
            .field("surface", &self.surface_kind())
            .field("last_switch", &self.last_switch)
            .finish()
    }
}

impl<L: SurfaceLoader> ModeController<L> {
    pub const NAME: &'static str = "ModeController";

    pub fn new(initial: ViewMode, loader: L, preview: impl PreviewPane + 'static) -> Self {
        let mut preview: Box<dyn PreviewPane> = Box::new(preview);
        preview.set_visible(initial.shows_preview());
        Self {
            base: ComponentBase::new(Self::NAME),
            mode: initial,
            loader,
            surface: None,
            preview,
            last_switch: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Kind of the mounted editor surface, `None` before first provisioning
    pub fn surface_kind(&self) -> Option<SurfaceKind> {
        self.surface.as_ref().map(|s| s.kind())
    }

    pub fn surface(&self) -> Option<&dyn EditorSurface> {
        self.surface.as_deref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn EditorSurface + 'static)> {
        self.surface.as_deref_mut()
    }

    pub fn preview(&self) -> &dyn PreviewPane {
        self.preview.as_ref()
    }

    pub fn preview_mut(&mut self) -> &mut dyn PreviewPane {
        self.preview.as_mut()
    }

    /// Duration of the most recent completed mode change
    pub fn last_switch_duration(&self) -> Option<Duration> {
        self.last_switch
    }

    /// Transition to `target`.
    ///
    /// The active tab's view-state is saved for the panes visible before the
    /// change and restored for the panes visible after it.
    pub async fn set_mode(&mut self, target: ViewMode, tabs: &mut TabManager) -> ModeChange {
        if target == self.mode {
            return ModeChange::Unchanged;
        }
        if target.shows_editor() && !tabs.has_tabs() {
            debug!("Refusing {} mode with no open tabs", target);
            return ModeChange::Refused;
        }

        let start = Instant::now();
        self.capture_view_state(tabs);

        if target.shows_editor() {
            self.ensure_surface().await;
        }

        let from = self.mode;
        self.mode = target;
        self.apply_layout();
        self.show_active_tab(tabs);

        let elapsed = start.elapsed();
        self.last_switch = Some(elapsed);
        self.base.emit(AppEvent::ModeChanged { from, to: target });
        info!("Mode {} -> {} in {:?}", from, target, elapsed);

        ModeChange::Changed { from, to: target }
    }

    /// Step through code → preview → split
    pub async fn cycle_mode(
        &mut self,
        direction: CycleDirection,
        tabs: &mut TabManager,
    ) -> ModeChange {
        let target = match direction {
            CycleDirection::Forward => self.mode.next(),
            CycleDirection::Backward => self.mode.previous(),
        };
        self.set_mode(target, tabs).await
    }

    /// Activate another tab, carrying view-state across the switch
    pub fn switch_tab(&mut self, id: &TabId, tabs: &mut TabManager) -> bool {
        if tabs.get_tab(id).is_none() {
            return false;
        }
        self.capture_view_state(tabs);
        let switched = tabs.switch_to_tab(id);
        if switched {
            self.show_active_tab(tabs);
        }
        switched
    }

    /// Push the active tab's content and saved positions into the visible panes
    pub fn show_active_tab(&mut self, tabs: &TabManager) {
        let Some(tab) = tabs.get_active_tab() else {
            return;
        };

        if self.mode.shows_editor() {
            if let Some(surface) = self.surface.as_mut() {
                surface.set_value(tab.content());
                if let Some(view_state) = tab.editor_view_state() {
                    surface.restore_view_state(view_state);
                }
            }
        }

        if self.mode.shows_preview() {
            self.preview.show(tab.content());
            self.preview
                .set_scroll_offset(tab.scroll_position().preview);
        }
    }

    /// Record the visible panes' state on the active tab. Call before any
    /// operation that changes the active tab.
    pub fn capture_view_state(&self, tabs: &mut TabManager) {
        let Some(id) = tabs.get_active_tab().map(|t| t.id().clone()) else {
            return;
        };

        if self.mode.shows_editor() {
            if let Some(view_state) = self.surface.as_ref().and_then(|s| s.save_view_state()) {
                tabs.save_tab_editor_state(&id, view_state);
            }
        }

        if self.mode.shows_preview() {
            tabs.update_tab_scroll(&id, None, Some(self.preview.scroll_offset()));
        }
    }

    async fn ensure_surface(&mut self) {
        if self.surface.is_some() {
            return;
        }
        let surface: Box<dyn EditorSurface> = match self.loader.load().await {
            Ok(surface) => {
                debug!("Editor surface provisioned ({:?})", surface.kind());
                surface
            }
            Err(e) => {
                warn!("Editor surface unavailable, using plain text: {}", e);
                Box::new(PlainTextSurface::new())
            }
        };
        self.surface = Some(surface);
    }

    fn apply_layout(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.layout(self.mode.shows_editor());
        }
        self.preview.set_visible(self.mode.shows_preview());
    }
}

impl<L: SurfaceLoader> Component for ModeController<L> {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }

    /// Provision the surface up front when starting in an editing layout
    async fn on_init(&mut self) -> Result<()> {
        if self.mode.shows_editor() {
            self.ensure_surface().await;
            self.apply_layout();
        }
        Ok(())
    }
}
