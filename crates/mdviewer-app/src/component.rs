//! Component lifecycle and event bus
//!
//! Every component owns a [`ComponentBase`] (composition, not inheritance) and
//! implements [`Component`] to hook into the shared lifecycle:
//!
//! 1. `init()` runs the component's `on_init()` extension point. A failure
//!    aborts initialization and leaves the component uninitialized.
//! 2. `update()` runs `on_update()` and records timing. Ignored before init.
//! 3. `destroy()` runs `on_destroy()`, destroys owned children, then clears
//!    every listener. It never fails; cleanup errors are logged.
//!
//! ## Event Bus
//!
//! `emit()` invokes every listener registered for the event's topic in
//! registration order. A listener returning `Err` is logged and the remaining
//! listeners still run. When a component has been adopted by a parent, the
//! event is then forwarded to the parent's inbox under `"<name>:<topic>"`.
//! Parents process their inbox with [`ComponentBase::drain_bubbled`], which
//! dispatches each bubbled event to the parent's own listeners and forwards it
//! further up.

use std::time::{Duration, Instant};

use mdviewer_core::prelude::*;
use tokio::sync::mpsc;

use crate::event::AppEvent;

type Listener = Box<dyn FnMut(&AppEvent) -> Result<()> + Send>;

/// Handle returned by [`ComponentBase::on`], used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An event forwarded from a child component to its parent
#[derive(Debug, Clone)]
pub struct BubbledEvent {
    /// Namespaced topic, e.g. `"TabCollection:tab-created"`
    pub topic: String,
    pub event: AppEvent,
}

/// Basic per-component performance counters
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceMetrics {
    pub init_time: Duration,
    pub last_update_time: Duration,
    pub total_update_time: Duration,
    pub update_count: u64,
}

impl PerformanceMetrics {
    pub fn average_update_time(&self) -> Duration {
        if self.update_count == 0 {
            Duration::ZERO
        } else {
            self.total_update_time
                .div_f64(self.update_count as f64)
        }
    }
}

/// Debug summary of a component
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentState {
    pub name: String,
    pub initialized: bool,
    pub child_count: usize,
    pub listener_count: usize,
    pub metrics: PerformanceMetrics,
}

/// Shared lifecycle and pub/sub state held by every component
pub struct ComponentBase {
    name: String,
    initialized: bool,
    listeners: Vec<(ListenerId, String, Listener)>,
    next_listener_id: u64,
    parent: Option<mpsc::UnboundedSender<BubbledEvent>>,
    inbox_tx: mpsc::UnboundedSender<BubbledEvent>,
    inbox_rx: mpsc::UnboundedReceiver<BubbledEvent>,
    children: Vec<String>,
    metrics: PerformanceMetrics,
}

impl std::fmt::Debug for ComponentBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentBase")
            .field("name", &self.name)
            .field("initialized", &self.initialized)
            .field("listeners", &self.listeners.len())
            .field("has_parent", &self.parent.is_some())
            .field("children", &self.children)
            .finish()
    }
}

impl ComponentBase {
    pub fn new(name: impl Into<String>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            initialized: false,
            listeners: Vec::new(),
            next_listener_id: 1,
            parent: None,
            inbox_tx,
            inbox_rx,
            children: Vec::new(),
            metrics: PerformanceMetrics::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        self.metrics
    }

    /// Names of adopted child components
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn state(&self) -> ComponentState {
        ComponentState {
            name: self.name.clone(),
            initialized: self.initialized,
            child_count: self.children.len(),
            listener_count: self.listeners.len(),
            metrics: self.metrics,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Pub/Sub
    // ─────────────────────────────────────────────────────────

    /// Register a listener for `topic`
    pub fn on<F>(&mut self, topic: impl Into<String>, handler: F) -> ListenerId
    where
        F: FnMut(&AppEvent) -> Result<()> + Send + 'static,
    {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, topic.into(), Box::new(handler)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Publish `event` to local listeners, then bubble it to the parent
    pub fn emit(&mut self, event: AppEvent) {
        let topic = event.name();
        self.dispatch(topic, &event);
        self.forward_to_parent(topic, event);
    }

    /// Invoke the listeners registered for `topic`, in registration order.
    /// Returns the number of listeners invoked.
    pub fn dispatch(&mut self, topic: &str, event: &AppEvent) -> usize {
        let mut invoked = 0;
        for (_, listener_topic, handler) in self.listeners.iter_mut() {
            if listener_topic.as_str() != topic {
                continue;
            }
            invoked += 1;
            if let Err(e) = handler(event) {
                warn!("[{}] Listener for '{}' failed: {}", self.name, topic, e);
            }
        }
        invoked
    }

    fn forward_to_parent(&self, topic: &str, event: AppEvent) {
        if let Some(parent) = &self.parent {
            let bubbled = BubbledEvent {
                topic: format!("{}:{}", self.name, topic),
                event,
            };
            if parent.send(bubbled).is_err() {
                debug!("[{}] Parent inbox closed, dropping '{}'", self.name, topic);
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Hierarchy
    // ─────────────────────────────────────────────────────────

    /// Make `child` bubble its events into this component's inbox
    pub fn adopt(&mut self, child: &mut ComponentBase) {
        child.parent = Some(self.inbox_tx.clone());
        if !self.children.contains(&child.name) {
            self.children.push(child.name.clone());
        }
    }

    /// Undo [`adopt`](Self::adopt)
    pub fn release(&mut self, child: &mut ComponentBase) {
        child.parent = None;
        self.children.retain(|name| name != &child.name);
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Process events bubbled up from children.
    ///
    /// Each event is dispatched to this component's listeners under its
    /// namespaced topic and forwarded further up. The drained events are
    /// returned in arrival order so the owner can react to them.
    pub fn drain_bubbled(&mut self) -> Vec<BubbledEvent> {
        let mut drained = Vec::new();
        while let Ok(bubbled) = self.inbox_rx.try_recv() {
            self.dispatch(&bubbled.topic, &bubbled.event);
            self.forward_to_parent(&bubbled.topic, bubbled.event.clone());
            drained.push(bubbled);
        }
        drained
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle bookkeeping
    // ─────────────────────────────────────────────────────────

    fn mark_initialized(&mut self, elapsed: Duration) {
        self.initialized = true;
        self.metrics.init_time = elapsed;
    }

    fn record_update(&mut self, elapsed: Duration) {
        self.metrics.last_update_time = elapsed;
        self.metrics.total_update_time += elapsed;
        self.metrics.update_count += 1;
    }

    /// Drop listeners, hierarchy links and the initialized flag
    fn clear(&mut self) {
        self.listeners.clear();
        self.children.clear();
        self.parent = None;
        self.initialized = false;
        while self.inbox_rx.try_recv().is_ok() {}
    }
}

/// Lifecycle contract implemented by every component.
///
/// Implementors supply access to their [`ComponentBase`] and override the
/// `on_*` extension points they need; `init`, `update` and `destroy` are
/// provided.
#[allow(async_fn_in_trait)]
pub trait Component {
    fn base(&self) -> &ComponentBase;

    fn base_mut(&mut self) -> &mut ComponentBase;

    /// Initialization extension point
    async fn on_init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Update extension point
    async fn on_update(&mut self, _data: &serde_json::Value) -> Result<()> {
        Ok(())
    }

    /// Cleanup extension point
    fn on_destroy(&mut self) -> Result<()> {
        Ok(())
    }

    /// Destroy owned child components
    fn destroy_children(&mut self) {}

    fn name(&self) -> &str {
        self.base().name()
    }

    fn is_initialized(&self) -> bool {
        self.base().is_initialized()
    }

    async fn init(&mut self) -> Result<()> {
        let start = Instant::now();
        if let Err(e) = self.on_init().await {
            error!("[{}] Initialization failed: {}", self.name(), e);
            return Err(e);
        }
        let component = self.name().to_string();
        let base = self.base_mut();
        base.mark_initialized(start.elapsed());
        base.emit(AppEvent::Initialized { component });
        Ok(())
    }

    async fn update(&mut self, data: &serde_json::Value) -> Result<()> {
        if !self.is_initialized() {
            warn!("[{}] Cannot update - component not initialized", self.name());
            return Ok(());
        }
        let start = Instant::now();
        if let Err(e) = self.on_update(data).await {
            error!("[{}] Update failed: {}", self.name(), e);
            return Err(e);
        }
        let component = self.name().to_string();
        let base = self.base_mut();
        base.record_update(start.elapsed());
        base.emit(AppEvent::Updated { component });
        Ok(())
    }

    fn destroy(&mut self) {
        if let Err(e) = self.on_destroy() {
            error!("[{}] Destroy failed: {}", self.name(), e);
        }
        self.destroy_children();
        let component = self.name().to_string();
        let base = self.base_mut();
        base.emit(AppEvent::Destroyed { component });
        base.clear();
    }

    fn on<F>(&mut self, topic: impl Into<String>, handler: F) -> ListenerId
    where
        F: FnMut(&AppEvent) -> Result<()> + Send + 'static,
    {
        self.base_mut().on(topic, handler)
    }

    fn off(&mut self, id: ListenerId) -> bool {
        self.base_mut().off(id)
    }
}
