//! Headless mode runner - line commands in, NDJSON events out
//!
//! Commands are read from stdin on a blocking thread and handed to the async
//! loop over a channel. Each command runs to completion before the next one is
//! read, so tab state is never observed mid-operation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use mdviewer_app::config::Settings;
use mdviewer_app::services::{FilePicker, FixedAnswer, PreformattedRenderer, TokioFileIo};
use mdviewer_app::surface::{BufferSurfaceLoader, OffscreenPreview};
use mdviewer_app::{
    topics, CloseOutcome, Component, ExportController, FileController, FileStore, KeyValueStore,
    MemoryStore, ModeChange, ModeController, TabId, TabManager,
};
use mdviewer_core::prelude::*;
use mdviewer_core::ViewMode;

use super::HeadlessEvent;

/// Startup options resolved from the command line and config
#[derive(Debug, Clone)]
pub struct HeadlessOptions {
    pub files: Vec<PathBuf>,
    pub mode: ViewMode,
    pub settings: Settings,
    /// `None` keeps session state in memory only
    pub state_dir: Option<PathBuf>,
    pub assume_yes: bool,
}

/// A parsed stdin command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    New,
    Open(PathBuf),
    Switch(TabId),
    Next,
    Prev,
    Close(Option<TabId>),
    CloseAll,
    Edit(String),
    Save,
    SaveAs(PathBuf),
    Reload,
    Mode(ViewMode),
    Export(Option<PathBuf>),
    List,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let required = |what| required_arg(verb, rest, what);
        let optional = || (!rest.is_empty()).then_some(rest);

        let command = match verb {
            "new" => Command::New,
            "open" => Command::Open(PathBuf::from(required("a path")?)),
            "switch" => Command::Switch(TabId::from(required("a tab id")?)),
            "next" => Command::Next,
            "prev" => Command::Prev,
            "close" => Command::Close(optional().map(TabId::from)),
            "close-all" => Command::CloseAll,
            "edit" => Command::Edit(unescape(rest)),
            "save" => Command::Save,
            "save-as" => Command::SaveAs(PathBuf::from(required("a path")?)),
            "reload" => Command::Reload,
            "mode" => Command::Mode(required("a mode")?.parse()?),
            "export" => Command::Export(optional().map(PathBuf::from)),
            "list" => Command::List,
            "q" | "quit" => Command::Quit,
            other => return Err(Error::config(format!("unknown command '{}'", other))),
        };
        Ok(Some(command))
    }
}

fn required_arg<'a>(verb: &str, rest: &'a str, what: &str) -> Result<&'a str> {
    if rest.is_empty() {
        Err(Error::config(format!("'{}' needs {}", verb, what)))
    } else {
        Ok(rest)
    }
}

/// Turn `\n` and `\t` escapes into real characters so multi-line content
/// fits on one command line
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Save-location source for headless runs.
///
/// A path queued by `save-as <path>` / `export <path>` answers the next
/// prompt; otherwise the suggested name is placed in the working directory.
#[derive(Debug, Clone)]
pub struct QueuedPicker {
    queued: Arc<Mutex<Option<PathBuf>>>,
    fallback_dir: PathBuf,
}

impl QueuedPicker {
    pub fn new(fallback_dir: impl Into<PathBuf>) -> Self {
        Self {
            queued: Arc::new(Mutex::new(None)),
            fallback_dir: fallback_dir.into(),
        }
    }

    pub fn queue(&self, path: PathBuf) {
        if let Ok(mut slot) = self.queued.lock() {
            *slot = Some(path);
        }
    }
}

impl FilePicker for QueuedPicker {
    async fn pick_save_path(&self, suggested_name: &str) -> Result<Option<PathBuf>> {
        let queued = self
            .queued
            .lock()
            .map_err(|_| Error::config("picker lock poisoned"))?
            .take();
        Ok(Some(
            queued.unwrap_or_else(|| self.fallback_dir.join(suggested_name)),
        ))
    }
}

type Files = FileController<TokioFileIo, QueuedPicker, FixedAnswer>;
type Export = ExportController<TokioFileIo, QueuedPicker, PreformattedRenderer>;

/// Everything a headless session owns
struct Session {
    tabs: TabManager,
    mode: ModeController<BufferSurfaceLoader>,
    files: Files,
    export: Export,
    picker: QueuedPicker,
}

impl Session {
    fn new(options: &HeadlessOptions) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = match &options.state_dir {
            Some(dir) => Arc::new(FileStore::new(dir)),
            None => Arc::new(MemoryStore::new()),
        };

        let settings = &options.settings;
        let tabs = TabManager::with_max_tabs(store, settings.tabs.effective_max_tabs())
            .restore_session(settings.tabs.restore_session);

        let cwd = std::env::current_dir()?;
        let picker = QueuedPicker::new(cwd);

        let mut session = Self {
            tabs,
            mode: ModeController::new(options.mode, BufferSurfaceLoader, OffscreenPreview::new()),
            files: FileController::new(
                TokioFileIo,
                picker.clone(),
                FixedAnswer(options.assume_yes),
                settings,
            ),
            export: ExportController::new(TokioFileIo, picker.clone(), PreformattedRenderer),
            picker,
        };
        session.forward_events();
        Ok(session)
    }

    /// Mirror bus events to stdout
    fn forward_events(&mut self) {
        const TAB_TOPICS: &[&str] = &[
            topics::TAB_CREATED,
            topics::TAB_REMOVED,
            topics::TAB_ACTIVATED,
            topics::ALL_TABS_CLOSED,
            topics::TAB_CONTENT_UPDATED,
            topics::TAB_SAVED,
            topics::TAB_RESTORED,
        ];
        for topic in TAB_TOPICS {
            self.tabs.on(*topic, emit_headless);
        }
        self.mode.on(topics::MODE_CHANGED, emit_headless);
        for topic in [
            topics::FILE_OPENED,
            topics::FILE_SAVED,
            topics::FILE_RELOADED,
            topics::TAB_LIMIT_WARNING,
        ] {
            self.files.on(topic, emit_headless);
        }
        self.export.on(topics::EXPORTED, emit_headless);
    }

    async fn start(&mut self, files: &[PathBuf]) -> Result<()> {
        self.tabs.init().await?;
        self.mode.init().await?;
        self.files.init().await?;
        self.export.init().await?;

        for path in files {
            if let Err(e) = self.files.open_file(path, &mut self.tabs).await {
                report(&e);
            }
        }
        self.mode.show_active_tab(&self.tabs);
        Ok(())
    }

    /// Run one command. Returns false when the session should end.
    async fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::New => {
                self.mode.capture_view_state(&mut self.tabs);
                self.files.new_file(&mut self.tabs).await?;
            }
            Command::Open(path) => {
                self.mode.capture_view_state(&mut self.tabs);
                self.files.open_file(&path, &mut self.tabs).await?;
            }
            Command::Switch(id) => {
                if !self.mode.switch_tab(&id, &mut self.tabs) {
                    return Err(Error::tab_not_found(id.as_str()));
                }
            }
            Command::Next | Command::Prev => {
                self.mode.capture_view_state(&mut self.tabs);
                let switched = if command == Command::Next {
                    self.tabs.switch_to_next_tab()
                } else {
                    self.tabs.switch_to_previous_tab()
                };
                if !switched {
                    info!("Nothing to switch to");
                }
            }
            Command::Close(id) => {
                match self.files.close_file(id.as_ref(), &mut self.tabs).await? {
                    CloseOutcome::Closed => {}
                    CloseOutcome::Declined => {
                        HeadlessEvent::close_declined(id.map(|id| id.to_string())).emit()
                    }
                    CloseOutcome::NotFound => {
                        let id = id.map(|id| id.to_string()).unwrap_or_default();
                        return Err(Error::tab_not_found(id));
                    }
                }
            }
            Command::CloseAll => {
                if self.files.close_all(&mut self.tabs).await? == CloseOutcome::Declined {
                    HeadlessEvent::close_declined(None).emit();
                }
            }
            Command::Edit(content) => {
                let id = self.active_id()?;
                self.tabs.update_tab_content(&id, &content);
            }
            Command::Save => {
                self.files.save_file(&mut self.tabs).await?;
            }
            Command::SaveAs(path) => {
                self.picker.queue(path);
                self.files.save_as_file(&mut self.tabs).await?;
            }
            Command::Reload => {
                if !self.files.reload_current_file(&mut self.tabs).await? {
                    info!("Reload skipped");
                }
            }
            Command::Mode(target) => {
                if self.mode.set_mode(target, &mut self.tabs).await == ModeChange::Refused {
                    return Err(Error::config(format!(
                        "{} mode requires an open document",
                        target
                    )));
                }
            }
            Command::Export(path) => {
                if let Some(path) = path {
                    self.picker.queue(path);
                }
                self.export.export_html(&self.tabs).await?;
            }
            Command::List => HeadlessEvent::tab_list(&self.tabs.get_all_tabs()).emit(),
            Command::Quit => return Ok(false),
        }

        self.mode.show_active_tab(&self.tabs);
        Ok(true)
    }

    fn active_id(&self) -> Result<TabId> {
        self.tabs
            .get_active_tab()
            .map(|t| t.id().clone())
            .ok_or(Error::NoActiveTab)
    }

    fn shutdown(&mut self) {
        self.mode.capture_view_state(&mut self.tabs);
        self.export.destroy();
        self.files.destroy();
        self.mode.destroy();
        self.tabs.destroy();
    }
}

fn emit_headless(event: &mdviewer_app::AppEvent) -> Result<()> {
    if let Some(headless) = HeadlessEvent::from_app_event(event) {
        headless.emit();
    }
    Ok(())
}

fn report(e: &Error) {
    warn!("Command failed: {}", e);
    HeadlessEvent::error(e.to_string()).emit();
}

/// Run in headless mode - output JSON events instead of a UI
pub async fn run_headless(options: HeadlessOptions) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("mdviewer starting in HEADLESS mode");
    match &options.state_dir {
        Some(dir) => info!("State dir: {}", dir.display()),
        None => info!("State dir: <memory>"),
    }
    info!("═══════════════════════════════════════════════════════");

    let mut session = Session::new(&options)?;
    session.start(&options.files).await?;
    HeadlessEvent::ready(session.tabs.get_tabs_count(), session.mode.mode().as_str()).emit();

    let (line_tx, mut line_rx) = mpsc::channel::<String>(64);
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(line_tx);
    });

    while let Some(line) = line_rx.recv().await {
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                report(&e);
                continue;
            }
        };

        match session.execute(command).await {
            Ok(true) => {}
            Ok(false) => {
                info!("Quit requested");
                break;
            }
            Err(e) => report(&e),
        }
    }

    session.shutdown();
    info!("mdviewer headless mode exiting");
    Ok(())
}

/// Forward stdin lines to the command loop (blocking version)
fn spawn_stdin_reader_blocking(line_tx: mpsc::Sender<String>) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if line_tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    info!("Stdin reader exiting");
}
