//! File controller: new, open, save, close and reload

use std::path::{Path, PathBuf};

use mdviewer_core::prelude::*;

use crate::component::{Component, ComponentBase};
use crate::config::Settings;
use crate::event::AppEvent;
use crate::services::{Confirmer, FileIo, FilePicker};
use crate::tab::TabId;
use crate::tab_manager::{CloseOutcome, TabManager};

pub struct FileController<F, P, C> {
    base: ComponentBase,
    io: F,
    picker: P,
    confirmer: C,
    template: String,
    warn_threshold: usize,
}

impl<F, P, C> std::fmt::Debug for FileController<F, P, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileController")
            .field("warn_threshold", &self.warn_threshold)
            .finish_non_exhaustive()
    }
}

impl<F: FileIo, P: FilePicker, C: Confirmer> FileController<F, P, C> {
    pub const NAME: &'static str = "FileController";

    pub fn new(io: F, picker: P, confirmer: C, settings: &Settings) -> Self {
        Self {
            base: ComponentBase::new(Self::NAME),
            io,
            picker,
            confirmer,
            template: settings.editor.new_document_template.clone(),
            warn_threshold: settings.tabs.effective_warn_threshold(),
        }
    }

    pub fn confirmer(&self) -> &C {
        &self.confirmer
    }

    /// Open an untitled tab seeded with the new-document template
    pub async fn new_file(&mut self, tabs: &mut TabManager) -> Result<TabId> {
        let id = tabs.create_new_tab(self.template.clone())?;
        self.warn_if_near_limit(tabs);
        Ok(id)
    }

    /// Open `path`, reusing its tab if it is already open (no disk read)
    pub async fn open_file(&mut self, path: &Path, tabs: &mut TabManager) -> Result<TabId> {
        if let Some(existing) = tabs.find_tab_by_path(path).map(|t| t.id().clone()) {
            tabs.switch_to_tab(&existing);
            return Ok(existing);
        }

        ensure_capacity(tabs)?;
        let content = self.io.read(path).await?;
        let id = tabs.open_file_in_tab(path, content)?;

        self.base.emit(AppEvent::FileOpened {
            tab_id: id.clone(),
            path: path.to_path_buf(),
        });
        self.warn_if_near_limit(tabs);
        Ok(id)
    }

    /// Write the active tab to its path, asking for one if it has none.
    ///
    /// Returns the saved path, or `None` if the picker was dismissed.
    pub async fn save_file(&mut self, tabs: &mut TabManager) -> Result<Option<PathBuf>> {
        let existing = tabs
            .get_active_tab()
            .ok_or(Error::NoActiveTab)?
            .file_path()
            .map(Path::to_path_buf);
        match existing {
            Some(path) => self.write_active(path, tabs).await.map(Some),
            None => self.save_as_file(tabs).await,
        }
    }

    /// Ask for a new location and write the active tab there
    pub async fn save_as_file(&mut self, tabs: &mut TabManager) -> Result<Option<PathBuf>> {
        let suggested = tabs
            .get_active_tab()
            .ok_or(Error::NoActiveTab)?
            .file_name()
            .to_string();

        let Some(path) = self.picker.pick_save_path(&suggested).await? else {
            debug!("Save dialog dismissed");
            return Ok(None);
        };
        self.write_active(path, tabs).await.map(Some)
    }

    async fn write_active(&mut self, path: PathBuf, tabs: &mut TabManager) -> Result<PathBuf> {
        let (id, content) = tabs
            .get_active_tab()
            .map(|t| (t.id().clone(), t.content().to_string()))
            .ok_or(Error::NoActiveTab)?;

        self.io.write(&path, &content).await?;
        tabs.mark_tab_saved(&id, Some(&path));

        info!("Saved {} to {:?}", id, path);
        self.base.emit(AppEvent::FileSaved {
            tab_id: id,
            path: path.clone(),
        });
        Ok(path)
    }

    /// Close `id`, or the active tab when `id` is `None`
    pub async fn close_file(
        &mut self,
        id: Option<&TabId>,
        tabs: &mut TabManager,
    ) -> Result<CloseOutcome> {
        let id = match id {
            Some(id) => id.clone(),
            None => match tabs.get_active_tab() {
                Some(tab) => tab.id().clone(),
                None => return Ok(CloseOutcome::NotFound),
            },
        };
        tabs.close_tab(&id, &self.confirmer).await
    }

    /// Close every tab (one confirmation for all unsaved ones)
    pub async fn close_all(&mut self, tabs: &mut TabManager) -> Result<CloseOutcome> {
        tabs.close_all_tabs(&self.confirmer).await
    }

    /// Re-read the active tab from disk. Unsaved changes are only discarded
    /// after confirmation.
    ///
    /// Returns false when the tab has no path or the user declined.
    pub async fn reload_current_file(&mut self, tabs: &mut TabManager) -> Result<bool> {
        let tab = tabs.get_active_tab().ok_or(Error::NoActiveTab)?;
        let Some(path) = tab.file_path().map(Path::to_path_buf) else {
            return Ok(false);
        };
        let id = tab.id().clone();

        if tab.is_dirty() {
            let message = format!(
                "Discard unsaved changes to \"{}\" and reload from disk?",
                tab.display_name()
            );
            if !self.confirmer.confirm("Reload File", &message).await? {
                return Ok(false);
            }
        }

        let content = self.io.read(&path).await?;
        tabs.reload_tab_content(&id, &content);
        self.base.emit(AppEvent::FileReloaded { tab_id: id });
        Ok(true)
    }

    fn warn_if_near_limit(&mut self, tabs: &TabManager) {
        let count = tabs.get_tabs_count();
        if count >= self.warn_threshold {
            let max = tabs.max_tabs();
            warn!("{} of {} tabs open", count, max);
            self.base.emit(AppEvent::TabLimitWarning { count, max });
        }
    }
}

fn ensure_capacity(tabs: &TabManager) -> Result<()> {
    if tabs.get_tabs_count() >= tabs.max_tabs() {
        return Err(Error::TabLimit {
            max: tabs.max_tabs(),
        });
    }
    Ok(())
}

impl<F: FileIo, P: FilePicker, C: Confirmer> Component for FileController<F, P, C> {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_utils::{CountingConfirmer, FakeFs, FakePicker};
    use crate::event::topics;
    use crate::storage::MemoryStore;
    use std::sync::{Arc, Mutex};

    type Controller = FileController<FakeFs, FakePicker, CountingConfirmer>;

    fn controller(fs: FakeFs, picker: FakePicker) -> Controller {
        FileController::new(
            fs,
            picker,
            CountingConfirmer::answering(true),
            &Settings::default(),
        )
    }

    fn tabs() -> TabManager {
        TabManager::new(MemoryStore::new())
    }

    fn record(c: &mut Controller, topic: &str) -> Arc<Mutex<Vec<AppEvent>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        c.on(topic, move |e| {
            sink.lock().unwrap().push(e.clone());
            Ok(())
        });
        log
    }

    #[tokio::test]
    async fn test_new_file_uses_template() {
        let mut c = controller(FakeFs::default(), FakePicker::dismissed());
        let mut tabs = tabs();

        c.new_file(&mut tabs).await.unwrap();

        let tab = tabs.get_active_tab().unwrap();
        assert!(tab.content().starts_with("# New Document"));
        assert!(!tab.is_dirty());
    }

    #[tokio::test]
    async fn test_open_reads_once_and_reuses_tab() {
        let fs = FakeFs::default().with_file("/x/a.md", "# A");
        let mut c = controller(fs, FakePicker::dismissed());
        let mut tabs = tabs();
        let opened = record(&mut c, topics::FILE_OPENED);

        let first = c.open_file(Path::new("/x/a.md"), &mut tabs).await.unwrap();
        c.new_file(&mut tabs).await.unwrap();
        let second = c.open_file(Path::new("/x/a.md"), &mut tabs).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(c.io.reads(), 1);
        assert_eq!(tabs.get_tabs_count(), 2);
        assert_eq!(tabs.get_active_tab().unwrap().id(), &first);
        assert_eq!(opened.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_missing_file_changes_nothing() {
        let mut c = controller(FakeFs::default(), FakePicker::dismissed());
        let mut tabs = tabs();

        let err = c
            .open_file(Path::new("/nope.md"), &mut tabs)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FileRead { .. }));
        assert!(!tabs.has_tabs());
    }

    #[tokio::test]
    async fn test_open_at_capacity_skips_read() {
        let fs = FakeFs::default().with_file("/x/a.md", "a");
        let mut c = controller(fs, FakePicker::dismissed());
        let mut tabs = TabManager::with_max_tabs(MemoryStore::new(), 1);
        c.new_file(&mut tabs).await.unwrap();

        let err = c
            .open_file(Path::new("/x/a.md"), &mut tabs)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::TabLimit { max: 1 }));
        assert_eq!(c.io.reads(), 0);
    }

    #[tokio::test]
    async fn test_limit_warning_at_threshold() {
        let mut settings = Settings::default();
        settings.tabs.warn_threshold = 2;
        let mut c: Controller = FileController::new(
            FakeFs::default(),
            FakePicker::dismissed(),
            CountingConfirmer::default(),
            &settings,
        );
        let warnings = record(&mut c, topics::TAB_LIMIT_WARNING);
        let mut tabs = tabs();

        c.new_file(&mut tabs).await.unwrap();
        assert!(warnings.lock().unwrap().is_empty());
        c.new_file(&mut tabs).await.unwrap();

        match &warnings.lock().unwrap()[0] {
            AppEvent::TabLimitWarning { count, max } => {
                assert_eq!((*count, *max), (2, 50));
            }
            other => panic!("unexpected event {:?}", other),
        };
    }

    #[tokio::test]
    async fn test_save_existing_path_skips_picker() {
        let fs = FakeFs::default().with_file("/x/a.md", "old");
        let mut c = controller(fs, FakePicker::choosing("/elsewhere.md"));
        let mut tabs = tabs();
        let id = c.open_file(Path::new("/x/a.md"), &mut tabs).await.unwrap();
        tabs.update_tab_content(&id, "new");

        let saved = c.save_file(&mut tabs).await.unwrap();

        assert_eq!(saved, Some(PathBuf::from("/x/a.md")));
        assert!(c.picker.suggestions().is_empty());
        assert_eq!(c.io.contents("/x/a.md").as_deref(), Some("new"));
        assert!(!tabs.get_tab(&id).unwrap().is_dirty());
    }

    #[tokio::test]
    async fn test_save_untitled_asks_for_path() {
        let mut c = controller(FakeFs::default(), FakePicker::choosing("/docs/notes.md"));
        let mut tabs = tabs();
        let id = c.new_file(&mut tabs).await.unwrap();
        tabs.update_tab_content(&id, "notes");
        let saved_events = record(&mut c, topics::FILE_SAVED);

        let saved = c.save_file(&mut tabs).await.unwrap();

        assert_eq!(saved, Some(PathBuf::from("/docs/notes.md")));
        assert_eq!(c.picker.suggestions(), vec!["untitled.md"]);
        let tab = tabs.get_tab(&id).unwrap();
        assert_eq!(tab.file_name(), "notes.md");
        assert!(!tab.is_dirty());
        assert_eq!(saved_events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_dismissed_keeps_tab_dirty() {
        let mut c = controller(FakeFs::default(), FakePicker::dismissed());
        let mut tabs = tabs();
        let id = c.new_file(&mut tabs).await.unwrap();
        tabs.update_tab_content(&id, "draft");

        assert_eq!(c.save_file(&mut tabs).await.unwrap(), None);
        assert!(tabs.get_tab(&id).unwrap().is_dirty());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_tab_dirty() {
        let fs = FakeFs::failing_writes();
        let mut c = controller(fs, FakePicker::choosing("/ro/a.md"));
        let mut tabs = tabs();
        let id = c.new_file(&mut tabs).await.unwrap();
        tabs.update_tab_content(&id, "draft");

        let err = c.save_as_file(&mut tabs).await.unwrap_err();

        assert!(matches!(err, Error::FileWrite { .. }));
        let tab = tabs.get_tab(&id).unwrap();
        assert!(tab.is_dirty());
        assert!(tab.file_path().is_none());
    }

    #[tokio::test]
    async fn test_save_without_tabs() {
        let mut c = controller(FakeFs::default(), FakePicker::dismissed());
        let err = c.save_file(&mut tabs()).await.unwrap_err();
        assert!(matches!(err, Error::NoActiveTab));
    }

    #[tokio::test]
    async fn test_close_file_defaults_to_active() {
        let mut c = controller(FakeFs::default(), FakePicker::dismissed());
        let mut tabs = tabs();
        let a = c.new_file(&mut tabs).await.unwrap();
        c.new_file(&mut tabs).await.unwrap();

        let outcome = c.close_file(None, &mut tabs).await.unwrap();

        assert_eq!(outcome, CloseOutcome::Closed);
        assert_eq!(tabs.get_active_tab().unwrap().id(), &a);
        assert_eq!(
            c.close_file(None, &mut TabManager::new(MemoryStore::new()))
                .await
                .unwrap(),
            CloseOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn test_reload_replaces_content_after_confirmation() {
        let fs = FakeFs::default().with_file("/x/a.md", "v1");
        let mut c = controller(fs, FakePicker::dismissed());
        let mut tabs = tabs();
        let id = c.open_file(Path::new("/x/a.md"), &mut tabs).await.unwrap();
        tabs.update_tab_content(&id, "local");
        c.io.put("/x/a.md", "v2");

        assert!(c.reload_current_file(&mut tabs).await.unwrap());

        assert_eq!(c.confirmer().asked(), 1);
        let tab = tabs.get_tab(&id).unwrap();
        assert_eq!(tab.content(), "v2");
        assert!(!tab.is_dirty());
    }

    #[tokio::test]
    async fn test_reload_declined_keeps_edits() {
        let fs = FakeFs::default().with_file("/x/a.md", "v1");
        let mut c: Controller = FileController::new(
            fs,
            FakePicker::dismissed(),
            CountingConfirmer::answering(false),
            &Settings::default(),
        );
        let mut tabs = tabs();
        let id = c.open_file(Path::new("/x/a.md"), &mut tabs).await.unwrap();
        tabs.update_tab_content(&id, "local");

        assert!(!c.reload_current_file(&mut tabs).await.unwrap());
        assert_eq!(tabs.get_tab(&id).unwrap().content(), "local");
    }

    #[tokio::test]
    async fn test_reload_untitled_is_noop() {
        let mut c = controller(FakeFs::default(), FakePicker::dismissed());
        let mut tabs = tabs();
        c.new_file(&mut tabs).await.unwrap();
        assert!(!c.reload_current_file(&mut tabs).await.unwrap());
    }
}
