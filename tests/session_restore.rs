//! Session restore across process-like boundaries: one manager writes the
//! open tabs to disk, a fresh manager reads them back.

use std::sync::{Arc, Mutex};

use mdviewer_app::config::{load_settings, Settings};
use mdviewer_app::{topics, Component, FileStore, KeyValueStore, TabId, TabManager, TABS_KEY};
use tempfile::tempdir;

#[tokio::test]
async fn test_tabs_survive_restart() {
    let temp = tempdir().unwrap();
    let state = temp.path().join("state");

    {
        let mut tabs = TabManager::new(FileStore::new(&state));
        tabs.init().await.unwrap();
        tabs.create_new_tab("# scratch").unwrap();
        let readme = tabs.open_file_in_tab("/docs/readme.md", "# Readme").unwrap();
        tabs.update_tab_content(&readme, "# Readme\n\nedited");
        tabs.update_tab_cursor(&readme, 3, 7);
        tabs.destroy();
    }

    let mut restored = TabManager::new(FileStore::new(&state));
    let names = Arc::new(Mutex::new(Vec::new()));
    let sink = names.clone();
    restored.on(topics::TAB_RESTORED, move |e| {
        sink.lock().unwrap().push(e.tab().unwrap().file_name().to_string());
        Ok(())
    });
    restored.init().await.unwrap();

    assert_eq!(*names.lock().unwrap(), vec!["untitled.md", "readme.md"]);
    let active = restored.get_active_tab().unwrap();
    assert_eq!(active.id(), &TabId::from("tab-2"));
    assert_eq!(active.content(), "# Readme\n\nedited");
    assert!(active.is_dirty());
    assert_eq!(active.cursor_position().line, 3);

    let next = restored.create_new_tab("").unwrap();
    assert_eq!(next, TabId::from("tab-3"));
}

#[tokio::test]
async fn test_corrupt_state_file_starts_empty() {
    let temp = tempdir().unwrap();
    let state = temp.path().join("state");
    std::fs::create_dir_all(&state).unwrap();
    std::fs::write(state.join("tabs.json"), "{ not json").unwrap();

    let mut tabs = TabManager::new(FileStore::new(&state));
    tabs.init().await.unwrap();

    assert!(!tabs.has_tabs());
    assert_eq!(FileStore::new(&state).get(TABS_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_restore_disabled_by_config() {
    let temp = tempdir().unwrap();
    let config_dir = temp.path().join("config");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[tabs]\nrestore_session = false\n",
    )
    .unwrap();
    let settings: Settings = load_settings(&config_dir);
    let state = temp.path().join("state");

    {
        let mut tabs = TabManager::new(FileStore::new(&state));
        tabs.create_new_tab("kept on disk").unwrap();
    }

    let mut tabs = TabManager::new(FileStore::new(&state))
        .restore_session(settings.tabs.restore_session);
    tabs.init().await.unwrap();

    assert!(!tabs.has_tabs());
}
