//! Settings parser for `config.toml`

use std::path::{Path, PathBuf};

use mdviewer_core::prelude::*;

use super::types::Settings;

const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "mdviewer";

/// Default configuration directory (`<config_dir>/mdviewer`)
pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| Error::config("Could not determine config directory"))
}

/// Resolve where session state is stored.
///
/// An empty `[storage] state_dir` means `<data_local_dir>/mdviewer/state`.
pub fn resolve_state_dir(settings: &Settings) -> Result<PathBuf> {
    if !settings.storage.state_dir.as_os_str().is_empty() {
        return Ok(settings.storage.state_dir.clone());
    }
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR).join("state"))
        .ok_or_else(|| Error::config("Could not determine data directory"))
}

/// Resolve where log files are written: `logs/` beside the session state.
pub fn resolve_log_dir(settings: &Settings) -> Result<PathBuf> {
    let state_dir = resolve_state_dir(settings)?;
    Ok(match state_dir.parent() {
        Some(parent) if settings.storage.state_dir.as_os_str().is_empty() => parent.join("logs"),
        _ => state_dir.join("logs"),
    })
}

/// Load settings from `<config_dir>/config.toml`.
///
/// Missing or unparsable files yield defaults.
pub fn load_settings(config_dir: &Path) -> Settings {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create the config directory with a commented default `config.toml`
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        let default_content = r##"# Markdown Viewer Configuration

[tabs]
max_tabs = 50           # Hard cap on open tabs
warn_threshold = 45     # Warn once this many tabs are open
restore_session = true  # Reopen last session's tabs on startup

[editor]
default_mode = "preview"   # code | preview | split
new_document_template = "# New Document\n\nStart writing your markdown here..."

[storage]
state_dir = ""          # Empty: platform data directory
"##;
        std::fs::write(&config_path, default_content)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = tempdir().unwrap();
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILENAME), "[tabs\nmax_tabs = ").unwrap();
        assert_eq!(load_settings(temp.path()), Settings::default());
    }

    #[test]
    fn test_init_writes_parsable_defaults() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("mdviewer");

        init_config_dir(&dir).unwrap();

        let content = std::fs::read_to_string(dir.join(CONFIG_FILENAME)).unwrap();
        let parsed: Settings = toml::from_str(&content).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILENAME), "[tabs]\nmax_tabs = 3\n").unwrap();

        init_config_dir(temp.path()).unwrap();

        assert_eq!(load_settings(temp.path()).tabs.max_tabs, 3);
    }

    #[test]
    fn test_explicit_state_dir_wins() {
        let mut settings = Settings::default();
        settings.storage.state_dir = PathBuf::from("/tmp/mdviewer-state");
        assert_eq!(
            resolve_state_dir(&settings).unwrap(),
            PathBuf::from("/tmp/mdviewer-state")
        );
    }

    #[test]
    fn test_log_dir_follows_state_dir() {
        let mut settings = Settings::default();
        settings.storage.state_dir = PathBuf::from("/srv/notes-state");
        assert_eq!(
            resolve_log_dir(&settings).unwrap(),
            PathBuf::from("/srv/notes-state/logs")
        );
    }
}
