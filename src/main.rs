//! mdviewer - A multi-document markdown editor core
//!
//! This is the binary entry point. All tab logic lives in the library crates;
//! the binary wires them to stdin/stdout for scripting.

mod headless;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use mdviewer_app::config::{self, Settings};
use mdviewer_core::ViewMode;

use headless::runner::{run_headless, HeadlessOptions};

/// mdviewer - A multi-document markdown editor core
#[derive(Parser, Debug)]
#[command(name = "mdviewer")]
#[command(
    about = "Headless multi-document markdown editor with session restore",
    long_about = None
)]
struct Args {
    /// Markdown files to open on startup
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Initial view mode (code, preview, split). Defaults to the configured mode.
    #[arg(long)]
    mode: Option<ViewMode>,

    /// Directory holding config.toml
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Keep session state in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Discard unsaved changes without asking
    #[arg(long, short = 'y')]
    assume_yes: bool,

    /// Write a default config.toml and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config_dir = match args.config_dir {
        Some(dir) => dir,
        None => config::default_config_dir()?,
    };

    if args.init_config {
        config::init_config_dir(&config_dir)?;
        eprintln!("Wrote {}", config_dir.join("config.toml").display());
        return Ok(());
    }

    let settings: Settings = config::load_settings(&config_dir);
    let _log_guard = mdviewer_core::logging::init(&config::resolve_log_dir(&settings)?)?;
    tracing::debug!("Config dir: {}", config_dir.display());

    let state_dir = if args.ephemeral {
        None
    } else {
        Some(config::resolve_state_dir(&settings)?)
    };

    let options = HeadlessOptions {
        files: args.files,
        mode: args.mode.unwrap_or(settings.editor.default_mode),
        settings,
        state_dir,
        assume_yes: args.assume_yes,
    };

    run_headless(options).await?;
    Ok(())
}
