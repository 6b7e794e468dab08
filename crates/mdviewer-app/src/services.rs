//! Collaborator traits consumed by the controllers
//!
//! The tab-management core never touches the filesystem, dialogs or the
//! markdown renderer directly. Each capability is a trait so the host (GUI,
//! headless runner, tests) can supply its own implementation.
//!
//! Async traits follow the `trait_variant` pattern: implement the `Send`
//! variant (`FileIo`, `Confirmer`, ...) and take it as a generic bound.

use std::path::{Path, PathBuf};

use mdviewer_core::prelude::*;

/// Yes/no prompt shown before discarding unsaved changes
#[trait_variant::make(Confirmer: Send)]
pub trait LocalConfirmer {
    async fn confirm(&self, title: &str, message: &str) -> Result<bool>;
}

/// Raw document I/O
#[trait_variant::make(FileIo: Send)]
pub trait LocalFileIo {
    async fn read(&self, path: &Path) -> Result<String>;

    async fn write(&self, path: &Path, content: &str) -> Result<()>;
}

/// Save-location dialog
#[trait_variant::make(FilePicker: Send)]
pub trait LocalFilePicker {
    /// Ask for a target path. `None` means the dialog was dismissed.
    async fn pick_save_path(&self, suggested_name: &str) -> Result<Option<PathBuf>>;
}

/// Markdown to HTML conversion
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Default implementations
// ─────────────────────────────────────────────────────────────────────────────

/// [`FileIo`] over `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileIo;

impl FileIo for TokioFileIo {
    async fn read(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::file_read(path, e.to_string()))
    }

    async fn write(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::file_write(path, e.to_string()))?;
        }
        tokio::fs::write(path, content)
            .await
            .map_err(|e| Error::file_write(path, e.to_string()))
    }
}

/// [`Confirmer`] that always gives the same answer (non-interactive runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    async fn confirm(&self, title: &str, message: &str) -> Result<bool> {
        debug!("Confirm '{}': {} -> {}", title, message, self.0);
        Ok(self.0)
    }
}

/// [`FilePicker`] that places the suggested name inside a fixed directory
#[derive(Debug, Clone)]
pub struct DirectoryPicker {
    dir: PathBuf,
}

impl DirectoryPicker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl FilePicker for DirectoryPicker {
    async fn pick_save_path(&self, suggested_name: &str) -> Result<Option<PathBuf>> {
        Ok(Some(self.dir.join(suggested_name)))
    }
}

/// [`MarkdownRenderer`] that shows the source verbatim inside `<pre>`
#[derive(Debug, Clone, Copy, Default)]
pub struct PreformattedRenderer;

impl MarkdownRenderer for PreformattedRenderer {
    fn render(&self, markdown: &str) -> Result<String> {
        Ok(format!("<pre>{}</pre>", escape_html(markdown)))
    }
}

/// Escape the five HTML-significant characters
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_tokio_file_io_round_trip() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("a.md");

        FileIo::write(&TokioFileIo, &path, "# hi").await.unwrap();
        let content = FileIo::read(&TokioFileIo, &path).await.unwrap();

        assert_eq!(content, "# hi");
    }

    #[tokio::test]
    async fn test_tokio_file_io_missing_file() {
        let temp = tempdir().unwrap();
        let err = FileIo::read(&TokioFileIo, &temp.path().join("missing.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_fixed_answer() {
        assert!(tokio_test::block_on(Confirmer::confirm(&FixedAnswer(true), "t", "m")).unwrap());
        assert!(!tokio_test::block_on(Confirmer::confirm(&FixedAnswer(false), "t", "m")).unwrap());
    }

    #[test]
    fn test_directory_picker_joins_name() {
        let picker = DirectoryPicker::new("/out");
        let path = tokio_test::block_on(FilePicker::pick_save_path(&picker, "a.html")).unwrap();
        assert_eq!(path, Some(PathBuf::from("/out/a.html")));
    }

    #[test]
    fn test_preformatted_renderer_escapes() {
        let html = PreformattedRenderer.render("a < b & \"c\"").unwrap();
        assert_eq!(html, "<pre>a &lt; b &amp; &quot;c&quot;</pre>");
    }
}
