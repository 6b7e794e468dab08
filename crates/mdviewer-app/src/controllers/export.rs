//! HTML export of the active document

use std::path::{Path, PathBuf};

use mdviewer_core::prelude::*;

use crate::component::{Component, ComponentBase};
use crate::event::AppEvent;
use crate::services::{escape_html, FileIo, FilePicker, MarkdownRenderer};
use crate::tab_manager::TabManager;

pub struct ExportController<F, P, R> {
    base: ComponentBase,
    io: F,
    picker: P,
    renderer: R,
}

impl<F, P, R> std::fmt::Debug for ExportController<F, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportController").finish_non_exhaustive()
    }
}

impl<F: FileIo, P: FilePicker, R: MarkdownRenderer> ExportController<F, P, R> {
    pub const NAME: &'static str = "ExportController";

    pub fn new(io: F, picker: P, renderer: R) -> Self {
        Self {
            base: ComponentBase::new(Self::NAME),
            io,
            picker,
            renderer,
        }
    }

    /// Render the active tab to a standalone HTML file.
    ///
    /// Returns the written path, or `None` if the picker was dismissed.
    pub async fn export_html(&mut self, tabs: &TabManager) -> Result<Option<PathBuf>> {
        let tab = tabs.get_active_tab().ok_or(Error::NoActiveTab)?;
        let title = document_title(tab.file_name());
        let body = self.renderer.render(tab.content())?;
        let html = standalone_html(&title, &body);

        let Some(path) = self.picker.pick_save_path(&format!("{}.html", title)).await? else {
            debug!("Export dialog dismissed");
            return Ok(None);
        };

        self.io.write(&path, &html).await?;
        info!("Exported {} to {:?}", tab.id(), path);
        self.base.emit(AppEvent::Exported { path: path.clone() });
        Ok(Some(path))
    }
}

/// File name without its extension
fn document_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "document".to_string())
}

/// Wrap rendered markdown in a complete HTML document
pub fn standalone_html(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n\
         </head>\n\
         <body>\n\
         <article class=\"markdown-body\">\n\
         {}\n\
         </article>\n\
         </body>\n\
         </html>\n",
        escape_html(title),
        body
    )
}

impl<F: FileIo, P: FilePicker, R: MarkdownRenderer> Component for ExportController<F, P, R> {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ComponentBase {
        &mut self.base
    }
}
