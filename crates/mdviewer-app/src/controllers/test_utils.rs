//! Hand-written fakes for the async collaborator traits

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use mdviewer_core::prelude::*;

use crate::services::{Confirmer, FileIo, FilePicker};

/// In-memory filesystem
#[derive(Default)]
pub struct FakeFs {
    files: Mutex<HashMap<PathBuf, String>>,
    reads: AtomicUsize,
    fail_writes: bool,
}

impl FakeFs {
    /// Every write fails with `FileWrite`
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Default::default()
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn put(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), content.to_string());
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        self.files.lock().unwrap().get(Path::new(path)).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FileIo for FakeFs {
    async fn read(&self, path: &Path) -> Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::file_read(path, "No such file"))
    }

    async fn write(&self, path: &Path, content: &str) -> Result<()> {
        if self.fail_writes {
            return Err(Error::file_write(path, "Read-only filesystem"));
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

/// Picker returning a fixed answer and recording suggested names
#[derive(Default)]
pub struct FakePicker {
    pub answer: Option<PathBuf>,
    suggestions: Mutex<Vec<String>>,
}

impl FakePicker {
    pub fn choosing(path: &str) -> Self {
        Self {
            answer: Some(PathBuf::from(path)),
            ..Default::default()
        }
    }

    pub fn dismissed() -> Self {
        Self::default()
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.suggestions.lock().unwrap().clone()
    }
}

impl FilePicker for FakePicker {
    async fn pick_save_path(&self, suggested_name: &str) -> Result<Option<PathBuf>> {
        self.suggestions
            .lock()
            .unwrap()
            .push(suggested_name.to_string());
        Ok(self.answer.clone())
    }
}

/// Confirmer with a fixed answer that counts prompts
#[derive(Default)]
pub struct CountingConfirmer {
    pub answer: bool,
    asked: AtomicUsize,
}

impl CountingConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Default::default()
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirmer for CountingConfirmer {
    async fn confirm(&self, _title: &str, _message: &str) -> Result<bool> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}
