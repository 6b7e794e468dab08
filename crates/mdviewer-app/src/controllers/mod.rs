//! User-facing controllers
//!
//! Controllers turn user actions (open, save, export) into Tab Manager calls,
//! doing the collaborator I/O first so a failed read or write never leaves
//! tabs half-updated.

pub mod export;
pub mod file;

#[cfg(test)]
pub(crate) mod test_utils;

pub use export::{standalone_html, ExportController};
pub use file::FileController;
