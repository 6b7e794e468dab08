//! # mdviewer-core - Core Domain Types
//!
//! Foundation crate for the markdown viewer. Provides domain value types,
//! error handling and the logging bootstrap.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ViewMode`] - Layout mode (code, preview, split)
//! - [`CursorPosition`] - 1-based line/column
//! - [`ScrollPosition`] - Editor and preview scroll offsets
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Error enum grouped by layer (tabs, persistence, config, collaborators)
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use mdviewer_core::prelude::*;
//! ```

pub mod error;
pub mod logging;
pub mod prelude;
pub mod types;

pub use error::{Error, Result};
pub use types::{CursorPosition, ScrollPosition, ViewMode};
