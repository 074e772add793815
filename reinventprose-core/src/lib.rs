//! Core library for ReinventProse, a local-first manager for books, chapters,
//! and the ideas behind them.
//!
//! The primary entry point is [`Session`], which owns an open [`Library`]
//! (the SQLite store) and tracks unsaved edits. Exporters for plain text,
//! Word and PDF live in [`export`](core::export).
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    assets::{asset_path, BUNDLED_ASSETS},
    book::{Book, BookDraft},
    chapter::{Chapter, ConcreteIdea},
    error::{ProseError, Result},
    export::{
        default_file_name, export_book, exporter_for, ExportError, ExportFormat, ExportLabels,
        Exporter,
    },
    layout::{Axis, LayoutNode, PaneKind, PaneLayout},
    library::Library,
    markup::{to_plain_text, RichText, Span, SpanStyle},
    session::{DirtySource, NavigationDecision, Session, UnsavedChoice},
    storage::Storage,
};

/// Application version shown in the About dialog and stamped into exports.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product name used for window titles and document metadata.
pub const APP_NAME: &str = "ReinventProse 2.0";
