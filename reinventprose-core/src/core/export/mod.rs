//! Book export to plain text, Word and PDF.
//!
//! Every format implements [`Exporter`]. Word and PDF are behind the `docx`
//! and `pdf` cargo features; a build without one of them still exports the
//! others and reports [`ExportError::Unavailable`] for the missing format.

#[cfg(feature = "docx")]
mod docx;
#[cfg(feature = "pdf")]
mod pdf;
mod txt;

#[cfg(feature = "docx")]
pub use docx::DocxExporter;
#[cfg(feature = "pdf")]
pub use pdf::PdfExporter;
pub use txt::TxtExporter;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::image_info::ImageInfo;
use crate::{Book, Chapter, Library};

/// The formats a book can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Txt,
    Docx,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Txt, Self::Docx, Self::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Docx => "docx",
            Self::Pdf => "pdf",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Txt => "Plain text",
            Self::Docx => "Word document",
            Self::Pdf => "PDF document",
        }
    }

    /// Whether this build was compiled with the back-end for the format.
    pub fn is_available(self) -> bool {
        match self {
            Self::Txt => true,
            Self::Docx => cfg!(feature = "docx"),
            Self::Pdf => cfg!(feature = "pdf"),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Errors specific to writing an export file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "docx")]
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unsupported image: {0}")]
    Image(String),

    #[error("{} export is not available in this build", .0.label())]
    Unavailable(ExportFormat),

    #[error("PDF error: {0}")]
    Pdf(String),
}

impl ExportError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(e) => format!("Could not write the export file: {e}"),
            #[cfg(feature = "docx")]
            Self::Zip(e) => format!("Could not build the Word document: {e}"),
            Self::Image(msg) => format!("The cover image could not be used: {msg}"),
            Self::Unavailable(format) => {
                format!("{} export is not available in this installation.", format.label())
            }
            Self::Pdf(msg) => format!("Could not build the PDF: {msg}"),
        }
    }
}

/// The fixed words written into an exported book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLabels {
    /// Prefix before the author's name.
    pub by: &'static str,
    pub index: &'static str,
    pub prologue: &'static str,
    /// Used in index entries, e.g. `Capítulo 2: Title`.
    pub chapter: &'static str,
    /// Used in chapter headings, e.g. `CAPÍTULO 2: TITLE`.
    pub chapter_heading: &'static str,
    pub no_chapters: &'static str,
    pub no_content: &'static str,
    pub fallback_file_name: &'static str,
}

impl Default for ExportLabels {
    fn default() -> Self {
        Self {
            by: "Por:",
            index: "ÍNDICE",
            prologue: "PRÓLOGO",
            chapter: "Capítulo",
            chapter_heading: "CAPÍTULO",
            no_chapters: "(No hay capítulos)",
            no_content: "No hay contenido de capítulos para exportar.",
            fallback_file_name: "libro_exportado",
        }
    }
}

impl ExportLabels {
    pub fn english() -> Self {
        Self {
            by: "By:",
            index: "CONTENTS",
            prologue: "PROLOGUE",
            chapter: "Chapter",
            chapter_heading: "CHAPTER",
            no_chapters: "(No chapters)",
            no_content: "There is no chapter content to export.",
            fallback_file_name: "exported_book",
        }
    }

    /// Labels for a settings language code; anything but `en` is Spanish.
    pub fn for_language(code: &str) -> Self {
        if code.eq_ignore_ascii_case("en") {
            Self::english()
        } else {
            Self::default()
        }
    }

    fn author_line(&self, author: &str) -> String {
        format!("{} {author}", self.by)
    }

    fn index_entry(&self, chapter: &Chapter) -> String {
        format!("{} {}: {}", self.chapter, chapter.chapter_number, chapter.title.trim())
    }

    fn chapter_header(&self, chapter: &Chapter) -> String {
        format!(
            "{} {}: {}",
            self.chapter_heading,
            chapter.chapter_number,
            chapter.title.trim()
        )
        .to_uppercase()
    }
}

/// A renderer for one export format.
pub trait Exporter {
    fn format(&self) -> ExportFormat;

    /// Renders the whole book into the bytes of the output file.
    ///
    /// `chapters` may be in any order; they are written by chapter number.
    fn render(&self, book: &Book, chapters: &[Chapter]) -> Result<Vec<u8>, ExportError>;

    /// Renders and writes the book to `path`, creating parent directories.
    fn export(&self, book: &Book, chapters: &[Chapter], path: &Path) -> Result<(), ExportError> {
        let bytes = self.render(book, chapters)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        log::info!(
            "exported \"{}\" as {} to {} ({} bytes)",
            book.title,
            self.format(),
            path.display(),
            bytes.len()
        );
        Ok(())
    }
}

/// Returns the exporter for `format`, or [`ExportError::Unavailable`] when
/// this build lacks it.
pub fn exporter_for(
    format: ExportFormat,
    labels: ExportLabels,
) -> Result<Box<dyn Exporter>, ExportError> {
    match format {
        ExportFormat::Txt => Ok(Box::new(TxtExporter::new(labels))),
        #[cfg(feature = "docx")]
        ExportFormat::Docx => Ok(Box::new(DocxExporter::new(labels))),
        #[cfg(feature = "pdf")]
        ExportFormat::Pdf => Ok(Box::new(PdfExporter::new(labels))),
        #[allow(unreachable_patterns)]
        other => {
            log::warn!("{} export requested but not compiled in", other.label());
            Err(ExportError::Unavailable(other))
        }
    }
}

/// Loads a book and its chapters from `library` and writes them to `path`.
///
/// Returns the path written so the caller can report it.
pub fn export_book(
    library: &Library,
    book_id: i64,
    format: ExportFormat,
    labels: ExportLabels,
    path: &Path,
) -> crate::Result<PathBuf> {
    let exporter = exporter_for(format, labels)?;
    let book = library.get_book(book_id)?;
    let chapters = library.list_chapters(book_id)?;
    exporter.export(&book, &chapters, path)?;
    Ok(path.to_path_buf())
}

/// Suggested file name for exporting a book titled `title`.
///
/// Keeps letters, digits, spaces, `-` and `_`, trims, then turns spaces into
/// underscores.
pub fn default_file_name(title: &str, format: ExportFormat, labels: &ExportLabels) -> String {
    let kept: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let stem = kept.trim().replace(' ', "_");
    let stem = if stem.is_empty() {
        labels.fallback_file_name
    } else {
        stem.as_str()
    };
    format!("{stem}.{}", format.extension())
}

fn sorted_chapters(chapters: &[Chapter]) -> Vec<&Chapter> {
    let mut sorted: Vec<&Chapter> = chapters.iter().collect();
    sorted.sort_by_key(|c| c.chapter_number);
    sorted
}

/// A cover image read from disk, ready to embed.
struct Cover {
    data: Vec<u8>,
    info: ImageInfo,
}

/// Reads the book's cover image. Any problem is logged and the cover is
/// skipped; a bad cover never fails an export.
fn load_cover(book: &Book) -> Option<Cover> {
    let path = book.cover_image_path.as_deref()?;
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("skipping cover image {path}: {e}");
            return None;
        }
    };
    match ImageInfo::parse(&data) {
        Some(info) => Some(Cover { data, info }),
        None => {
            log::warn!("skipping cover image {path}: not a PNG or JPEG file");
            None
        }
    }
}
