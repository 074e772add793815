//! Error types for the ReinventProse core library.

use thiserror::Error;

use crate::core::export::ExportError;

/// All errors that can occur within the ReinventProse core library.
#[derive(Debug, Error)]
pub enum ProseError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A book ID was requested that does not exist in the library.
    #[error("Book not found: {0}")]
    BookNotFound(i64),

    /// A chapter ID was requested that does not exist in the library.
    #[error("Chapter not found: {0}")]
    ChapterNotFound(i64),

    /// A concrete idea ID was requested that does not exist in the library.
    #[error("Concrete idea not found: {0}")]
    IdeaNotFound(i64),

    /// Book titles are unique across the library.
    #[error("A book titled '{0}' already exists")]
    DuplicateTitle(String),

    /// Chapter numbers are unique within a book.
    #[error("Book {book_id} already has a chapter number {number}")]
    DuplicateChapterNumber { book_id: i64, number: i64 },

    /// A required field was empty or otherwise rejected before saving.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The opened file is not a ReinventProse library.
    #[error("Invalid library: {0}")]
    InvalidLibrary(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or layout data could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing an export file failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Convenience alias that pins the error type to [`ProseError`].
pub type Result<T> = std::result::Result<T, ProseError>;

impl ProseError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::BookNotFound(_) => "The book no longer exists".to_string(),
            Self::ChapterNotFound(_) => "The chapter no longer exists".to_string(),
            Self::IdeaNotFound(_) => "The idea no longer exists".to_string(),
            Self::DuplicateTitle(title) => {
                format!("Another book is already titled \"{title}\". Please choose a different title.")
            }
            Self::DuplicateChapterNumber { number, .. } => {
                format!("Chapter {number} already exists in this book")
            }
            Self::Validation(msg) => msg.clone(),
            Self::InvalidLibrary(_) => "Could not open the library file".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
            Self::Export(e) => e.user_message(),
        }
    }

    /// `true` for the not-found family, which the UI treats as "nothing to show"
    /// rather than as a failure worth a dialog.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::BookNotFound(_) | Self::ChapterNotFound(_) | Self::IdeaNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_title_message_names_the_title() {
        let e = ProseError::DuplicateTitle("Dune".to_string());
        assert!(e.to_string().contains("Dune"));
        assert!(e.user_message().contains("Dune"));
    }

    #[test]
    fn test_not_found_family() {
        assert!(ProseError::BookNotFound(1).is_not_found());
        assert!(ProseError::ChapterNotFound(1).is_not_found());
        assert!(ProseError::IdeaNotFound(1).is_not_found());
        assert!(!ProseError::Validation("x".into()).is_not_found());
    }

    #[test]
    fn test_validation_user_message_is_passed_through() {
        let e = ProseError::Validation("Title is required".to_string());
        assert_eq!(e.user_message(), "Title is required");
    }
}
