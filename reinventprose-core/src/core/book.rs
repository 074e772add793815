use serde::{Deserialize, Serialize};

use crate::{ProseError, Result};

/// A writing project as stored in the `books` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub synopsis: String,
    /// Rich markup, same dialect as chapter content.
    pub prologue: String,
    pub back_cover_text: String,
    pub cover_image_path: Option<String>,
    pub created_at: i64,
    pub modified_at: i64,
}

/// The user-editable fields of a [`Book`], used for both creation and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub synopsis: String,
    pub prologue: String,
    pub back_cover_text: String,
    pub cover_image_path: Option<String>,
}

impl BookDraft {
    /// Shorthand for the new-book dialog, which only asks for these three.
    pub fn new(title: impl Into<String>, author: impl Into<String>, synopsis: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            synopsis: synopsis.into(),
            ..Self::default()
        }
    }

    /// Trims the single-line fields and checks that title and author are present.
    ///
    /// An empty cover path is normalised to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::Validation`] naming the first missing field.
    pub fn validate(&self) -> Result<Self> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ProseError::Validation("Please enter a title for the book.".to_string()));
        }
        let author = self.author.trim();
        if author.is_empty() {
            return Err(ProseError::Validation("Please enter an author for the book.".to_string()));
        }
        Ok(Self {
            title: title.to_string(),
            author: author.to_string(),
            synopsis: self.synopsis.trim().to_string(),
            prologue: self.prologue.clone(),
            back_cover_text: self.back_cover_text.trim().to_string(),
            cover_image_path: self
                .cover_image_path
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        })
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            synopsis: book.synopsis.clone(),
            prologue: book.prologue.clone(),
            back_cover_text: book.back_cover_text.clone(),
            cover_image_path: book.cover_image_path.clone(),
        }
    }
}
