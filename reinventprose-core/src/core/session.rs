//! The application coordinator between the UI and the library.
//!
//! A [`Session`] owns the open [`Library`] and the unsaved-changes state. Each
//! editing surface reports its own dirtiness through a [`DirtySource`]; the
//! session is dirty while any source is.

use crate::{
    export_book, Book, BookDraft, Chapter, ConcreteIdea, ExportFormat, ExportLabels, Library, Result,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The editing surfaces that can hold unsaved text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DirtySource {
    BookDetails,
    ChapterContent,
    AbstractIdea,
}

/// The user's answer to "Save changes?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsavedChoice {
    Save,
    Discard,
    Cancel,
}

/// Whether a navigation guarded by [`Session::guard`] may continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Continue; pending edits must be saved first.
    SaveThenProceed,
    /// Continue and throw pending edits away.
    DiscardThenProceed,
    /// Stay where we are.
    Stay,
}

/// An open library plus the dirty flag shared by every view.
pub struct Session {
    library: Library,
    dirty: BTreeSet<DirtySource>,
    /// The chapter whose content and abstract idea the chapter marks belong to.
    edited_chapter: Option<i64>,
}

impl Session {
    /// Opens (or initialises) the library file at `path`.
    ///
    /// # Errors
    ///
    /// Propagates any [`crate::ProseError`] from opening the database; the
    /// desktop shell treats this as fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::with_library(Library::open_or_create(path)?))
    }

    pub fn with_library(library: Library) -> Self {
        Self {
            library,
            dirty: BTreeSet::new(),
            edited_chapter: None,
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    // ── Dirty tracking ────────────────────────────────────────────

    /// Marks `source` as holding unsaved edits. Returns `true` when the
    /// session as a whole just became dirty.
    pub fn mark_dirty(&mut self, source: DirtySource) -> bool {
        let was_dirty = self.is_dirty();
        self.dirty.insert(source);
        !was_dirty
    }

    /// Clears `source`. Returns `true` when the session as a whole just
    /// became clean.
    pub fn clear_dirty(&mut self, source: DirtySource) -> bool {
        let removed = self.dirty.remove(&source);
        removed && !self.is_dirty()
    }

    pub fn clear_all(&mut self) {
        self.dirty.clear();
    }

    /// Records which chapter the editors now show, dropping the chapter
    /// marks left by the previous one.
    pub fn set_edited_chapter(&mut self, chapter_id: Option<i64>) {
        if self.edited_chapter != chapter_id {
            self.clear_chapter_marks();
        }
        self.edited_chapter = chapter_id;
    }

    pub fn edited_chapter(&self) -> Option<i64> {
        self.edited_chapter
    }

    fn clear_chapter_marks(&mut self) {
        self.dirty.remove(&DirtySource::ChapterContent);
        self.dirty.remove(&DirtySource::AbstractIdea);
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn is_source_dirty(&self, source: DirtySource) -> bool {
        self.dirty.contains(&source)
    }

    /// Decides whether a navigation may continue given the user's answer.
    ///
    /// A clean session always proceeds without asking, so `choice` is only
    /// consulted while dirty.
    pub fn guard(&self, choice: Option<UnsavedChoice>) -> NavigationDecision {
        if !self.is_dirty() {
            return NavigationDecision::DiscardThenProceed;
        }
        match choice {
            Some(UnsavedChoice::Save) => NavigationDecision::SaveThenProceed,
            Some(UnsavedChoice::Discard) => NavigationDecision::DiscardThenProceed,
            Some(UnsavedChoice::Cancel) | None => NavigationDecision::Stay,
        }
    }

    /// Main-window title, with a trailing `*` while there are unsaved edits.
    pub fn window_title(&self, app_name: &str, book: Option<&Book>) -> String {
        let mut title = match book {
            Some(book) => format!("{app_name} - {}", book.title),
            None => app_name.to_string(),
        };
        if self.is_dirty() {
            title.push_str(" *");
        }
        title
    }

    // ── Books ─────────────────────────────────────────────────────

    pub fn create_book(&mut self, draft: &BookDraft) -> Result<i64> {
        self.library.create_book(draft)
    }

    pub fn list_books(&self) -> Result<Vec<Book>> {
        self.library.list_books()
    }

    /// Returns `Ok(None)` for a book that has disappeared.
    pub fn book(&self, book_id: i64) -> Result<Option<Book>> {
        not_found_as_none(self.library.get_book(book_id))
    }

    /// Saves the book-details form and clears its dirty mark.
    pub fn save_book_details(&mut self, book_id: i64, draft: &BookDraft) -> Result<Book> {
        let book = self.library.update_book(book_id, draft)?;
        self.clear_dirty(DirtySource::BookDetails);
        Ok(book)
    }

    pub fn delete_book(&mut self, book_id: i64) -> Result<()> {
        self.library.delete_book(book_id)?;
        self.clear_all();
        self.edited_chapter = None;
        Ok(())
    }

    // ── Chapters ──────────────────────────────────────────────────

    pub fn chapters(&self, book_id: i64) -> Result<Vec<Chapter>> {
        self.library.list_chapters(book_id)
    }

    /// Returns `Ok(None)` for a chapter that has disappeared.
    pub fn chapter(&self, chapter_id: i64) -> Result<Option<Chapter>> {
        not_found_as_none(self.library.get_chapter(chapter_id))
    }

    /// Adds a chapter after the last one. Structural changes are written
    /// immediately and leave the dirty flag alone.
    pub fn add_chapter(&mut self, book_id: i64, title: &str) -> Result<Chapter> {
        self.library.append_chapter(book_id, title)
    }

    /// Deletes a chapter. Pending chapter edits are dropped only when they
    /// belong to the deleted chapter.
    pub fn delete_chapter(&mut self, chapter_id: i64) -> Result<()> {
        self.library.delete_chapter(chapter_id)?;
        if self.edited_chapter == Some(chapter_id) {
            self.clear_chapter_marks();
            self.edited_chapter = None;
        }
        Ok(())
    }

    pub fn chapter_count(&self, book_id: i64) -> Result<usize> {
        self.library.count_chapters(book_id)
    }

    pub fn save_chapter_content(&mut self, chapter_id: i64, html: &str) -> Result<()> {
        self.library.update_chapter_content(chapter_id, html)?;
        self.clear_dirty(DirtySource::ChapterContent);
        Ok(())
    }

    pub fn save_abstract_idea(&mut self, chapter_id: i64, idea: &str) -> Result<()> {
        self.library.update_chapter_abstract_idea(chapter_id, idea)?;
        self.clear_dirty(DirtySource::AbstractIdea);
        Ok(())
    }

    // ── Concrete ideas ────────────────────────────────────────────

    pub fn concrete_ideas(&self, chapter_id: i64) -> Result<Vec<ConcreteIdea>> {
        self.library.list_concrete_ideas(chapter_id)
    }

    pub fn add_concrete_idea(&mut self, chapter_id: i64, idea: &str) -> Result<i64> {
        self.library.add_concrete_idea(chapter_id, idea)
    }

    pub fn update_concrete_idea(&mut self, idea_id: i64, idea: &str) -> Result<()> {
        self.library.update_concrete_idea(idea_id, idea)
    }

    pub fn delete_concrete_idea(&mut self, idea_id: i64) -> Result<()> {
        self.library.delete_concrete_idea(idea_id)
    }

    /// Exports what is stored for `book_id`. Unsaved editor text is not
    /// included, so the shell saves first.
    pub fn export_book(
        &self,
        book_id: i64,
        format: ExportFormat,
        labels: ExportLabels,
        path: &Path,
    ) -> Result<PathBuf> {
        export_book(&self.library, book_id, format, labels, path)
    }
}

fn not_found_as_none<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
