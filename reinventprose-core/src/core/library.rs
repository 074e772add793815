//! CRUD operations over a ReinventProse SQLite library.

use crate::{Book, BookDraft, Chapter, ConcreteIdea, ProseError, Result, Storage};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

const BOOK_COLUMNS: &str =
    "id, title, author, synopsis, prologue, back_cover_text, cover_image_path, created_at, modified_at";

const CHAPTER_COLUMNS: &str =
    "id, book_id, chapter_number, title, content, abstract_idea, created_at, modified_at";

/// An open library of books backed by a SQLite database.
///
/// `Library` is the only type that issues SQL. Every mutation runs inside its
/// own transaction, so a failed call leaves the file untouched.
pub struct Library {
    storage: Storage,
}

impl Library {
    /// Opens the library at `path`, creating and initialising it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::InvalidLibrary`] if the file is a SQLite database
    /// of some other application, or [`ProseError::Database`] for any SQLite
    /// failure.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            storage: Storage::open_or_create(path)?,
        })
    }

    /// Creates an empty library that lives only as long as the returned value.
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            storage: Storage::in_memory()?,
        })
    }

    /// Returns the underlying SQLite connection.
    pub fn connection(&self) -> &Connection {
        self.storage.connection()
    }

    // ── Books ──────────────────────────────────────────────────────

    /// Inserts a new book and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::Validation`] if title or author is blank, or
    /// [`ProseError::DuplicateTitle`] if another book already uses the title.
    pub fn create_book(&mut self, draft: &BookDraft) -> Result<i64> {
        let draft = draft.validate()?;
        let now = chrono::Utc::now().timestamp();

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "INSERT INTO books (title, author, synopsis, prologue, back_cover_text, cover_image_path, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                draft.title,
                draft.author,
                draft.synopsis,
                draft.prologue,
                draft.back_cover_text,
                draft.cover_image_path,
                now,
                now,
            ],
        )
        .map_err(|e| duplicate_title_or(e, &draft.title))?;
        let book_id = tx.last_insert_rowid();
        tx.commit()?;

        log::info!("Created book {book_id} '{}'", draft.title);
        Ok(book_id)
    }

    /// Fetches a single book by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::BookNotFound`] if no book has this ID.
    pub fn get_book(&self, book_id: i64) -> Result<Book> {
        self.connection()
            .query_row(
                &format!("SELECT {BOOK_COLUMNS} FROM books WHERE id = ?"),
                [book_id],
                map_book_row,
            )
            .optional()?
            .ok_or(ProseError::BookNotFound(book_id))
    }

    /// Returns every book, ordered by title.
    pub fn list_books(&self) -> Result<Vec<Book>> {
        let mut stmt = self
            .connection()
            .prepare(&format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title"))?;
        let books = stmt
            .query_map([], map_book_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(books)
    }

    /// Replaces every editable field of a book and returns the stored row.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::BookNotFound`], [`ProseError::Validation`], or
    /// [`ProseError::DuplicateTitle`].
    pub fn update_book(&mut self, book_id: i64, draft: &BookDraft) -> Result<Book> {
        let draft = draft.validate()?;
        let now = chrono::Utc::now().timestamp();

        let tx = self.storage.connection_mut().transaction()?;
        let changed = tx
            .execute(
                "UPDATE books
                 SET title = ?, author = ?, synopsis = ?, prologue = ?, back_cover_text = ?,
                     cover_image_path = ?, modified_at = ?
                 WHERE id = ?",
                rusqlite::params![
                    draft.title,
                    draft.author,
                    draft.synopsis,
                    draft.prologue,
                    draft.back_cover_text,
                    draft.cover_image_path,
                    now,
                    book_id,
                ],
            )
            .map_err(|e| duplicate_title_or(e, &draft.title))?;

        // An UPDATE on a missing row succeeds but touches nothing.
        if changed == 0 {
            return Err(ProseError::BookNotFound(book_id));
        }
        tx.commit()?;

        self.get_book(book_id)
    }

    /// Deletes a book together with all of its chapters and their ideas.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::BookNotFound`] if no book has this ID.
    pub fn delete_book(&mut self, book_id: i64) -> Result<()> {
        let tx = self.storage.connection_mut().transaction()?;
        let deleted = tx.execute("DELETE FROM books WHERE id = ?", [book_id])?;
        if deleted == 0 {
            return Err(ProseError::BookNotFound(book_id));
        }
        tx.commit()?;

        log::info!("Deleted book {book_id}");
        Ok(())
    }

    /// Number of chapters in a book; `0` for unknown books.
    pub fn count_chapters(&self, book_id: i64) -> Result<usize> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM chapters WHERE book_id = ?",
            [book_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    // ── Chapters ───────────────────────────────────────────────────

    /// Inserts a chapter with an explicit number and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::Validation`] for a blank title or a number below 1,
    /// [`ProseError::BookNotFound`] if the book does not exist, or
    /// [`ProseError::DuplicateChapterNumber`] if the number is taken.
    pub fn create_chapter(
        &mut self,
        book_id: i64,
        chapter_number: i64,
        title: &str,
        content: &str,
        abstract_idea: &str,
    ) -> Result<i64> {
        let title = validate_chapter_fields(chapter_number, title)?;
        let now = chrono::Utc::now().timestamp();

        let tx = self.storage.connection_mut().transaction()?;
        ensure_book_exists(&tx, book_id)?;
        tx.execute(
            "INSERT INTO chapters (book_id, chapter_number, title, content, abstract_idea, created_at, modified_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            rusqlite::params![book_id, chapter_number, title, content, abstract_idea, now, now],
        )
        .map_err(|e| duplicate_number_or(e, book_id, chapter_number))?;
        let chapter_id = tx.last_insert_rowid();
        tx.commit()?;

        log::info!("Created chapter {chapter_id} (#{chapter_number}) in book {book_id}");
        Ok(chapter_id)
    }

    /// Appends an empty chapter after the current last one and returns it.
    pub fn append_chapter(&mut self, book_id: i64, title: &str) -> Result<Chapter> {
        let number = self.next_chapter_number(book_id)?;
        let chapter_id = self.create_chapter(book_id, number, title, "", "")?;
        self.get_chapter(chapter_id)
    }

    /// One past the highest chapter number of the book, or `1` when it has none.
    pub fn next_chapter_number(&self, book_id: i64) -> Result<i64> {
        let next: i64 = self.connection().query_row(
            "SELECT COALESCE(MAX(chapter_number), 0) + 1 FROM chapters WHERE book_id = ?",
            [book_id],
            |row| row.get(0),
        )?;
        Ok(next)
    }

    /// Fetches a single chapter by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::ChapterNotFound`] if no chapter has this ID.
    pub fn get_chapter(&self, chapter_id: i64) -> Result<Chapter> {
        self.connection()
            .query_row(
                &format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?"),
                [chapter_id],
                map_chapter_row,
            )
            .optional()?
            .ok_or(ProseError::ChapterNotFound(chapter_id))
    }

    /// Returns the chapters of a book ordered by chapter number.
    pub fn list_chapters(&self, book_id: i64) -> Result<Vec<Chapter>> {
        let mut stmt = self.connection().prepare(&format!(
            "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE book_id = ? ORDER BY chapter_number"
        ))?;
        let chapters = stmt
            .query_map([book_id], map_chapter_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(chapters)
    }

    /// Rewrites number, title, content, and abstract idea of a chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::ChapterNotFound`], [`ProseError::Validation`], or
    /// [`ProseError::DuplicateChapterNumber`].
    pub fn update_chapter(
        &mut self,
        chapter_id: i64,
        chapter_number: i64,
        title: &str,
        content: &str,
        abstract_idea: &str,
    ) -> Result<Chapter> {
        let title = validate_chapter_fields(chapter_number, title)?;
        let existing = self.get_chapter(chapter_id)?;
        let now = chrono::Utc::now().timestamp();

        let tx = self.storage.connection_mut().transaction()?;
        tx.execute(
            "UPDATE chapters
             SET chapter_number = ?, title = ?, content = ?, abstract_idea = ?, modified_at = ?
             WHERE id = ?",
            rusqlite::params![chapter_number, title, content, abstract_idea, now, chapter_id],
        )
        .map_err(|e| duplicate_number_or(e, existing.book_id, chapter_number))?;
        tx.commit()?;

        self.get_chapter(chapter_id)
    }

    /// Replaces only the rich-text content of a chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::ChapterNotFound`] if no chapter has this ID.
    pub fn update_chapter_content(&mut self, chapter_id: i64, content: &str) -> Result<()> {
        self.update_chapter_column(chapter_id, "content", content)
    }

    /// Replaces only the abstract idea of a chapter.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::ChapterNotFound`] if no chapter has this ID.
    pub fn update_chapter_abstract_idea(&mut self, chapter_id: i64, abstract_idea: &str) -> Result<()> {
        self.update_chapter_column(chapter_id, "abstract_idea", abstract_idea)
    }

    fn update_chapter_column(&mut self, chapter_id: i64, column: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.storage.connection_mut().transaction()?;
        let changed = tx.execute(
            &format!("UPDATE chapters SET {column} = ?, modified_at = ? WHERE id = ?"),
            rusqlite::params![value, now, chapter_id],
        )?;
        if changed == 0 {
            return Err(ProseError::ChapterNotFound(chapter_id));
        }
        tx.commit()?;
        Ok(())
    }

    /// Deletes a chapter and its concrete ideas.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::ChapterNotFound`] if no chapter has this ID.
    pub fn delete_chapter(&mut self, chapter_id: i64) -> Result<()> {
        let tx = self.storage.connection_mut().transaction()?;
        let deleted = tx.execute("DELETE FROM chapters WHERE id = ?", [chapter_id])?;
        if deleted == 0 {
            return Err(ProseError::ChapterNotFound(chapter_id));
        }
        tx.commit()?;

        log::info!("Deleted chapter {chapter_id}");
        Ok(())
    }

    // ── Concrete ideas ─────────────────────────────────────────────

    /// Attaches a new concrete idea to a chapter and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::Validation`] for blank text or
    /// [`ProseError::ChapterNotFound`] if the chapter does not exist.
    pub fn add_concrete_idea(&mut self, chapter_id: i64, idea: &str) -> Result<i64> {
        let idea = validate_idea(idea)?;

        let tx = self.storage.connection_mut().transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM chapters WHERE id = ?", [chapter_id], |_| Ok(()))
            .optional()?;
        if exists.is_none() {
            return Err(ProseError::ChapterNotFound(chapter_id));
        }
        tx.execute(
            "INSERT INTO concrete_ideas (chapter_id, idea) VALUES (?, ?)",
            rusqlite::params![chapter_id, idea],
        )?;
        let idea_id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(idea_id)
    }

    /// Returns the concrete ideas of a chapter in insertion order.
    pub fn list_concrete_ideas(&self, chapter_id: i64) -> Result<Vec<ConcreteIdea>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, chapter_id, idea FROM concrete_ideas WHERE chapter_id = ? ORDER BY id",
        )?;
        let ideas = stmt
            .query_map([chapter_id], |row| {
                Ok(ConcreteIdea {
                    id: row.get(0)?,
                    chapter_id: row.get(1)?,
                    idea: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ideas)
    }

    /// Replaces the text of a concrete idea.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::Validation`] for blank text or
    /// [`ProseError::IdeaNotFound`] if no idea has this ID.
    pub fn update_concrete_idea(&mut self, idea_id: i64, idea: &str) -> Result<()> {
        let idea = validate_idea(idea)?;
        let tx = self.storage.connection_mut().transaction()?;
        let changed = tx.execute(
            "UPDATE concrete_ideas SET idea = ? WHERE id = ?",
            rusqlite::params![idea, idea_id],
        )?;
        if changed == 0 {
            return Err(ProseError::IdeaNotFound(idea_id));
        }
        tx.commit()?;
        Ok(())
    }

    /// Removes a concrete idea.
    ///
    /// # Errors
    ///
    /// Returns [`ProseError::IdeaNotFound`] if no idea has this ID.
    pub fn delete_concrete_idea(&mut self, idea_id: i64) -> Result<()> {
        let tx = self.storage.connection_mut().transaction()?;
        let deleted = tx.execute("DELETE FROM concrete_ideas WHERE id = ?", [idea_id])?;
        if deleted == 0 {
            return Err(ProseError::IdeaNotFound(idea_id));
        }
        tx.commit()?;
        Ok(())
    }
}

fn map_book_row(row: &rusqlite::Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        synopsis: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        prologue: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        back_cover_text: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        cover_image_path: row
            .get::<_, Option<String>>(6)?
            .filter(|p| !p.trim().is_empty()),
        created_at: row.get(7)?,
        modified_at: row.get(8)?,
    })
}

fn map_chapter_row(row: &rusqlite::Row) -> rusqlite::Result<Chapter> {
    Ok(Chapter {
        id: row.get(0)?,
        book_id: row.get(1)?,
        chapter_number: row.get(2)?,
        title: row.get(3)?,
        content: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        abstract_idea: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        created_at: row.get(6)?,
        modified_at: row.get(7)?,
    })
}

fn ensure_book_exists(conn: &Connection, book_id: i64) -> Result<()> {
    conn.query_row("SELECT 1 FROM books WHERE id = ?", [book_id], |_| Ok(()))
        .optional()?
        .ok_or(ProseError::BookNotFound(book_id))
}

fn validate_chapter_fields(chapter_number: i64, title: &str) -> Result<&str> {
    if chapter_number < 1 {
        return Err(ProseError::Validation(format!(
            "Chapter numbers start at 1 (got {chapter_number})"
        )));
    }
    let title = title.trim();
    if title.is_empty() {
        return Err(ProseError::Validation("The chapter title cannot be empty.".to_string()));
    }
    Ok(title)
}

fn validate_idea(idea: &str) -> Result<&str> {
    let idea = idea.trim();
    if idea.is_empty() {
        return Err(ProseError::Validation("The idea text cannot be empty.".to_string()));
    }
    Ok(idea)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn duplicate_title_or(e: rusqlite::Error, title: &str) -> ProseError {
    if is_constraint_violation(&e) {
        ProseError::DuplicateTitle(title.to_string())
    } else {
        e.into()
    }
}

fn duplicate_number_or(e: rusqlite::Error, book_id: i64, number: i64) -> ProseError {
    if is_constraint_violation(&e) {
        ProseError::DuplicateChapterNumber { book_id, number }
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn library_with_book() -> (Library, i64) {
        let mut lib = Library::in_memory().unwrap();
        let book_id = lib
            .create_book(&BookDraft::new("The Long Road", "A. Writer", "A journey."))
            .unwrap();
        (lib, book_id)
    }

    #[test]
    fn test_create_and_get_book() {
        let (lib, book_id) = library_with_book();
        let book = lib.get_book(book_id).unwrap();
        assert_eq!(book.title, "The Long Road");
        assert_eq!(book.author, "A. Writer");
        assert_eq!(book.synopsis, "A journey.");
        assert_eq!(book.prologue, "");
        assert!(book.cover_image_path.is_none());
        assert!(book.created_at > 0);
    }

    #[test]
    fn test_get_book_not_found() {
        let lib = Library::in_memory().unwrap();
        assert!(matches!(lib.get_book(42), Err(ProseError::BookNotFound(42))));
    }

    #[test]
    fn test_create_book_rejects_blank_author() {
        let mut lib = Library::in_memory().unwrap();
        let result = lib.create_book(&BookDraft::new("Title", "   ", ""));
        assert!(matches!(result, Err(ProseError::Validation(_))));
        assert!(lib.list_books().unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_title_is_rejected() {
        let (mut lib, _) = library_with_book();
        let result = lib.create_book(&BookDraft::new("The Long Road", "Someone Else", ""));
        match result {
            Err(ProseError::DuplicateTitle(title)) => assert_eq!(title, "The Long Road"),
            other => panic!("expected DuplicateTitle, got {other:?}"),
        }
    }

    #[test]
    fn test_list_books_ordered_by_title() {
        let mut lib = Library::in_memory().unwrap();
        for title in ["Zebra", "Apple", "Mango"] {
            lib.create_book(&BookDraft::new(title, "A", "")).unwrap();
        }
        let titles: Vec<String> = lib.list_books().unwrap().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Apple", "Mango", "Zebra"]);
    }

    #[test]
    fn test_update_book() {
        let (mut lib, book_id) = library_with_book();
        let mut draft = BookDraft::from(&lib.get_book(book_id).unwrap());
        draft.prologue = "<b>Once</b> upon a time".to_string();
        draft.back_cover_text = "Read me".to_string();
        draft.cover_image_path = Some("/tmp/cover.png".to_string());

        let updated = lib.update_book(book_id, &draft).unwrap();
        assert_eq!(updated.prologue, "<b>Once</b> upon a time");
        assert_eq!(updated.back_cover_text, "Read me");
        assert_eq!(updated.cover_image_path.as_deref(), Some("/tmp/cover.png"));
    }

    #[test]
    fn test_update_book_not_found() {
        let mut lib = Library::in_memory().unwrap();
        let result = lib.update_book(99, &BookDraft::new("T", "A", ""));
        assert!(matches!(result, Err(ProseError::BookNotFound(99))));
    }

    #[test]
    fn test_update_book_to_existing_title_fails() {
        let (mut lib, _) = library_with_book();
        let other = lib.create_book(&BookDraft::new("Other", "B", "")).unwrap();
        let result = lib.update_book(other, &BookDraft::new("The Long Road", "B", ""));
        assert!(matches!(result, Err(ProseError::DuplicateTitle(_))));
        assert_eq!(lib.get_book(other).unwrap().title, "Other");
    }

    #[test]
    fn test_delete_book_cascades() {
        let (mut lib, book_id) = library_with_book();
        let chapter = lib.append_chapter(book_id, "One").unwrap();
        lib.add_concrete_idea(chapter.id, "An idea").unwrap();

        lib.delete_book(book_id).unwrap();

        assert!(matches!(lib.get_book(book_id), Err(ProseError::BookNotFound(_))));
        assert!(matches!(lib.get_chapter(chapter.id), Err(ProseError::ChapterNotFound(_))));
        let idea_count: i64 = lib
            .connection()
            .query_row("SELECT COUNT(*) FROM concrete_ideas", [], |row| row.get(0))
            .unwrap();
        assert_eq!(idea_count, 0);
    }

    #[test]
    fn test_delete_book_not_found() {
        let mut lib = Library::in_memory().unwrap();
        assert!(matches!(lib.delete_book(5), Err(ProseError::BookNotFound(5))));
    }

    #[test]
    fn test_next_chapter_number() {
        let (mut lib, book_id) = library_with_book();
        assert_eq!(lib.next_chapter_number(book_id).unwrap(), 1);

        lib.create_chapter(book_id, 4, "Four", "", "").unwrap();
        assert_eq!(lib.next_chapter_number(book_id).unwrap(), 5);

        let appended = lib.append_chapter(book_id, "Five").unwrap();
        assert_eq!(appended.chapter_number, 5);
        assert_eq!(lib.count_chapters(book_id).unwrap(), 2);
    }

    #[test]
    fn test_chapters_listed_by_number() {
        let (mut lib, book_id) = library_with_book();
        lib.create_chapter(book_id, 3, "Three", "", "").unwrap();
        lib.create_chapter(book_id, 1, "One", "", "").unwrap();
        lib.create_chapter(book_id, 2, "Two", "", "").unwrap();

        let titles: Vec<String> = lib
            .list_chapters(book_id)
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
    }

    #[test]
    fn test_duplicate_chapter_number_is_rejected() {
        let (mut lib, book_id) = library_with_book();
        lib.create_chapter(book_id, 1, "One", "", "").unwrap();
        let result = lib.create_chapter(book_id, 1, "Also One", "", "");
        assert!(matches!(
            result,
            Err(ProseError::DuplicateChapterNumber { number: 1, .. })
        ));
    }

    #[test]
    fn test_same_chapter_number_in_different_books() {
        let (mut lib, book_a) = library_with_book();
        let book_b = lib.create_book(&BookDraft::new("Second", "A", "")).unwrap();
        lib.create_chapter(book_a, 1, "One", "", "").unwrap();
        lib.create_chapter(book_b, 1, "One", "", "").unwrap();
    }

    #[test]
    fn test_create_chapter_validation() {
        let (mut lib, book_id) = library_with_book();
        assert!(matches!(
            lib.create_chapter(book_id, 1, "  ", "", ""),
            Err(ProseError::Validation(_))
        ));
        assert!(matches!(
            lib.create_chapter(book_id, 0, "Zero", "", ""),
            Err(ProseError::Validation(_))
        ));
        assert!(matches!(
            lib.create_chapter(999, 1, "Orphan", "", ""),
            Err(ProseError::BookNotFound(999))
        ));
    }

    #[test]
    fn test_update_chapter() {
        let (mut lib, book_id) = library_with_book();
        let chapter = lib.append_chapter(book_id, "Draft").unwrap();

        let updated = lib
            .update_chapter(chapter.id, 2, " Final ", "<i>text</i>", "Loss")
            .unwrap();
        assert_eq!(updated.chapter_number, 2);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.content, "<i>text</i>");
        assert_eq!(updated.abstract_idea, "Loss");
    }

    #[test]
    fn test_update_chapter_to_taken_number_fails() {
        let (mut lib, book_id) = library_with_book();
        lib.append_chapter(book_id, "One").unwrap();
        let two = lib.append_chapter(book_id, "Two").unwrap();
        let result = lib.update_chapter(two.id, 1, "Two", "", "");
        assert!(matches!(result, Err(ProseError::DuplicateChapterNumber { .. })));
    }

    #[test]
    fn test_update_single_chapter_columns() {
        let (mut lib, book_id) = library_with_book();
        let chapter = lib
            .create_chapter(book_id, 1, "One", "old content", "old idea")
            .unwrap();

        lib.update_chapter_content(chapter, "new content").unwrap();
        let stored = lib.get_chapter(chapter).unwrap();
        assert_eq!(stored.content, "new content");
        assert_eq!(stored.abstract_idea, "old idea");

        lib.update_chapter_abstract_idea(chapter, "new idea").unwrap();
        let stored = lib.get_chapter(chapter).unwrap();
        assert_eq!(stored.content, "new content");
        assert_eq!(stored.abstract_idea, "new idea");
    }

    #[test]
    fn test_update_chapter_content_not_found() {
        let mut lib = Library::in_memory().unwrap();
        assert!(matches!(
            lib.update_chapter_content(3, "x"),
            Err(ProseError::ChapterNotFound(3))
        ));
        assert!(matches!(
            lib.update_chapter_abstract_idea(3, "x"),
            Err(ProseError::ChapterNotFound(3))
        ));
    }

    #[test]
    fn test_delete_chapter_removes_its_ideas() {
        let (mut lib, book_id) = library_with_book();
        let keep = lib.append_chapter(book_id, "Keep").unwrap();
        let gone = lib.append_chapter(book_id, "Gone").unwrap();
        lib.add_concrete_idea(keep.id, "stays").unwrap();
        lib.add_concrete_idea(gone.id, "goes").unwrap();

        lib.delete_chapter(gone.id).unwrap();

        assert_eq!(lib.list_chapters(book_id).unwrap().len(), 1);
        assert_eq!(lib.list_concrete_ideas(keep.id).unwrap().len(), 1);
        assert!(lib.list_concrete_ideas(gone.id).unwrap().is_empty());
        assert!(matches!(lib.delete_chapter(gone.id), Err(ProseError::ChapterNotFound(_))));
    }

    #[test]
    fn test_concrete_idea_lifecycle() {
        let (mut lib, book_id) = library_with_book();
        let chapter = lib.append_chapter(book_id, "One").unwrap();

        let first = lib.add_concrete_idea(chapter.id, "  The hero hesitates ").unwrap();
        let second = lib.add_concrete_idea(chapter.id, "A letter arrives").unwrap();

        let ideas = lib.list_concrete_ideas(chapter.id).unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].id, first);
        assert_eq!(ideas[0].idea, "The hero hesitates");
        assert_eq!(ideas[1].id, second);

        lib.update_concrete_idea(first, "The hero refuses").unwrap();
        assert_eq!(lib.list_concrete_ideas(chapter.id).unwrap()[0].idea, "The hero refuses");

        lib.delete_concrete_idea(second).unwrap();
        assert_eq!(lib.list_concrete_ideas(chapter.id).unwrap().len(), 1);
    }

    #[test]
    fn test_concrete_idea_errors() {
        let (mut lib, book_id) = library_with_book();
        let chapter = lib.append_chapter(book_id, "One").unwrap();

        assert!(matches!(
            lib.add_concrete_idea(chapter.id, "   "),
            Err(ProseError::Validation(_))
        ));
        assert!(matches!(
            lib.add_concrete_idea(777, "idea"),
            Err(ProseError::ChapterNotFound(777))
        ));
        assert!(matches!(
            lib.update_concrete_idea(777, "idea"),
            Err(ProseError::IdeaNotFound(777))
        ));
        assert!(matches!(
            lib.delete_concrete_idea(777),
            Err(ProseError::IdeaNotFound(777))
        ));
    }

    #[test]
    fn test_library_persists_across_open() {
        let temp = NamedTempFile::new().unwrap();
        let book_id = {
            let mut lib = Library::open_or_create(temp.path()).unwrap();
            let book_id = lib.create_book(&BookDraft::new("Persisted", "A", "")).unwrap();
            lib.append_chapter(book_id, "One").unwrap();
            book_id
        };

        let lib = Library::open_or_create(temp.path()).unwrap();
        assert_eq!(lib.get_book(book_id).unwrap().title, "Persisted");
        assert_eq!(lib.list_chapters(book_id).unwrap().len(), 1);
    }
}
