//! The book screen: editing state for the open book and the panes that show it.

use std::sync::Arc;

use iced::widget::{
    button, center, column, container, horizontal_space, image, pane_grid, pick_list, rich_text,
    row, scrollable, text, text_editor, text_input, Column,
};
use iced::{Alignment, Element, Length, Theme};
use reinventprose_core::{Book, BookDraft, Chapter, ConcreteIdea, DirtySource, PaneKind, RichText};

use crate::ui::app::Message;
use crate::ui::editor::{self, EditHistory, FormatCommand, TextColor, FONT_FACES, FONT_SIZES};
use crate::ui::menu::Icons;

/// The multi-line editors on the book screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorSlot {
    Prologue,
    Content,
    AbstractIdea,
}

impl EditorSlot {
    pub fn source(self) -> DirtySource {
        match self {
            Self::Prologue => DirtySource::BookDetails,
            Self::Content => DirtySource::ChapterContent,
            Self::AbstractIdea => DirtySource::AbstractIdea,
        }
    }
}

/// Everything on screen for one open book.
pub struct BookView {
    pub book: Book,
    pub details: DetailsForm,
    pub chapters: Vec<Chapter>,
    pub selected: Option<ChapterState>,
    /// The editor undo and redo act on: the last one the user touched.
    pub active_editor: EditorSlot,
}

impl BookView {
    pub fn new(book: Book, chapters: Vec<Chapter>) -> Self {
        Self {
            details: DetailsForm::from_book(&book),
            book,
            chapters,
            selected: None,
            active_editor: EditorSlot::Content,
        }
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected.as_ref().map(|state| state.chapter.id)
    }

    /// Applies an editor action, keeping that editor's history. Returns
    /// `true` when the text changed.
    pub fn perform(&mut self, slot: EditorSlot, action: text_editor::Action) -> bool {
        let Some((content, history)) = self.editor_mut(slot) else {
            return false;
        };
        let is_edit = action.is_edit();
        history.record(editor::editor_text(content), &action);
        content.perform(action);
        self.active_editor = slot;
        is_edit
    }

    /// Replaces the selection in `slot` with `text` as one undoable step.
    pub fn paste(&mut self, slot: EditorSlot, text: String) -> bool {
        let Some((content, history)) = self.editor_mut(slot) else {
            return false;
        };
        history.record_replace(editor::editor_text(content));
        content.perform(text_editor::Action::Edit(text_editor::Edit::Paste(Arc::new(text))));
        self.active_editor = slot;
        true
    }

    /// Steps the active editor back. Returns the editor that changed.
    pub fn undo(&mut self) -> Option<EditorSlot> {
        self.step(|history, current| history.undo(current))
    }

    pub fn redo(&mut self) -> Option<EditorSlot> {
        self.step(|history, current| history.redo(current))
    }

    pub fn can_undo(&self) -> bool {
        self.history(self.active_editor).is_some_and(EditHistory::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history(self.active_editor).is_some_and(EditHistory::can_redo)
    }

    fn step(
        &mut self,
        apply: impl FnOnce(&mut EditHistory, String) -> Option<String>,
    ) -> Option<EditorSlot> {
        let slot = self.active_editor;
        let (content, history) = self.editor_mut(slot)?;
        let restored = apply(history, editor::editor_text(content))?;
        *content = text_editor::Content::with_text(&restored);
        Some(slot)
    }

    fn editor_mut(
        &mut self,
        slot: EditorSlot,
    ) -> Option<(&mut text_editor::Content, &mut EditHistory)> {
        match slot {
            EditorSlot::Prologue => {
                Some((&mut self.details.prologue, &mut self.details.prologue_history))
            }
            EditorSlot::Content => self
                .selected
                .as_mut()
                .map(|state| (&mut state.content, &mut state.content_history)),
            EditorSlot::AbstractIdea => self
                .selected
                .as_mut()
                .map(|state| (&mut state.abstract_idea, &mut state.abstract_history)),
        }
    }

    fn history(&self, slot: EditorSlot) -> Option<&EditHistory> {
        match slot {
            EditorSlot::Prologue => Some(&self.details.prologue_history),
            EditorSlot::Content => self.selected.as_ref().map(|state| &state.content_history),
            EditorSlot::AbstractIdea => self.selected.as_ref().map(|state| &state.abstract_history),
        }
    }

    /// Replaces the stored book after a save, keeping the form's mode.
    pub fn replace_book(&mut self, book: Book) {
        let editing = self.details.editing;
        self.details = DetailsForm::from_book(&book);
        self.details.editing = editing;
        self.book = book;
    }
}

/// The book-details form. Starts read-only.
pub struct DetailsForm {
    pub editing: bool,
    pub title: String,
    pub author: String,
    pub synopsis: String,
    pub back_cover_text: String,
    pub cover_image_path: String,
    pub prologue: text_editor::Content,
    pub prologue_history: EditHistory,
}

impl DetailsForm {
    pub fn from_book(book: &Book) -> Self {
        Self {
            editing: false,
            title: book.title.clone(),
            author: book.author.clone(),
            synopsis: book.synopsis.clone(),
            back_cover_text: book.back_cover_text.clone(),
            cover_image_path: book.cover_image_path.clone().unwrap_or_default(),
            prologue: editor::content_for(&book.prologue),
            prologue_history: EditHistory::default(),
        }
    }

    pub fn draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            synopsis: self.synopsis.clone(),
            prologue: editor::source_markup(&editor::editor_text(&self.prologue)),
            back_cover_text: self.back_cover_text.clone(),
            cover_image_path: Some(self.cover_image_path.clone()),
        }
    }
}

/// The selected chapter with its editors and ideas.
pub struct ChapterState {
    /// The chapter as last saved.
    pub chapter: Chapter,
    pub content: text_editor::Content,
    pub rendered: RichText,
    pub editing: bool,
    pub abstract_idea: text_editor::Content,
    pub content_history: EditHistory,
    pub abstract_history: EditHistory,
    pub ideas: Vec<ConcreteIdea>,
    pub new_idea: String,
    pub editing_idea: Option<(i64, String)>,
}

impl ChapterState {
    pub fn new(chapter: Chapter, ideas: Vec<ConcreteIdea>) -> Self {
        Self {
            content: editor::content_for(&chapter.content),
            rendered: RichText::parse(&chapter.content),
            editing: true,
            abstract_idea: text_editor::Content::with_text(&chapter.abstract_idea),
            content_history: EditHistory::default(),
            abstract_history: EditHistory::default(),
            chapter,
            ideas,
            new_idea: String::new(),
            editing_idea: None,
        }
    }

    /// Markup for what is currently in the content editor.
    pub fn content_markup(&self) -> String {
        editor::source_markup(&editor::editor_text(&self.content))
    }

    pub fn abstract_text(&self) -> String {
        editor::editor_text(&self.abstract_idea)
    }

    /// Throws away unsaved edits.
    pub fn reset(&mut self) {
        self.content = editor::content_for(&self.chapter.content);
        self.rendered = RichText::parse(&self.chapter.content);
        self.abstract_idea = text_editor::Content::with_text(&self.chapter.abstract_idea);
        self.content_history.clear();
        self.abstract_history.clear();
    }
}

pub fn view<'a>(
    book: &'a BookView,
    panes: &'a pane_grid::State<PaneKind>,
    books: &'a [Book],
    icons: &'a Icons,
) -> Element<'a, Message> {
    pane_grid(panes, |_pane, kind, _maximized| {
        let title_bar = pane_grid::TitleBar::new(text(kind.title()).size(14))
            .padding([4, 8])
            .style(container::rounded_box);
        let body = match kind {
            PaneKind::Library => library_pane(books, book.book.id),
            PaneKind::BookDetails => details_pane(book),
            PaneKind::ChapterList => chapter_list_pane(book),
            PaneKind::Editor => editor_pane(book.selected.as_ref(), icons),
            PaneKind::AbstractIdea => abstract_idea_pane(book.selected.as_ref()),
            PaneKind::ConcreteIdeas => concrete_ideas_pane(book.selected.as_ref()),
        };
        pane_grid::Content::new(container(body).padding(8))
            .title_bar(title_bar)
            .style(container::bordered_box)
    })
    .on_drag(Message::PaneDragged)
    .on_resize(10, Message::PaneResized)
    .spacing(6)
    .into()
}

fn library_pane(books: &[Book], open_id: i64) -> Element<'_, Message> {
    let items = books.iter().map(|book| {
        Element::from(
            button(text(&book.title))
                .width(Length::Fill)
                .style(list_style(book.id == open_id))
                .on_press(Message::OpenBook(book.id)),
        )
    });
    scrollable(Column::with_children(items).spacing(2))
        .height(Length::Fill)
        .into()
}

fn details_pane(view: &BookView) -> Element<'_, Message> {
    let form = &view.details;
    let body = if form.editing {
        column![
            labeled("Title", text_input("Title", &form.title).on_input(Message::TitleChanged)),
            labeled("Author", text_input("Author", &form.author).on_input(Message::AuthorChanged)),
            labeled(
                "Synopsis",
                text_input("Synopsis", &form.synopsis).on_input(Message::SynopsisChanged)
            ),
            labeled(
                "Back cover",
                text_input("Back cover text", &form.back_cover_text)
                    .on_input(Message::BackCoverChanged)
            ),
            labeled(
                "Cover image",
                text_input("Path to a JPEG or PNG file", &form.cover_image_path)
                    .on_input(Message::CoverPathChanged)
            ),
            text("Prologue").size(13),
            text_editor(&form.prologue)
                .on_action(Message::PrologueEdited)
                .height(Length::Fixed(160.0)),
            row![horizontal_space(), button("Save details").on_press(Message::SaveDetails)],
        ]
    } else {
        let book = &view.book;
        let mut col = column![
            text(&book.title).size(22),
            text(format!("by {}", book.author)).size(14),
        ];
        for (label, value) in [("Synopsis", &book.synopsis), ("Back cover", &book.back_cover_text)] {
            if !value.trim().is_empty() {
                col = col.push(labeled(label, text(value)));
            }
        }
        if let Some(path) = &book.cover_image_path {
            col = col.push(labeled("Cover image", text(path)));
        }
        let prologue = RichText::parse(&book.prologue);
        if !prologue.is_empty() {
            col = col.push(labeled("Prologue", rich_text(editor::rich_spans::<Message>(&prologue))));
        }
        col
    };
    scrollable(body.spacing(8)).height(Length::Fill).into()
}

fn chapter_list_pane(view: &BookView) -> Element<'_, Message> {
    let selected = view.selected_id();
    let list: Element<'_, Message> = if view.chapters.is_empty() {
        text("No chapters yet.").into()
    } else {
        let items = view.chapters.iter().map(|chapter| {
            Element::from(
                button(text(chapter.display_label()))
                    .width(Length::Fill)
                    .style(list_style(Some(chapter.id) == selected))
                    .on_press(Message::SelectChapter(chapter.id)),
            )
        });
        scrollable(Column::with_children(items).spacing(2))
            .height(Length::Fill)
            .into()
    };
    column![
        container(list).height(Length::Fill),
        row![
            button("Add chapter").on_press(Message::AddChapter),
            button("Delete")
                .style(button::danger)
                .on_press_maybe(selected.map(Message::DeleteChapter)),
        ]
        .spacing(6),
    ]
    .spacing(8)
    .into()
}

fn editor_pane<'a>(selected: Option<&'a ChapterState>, icons: &'a Icons) -> Element<'a, Message> {
    let Some(state) = selected else {
        return center(text("Select a chapter or add one to start writing.")).into();
    };

    let header = row![
        text(state.chapter.display_label()).size(16),
        horizontal_space(),
        button(if state.editing { "View" } else { "Edit" })
            .style(button::secondary)
            .on_press(Message::ToggleContentEditing),
        button("Save").on_press(Message::SaveContent),
    ]
    .spacing(6)
    .align_y(Alignment::Center);

    let body: Element<'a, Message> = if state.editing {
        let tools = row![
            format_button(icons, "bold.png", "B", FormatCommand::Bold),
            format_button(icons, "italic.png", "I", FormatCommand::Italic),
            format_button(icons, "underline.png", "U", FormatCommand::Underline),
            pick_list(&FONT_FACES[..], None::<&str>, |face| Message::Format(
                FormatCommand::Face(face.to_string())
            ))
            .placeholder("Font"),
            pick_list(&FONT_SIZES[..], None::<u16>, |size| Message::Format(
                FormatCommand::Size(size)
            ))
            .placeholder("Size"),
            pick_list(&TextColor::ALL[..], None::<TextColor>, |color| Message::Format(
                FormatCommand::Color(color)
            ))
            .placeholder("Colour"),
        ]
        .spacing(4)
        .align_y(Alignment::Center);
        column![
            tools,
            text_editor(&state.content)
                .on_action(Message::ContentEdited)
                .height(Length::Fill),
        ]
        .spacing(6)
        .into()
    } else if state.rendered.is_empty() {
        center(text("This chapter is empty.")).into()
    } else {
        scrollable(rich_text(editor::rich_spans::<Message>(&state.rendered)))
            .height(Length::Fill)
            .into()
    };

    column![header, body].spacing(8).into()
}

fn format_button<'a>(
    icons: &Icons,
    icon: &str,
    label: &'a str,
    command: FormatCommand,
) -> Element<'a, Message> {
    let content: Element<'a, Message> = match icons.get(icon) {
        Some(path) => image(path.clone()).width(16).height(16).into(),
        None => text(label).into(),
    };
    button(content)
        .padding([4, 8])
        .style(button::secondary)
        .on_press(Message::Format(command))
        .into()
}

fn abstract_idea_pane(selected: Option<&ChapterState>) -> Element<'_, Message> {
    let Some(state) = selected else {
        return center(text("No chapter selected.")).into();
    };
    column![
        text_editor(&state.abstract_idea)
            .placeholder("What is this chapter about?")
            .on_action(Message::AbstractIdeaEdited)
            .height(Length::Fill),
        row![horizontal_space(), button("Save idea").on_press(Message::SaveAbstractIdea)],
    ]
    .spacing(6)
    .into()
}

fn concrete_ideas_pane(selected: Option<&ChapterState>) -> Element<'_, Message> {
    let Some(state) = selected else {
        return center(text("No chapter selected.")).into();
    };

    let rows = state.ideas.iter().map(|idea| {
        let row = match &state.editing_idea {
            Some((id, draft)) if *id == idea.id => row![
                text_input("Idea", draft)
                    .on_input(Message::EditedIdeaChanged)
                    .on_submit(Message::SaveIdea),
                button("Save").on_press(Message::SaveIdea),
                button("Cancel")
                    .style(button::secondary)
                    .on_press(Message::CancelIdeaEdit),
            ],
            _ => row![
                text(format!("• {}", idea.idea)).width(Length::Fill),
                button("Edit")
                    .style(button::secondary)
                    .on_press(Message::EditIdea(idea.id)),
                button("Delete")
                    .style(button::danger)
                    .on_press(Message::DeleteIdea(idea.id)),
            ],
        };
        Element::from(row.spacing(6).align_y(Alignment::Center))
    });

    column![
        scrollable(Column::with_children(rows).spacing(4)).height(Length::Fill),
        row![
            text_input("New idea", &state.new_idea)
                .on_input(Message::NewIdeaChanged)
                .on_submit(Message::AddIdea),
            button("Add").on_press_maybe(
                (!state.new_idea.trim().is_empty()).then_some(Message::AddIdea)
            ),
        ]
        .spacing(6),
    ]
    .spacing(8)
    .into()
}

fn labeled<'a>(
    label: &'a str,
    content: impl Into<Element<'a, Message>>,
) -> Column<'a, Message> {
    column![text(label).size(12), content.into()].spacing(2)
}

fn list_style(active: bool) -> fn(&Theme, button::Status) -> button::Style {
    if active {
        button::primary
    } else {
        button::text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> Book {
        Book {
            id: 7,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            synopsis: "Spice".to_string(),
            prologue: "First<br /><b>Second</b>".to_string(),
            back_cover_text: String::new(),
            cover_image_path: None,
            created_at: 0,
            modified_at: 0,
        }
    }

    fn chapter() -> Chapter {
        Chapter {
            id: 3,
            book_id: 7,
            chapter_number: 1,
            title: "Arrakis".to_string(),
            content: "Desert<br /><i>planet</i>".to_string(),
            abstract_idea: "Arrival".to_string(),
            created_at: 0,
            modified_at: 0,
        }
    }

    #[test]
    fn test_unchanged_form_gives_the_stored_book() {
        let book = book();
        let draft = DetailsForm::from_book(&book).draft();
        let draft = draft.validate().unwrap();
        assert_eq!(draft.title, book.title);
        assert_eq!(draft.prologue, book.prologue);
        assert_eq!(draft.cover_image_path, None);
    }

    #[test]
    fn test_chapter_state_round_trips_and_resets() {
        let mut state = ChapterState::new(chapter(), Vec::new());
        assert_eq!(state.content_markup(), "Desert<br /><i>planet</i>");
        assert_eq!(state.abstract_text(), "Arrival");

        state.content = text_editor::Content::with_text("Rewritten");
        state.abstract_idea = text_editor::Content::with_text("Other");
        assert_eq!(state.content_markup(), "Rewritten");

        state.reset();
        assert_eq!(state.content_markup(), "Desert<br /><i>planet</i>");
        assert_eq!(state.abstract_text(), "Arrival");
    }

    fn insert(c: char) -> text_editor::Action {
        text_editor::Action::Edit(text_editor::Edit::Insert(c))
    }

    #[test]
    fn test_undo_then_redo_in_the_active_editor() {
        let mut view = BookView::new(book(), vec![chapter()]);
        view.selected = Some(ChapterState::new(chapter(), Vec::new()));
        let original = "Desert\n<i>planet</i>";

        let _ = view.perform(EditorSlot::Content, text_editor::Action::SelectAll);
        assert!(view.perform(EditorSlot::Content, insert('X')));
        assert!(!view.can_redo());
        assert!(view.can_undo());
        let typed = editor::editor_text(&view.selected.as_ref().unwrap().content);
        assert_ne!(typed, original);

        assert_eq!(view.undo(), Some(EditorSlot::Content));
        let state = view.selected.as_ref().unwrap();
        assert_eq!(editor::editor_text(&state.content), original);
        assert!(view.can_redo());

        assert_eq!(view.redo(), Some(EditorSlot::Content));
        let state = view.selected.as_ref().unwrap();
        assert_eq!(editor::editor_text(&state.content), typed);
        assert_eq!(view.redo(), None);
    }

    #[test]
    fn test_undo_follows_the_last_touched_editor() {
        let mut view = BookView::new(book(), vec![chapter()]);
        view.selected = Some(ChapterState::new(chapter(), Vec::new()));
        view.paste(EditorSlot::Content, "body".to_string());
        view.paste(EditorSlot::AbstractIdea, "idea ".to_string());
        assert_eq!(view.active_editor, EditorSlot::AbstractIdea);

        assert_eq!(view.undo(), Some(EditorSlot::AbstractIdea));
        assert_eq!(view.selected.as_ref().unwrap().abstract_text(), "Arrival");
        assert_eq!(view.undo(), None, "abstract idea has nothing left");

        view.selected.as_mut().unwrap().reset();
        view.active_editor = EditorSlot::Content;
        assert!(!view.can_undo());
    }

    #[test]
    fn test_replace_book_keeps_mode() {
        let mut view = BookView::new(book(), vec![chapter()]);
        view.details.editing = true;
        let mut saved = book();
        saved.title = "Dune Messiah".to_string();
        view.replace_book(saved);
        assert!(view.details.editing);
        assert_eq!(view.details.title, "Dune Messiah");
        assert_eq!(view.selected_id(), None);
    }
}
