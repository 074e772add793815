use std::collections::HashMap;
use std::path::PathBuf;

use iced::widget::{column, container, pane_grid, text, text_editor};
use iced::{keyboard, window, Element, Length, Size, Subscription, Task, Theme};
use reinventprose_core::{
    asset_path, default_file_name, Book, BookDraft, DirtySource, ExportFormat, ExportLabels,
    NavigationDecision, PaneKind, PaneLayout, ProseError, RichText, Session, UnsavedChoice,
    APP_NAME,
};

use crate::settings::{self, AppSettings, ConfigPaths};
use crate::ui::book::{self, BookView, ChapterState, EditorSlot};
use crate::ui::editor::{self, FormatCommand};
use crate::ui::library;
use crate::ui::menu::{self, Icons, MenuMessage, ToolbarState};
use crate::ui::modal::{self, ChapterForm, DeleteTarget, ExportForm, Modal, Navigation, NewBookForm};
use crate::ui::panes;

pub struct ReinventProseApp {
    session: Session,
    settings: AppSettings,
    paths: ConfigPaths,
    icons: Icons,
    books: Vec<Book>,
    chapter_counts: HashMap<i64, usize>,
    screen: Screen,
    layout: PaneLayout,
    panes: pane_grid::State<PaneKind>,
    modal: Option<Modal>,
    status_message: String,
}

enum Screen {
    Library,
    Book(Box<BookView>),
}

#[derive(Debug, Clone)]
pub enum Message {
    Menu(MenuMessage),
    OpenBook(i64),
    DeleteBook(i64),
    SelectChapter(i64),

    NewBookTitleChanged(String),
    NewBookAuthorChanged(String),
    NewBookSynopsisChanged(String),
    CreateBook,

    TitleChanged(String),
    AuthorChanged(String),
    SynopsisChanged(String),
    BackCoverChanged(String),
    CoverPathChanged(String),
    PrologueEdited(text_editor::Action),
    SaveDetails,

    AddChapter,
    AddChapterTitleChanged(String),
    ConfirmAddChapter,
    DeleteChapter(i64),
    ConfirmDelete,

    ContentEdited(text_editor::Action),
    ToggleContentEditing,
    Format(FormatCommand),
    SaveContent,
    AbstractIdeaEdited(text_editor::Action),
    SaveAbstractIdea,

    NewIdeaChanged(String),
    AddIdea,
    EditIdea(i64),
    EditedIdeaChanged(String),
    SaveIdea,
    CancelIdeaEdit,
    DeleteIdea(i64),

    SaveAll,
    UnsavedAnswer(UnsavedChoice),

    ExportPathChanged(String),
    ConfirmExport,

    TogglePane(PaneKind),
    ResetLayout,
    PaneResized(pane_grid::ResizeEvent),
    PaneDragged(pane_grid::DragEvent),

    CloseModal,
    CloseRequested(window::Id),
}

impl ReinventProseApp {
    fn new(session: Session, settings: AppSettings, paths: ConfigPaths, assets: PathBuf) -> Self {
        let layout = PaneLayout::load(&paths.layout_file);
        let mut app = Self {
            session,
            settings,
            paths,
            icons: Icons::discover(&assets),
            books: Vec::new(),
            chapter_counts: HashMap::new(),
            screen: Screen::Library,
            panes: panes::grid_state(&layout),
            layout,
            modal: None,
            status_message: format!("Welcome to {APP_NAME}"),
        };
        app.refresh_books();
        app
    }

    fn title(&self) -> String {
        self.session.window_title(APP_NAME, self.open_book())
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Menu(menu) => return self.on_menu(menu),
            Message::OpenBook(id) => {
                if self.open_book().map(|book| book.id) != Some(id) {
                    return self.navigate(Navigation::Book(id));
                }
            }
            Message::DeleteBook(id) => {
                if let Some(book) = self.books.iter().find(|book| book.id == id) {
                    self.modal = Some(Modal::ConfirmDelete(DeleteTarget::Book {
                        id,
                        title: book.title.clone(),
                    }));
                }
            }
            Message::SelectChapter(id) => {
                if self.book_view().and_then(BookView::selected_id) != Some(id) {
                    return self.navigate(Navigation::Chapter(id));
                }
            }

            Message::NewBookTitleChanged(value) => {
                if let Some(Modal::NewBook(form)) = &mut self.modal {
                    form.title = value;
                }
            }
            Message::NewBookAuthorChanged(value) => {
                if let Some(Modal::NewBook(form)) = &mut self.modal {
                    form.author = value;
                }
            }
            Message::NewBookSynopsisChanged(value) => {
                if let Some(Modal::NewBook(form)) = &mut self.modal {
                    form.synopsis = value;
                }
            }
            Message::CreateBook => return self.create_book(),

            Message::TitleChanged(value) => self.edit_details(|form| form.title = value),
            Message::AuthorChanged(value) => self.edit_details(|form| form.author = value),
            Message::SynopsisChanged(value) => self.edit_details(|form| form.synopsis = value),
            Message::BackCoverChanged(value) => {
                self.edit_details(|form| form.back_cover_text = value)
            }
            Message::CoverPathChanged(value) => {
                self.edit_details(|form| form.cover_image_path = value)
            }
            Message::PrologueEdited(action) => self.edit_text(EditorSlot::Prologue, action),
            Message::SaveDetails => match self.save_details() {
                Ok(()) => self.status_message = "Book details saved".to_string(),
                Err(e) => self.show_error(e),
            },

            Message::AddChapter => {
                if self.book_view().is_some() {
                    self.modal = Some(Modal::AddChapter(ChapterForm::default()));
                }
            }
            Message::AddChapterTitleChanged(value) => {
                if let Some(Modal::AddChapter(form)) = &mut self.modal {
                    form.title = value;
                }
            }
            Message::ConfirmAddChapter => return self.add_chapter(),
            Message::DeleteChapter(id) => {
                let chapter = self
                    .book_view()
                    .and_then(|view| view.chapters.iter().find(|chapter| chapter.id == id));
                if let Some(chapter) = chapter {
                    self.modal = Some(Modal::ConfirmDelete(DeleteTarget::Chapter {
                        id,
                        label: chapter.display_label(),
                    }));
                }
            }
            Message::ConfirmDelete => self.confirm_delete(),

            Message::ContentEdited(action) => self.edit_text(EditorSlot::Content, action),
            Message::ToggleContentEditing => {
                if let Some(state) = selected_chapter(&mut self.screen) {
                    state.editing = !state.editing;
                    if !state.editing {
                        state.rendered = RichText::parse(&state.content_markup());
                    }
                }
            }
            Message::Format(command) => {
                if let Screen::Book(view) = &mut self.screen {
                    let wrapped = view
                        .selected
                        .as_ref()
                        .filter(|state| state.editing)
                        .map(|state| {
                            editor::wrap(&state.content.selection().unwrap_or_default(), &command)
                        });
                    if let Some(wrapped) = wrapped {
                        view.paste(EditorSlot::Content, wrapped);
                        self.session.mark_dirty(DirtySource::ChapterContent);
                    }
                }
            }
            Message::SaveContent => match self.save_content() {
                Ok(()) => self.status_message = "Chapter saved".to_string(),
                Err(e) => self.show_error(e),
            },
            Message::AbstractIdeaEdited(action) => self.edit_text(EditorSlot::AbstractIdea, action),
            Message::SaveAbstractIdea => match self.save_abstract_idea() {
                Ok(()) => self.status_message = "Abstract idea saved".to_string(),
                Err(e) => self.show_error(e),
            },

            Message::NewIdeaChanged(value) => {
                if let Some(state) = selected_chapter(&mut self.screen) {
                    state.new_idea = value;
                }
            }
            Message::AddIdea => {
                if let Some(state) = selected_chapter(&mut self.screen) {
                    match self
                        .session
                        .add_concrete_idea(state.chapter.id, state.new_idea.trim())
                    {
                        Ok(_) => {
                            state.new_idea.clear();
                            self.reload_ideas();
                        }
                        Err(e) => self.show_error(e),
                    }
                }
            }
            Message::EditIdea(id) => {
                if let Some(state) = selected_chapter(&mut self.screen) {
                    if let Some(idea) = state.ideas.iter().find(|idea| idea.id == id) {
                        state.editing_idea = Some((id, idea.idea.clone()));
                    }
                }
            }
            Message::EditedIdeaChanged(value) => {
                if let Some(state) = selected_chapter(&mut self.screen) {
                    if let Some((_, draft)) = &mut state.editing_idea {
                        *draft = value;
                    }
                }
            }
            Message::SaveIdea => {
                let edit = selected_chapter(&mut self.screen).and_then(|s| s.editing_idea.take());
                if let Some((id, idea)) = edit {
                    match self.session.update_concrete_idea(id, idea.trim()) {
                        Ok(()) => self.reload_ideas(),
                        Err(e) => self.show_error(e),
                    }
                }
            }
            Message::CancelIdeaEdit => {
                if let Some(state) = selected_chapter(&mut self.screen) {
                    state.editing_idea = None;
                }
            }
            Message::DeleteIdea(id) => match self.session.delete_concrete_idea(id) {
                Ok(()) => self.reload_ideas(),
                Err(e) => self.show_error(e),
            },

            Message::SaveAll => self.save_from_menu(),
            Message::UnsavedAnswer(choice) => {
                let Some(Modal::Unsaved(navigation)) = self.modal.take() else {
                    return Task::none();
                };
                match self.session.guard(Some(choice)) {
                    NavigationDecision::SaveThenProceed => match self.save_all() {
                        Ok(()) => return self.perform(navigation),
                        Err(e) => self.show_error(e),
                    },
                    NavigationDecision::DiscardThenProceed => {
                        self.discard_changes();
                        return self.perform(navigation);
                    }
                    NavigationDecision::Stay => {}
                }
            }

            Message::ExportPathChanged(value) => {
                if let Some(Modal::Export(form)) = &mut self.modal {
                    form.path = value;
                    form.error = None;
                }
            }
            Message::ConfirmExport => self.confirm_export(),

            Message::TogglePane(kind) => {
                self.sync_layout();
                let layout = std::mem::take(&mut self.layout).toggled(kind);
                self.set_layout(layout);
            }
            Message::ResetLayout => self.set_layout(PaneLayout::default()),
            Message::PaneResized(pane_grid::ResizeEvent { split, ratio }) => {
                self.panes.resize(split, ratio);
                self.sync_layout();
            }
            Message::PaneDragged(pane_grid::DragEvent::Dropped { pane, target }) => {
                self.panes.drop(pane, target);
                self.sync_layout();
            }
            Message::PaneDragged(_) => {}

            Message::CloseModal => self.modal = None,
            Message::CloseRequested(_) => return self.navigate(Navigation::Exit),
        }
        Task::none()
    }

    fn on_menu(&mut self, message: MenuMessage) -> Task<Message> {
        match message {
            MenuMessage::NewBook => self.modal = Some(Modal::NewBook(NewBookForm::default())),
            MenuMessage::ToggleDetailsEditing => {
                if let Screen::Book(view) = &mut self.screen {
                    view.details.editing = !view.details.editing;
                }
            }
            MenuMessage::Save => self.save_from_menu(),
            MenuMessage::ShowLibrary => return self.navigate(Navigation::Library),
            MenuMessage::Undo => self.step_history(BookView::undo),
            MenuMessage::Redo => self.step_history(BookView::redo),
            MenuMessage::Export(format) => {
                if !format.is_available() {
                    self.modal = Some(Modal::Error(format!(
                        "{} export is not available in this build.",
                        format.label()
                    )));
                } else if self.book_view().is_some() {
                    return self.navigate(Navigation::Export(format));
                }
            }
            MenuMessage::View => self.modal = Some(Modal::ViewMenu),
            MenuMessage::About => self.modal = Some(Modal::About),
        }
        Task::none()
    }

    fn view(&self) -> Element<'_, Message> {
        let toolbar = menu::toolbar(
            &self.icons,
            ToolbarState {
                book_open: self.book_view().is_some(),
                details_editing: self.book_view().is_some_and(|view| view.details.editing),
                dirty: self.session.is_dirty(),
                can_undo: self.book_view().is_some_and(BookView::can_undo),
                can_redo: self.book_view().is_some_and(BookView::can_redo),
            },
        )
        .map(Message::Menu);

        let body = match &self.screen {
            Screen::Library => library::view(&self.books, &self.chapter_counts),
            Screen::Book(view) => book::view(view, &self.panes, &self.books, &self.icons),
        };

        let content = column![
            toolbar,
            container(body).height(Length::Fill),
            text(&self.status_message).size(12),
        ]
        .spacing(8)
        .padding(8);

        match &self.modal {
            Some(dialog) => modal::overlay(content, dialog.view(&self.layout), dialog.on_blur()),
            None => content.into(),
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            window::close_requests().map(Message::CloseRequested),
            keyboard::on_key_press(shortcut),
        ])
    }

    // ── Navigation ────────────────────────────────────────────────

    /// Runs `navigation` now, or asks first when there are unsaved edits.
    fn navigate(&mut self, navigation: Navigation) -> Task<Message> {
        match self.session.guard(None) {
            NavigationDecision::Stay => {
                self.modal = Some(Modal::Unsaved(navigation));
                Task::none()
            }
            _ => self.perform(navigation),
        }
    }

    fn perform(&mut self, navigation: Navigation) -> Task<Message> {
        match navigation {
            Navigation::Library => {
                self.screen = Screen::Library;
                self.session.set_edited_chapter(None);
                self.refresh_books();
            }
            Navigation::Book(id) => self.load_book(id),
            Navigation::Chapter(id) => self.load_chapter(id),
            Navigation::Export(format) => self.open_export_dialog(format),
            Navigation::Exit => {
                self.sync_layout();
                if let Err(e) = self.layout.save(&self.paths.layout_file) {
                    log::warn!("Could not save the pane layout: {e}");
                }
                log::info!("Closing {APP_NAME}");
                return iced::exit();
            }
        }
        Task::none()
    }

    fn load_book(&mut self, id: i64) {
        let book = match self.session.book(id) {
            Ok(Some(book)) => book,
            Ok(None) => {
                self.modal = Some(Modal::Error("That book no longer exists.".to_string()));
                self.refresh_books();
                return;
            }
            Err(e) => return self.show_error(e),
        };
        let chapters = match self.session.chapters(id) {
            Ok(chapters) => chapters,
            Err(e) => return self.show_error(e),
        };
        log::info!("Opening book {id} ({} chapters)", chapters.len());
        self.session.clear_all();
        self.session.set_edited_chapter(None);
        self.status_message = format!("Opened \"{}\"", book.title);
        let first = chapters.first().map(|chapter| chapter.id);
        self.screen = Screen::Book(Box::new(BookView::new(book, chapters)));
        if let Some(chapter_id) = first {
            self.load_chapter(chapter_id);
        }
    }

    fn load_chapter(&mut self, id: i64) {
        let chapter = match self.session.chapter(id) {
            Ok(Some(chapter)) => chapter,
            Ok(None) => {
                self.modal = Some(Modal::Error("That chapter no longer exists.".to_string()));
                self.reload_chapters();
                return;
            }
            Err(e) => return self.show_error(e),
        };
        let ideas = match self.session.concrete_ideas(id) {
            Ok(ideas) => ideas,
            Err(e) => return self.show_error(e),
        };
        if let Screen::Book(view) = &mut self.screen {
            view.selected = Some(ChapterState::new(chapter, ideas));
            view.active_editor = EditorSlot::Content;
        }
        self.session.set_edited_chapter(Some(id));
    }

    fn open_export_dialog(&mut self, format: ExportFormat) {
        let Some(view) = self.book_view() else {
            return;
        };
        let labels = ExportLabels::for_language(&self.settings.export_language);
        let path = PathBuf::from(&self.settings.export_directory)
            .join(default_file_name(&view.book.title, format, &labels));
        self.modal = Some(Modal::Export(ExportForm {
            format,
            path: path.to_string_lossy().to_string(),
            error: None,
        }));
    }

    // ── Saving ────────────────────────────────────────────────────

    fn save_from_menu(&mut self) {
        match self.save_all() {
            Ok(()) => self.status_message = "All changes saved".to_string(),
            Err(e) => self.show_error(e),
        }
    }

    /// Saves every dirty source. Stops at the first failure, leaving that
    /// source and the ones after it marked dirty.
    fn save_all(&mut self) -> Result<(), ProseError> {
        if self.session.is_source_dirty(DirtySource::BookDetails) {
            self.save_details()?;
        }
        if self.session.is_source_dirty(DirtySource::ChapterContent) {
            self.save_content()?;
        }
        if self.session.is_source_dirty(DirtySource::AbstractIdea) {
            self.save_abstract_idea()?;
        }
        Ok(())
    }

    fn save_details(&mut self) -> Result<(), ProseError> {
        let Screen::Book(view) = &mut self.screen else {
            return Ok(());
        };
        let book = self
            .session
            .save_book_details(view.book.id, &view.details.draft())?;
        log::info!("Saved details of book {}", book.id);
        view.replace_book(book);
        self.refresh_books();
        Ok(())
    }

    fn save_content(&mut self) -> Result<(), ProseError> {
        let Some(state) = selected_chapter(&mut self.screen) else {
            return Ok(());
        };
        let html = state.content_markup();
        self.session.save_chapter_content(state.chapter.id, &html)?;
        log::info!("Saved content of chapter {}", state.chapter.id);
        state.rendered = RichText::parse(&html);
        state.chapter.content = html;
        Ok(())
    }

    fn save_abstract_idea(&mut self) -> Result<(), ProseError> {
        let Some(state) = selected_chapter(&mut self.screen) else {
            return Ok(());
        };
        let idea = state.abstract_text();
        self.session.save_abstract_idea(state.chapter.id, &idea)?;
        state.chapter.abstract_idea = idea;
        Ok(())
    }

    fn discard_changes(&mut self) {
        if let Screen::Book(view) = &mut self.screen {
            let book = view.book.clone();
            view.replace_book(book);
            if let Some(state) = &mut view.selected {
                state.reset();
            }
        }
        self.session.clear_all();
        log::debug!("Discarded unsaved changes");
    }

    // ── Records ───────────────────────────────────────────────────

    fn create_book(&mut self) -> Task<Message> {
        let Some(Modal::NewBook(form)) = &mut self.modal else {
            return Task::none();
        };
        let draft = BookDraft::new(&form.title, &form.author, &form.synopsis);
        match self.session.create_book(&draft) {
            Ok(id) => {
                log::info!("Created book {id}");
                self.modal = None;
                self.refresh_books();
                self.navigate(Navigation::Book(id))
            }
            Err(e) => {
                log::warn!("Could not create book: {e}");
                form.error = Some(e.user_message());
                Task::none()
            }
        }
    }

    fn add_chapter(&mut self) -> Task<Message> {
        let Some(book_id) = self.book_view().map(|view| view.book.id) else {
            return Task::none();
        };
        let Some(Modal::AddChapter(form)) = &mut self.modal else {
            return Task::none();
        };
        match self.session.add_chapter(book_id, form.title.trim()) {
            Ok(chapter) => {
                log::info!("Added chapter {} to book {book_id}", chapter.id);
                self.modal = None;
                self.reload_chapters();
                self.navigate(Navigation::Chapter(chapter.id))
            }
            Err(e) => {
                form.error = Some(e.user_message());
                Task::none()
            }
        }
    }

    fn confirm_delete(&mut self) {
        let Some(Modal::ConfirmDelete(target)) = self.modal.take() else {
            return;
        };
        match target {
            DeleteTarget::Book { id, title } => match self.session.delete_book(id) {
                Ok(()) => {
                    log::info!("Deleted book {id}");
                    self.status_message = format!("Deleted \"{title}\"");
                    if self.open_book().map(|book| book.id) == Some(id) {
                        self.screen = Screen::Library;
                    }
                    self.refresh_books();
                }
                Err(e) => self.show_error(e),
            },
            DeleteTarget::Chapter { id, label } => match self.session.delete_chapter(id) {
                Ok(()) => {
                    log::info!("Deleted chapter {id}");
                    self.status_message = format!("Deleted \"{label}\"");
                    if let Screen::Book(view) = &mut self.screen {
                        if view.selected_id() == Some(id) {
                            view.selected = None;
                        }
                    }
                    self.reload_chapters();
                }
                Err(e) => self.show_error(e),
            },
        }
    }

    fn confirm_export(&mut self) {
        let Some(book_id) = self.book_view().map(|view| view.book.id) else {
            return;
        };
        let Some(Modal::Export(form)) = &mut self.modal else {
            return;
        };
        let labels = ExportLabels::for_language(&self.settings.export_language);
        let path = PathBuf::from(form.path.trim());
        match self.session.export_book(book_id, form.format, labels, &path) {
            Ok(written) => {
                self.modal = None;
                self.status_message = format!("Exported to {}", written.display());
                if let Some(directory) = written.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                    self.settings.export_directory = directory.to_string_lossy().to_string();
                    let saved = settings::save_settings_to(&self.settings, &self.paths.settings_file);
                    if let Err(e) = saved {
                        log::warn!("{e}");
                    }
                }
            }
            Err(e) => {
                log::error!("Export to {} failed: {e}", path.display());
                form.error = Some(e.user_message());
            }
        }
    }

    fn refresh_books(&mut self) {
        let listed = self.session.list_books().and_then(|books| {
            let counts = books
                .iter()
                .map(|book| Ok((book.id, self.session.chapter_count(book.id)?)))
                .collect::<Result<HashMap<_, _>, ProseError>>()?;
            Ok((books, counts))
        });
        match listed {
            Ok((books, counts)) => {
                self.books = books;
                self.chapter_counts = counts;
            }
            Err(e) => self.show_error(e),
        }
    }

    fn reload_chapters(&mut self) {
        let Some(book_id) = self.book_view().map(|view| view.book.id) else {
            return;
        };
        match self.session.chapters(book_id) {
            Ok(chapters) => {
                if let Screen::Book(view) = &mut self.screen {
                    view.chapters = chapters;
                }
            }
            Err(e) => self.show_error(e),
        }
    }

    fn reload_ideas(&mut self) {
        let Some(state) = selected_chapter(&mut self.screen) else {
            return;
        };
        match self.session.concrete_ideas(state.chapter.id) {
            Ok(ideas) => state.ideas = ideas,
            Err(e) => self.show_error(e),
        }
    }

    // ── Helpers ───────────────────────────────────────────────────

    fn book_view(&self) -> Option<&BookView> {
        match &self.screen {
            Screen::Book(view) => Some(view),
            Screen::Library => None,
        }
    }

    fn open_book(&self) -> Option<&Book> {
        self.book_view().map(|view| &view.book)
    }

    /// Routes an action to one of the book screen's text editors.
    fn edit_text(&mut self, slot: EditorSlot, action: text_editor::Action) {
        if let Screen::Book(view) = &mut self.screen {
            if view.perform(slot, action) {
                self.session.mark_dirty(slot.source());
            }
        }
    }

    fn step_history(&mut self, step: fn(&mut BookView) -> Option<EditorSlot>) {
        if let Screen::Book(view) = &mut self.screen {
            if let Some(slot) = step(view) {
                self.session.mark_dirty(slot.source());
            }
        }
    }

    fn edit_details(&mut self, edit: impl FnOnce(&mut book::DetailsForm)) {
        if let Screen::Book(view) = &mut self.screen {
            edit(&mut view.details);
            self.session.mark_dirty(DirtySource::BookDetails);
        }
    }

    fn sync_layout(&mut self) {
        if let Some(layout) = panes::capture(&self.panes, &self.layout.hidden) {
            self.layout = layout;
        }
    }

    fn set_layout(&mut self, layout: PaneLayout) {
        self.panes = panes::grid_state(&layout);
        self.layout = layout;
    }

    fn show_error(&mut self, error: ProseError) {
        log::error!("{error}");
        self.modal = Some(Modal::Error(error.user_message()));
    }
}

fn selected_chapter(screen: &mut Screen) -> Option<&mut ChapterState> {
    match screen {
        Screen::Book(view) => view.selected.as_mut(),
        Screen::Library => None,
    }
}

/// Keyboard accelerators. All of them need the platform command key.
fn shortcut(key: keyboard::Key, modifiers: keyboard::Modifiers) -> Option<Message> {
    if !modifiers.command() {
        return None;
    }
    let menu = match key.as_ref() {
        keyboard::Key::Character("s") => return Some(Message::SaveAll),
        keyboard::Key::Character("n") => MenuMessage::NewBook,
        keyboard::Key::Character("e") => MenuMessage::Export(ExportFormat::Txt),
        keyboard::Key::Character("l") => MenuMessage::ShowLibrary,
        keyboard::Key::Character("z") if modifiers.shift() => MenuMessage::Redo,
        keyboard::Key::Character("z") => MenuMessage::Undo,
        keyboard::Key::Character("y") => MenuMessage::Redo,
        _ => return None,
    };
    Some(Message::Menu(menu))
}

/// Directory searched for bundled assets: the one holding the executable.
fn asset_base() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn run(session: Session, settings: AppSettings, paths: ConfigPaths) -> iced::Result {
    let assets = asset_base();
    let icon = asset_path(&assets, "app_icon.ico").and_then(|path| {
        window::icon::from_file(&path)
            .map_err(|e| log::warn!("Could not load window icon {}: {e}", path.display()))
            .ok()
    });

    iced::application(
        ReinventProseApp::title,
        ReinventProseApp::update,
        ReinventProseApp::view,
    )
    .subscription(ReinventProseApp::subscription)
    .theme(ReinventProseApp::theme)
    .window(window::Settings {
        size: Size::new(1280.0, 800.0),
        min_size: Some(Size::new(800.0, 520.0)),
        icon,
        exit_on_close_request: false,
        ..window::Settings::default()
    })
    .run_with(move || {
        (
            ReinventProseApp::new(session, settings, paths, assets),
            Task::none(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reinventprose_core::Library;
    use std::sync::Arc;
    use tempfile::{tempdir, TempDir};

    /// An app whose settings and layout files live in a fresh directory.
    fn app() -> (ReinventProseApp, TempDir) {
        let dir = tempdir().unwrap();
        let session = Session::with_library(Library::in_memory().unwrap());
        let app = ReinventProseApp::new(
            session,
            AppSettings::default(),
            ConfigPaths::in_dir(dir.path()),
            dir.path().to_path_buf(),
        );
        (app, dir)
    }

    fn press(key: &str) -> Option<Message> {
        shortcut(keyboard::Key::Character(key.into()), keyboard::Modifiers::COMMAND)
    }

    fn chapter_text(app: &ReinventProseApp) -> String {
        let state = app.book_view().and_then(|view| view.selected.as_ref()).unwrap();
        editor::editor_text(&state.content)
    }

    fn create(app: &mut ReinventProseApp, title: &str) -> i64 {
        let _ = app.update(Message::Menu(MenuMessage::NewBook));
        let _ = app.update(Message::NewBookTitleChanged(title.to_string()));
        let _ = app.update(Message::NewBookAuthorChanged("Frank Herbert".to_string()));
        let _ = app.update(Message::CreateBook);
        app.open_book().map(|book| book.id).unwrap()
    }

    fn add_chapter(app: &mut ReinventProseApp, title: &str) {
        let _ = app.update(Message::AddChapter);
        let _ = app.update(Message::AddChapterTitleChanged(title.to_string()));
        let _ = app.update(Message::ConfirmAddChapter);
    }

    fn type_into_chapter(app: &mut ReinventProseApp, text: &str) {
        let _ = app.update(Message::ContentEdited(text_editor::Action::Edit(
            text_editor::Edit::Paste(Arc::new(text.to_string())),
        )));
    }

    #[test]
    fn test_create_book_opens_it() {
        let (mut app, _dir) = app();
        assert_eq!(app.title(), APP_NAME);
        create(&mut app, "Dune");
        assert!(app.modal.is_none());
        assert_eq!(app.books.len(), 1);
        assert_eq!(app.title(), format!("{APP_NAME} - Dune"));
    }

    #[test]
    fn test_invalid_new_book_keeps_dialog_open() {
        let (mut app, _dir) = app();
        let _ = app.update(Message::Menu(MenuMessage::NewBook));
        let _ = app.update(Message::NewBookTitleChanged("Dune".to_string()));
        let _ = app.update(Message::CreateBook);
        match &app.modal {
            Some(Modal::NewBook(form)) => assert!(form.error.is_some()),
            other => panic!("expected the new-book dialog, got {other:?}"),
        }
        assert!(app.books.is_empty());
    }

    #[test]
    fn test_editing_marks_title_and_save_clears_it() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        type_into_chapter(&mut app, "Desert");
        assert!(app.title().ends_with(" *"));

        let _ = app.update(Message::SaveAll);
        assert!(!app.title().ends_with(" *"));
        let chapter_id = app.book_view().and_then(BookView::selected_id).unwrap();
        let stored = app.session.chapter(chapter_id).unwrap().unwrap();
        assert_eq!(stored.content, "Desert");
    }

    #[test]
    fn test_navigation_with_unsaved_edits_asks_first() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        type_into_chapter(&mut app, "Desert");

        let _ = app.update(Message::Menu(MenuMessage::ShowLibrary));
        assert!(matches!(app.modal, Some(Modal::Unsaved(Navigation::Library))));
        assert!(app.book_view().is_some());

        let _ = app.update(Message::UnsavedAnswer(UnsavedChoice::Cancel));
        assert!(app.modal.is_none());
        assert!(app.book_view().is_some());
        assert!(app.session.is_dirty());

        let _ = app.update(Message::Menu(MenuMessage::ShowLibrary));
        let _ = app.update(Message::UnsavedAnswer(UnsavedChoice::Discard));
        assert!(app.book_view().is_none());
        assert!(!app.session.is_dirty());
    }

    #[test]
    fn test_save_answer_saves_then_navigates() {
        let (mut app, _dir) = app();
        let book_id = create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        type_into_chapter(&mut app, "Desert");

        let _ = app.update(Message::Menu(MenuMessage::ShowLibrary));
        let _ = app.update(Message::UnsavedAnswer(UnsavedChoice::Save));
        assert!(app.book_view().is_none());
        let chapters = app.session.chapters(book_id).unwrap();
        assert_eq!(chapters[0].content, "Desert");
    }

    #[test]
    fn test_format_wraps_selection() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        type_into_chapter(&mut app, "spice");
        let _ = app.update(Message::ContentEdited(text_editor::Action::SelectAll));
        let _ = app.update(Message::Format(FormatCommand::Bold));
        let _ = app.update(Message::SaveContent);

        let state = app.book_view().and_then(|view| view.selected.as_ref()).unwrap();
        assert_eq!(state.chapter.content, "<b>spice</b>");
    }

    #[test]
    fn test_concrete_ideas_round_trip() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        let _ = app.update(Message::NewIdeaChanged("Sandworms".to_string()));
        let _ = app.update(Message::AddIdea);

        let ideas = |app: &ReinventProseApp| {
            app.book_view()
                .and_then(|view| view.selected.as_ref())
                .map(|state| state.ideas.clone())
                .unwrap()
        };
        let added = ideas(&app);
        assert_eq!(added.len(), 1);
        assert!(!app.session.is_dirty());

        let _ = app.update(Message::EditIdea(added[0].id));
        let _ = app.update(Message::EditedIdeaChanged("Shai-Hulud".to_string()));
        let _ = app.update(Message::SaveIdea);
        assert_eq!(ideas(&app)[0].idea, "Shai-Hulud");

        let _ = app.update(Message::DeleteIdea(added[0].id));
        assert!(ideas(&app).is_empty());
    }

    #[test]
    fn test_delete_chapter_clears_selection() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        let id = app.book_view().and_then(BookView::selected_id).unwrap();

        let _ = app.update(Message::DeleteChapter(id));
        assert!(matches!(app.modal, Some(Modal::ConfirmDelete(_))));
        let _ = app.update(Message::ConfirmDelete);
        let view = app.book_view().unwrap();
        assert!(view.selected.is_none());
        assert!(view.chapters.is_empty());
    }

    #[test]
    fn test_hiding_a_pane() {
        let (mut app, _dir) = app();
        assert!(app.layout.is_visible(PaneKind::Editor));
        let _ = app.update(Message::TogglePane(PaneKind::AbstractIdea));
        assert!(!app.layout.is_visible(PaneKind::AbstractIdea));
        assert_eq!(app.panes.len(), app.layout.root.panes().len());
        let _ = app.update(Message::ResetLayout);
        assert_eq!(app.layout, PaneLayout::default());
    }

    #[test]
    fn test_shortcuts_map_to_menu_actions() {
        assert!(matches!(press("s"), Some(Message::SaveAll)));
        assert!(matches!(press("n"), Some(Message::Menu(MenuMessage::NewBook))));
        assert!(matches!(
            press("e"),
            Some(Message::Menu(MenuMessage::Export(ExportFormat::Txt)))
        ));
        assert!(matches!(press("l"), Some(Message::Menu(MenuMessage::ShowLibrary))));
        assert!(matches!(press("z"), Some(Message::Menu(MenuMessage::Undo))));
        assert!(matches!(press("y"), Some(Message::Menu(MenuMessage::Redo))));
        assert!(matches!(
            shortcut(
                keyboard::Key::Character("z".into()),
                keyboard::Modifiers::COMMAND | keyboard::Modifiers::SHIFT
            ),
            Some(Message::Menu(MenuMessage::Redo))
        ));
        assert!(press("q").is_none());
        assert!(shortcut(keyboard::Key::Character("n".into()), keyboard::Modifiers::empty()).is_none());
    }

    #[test]
    fn test_undo_then_redo_from_the_toolbar() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        type_into_chapter(&mut app, "Desert");
        let _ = app.update(Message::SaveAll);
        let _ = app.update(Message::ContentEdited(text_editor::Action::Move(
            text_editor::Motion::DocumentStart,
        )));
        type_into_chapter(&mut app, "Deep ");
        assert_eq!(chapter_text(&app), "Deep Desert");

        let _ = app.update(Message::Menu(MenuMessage::Undo));
        assert_eq!(chapter_text(&app), "Desert");
        assert!(app.session.is_source_dirty(DirtySource::ChapterContent));
        assert!(app.book_view().is_some_and(BookView::can_redo));

        let _ = app.update(Message::Menu(MenuMessage::Redo));
        assert_eq!(chapter_text(&app), "Deep Desert");
        assert!(!app.book_view().is_some_and(BookView::can_redo));
    }

    #[test]
    fn test_face_from_the_picker_is_saved() {
        let (mut app, _dir) = app();
        create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        type_into_chapter(&mut app, "spice");
        let _ = app.update(Message::ContentEdited(text_editor::Action::SelectAll));
        let _ = app.update(Message::Format(FormatCommand::Face("Georgia".to_string())));
        let _ = app.update(Message::SaveContent);

        let state = app.book_view().and_then(|view| view.selected.as_ref()).unwrap();
        assert_eq!(state.chapter.content, "<font face=\"Georgia\">spice</font>");
    }

    #[test]
    fn test_library_cards_count_chapters() {
        let (mut app, _dir) = app();
        let book_id = create(&mut app, "Dune");
        add_chapter(&mut app, "Arrakis");
        add_chapter(&mut app, "Caladan");
        let _ = app.update(Message::Menu(MenuMessage::ShowLibrary));
        assert!(app.book_view().is_none());
        assert_eq!(app.chapter_counts.get(&book_id), Some(&2));
    }

    #[test]
    fn test_exit_and_export_write_to_the_given_directory() {
        let (mut app, dir) = app();
        create(&mut app, "Dune");
        let _ = app.update(Message::TogglePane(PaneKind::AbstractIdea));
        let _ = app.update(Message::Menu(MenuMessage::Export(ExportFormat::Txt)));
        let out = dir.path().join("out").join("dune.txt");
        let _ = app.update(Message::ExportPathChanged(out.to_string_lossy().to_string()));
        let _ = app.update(Message::ConfirmExport);
        assert!(out.exists());
        let saved = settings::load_settings_from(&dir.path().join("settings.json"));
        assert_eq!(saved.export_directory, dir.path().join("out").to_string_lossy());

        let _ = app.update(Message::CloseRequested(window::Id::unique()));
        let layout = PaneLayout::load(&dir.path().join("layout.json"));
        assert!(!layout.is_visible(PaneKind::AbstractIdea));
    }
}
