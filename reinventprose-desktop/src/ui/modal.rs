//! Dialogs shown over the main window.

use iced::widget::text::IntoFragment;
use iced::widget::{
    button, center, checkbox, column, container, horizontal_space, mouse_area, opaque, stack,
    text, text_input, Column, Row, Space,
};
use iced::{Color, Element, Length};
use reinventprose_core::{ExportFormat, PaneKind, PaneLayout, UnsavedChoice, APP_NAME, APP_VERSION};

use crate::ui::app::Message;

/// Where the user was heading when the unsaved-changes dialog interrupted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Navigation {
    Library,
    Book(i64),
    Chapter(i64),
    Export(ExportFormat),
    Exit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeleteTarget {
    Book { id: i64, title: String },
    Chapter { id: i64, label: String },
}

#[derive(Debug, Clone, Default)]
pub struct NewBookForm {
    pub title: String,
    pub author: String,
    pub synopsis: String,
    pub error: Option<String>,
}

impl NewBookForm {
    fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.author.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChapterForm {
    pub title: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExportForm {
    pub format: ExportFormat,
    pub path: String,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum Modal {
    NewBook(NewBookForm),
    AddChapter(ChapterForm),
    ConfirmDelete(DeleteTarget),
    Export(ExportForm),
    Unsaved(Navigation),
    ViewMenu,
    About,
    Error(String),
}

impl Modal {
    /// Message sent when the user clicks outside the dialog.
    pub fn on_blur(&self) -> Message {
        match self {
            Modal::Unsaved(_) => Message::UnsavedAnswer(UnsavedChoice::Cancel),
            _ => Message::CloseModal,
        }
    }

    pub fn view<'a>(&'a self, layout: &PaneLayout) -> Element<'a, Message> {
        match self {
            Modal::NewBook(form) => dialog(
                "New book",
                column![
                    text_input("Title", &form.title)
                        .on_input(Message::NewBookTitleChanged)
                        .on_submit(Message::CreateBook),
                    text_input("Author", &form.author)
                        .on_input(Message::NewBookAuthorChanged)
                        .on_submit(Message::CreateBook),
                    text_input("Synopsis (optional)", &form.synopsis)
                        .on_input(Message::NewBookSynopsisChanged)
                        .on_submit(Message::CreateBook),
                    error_text(form.error.as_deref()),
                ]
                .spacing(8),
                vec![
                    cancel_button(),
                    button("Create")
                        .on_press_maybe(form.is_complete().then_some(Message::CreateBook))
                        .into(),
                ],
            ),
            Modal::AddChapter(form) => dialog(
                "Add chapter",
                column![
                    text_input("Chapter title", &form.title)
                        .on_input(Message::AddChapterTitleChanged)
                        .on_submit(Message::ConfirmAddChapter),
                    error_text(form.error.as_deref()),
                ]
                .spacing(8),
                vec![
                    cancel_button(),
                    button("Add")
                        .on_press_maybe(
                            (!form.title.trim().is_empty()).then_some(Message::ConfirmAddChapter),
                        )
                        .into(),
                ],
            ),
            Modal::ConfirmDelete(target) => {
                let question = match target {
                    DeleteTarget::Book { title, .. } => format!(
                        "Delete \"{title}\" with all of its chapters and ideas? This cannot be undone."
                    ),
                    DeleteTarget::Chapter { label, .. } => format!(
                        "Delete \"{label}\" and its ideas? This cannot be undone."
                    ),
                };
                dialog(
                    "Confirm delete",
                    text(question),
                    vec![
                        cancel_button(),
                        button("Delete")
                            .style(button::danger)
                            .on_press(Message::ConfirmDelete)
                            .into(),
                    ],
                )
            }
            Modal::Export(form) => dialog(
                format!("Export as {}", form.format.label()),
                column![
                    text("Save to:"),
                    text_input("File path", &form.path)
                        .on_input(Message::ExportPathChanged)
                        .on_submit(Message::ConfirmExport),
                    error_text(form.error.as_deref()),
                ]
                .spacing(8),
                vec![
                    cancel_button(),
                    button("Export")
                        .on_press_maybe(
                            (!form.path.trim().is_empty()).then_some(Message::ConfirmExport),
                        )
                        .into(),
                ],
            ),
            Modal::Unsaved(_) => dialog(
                "Unsaved changes",
                text("There are unsaved changes. Save them before continuing?"),
                vec![
                    button("Cancel")
                        .style(button::secondary)
                        .on_press(Message::UnsavedAnswer(UnsavedChoice::Cancel))
                        .into(),
                    button("Discard")
                        .style(button::danger)
                        .on_press(Message::UnsavedAnswer(UnsavedChoice::Discard))
                        .into(),
                    button("Save")
                        .on_press(Message::UnsavedAnswer(UnsavedChoice::Save))
                        .into(),
                ],
            ),
            Modal::ViewMenu => {
                let toggles = PaneKind::ALL.iter().map(|&kind| {
                    Element::from(
                        checkbox(kind.title(), layout.is_visible(kind))
                            .on_toggle(move |_| Message::TogglePane(kind)),
                    )
                });
                dialog(
                    "Panels",
                    Column::with_children(toggles).spacing(6),
                    vec![
                        button("Reset layout")
                            .style(button::secondary)
                            .on_press(Message::ResetLayout)
                            .into(),
                        button("Close").on_press(Message::CloseModal).into(),
                    ],
                )
            }
            Modal::About => dialog(
                "About",
                column![
                    text(format!("{APP_NAME} ({APP_VERSION})")).size(16),
                    text("Write books chapter by chapter, keep the ideas behind each one close at hand, and export the result to TXT, DOCX or PDF."),
                ]
                .spacing(8),
                vec![button("OK").on_press(Message::CloseModal).into()],
            ),
            Modal::Error(message) => dialog(
                "Something went wrong",
                text(message),
                vec![button("OK").on_press(Message::CloseModal).into()],
            ),
        }
    }
}

/// Lays `content` over `base` on a dimmed backdrop.
pub fn overlay<'a>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_blur: Message,
) -> Element<'a, Message> {
    stack![
        base.into(),
        opaque(
            mouse_area(center(opaque(content)).style(|_theme| container::Style {
                background: Some(
                    Color {
                        a: 0.6,
                        ..Color::BLACK
                    }
                    .into(),
                ),
                ..container::Style::default()
            }))
            .on_press(on_blur)
        )
    ]
    .into()
}

fn dialog<'a>(
    title: impl IntoFragment<'a>,
    body: impl Into<Element<'a, Message>>,
    actions: Vec<Element<'a, Message>>,
) -> Element<'a, Message> {
    let mut buttons: Vec<Element<'a, Message>> = vec![horizontal_space().into()];
    buttons.extend(actions);

    container(
        column![
            text(title).size(20),
            body.into(),
            Row::with_children(buttons).spacing(8),
        ]
        .spacing(14),
    )
    .width(460)
    .padding(20)
    .style(container::rounded_box)
    .into()
}

fn cancel_button<'a>() -> Element<'a, Message> {
    button("Cancel")
        .style(button::secondary)
        .on_press(Message::CloseModal)
        .into()
}

fn error_text(error: Option<&str>) -> Element<'_, Message> {
    match error {
        Some(message) => text(message).style(text::danger).into(),
        None => Space::with_height(Length::Shrink).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsaved_dialog_blur_cancels() {
        assert!(matches!(
            Modal::Unsaved(Navigation::Library).on_blur(),
            Message::UnsavedAnswer(UnsavedChoice::Cancel)
        ));
        assert!(matches!(Modal::About.on_blur(), Message::CloseModal));
    }

    #[test]
    fn test_new_book_needs_title_and_author() {
        let mut form = NewBookForm {
            title: "Dune".to_string(),
            author: "  ".to_string(),
            ..NewBookForm::default()
        };
        assert!(!form.is_complete());
        form.author = "Frank Herbert".to_string();
        assert!(form.is_complete());
    }
}
