use std::collections::HashMap;

use iced::widget::{button, center, column, container, horizontal_space, row, scrollable, text, Column};
use iced::{Alignment, Element, Length};
use reinventprose_core::Book;

use crate::ui::app::Message;
use crate::ui::editor;
use crate::ui::menu::MenuMessage;

const SYNOPSIS_PREVIEW_CHARS: usize = 180;

/// The start screen: one card per book.
pub fn view<'a>(books: &'a [Book], chapter_counts: &HashMap<i64, usize>) -> Element<'a, Message> {
    if books.is_empty() {
        return center(
            column![
                text("Your library is empty.").size(18),
                button("Create your first book").on_press(Message::Menu(MenuMessage::NewBook)),
            ]
            .spacing(12)
            .align_x(Alignment::Center),
        )
        .into();
    }

    let heading = text(match books.len() {
        1 => "1 book".to_string(),
        n => format!("{n} books"),
    })
    .size(14);
    let cards = Column::with_children(
        books
            .iter()
            .map(|book| card(book, chapter_counts.get(&book.id).copied().unwrap_or(0))),
    )
        .spacing(12)
        .padding(12)
        .align_x(Alignment::Center);

    scrollable(container(column![heading, cards].spacing(8).align_x(Alignment::Center)).center_x(Length::Fill))
        .height(Length::Fill)
        .into()
}

fn card(book: &Book, chapters: usize) -> Element<'_, Message> {
    let chapters = match chapters {
        1 => "1 chapter".to_string(),
        n => format!("{n} chapters"),
    };
    let mut body = column![
        text(&book.title).size(20),
        text(format!("by {} · {chapters}", book.author)).size(14),
    ]
    .spacing(6);
    if !book.synopsis.trim().is_empty() {
        body = body.push(text(editor::excerpt(&book.synopsis, SYNOPSIS_PREVIEW_CHARS)).size(13));
    }
    body = body.push(
        row![
            horizontal_space(),
            button("Delete")
                .style(button::danger)
                .on_press(Message::DeleteBook(book.id)),
            button("Open").on_press(Message::OpenBook(book.id)),
        ]
        .spacing(8),
    );

    container(body)
        .width(520)
        .padding(16)
        .style(container::rounded_box)
        .into()
}
