//! Helpers for the chapter editor.
//!
//! Chapters are edited as source markup in a plain text editor: line breaks
//! are real newlines and formatting is written as tags. The read-only view
//! renders the same markup as styled spans.

use std::fmt;

use iced::font::{Style, Weight};
use iced::widget::text_editor;
use iced::widget::text::Span;
use iced::{Color, Font};
use reinventprose_core::core::markup::{escape_text, html_to_source, source_to_html, unescape_entities};
use reinventprose_core::RichText;

/// Point sizes offered by the size picker.
pub const FONT_SIZES: [u16; 7] = [8, 10, 12, 14, 18, 24, 32];

/// Font faces offered by the face picker.
pub const FONT_FACES: [&str; 6] = [
    "Arial",
    "Courier New",
    "Georgia",
    "Tahoma",
    "Times New Roman",
    "Verdana",
];

/// Snapshots kept per editor before the oldest is dropped.
const HISTORY_LIMIT: usize = 200;

/// A formatting action from the editor toolbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Face(String),
    Size(u16),
    Color(TextColor),
}

/// The colours offered by the colour picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Black,
    Red,
    Green,
    Blue,
    Gray,
}

impl TextColor {
    pub const ALL: [TextColor; 5] = [Self::Black, Self::Red, Self::Green, Self::Blue, Self::Gray];

    fn hex(self) -> &'static str {
        match self {
            Self::Black => "000000",
            Self::Red => "c0392b",
            Self::Green => "27ae60",
            Self::Blue => "2980b9",
            Self::Gray => "7f8c8d",
        }
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Black => "Black",
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
            Self::Gray => "Gray",
        };
        f.write_str(name)
    }
}

/// Wraps `selection` in the markup for `command`.
pub fn wrap(selection: &str, command: &FormatCommand) -> String {
    match command {
        FormatCommand::Bold => format!("<b>{selection}</b>"),
        FormatCommand::Italic => format!("<i>{selection}</i>"),
        FormatCommand::Underline => format!("<u>{selection}</u>"),
        FormatCommand::Face(face) => {
            format!("<font face=\"{}\">{selection}</font>", escape_text(face))
        }
        FormatCommand::Size(size) => format!("<font data-point-size=\"{size}\">{selection}</font>"),
        FormatCommand::Color(color) => format!("<font color=\"#{}\">{selection}</font>", color.hex()),
    }
}

/// Editor content for stored markup. Entities show as the characters they
/// stand for; saving escapes them again.
pub fn content_for(html: &str) -> text_editor::Content {
    text_editor::Content::with_text(&unescape_entities(&html_to_source(html)))
}

/// Undo and redo snapshots for one text editor.
///
/// A snapshot is the editor text before an edit. Typing inside a word is
/// grouped into a single step.
#[derive(Debug, Default)]
pub struct EditHistory {
    undo: Vec<String>,
    redo: Vec<String>,
    typing: bool,
}

impl EditHistory {
    /// Records `before` ahead of `action` if the action changes the text.
    pub fn record(&mut self, before: String, action: &text_editor::Action) {
        if !action.is_edit() {
            self.typing = false;
            return;
        }
        let typing = matches!(
            action,
            text_editor::Action::Edit(text_editor::Edit::Insert(c)) if !c.is_whitespace()
        );
        self.redo.clear();
        if !(typing && self.typing) {
            self.push_undo(before);
        }
        self.typing = typing;
    }

    /// Records `before` ahead of a change made outside the widget.
    pub fn record_replace(&mut self, before: String) {
        self.redo.clear();
        self.typing = false;
        self.push_undo(before);
    }

    /// The text to restore, given the text shown now.
    pub fn undo(&mut self, current: String) -> Option<String> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        self.typing = false;
        Some(previous)
    }

    pub fn redo(&mut self, current: String) -> Option<String> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        self.typing = false;
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn push_undo(&mut self, before: String) {
        if self.undo.len() == HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.undo.push(before);
    }
}

/// The editor's text without the trailing newline the widget keeps.
pub fn editor_text(content: &text_editor::Content) -> String {
    let text = content.text();
    match text.strip_suffix('\n') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Turns editor source back into stored markup, normalising tags and
/// escaping stray `<`/`&` the user typed as text.
pub fn source_markup(source: &str) -> String {
    RichText::parse(&source_to_html(source)).to_html()
}

/// Styled spans for the read-only view.
pub fn rich_spans<Link>(rich: &RichText) -> Vec<Span<'static, Link>> {
    rich.spans()
        .iter()
        .map(|span| {
            let style = &span.style;
            let font = Font {
                weight: if style.bold { Weight::Bold } else { Weight::Normal },
                style: if style.italic { Style::Italic } else { Style::Normal },
                ..Font::DEFAULT
            };
            let mut out = iced::widget::span(span.text.clone())
                .font(font)
                .underline(style.underline);
            if let Some(size) = style.size {
                out = out.size(f32::from(size));
            }
            if let Some([r, g, b]) = style.color {
                out = out.color(Color::from_rgb8(r, g, b));
            }
            out
        })
        .collect()
}

/// First `max_chars` characters of `text` on one line, with an ellipsis when cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}
