use std::collections::HashMap;
use std::path::{Path, PathBuf};

use iced::widget::text::IntoFragment;
use iced::widget::{button, horizontal_space, image, row, text, Row};
use iced::{Alignment, Element};
use reinventprose_core::{asset_path, ExportFormat, BUNDLED_ASSETS};

#[derive(Debug, Clone)]
pub enum MenuMessage {
    NewBook,
    ToggleDetailsEditing,
    Save,
    ShowLibrary,
    Undo,
    Redo,
    Export(ExportFormat),
    View,
    About,
}

/// Bundled toolbar images found next to the executable. Missing files just
/// leave their buttons text-only.
#[derive(Debug, Clone, Default)]
pub struct Icons(HashMap<&'static str, PathBuf>);

impl Icons {
    pub fn discover(base: &Path) -> Self {
        let found: HashMap<_, _> = BUNDLED_ASSETS
            .iter()
            .filter_map(|name| asset_path(base, name).map(|path| (*name, path)))
            .collect();
        log::debug!("Found {} of {} bundled assets", found.len(), BUNDLED_ASSETS.len());
        Self(found)
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.0.get(name)
    }
}

/// What the toolbar needs to know about the window.
#[derive(Debug, Clone, Copy)]
pub struct ToolbarState {
    pub book_open: bool,
    pub details_editing: bool,
    pub dirty: bool,
    pub can_undo: bool,
    pub can_redo: bool,
}

pub fn toolbar(icons: &Icons, state: ToolbarState) -> Element<'_, MenuMessage> {
    let edit_icon = if state.details_editing { "edit2.png" } else { "edit.png" };
    let edit_label = if state.details_editing { "View Book" } else { "Edit Book" };

    let exports = ExportFormat::ALL.iter().map(|&format| {
        let enabled = state.book_open && format.is_available();
        tool_button(
            format!("Export {}", format.label()),
            None,
            enabled.then_some(MenuMessage::Export(format)),
        )
    });

    row![
        tool_button("New Book", icons.get("new_book.png"), Some(MenuMessage::NewBook)),
        tool_button(
            edit_label,
            icons.get(edit_icon),
            state.book_open.then_some(MenuMessage::ToggleDetailsEditing)
        ),
        tool_button("Save", icons.get("save.png"), state.dirty.then_some(MenuMessage::Save)),
        tool_button(
            "Library",
            icons.get("library.png"),
            state.book_open.then_some(MenuMessage::ShowLibrary)
        ),
        tool_button("Undo", icons.get("undo.png"), state.can_undo.then_some(MenuMessage::Undo)),
        tool_button("Redo", icons.get("redo.png"), state.can_redo.then_some(MenuMessage::Redo)),
    ]
    .push(Row::with_children(exports).spacing(4))
    .push(horizontal_space())
    .push(tool_button("View", None, state.book_open.then_some(MenuMessage::View)))
    .push(tool_button("About", None, Some(MenuMessage::About)))
    .spacing(6)
    .align_y(Alignment::Center)
    .into()
}

fn tool_button<'a>(
    label: impl IntoFragment<'a>,
    icon: Option<&PathBuf>,
    on_press: Option<MenuMessage>,
) -> Element<'a, MenuMessage> {
    let content: Element<'a, MenuMessage> = match icon {
        Some(path) => row![image(path.clone()).width(16).height(16), text(label)]
            .spacing(4)
            .align_y(Alignment::Center)
            .into(),
        None => text(label).into(),
    };
    button(content).padding([4, 8]).on_press_maybe(on_press).into()
}
