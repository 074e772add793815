pub mod app;
pub mod book;
pub mod editor;
pub mod library;
pub mod menu;
pub mod modal;
pub mod panes;
