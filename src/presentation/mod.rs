//! Presentation layer with UI components and event handling.

/// Key bindings resolved per context.
pub mod commands;
/// Terminal event helpers.
pub mod events;
/// Accent-derived color theme.
pub mod theme;
/// UI screens.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use ui::{App, AppPorts};
