//! TUI components for vercelscope
//!
//! This crate provides the terminal user interface for vercelscope,
//! including state management, keybindings, event handling, and UI
//! components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, Screen, UiState};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{HelpOverlay, StatusBar, deployment_nav_hints, log_viewer_hints};
pub use ui::screens::{DeploymentListScreen, LogViewerScreen};
pub use ui::{Layout, Theme};
