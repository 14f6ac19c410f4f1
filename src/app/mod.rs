//! The interactive session: REPL loop, turn submission and command actions.

pub mod actions;
mod app;
pub mod commands;

pub use app::App;
pub use commands::Command;

/// What the REPL does after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    Continue,
    Quit,
}
