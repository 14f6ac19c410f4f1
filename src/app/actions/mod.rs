//! Command actions split by domain.
//!
//! - `session` - save, load, delete, reset, summarize
//! - `context` - attachments, web pages, working directory, code copy
//! - `settings` - persisted settings and charts
//! - `profiles` - model profile management

pub mod context;
pub mod profiles;
pub mod session;
pub mod settings;

use super::commands::Command;
use super::{ActionResult, App};
use crate::ui::panels;

pub fn dispatch(app: &mut App, command: Command) -> ActionResult {
    match command {
        Command::Help => app.print(&panels::help()),
        Command::Save => session::save(app),
        Command::Load => session::load(app),
        Command::Sessions => {
            session::list(app);
        }
        Command::Delete => session::delete(app),
        Command::Reset => session::reset(app),
        Command::Summarize => session::summarize(app),
        Command::Attach => context::attach(app),
        Command::Attachments => {
            context::list(app);
        }
        Command::Purge => context::purge(app),
        Command::PurgeAll => context::purge_all(app),
        Command::Web => context::web(app),
        Command::ChangeDir => context::change_dir(app),
        Command::Copy => context::copy_code(app),
        Command::Consume => settings::toggle_consume(app),
        Command::Settings => settings::show(app),
        Command::ContextLength => settings::context_length(app),
        Command::RefreshRate => settings::refresh_rate(app),
        Command::Theme => settings::code_theme(app),
        Command::ApiKey => settings::api_key(app),
        Command::SystemPrompt => settings::system_prompt(app),
        Command::ProfileList => profiles::list(app),
        Command::ProfileAdd => profiles::add(app),
        Command::ProfileRemove => profiles::remove(app),
        Command::ProfileSwitch => profiles::switch(app),
        Command::Clear => app.console.clear_screen(),
        Command::Quit => {
            app.farewell();
            return ActionResult::Quit;
        }
    }
    ActionResult::Continue
}
