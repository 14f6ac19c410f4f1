use sage_base::config::constants::SUMMARY_PROMPT;
use sage_base::persistence::{SessionError, session_file_name};
use sage_base::state::{HistoryStore, Role};

use crate::app::App;
use crate::infra::logging::log_error;
use crate::stream::{CompletionCallback, TurnOutcome};
use crate::ui::panels;

const SESSION_PROMPT: &str = "Enter a session name: ";

/// Split a stored assistant entry into its `<think>` block and the answer.
pub fn split_reasoning(text: &str) -> (Option<&str>, &str) {
    if let Some(rest) = text.strip_prefix("<think>\n")
        && let Some((reasoning, answer)) = rest.split_once("\n</think>")
    {
        return (Some(reasoning.trim()), answer.trim());
    }
    (None, text)
}

/// Save under the active session name, or prompt for one.
pub fn save(app: &mut App) {
    let name = match app.history.active_session() {
        Some(active) => active.to_string(),
        None => match app.prompt(SESSION_PROMPT, false) {
            Some(name) => name,
            None => return,
        },
    };

    match app.history.save_to_disk(&app.sessions, &name) {
        Ok(path) => app.success(&format!("Session saved in: {}", path.display())),
        Err(e @ SessionError::InvalidName(_)) => app.fail(&e.to_string()),
        Err(e) => app.report("ERROR SAVING", &format!("Saving session {}", name), &e.to_string()),
    }
}

/// Print saved sessions. Returns false when there are none.
pub fn list(app: &mut App) -> bool {
    let sessions = match app.sessions.list() {
        Ok(s) => s,
        Err(e) => {
            app.report("ERROR LISTING SESSIONS", "Listing sessions", &e.to_string());
            return false;
        }
    };
    if sessions.is_empty() {
        app.info("No saved sessions found.");
        return false;
    }
    app.print(&panels::list("Available sessions:", &sessions));
    true
}

pub fn load(app: &mut App) {
    if !list(app) {
        return;
    }
    let Some(name) = app.prompt(SESSION_PROMPT, false) else { return };

    match app.history.load_from_disk(&app.sessions, &name) {
        Ok(path) => {
            replay(app);
            app.success(&format!("Session loaded from: {}", path.display()));
            app.status();
        }
        Err(SessionError::NotFound(path)) => app.fail(&format!("No session file found: {}", path.display())),
        Err(e @ SessionError::InvalidName(_)) => app.fail(&e.to_string()),
        Err(SessionError::Corrupted { path, reason }) => {
            log_error(&app.dirs.logs_dir, &format!("Loading session {}", name), &reason);
            app.fail(&format!("Corrupted session file: {}", path.display()));
        }
        Err(e) => app.report("ERROR LOADING", &format!("Loading session {}", name), &e.to_string()),
    }
}

/// Print the loaded history as user and assistant panels.
fn replay(app: &mut App) {
    let theme = app.console.code_theme().to_string();
    let entries: Vec<(Role, String)> =
        app.history.messages().iter().map(|m| (m.role, m.text().trim().to_string())).collect();

    for (role, text) in entries {
        if text.is_empty() {
            continue;
        }
        match role {
            Role::User => app.print(&panels::user(&text)),
            Role::Assistant => {
                let (reasoning, answer) = split_reasoning(&text);
                if let Some(reasoning) = reasoning {
                    app.print(&panels::reasoning(reasoning));
                }
                app.print(&panels::response(answer, &theme));
            }
            Role::System => {}
        }
    }
}

pub fn delete(app: &mut App) {
    if !list(app) {
        return;
    }
    let Some(name) = app.prompt(SESSION_PROMPT, false) else { return };

    match app.sessions.delete(&name) {
        Ok(path) => {
            if app.history.active_session() == Some(session_file_name(&name).as_str()) {
                app.history.clear_active_session();
            }
            app.success(&format!("Session deleted: {}", path.display()));
        }
        Err(SessionError::NotFound(path)) => app.fail(&format!("No session file found: {}", path.display())),
        Err(e @ SessionError::InvalidName(_)) => app.fail(&e.to_string()),
        Err(e) => app.report("DELETION ERROR", &format!("Deleting session {}", name), &e.to_string()),
    }
}

pub fn reset(app: &mut App) {
    let prompt = app.config.system_prompt.clone();
    app.history.reset(&prompt);
    app.success("The current session has been reset successfully.");
    app.status();
}

/// Run a summarization turn. The history is replaced only when it commits.
pub fn summarize(app: &mut App) {
    app.warn("Beginning summarization...");
    app.history.append(Role::User, SUMMARY_PROMPT);

    let prompt = app.config.system_prompt.clone();
    let on_complete: CompletionCallback<'_> = Box::new(move |history: &mut HistoryStore, summary: &str| {
        history.reset_with_summary(&prompt, summary);
    });

    if let TurnOutcome::Committed = app.submit_turn(Some(on_complete)) {
        app.success("Summarization complete! New session primed.");
        app.status();
    }
}
