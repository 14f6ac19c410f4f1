use std::env;
use std::sync::Arc;

use sage_base::config::{AppDirs, Config};
use sage_base::persistence::SessionStore;
use sage_base::state::{CharEstimator, EnvironmentContext, HistoryStore, Role};

use super::actions;
use super::commands::Command;
use super::ActionResult;
use crate::constants::PROMPT_PREFIX;
use crate::infra::logging::log_error;
use crate::llms::ThreadedTransport;
use crate::llms::openai_compat::{ApiKey, OpenAiCompatClient, key_from_env, wrap_key};
use crate::stream::{CompletionCallback, TurnOutcome, TurnSettings, run_turn};
use crate::ui::input::{KeyInterrupt, LineEditor, ReadOutcome};
use crate::ui::panels::{self, Panel};
use crate::ui::{Console, Renderer, StatusLine, theme};

/// One interactive session. Owns the history and everything that touches it;
/// turns and commands run strictly one after another.
pub struct App {
    pub(crate) config: Config,
    pub(crate) dirs: AppDirs,
    pub(crate) history: HistoryStore,
    pub(crate) sessions: SessionStore,
    pub(crate) console: Console,
    editor: LineEditor,
    transport: ThreadedTransport,
    /// False when no terminal could be attached for keyboard input
    interactive: bool,
}

fn transport_for(key: Option<ApiKey>) -> ThreadedTransport {
    ThreadedTransport::new(Arc::new(OpenAiCompatClient::new(key)))
}

impl App {
    pub fn new(config: Config, dirs: AppDirs, interactive: bool) -> Self {
        let history = HistoryStore::new(&config.system_prompt, Box::new(CharEstimator));
        let sessions = SessionStore::new(dirs.sessions_dir.clone());
        let console = Console::new(&config.code_theme);
        Self {
            config,
            dirs,
            history,
            sessions,
            console,
            editor: LineEditor::new(),
            transport: transport_for(key_from_env()),
            interactive,
        }
    }

    /// Run the session. `piped` is submitted as the first turn.
    pub fn run(&mut self, piped: Option<String>) {
        let cwd = env::current_dir().unwrap_or_default();
        self.console.print(&panels::intro(&self.config, &cwd));
        self.info("Type !h for a list of commands.");

        if let Some(content) = piped {
            self.history.append(Role::User, content);
            self.submit_turn(None);
            if !self.interactive {
                self.info("Cannot re-attach to the active terminal. Exiting gracefully...");
                return;
            }
        }

        loop {
            match self.editor.read_line(PROMPT_PREFIX, true) {
                Ok(ReadOutcome::Line(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if self.handle_input(&line) == ActionResult::Quit {
                        break;
                    }
                }
                Ok(ReadOutcome::Escape) => continue,
                Ok(ReadOutcome::Interrupt) | Err(_) => {
                    self.farewell();
                    break;
                }
            }
        }
    }

    /// Dispatch a command, or send plain text as a turn.
    pub fn handle_input(&mut self, input: &str) -> ActionResult {
        let Some(command) = Command::lookup(input) else {
            if input.trim_start().starts_with('!') {
                self.info("Command not found. Type !help for usage.");
                return ActionResult::Continue;
            }
            self.history.append(Role::User, input);
            self.submit_turn(None);
            return ActionResult::Continue;
        };

        if command.offers_save() && self.history.len() > 1 {
            match self.prompt("Save first? (y/N): ", true) {
                None => return ActionResult::Continue,
                Some(choice) if matches!(choice.to_lowercase().as_str(), "y" | "yes") => {
                    actions::session::save(self);
                }
                Some(_) => {}
            }
        }

        actions::dispatch(self, command)
    }

    /// Stream one turn against the current history. The user prompt must
    /// already be appended.
    pub(crate) fn submit_turn(&mut self, on_complete: Option<CompletionCallback<'_>>) -> TurnOutcome {
        let settings = TurnSettings::from_config(&self.config, self.console.height());
        let environment = EnvironmentContext::current().render();
        let turn = self.history.turn_count();

        let outcome = run_turn(
            &mut self.history,
            &settings,
            &environment,
            &self.transport,
            &mut self.console,
            &mut KeyInterrupt,
            on_complete,
        );

        match &outcome {
            TurnOutcome::Failed(e) => {
                let context =
                    format!("Stream failure - model: {}, endpoint: {}, turn: {}", settings.model, settings.endpoint, turn);
                log_error(&self.dirs.logs_dir, &context, &e.to_string());
            }
            TurnOutcome::Canceled => self.info("Canceled."),
            TurnOutcome::Committed => {}
        }
        outcome
    }

    pub(crate) fn set_api_key(&mut self, key: String) {
        self.transport = transport_for(Some(wrap_key(key)));
    }

    // ========================================================================
    // Prompts & output
    // ========================================================================

    /// Ask for one line. `None` when canceled, or empty and `allow_empty`
    /// is false.
    pub(crate) fn prompt(&mut self, label: &str, allow_empty: bool) -> Option<String> {
        match self.editor.read_line(label, false) {
            Ok(ReadOutcome::Line(line)) => {
                let trimmed = line.trim().to_string();
                if trimmed.is_empty() && !allow_empty {
                    self.info("No input detected.");
                    return None;
                }
                Some(trimmed)
            }
            Ok(ReadOutcome::Escape) | Ok(ReadOutcome::Interrupt) | Err(_) => {
                self.info("Canceled.");
                None
            }
        }
    }

    pub(crate) fn print(&mut self, panel: &Panel) {
        self.console.print(panel);
    }

    pub(crate) fn info(&mut self, text: &str) {
        self.console.print(&panels::info(text));
    }

    pub(crate) fn success(&mut self, text: &str) {
        self.console.print(&panels::success(text));
    }

    pub(crate) fn warn(&mut self, text: &str) {
        self.console.print(&panels::notice(text, theme::WARNING));
    }

    pub(crate) fn fail(&mut self, text: &str) {
        self.console.print(&panels::notice(text, theme::ERROR));
    }

    pub(crate) fn show_error(&mut self, title: &str, detail: &str) {
        self.console.show_error(title, detail);
    }

    /// Status line after a command; never includes throughput.
    pub(crate) fn status(&mut self) {
        let status = StatusLine::capture(&mut self.history, self.config.context_length, false);
        self.console.show_status(&status);
    }

    /// Log `error` and show it in an error panel titled `title`.
    pub(crate) fn report(&mut self, title: &str, context: &str, error: &str) {
        log_error(&self.dirs.logs_dir, context, error);
        self.show_error(title, error);
    }

    pub(crate) fn save_config(&mut self) {
        if let Err(e) = self.config.save(&self.dirs.settings_file()) {
            self.report("CONFIG ERROR", "Saving settings", &e.to_string());
        }
    }

    pub(crate) fn farewell(&mut self) {
        self.warn("✨ Farewell!");
    }
}
