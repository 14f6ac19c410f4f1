use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use sage_base::config::Config;
use sage_base::config::constants::TRIM_LIMIT_FRACTION;
use sage_base::state::{HistoryStore, Role};

use super::state::{Channel, PanelPhase, TurnState};
use crate::constants::{EVENT_POLL_MS, FLUSH_GRACE_MS, PANEL_HEIGHT_FACTOR};
use crate::llms::{Fragment, LlmError, StreamEvent, Transport, TurnRequest};
use crate::ui::{PanelKind, Renderer, StatusLine};

/// External cancellation signal, polled between fragment reads.
pub trait Interrupt {
    fn interrupted(&mut self) -> bool;
}

/// Receives the trimmed response text instead of the default assistant commit.
pub type CompletionCallback<'a> = Box<dyn FnOnce(&mut HistoryStore, &str) + 'a>;

/// Per-turn parameters, captured from the config when the turn starts.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    pub model: String,
    pub endpoint: String,
    pub context_length: usize,
    pub refresh_rate: u32,
    pub consume_reasoning: bool,
    /// Live panels stop re-rendering once they exceed this many lines
    pub panel_line_limit: usize,
    pub grace: Duration,
    pub poll: Duration,
}

impl TurnSettings {
    pub fn from_config(config: &Config, terminal_height: u16) -> Self {
        let profile = config.active();
        Self {
            model: profile.name,
            endpoint: profile.endpoint,
            context_length: config.context_length,
            refresh_rate: config.refresh_rate,
            consume_reasoning: config.reasoning_panel_consume,
            panel_line_limit: (terminal_height as f64 * PANEL_HEIGHT_FACTOR) as usize,
            grace: Duration::from_millis(FLUSH_GRACE_MS),
            poll: Duration::from_millis(EVENT_POLL_MS),
        }
    }

    fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.refresh_rate.max(1) as f64)
    }
}

/// Terminal state of one turn.
#[derive(Debug)]
pub enum TurnOutcome {
    Committed,
    Canceled,
    Failed(LlmError),
}

/// How the fragment loop ended, before finalization.
enum LoopEnd {
    /// Generation time, measured up to the end of the stream
    Exhausted(Duration),
    Canceled,
    Failed(LlmError),
}

/// Drive one request/response turn against `history`.
///
/// The caller has already appended the user prompt. On success the response
/// is committed (or handed to `on_complete`); on cancel or failure the
/// trailing user prompt is removed and nothing else changes.
pub fn run_turn(
    history: &mut HistoryStore,
    settings: &TurnSettings,
    environment: &str,
    transport: &dyn Transport,
    renderer: &mut dyn Renderer,
    interrupt: &mut dyn Interrupt,
    on_complete: Option<CompletionCallback<'_>>,
) -> TurnOutcome {
    history.trim_to_budget(TRIM_LIMIT_FRACTION, settings.context_length);

    let request = TurnRequest {
        model: settings.model.clone(),
        endpoint: settings.endpoint.clone(),
        messages: history.processed_view(environment),
    };

    let mut state = TurnState::default();
    renderer.begin_live();
    renderer.show_waiting();

    let end = match transport.open(request) {
        Ok(rx) => consume(&rx, &mut state, settings, renderer, interrupt),
        Err(e) => LoopEnd::Failed(e),
    };

    finalize(end, state, history, settings, renderer, on_complete)
}

fn consume(
    rx: &Receiver<StreamEvent>,
    state: &mut TurnState,
    settings: &TurnSettings,
    renderer: &mut dyn Renderer,
    interrupt: &mut dyn Interrupt,
) -> LoopEnd {
    loop {
        if interrupt.interrupted() {
            return LoopEnd::Canceled;
        }
        match rx.recv_timeout(settings.poll) {
            Ok(StreamEvent::Fragment(fragment)) => {
                on_fragment(fragment, state, settings, renderer);
                update_renderables(state, settings, renderer);
            }
            Ok(StreamEvent::Done) => break,
            Ok(StreamEvent::Error(e)) => return LoopEnd::Failed(e),
            Err(RecvTimeoutError::Timeout) => {
                if !state.has_started() {
                    renderer.refresh();
                }
            }
            Err(RecvTimeoutError::Disconnected) => return LoopEnd::Failed(LlmError::Disconnected),
        }
    }

    let generation = state.elapsed();

    // Admit fragments that raced the end of the stream
    thread::sleep(settings.grace);
    while let Ok(event) = rx.try_recv() {
        if let StreamEvent::Fragment(fragment) = event {
            on_fragment(fragment, state, settings, renderer);
        }
    }
    flush_final(state, renderer);
    LoopEnd::Exhausted(generation)
}

/// Classify a fragment and run the panel lifecycle it triggers.
fn on_fragment(fragment: Fragment, state: &mut TurnState, settings: &TurnSettings, renderer: &mut dyn Renderer) {
    if !state.has_started() {
        renderer.clear_waiting();
        state.arm(Instant::now());
    }

    let seen = state.classify(fragment);

    if seen.reasoning && state.reasoning.phase == PanelPhase::Absent {
        state.reasoning.phase = PanelPhase::Visible;
        renderer.show_panel(PanelKind::Reasoning);
    }

    if seen.content && state.response.phase == PanelPhase::Absent {
        if settings.consume_reasoning && state.reasoning.is_visible() {
            renderer.hide_panels();
            state.reasoning.phase = PanelPhase::Consumed;
        }
        state.response.phase = PanelPhase::Visible;
        renderer.show_panel(PanelKind::Response);
    }
}

/// Cadence flush: acts at most once per refresh interval.
fn update_renderables(state: &mut TurnState, settings: &TurnSettings, renderer: &mut dyn Renderer) {
    if !state.flush_due(settings.refresh_interval(), Instant::now()) {
        return;
    }
    let mut rendered = false;
    for channel in state.channels_mut() {
        channel.drain();
        rendered |= render_counted(channel, settings.panel_line_limit, renderer);
    }
    if rendered {
        renderer.refresh();
    }
}

fn render_counted(channel: &mut Channel, line_limit: usize, renderer: &mut dyn Renderer) -> bool {
    if !channel.is_visible() || !channel.counting {
        return false;
    }
    if channel.text().lines().count() < line_limit {
        renderer.update_text(channel.kind, channel.text());
        true
    } else {
        channel.counting = false;
        false
    }
}

/// Last drain after the stream is exhausted. Pushes both channels regardless
/// of the line-count gate.
fn flush_final(state: &mut TurnState, renderer: &mut dyn Renderer) {
    if state.reasoning.phase == PanelPhase::Consumed {
        state.reasoning.discard_buffer();
    } else {
        state.reasoning.drain();
    }
    state.response.drain();

    for channel in state.channels_mut() {
        if channel.is_visible() {
            renderer.update_text(channel.kind, channel.text());
        }
    }
    renderer.refresh();
}

/// Single exit path: live rendering stops exactly once and history is either
/// committed or corrected, never both.
fn finalize(
    end: LoopEnd,
    state: TurnState,
    history: &mut HistoryStore,
    settings: &TurnSettings,
    renderer: &mut dyn Renderer,
    on_complete: Option<CompletionCallback<'_>>,
) -> TurnOutcome {
    match end {
        LoopEnd::Exhausted(generation) => {
            renderer.end_live(true);
            history.record_generation(generation);
            match on_complete {
                Some(callback) => callback(history, state.response.text().trim()),
                None => {
                    history.append(Role::Assistant, state.commit_text());
                    let status = StatusLine::capture(history, settings.context_length, true);
                    renderer.show_status(&status);
                }
            }
            TurnOutcome::Committed
        }
        LoopEnd::Canceled => {
            renderer.end_live(false);
            history.correct_last_user_turn();
            TurnOutcome::Canceled
        }
        LoopEnd::Failed(e) => {
            renderer.end_live(false);
            history.correct_last_user_turn();
            renderer.show_error("API ERROR", &e.to_string());
            TurnOutcome::Failed(e)
        }
    }
}
