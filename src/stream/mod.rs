//! Turn streaming engine.
//!
//! One turn moves IDLE -> STREAMING -> {COMMITTED | CANCELED | FAILED} -> IDLE.
//! Fragments are classified into a reasoning and a response channel, flushed
//! to the renderer at a bounded cadence, and committed to history only when
//! the stream is exhausted without error or interruption.

mod engine;
mod state;


pub use engine::{CompletionCallback, Interrupt, TurnOutcome, TurnSettings, run_turn};
pub use state::TurnState;
