//! Cross-context intake.
//!
//! `EngineHandle` is `Clone + Send`; producers on other threads (slow content
//! generators, story logic) post commands into an unbounded channel. The engine
//! drains it once per tick, before any scheduler step, in FIFO order. Effect
//! requests get a `Ticket` immediately and their outcome appears in the
//! `TickReport` of the tick that resolved them.

use core_effects::{EffectRequest, InstanceId, Ticket};
use core_text::TextLine;
use crossbeam_channel::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug)]
pub(crate) enum Command {
    Submit(Ticket, EffectRequest),
    SetLevel(f32),
    AdjustLevel(f32),
    ClearAll,
    Cancel(InstanceId),
    PostLines(Vec<TextLine>),
    /// Plain text colored with the theme's default foreground.
    PostText(Vec<String>),
    Placeholder(Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    #[error("engine has shut down")]
    EngineGone,
}

#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: Sender<Command>,
    tickets: Arc<AtomicU64>,
}

impl EngineHandle {
    pub(crate) fn new(tx: Sender<Command>, tickets: Arc<AtomicU64>) -> Self {
        Self { tx, tickets }
    }

    fn send(&self, cmd: Command) -> Result<(), HandleError> {
        self.tx.send(cmd).map_err(|_| HandleError::EngineGone)
    }

    /// Request an effect; resolved during the next tick.
    pub fn submit(&self, request: EffectRequest) -> Result<Ticket, HandleError> {
        let ticket = Ticket(self.tickets.fetch_add(1, Ordering::Relaxed));
        self.send(Command::Submit(ticket, request))?;
        Ok(ticket)
    }

    pub fn set_level(&self, level: f32) -> Result<(), HandleError> {
        self.send(Command::SetLevel(level))
    }

    pub fn adjust_level(&self, delta: f32) -> Result<(), HandleError> {
        self.send(Command::AdjustLevel(delta))
    }

    pub fn clear_all(&self) -> Result<(), HandleError> {
        self.send(Command::ClearAll)
    }

    pub fn cancel(&self, id: InstanceId) -> Result<(), HandleError> {
        self.send(Command::Cancel(id))
    }

    /// Post completed lines. Partial output should stay with the producer.
    pub fn post_lines(&self, lines: Vec<TextLine>) -> Result<(), HandleError> {
        self.send(Command::PostLines(lines))
    }

    pub fn post_text<I, S>(&self, lines: I) -> Result<(), HandleError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Command::PostText(lines.into_iter().map(Into::into).collect()))
    }

    /// Show (or with `None`, remove) the pending-output placeholder.
    pub fn set_placeholder(&self, text: Option<String>) -> Result<(), HandleError> {
        self.send(Command::Placeholder(text))
    }
}
