//! Per-request state machine
//!
//! ```text
//! Idle -> Generating -> Encoding -> Done
//!             |             |
//!             +-> Failed <--+
//! ```
//!
//! `Done` and `Failed` are terminal. There are no retries: a failed request
//! is reported and a new request starts from `Idle`.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{BeatloopError, Result};

/// Request lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    #[default]
    Idle,
    Generating,
    Encoding,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "Idle"),
            PipelineState::Generating => write!(f, "Generating"),
            PipelineState::Encoding => write!(f, "Encoding"),
            PipelineState::Done => write!(f, "Done"),
            PipelineState::Failed => write!(f, "Failed"),
        }
    }
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Whether `self -> next` is a legal edge
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;
        matches!(
            (self, next),
            (Idle, Generating)
                | (Generating, Encoding)
                | (Encoding, Done)
                | (Generating, Failed)
                | (Encoding, Failed)
        )
    }
}

/// Tracks the state of one request
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    state: PipelineState,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Move to `next`
    ///
    /// # Errors
    /// * `InvalidTransition` - `next` is not reachable from the current state
    pub fn transition(&mut self, next: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(BeatloopError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!(from = %self.state, to = %next, "pipeline transition");
        self.state = next;
        Ok(())
    }

    /// Move to `Failed`
    pub fn fail(&mut self, error: &BeatloopError) -> Result<()> {
        self.transition(PipelineState::Failed)?;
        debug!(code = error.error_code(), "request failed");
        Ok(())
    }
}
