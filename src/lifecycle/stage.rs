//! Startup stage machine.
//!
//! ```text
//! Loading → IdentityResolved → ContractsBound → OverlayConstructed
//!         → IngestionStarted → Bootstrapping → Serving
//!
//! Loading | IdentityResolved | ContractsBound ──fatal──► Aborted
//! ```
//!
//! Failures in later stages are degraded: they are recorded and the machine
//! keeps moving forward.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::error::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Loading,
    IdentityResolved,
    ContractsBound,
    OverlayConstructed,
    IngestionStarted,
    Bootstrapping,
    Serving,
    Aborted,
}

impl Stage {
    /// The stage that follows on success.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Loading => Some(Stage::IdentityResolved),
            Stage::IdentityResolved => Some(Stage::ContractsBound),
            Stage::ContractsBound => Some(Stage::OverlayConstructed),
            Stage::OverlayConstructed => Some(Stage::IngestionStarted),
            Stage::IngestionStarted => Some(Stage::Bootstrapping),
            Stage::Bootstrapping => Some(Stage::Serving),
            Stage::Serving | Stage::Aborted => None,
        }
    }

    /// Whether a failure in this stage may abort startup.
    pub fn can_abort(self) -> bool {
        matches!(self, Stage::Loading | Stage::IdentityResolved | Stage::ContractsBound)
    }

    pub fn can_transition_to(self, to: Stage) -> bool {
        self.next() == Some(to) || (to == Stage::Aborted && self.can_abort())
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Serving | Stage::Aborted)
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Stage::Loading => 0,
            Stage::IdentityResolved => 1,
            Stage::ContractsBound => 2,
            Stage::OverlayConstructed => 3,
            Stage::IngestionStarted => 4,
            Stage::Bootstrapping => 5,
            Stage::Serving => 6,
            Stage::Aborted => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Loading => "loading",
            Stage::IdentityResolved => "identity-resolved",
            Stage::ContractsBound => "contracts-bound",
            Stage::OverlayConstructed => "overlay-constructed",
            Stage::IngestionStarted => "ingestion-started",
            Stage::Bootstrapping => "bootstrapping",
            Stage::Serving => "serving",
            Stage::Aborted => "aborted",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal stage transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: Stage,
    pub to: Stage,
}

/// Outcome of a failed stage.
#[derive(Debug)]
pub enum StageFailure {
    /// Startup cannot continue.
    Fatal { stage: Stage, error: NodeError },
    /// Logged; startup continues.
    Degraded { stage: Stage, error: NodeError },
}

impl StageFailure {
    /// Classify `error` raised while in `stage`.
    pub fn classify(stage: Stage, error: NodeError) -> Self {
        if error.is_fatal() && stage.can_abort() {
            StageFailure::Fatal { stage, error }
        } else {
            StageFailure::Degraded { stage, error }
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            StageFailure::Fatal { stage, .. } | StageFailure::Degraded { stage, .. } => *stage,
        }
    }

    pub fn error(&self) -> &NodeError {
        match self {
            StageFailure::Fatal { error, .. } | StageFailure::Degraded { error, .. } => error,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, StageFailure::Fatal { .. })
    }
}

/// Current stage plus every stage visited so far.
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: Stage,
    history: Vec<Stage>,
    degraded: Vec<Stage>,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: Stage::Loading,
            history: vec![Stage::Loading],
            degraded: Vec::new(),
        }
    }

    pub fn current(&self) -> Stage {
        self.current
    }

    pub fn history(&self) -> &[Stage] {
        &self.history
    }

    /// Stages that completed with a degraded failure.
    pub fn degraded(&self) -> &[Stage] {
        &self.degraded
    }

    pub fn reached(&self, stage: Stage) -> bool {
        self.history.contains(&stage)
    }

    pub fn advance(&mut self, to: Stage) -> Result<(), InvalidTransition> {
        if !self.current.can_transition_to(to) {
            return Err(InvalidTransition {
                from: self.current,
                to,
            });
        }
        self.current = to;
        self.history.push(to);
        crate::observability::metrics::record_stage(to);
        Ok(())
    }

    /// Apply a failure of the current stage. Fatal failures move to
    /// `Aborted`; degraded failures leave the stage unchanged.
    pub fn record_failure(&mut self, failure: &StageFailure) -> Result<Stage, InvalidTransition> {
        match failure {
            StageFailure::Fatal { .. } => {
                self.advance(Stage::Aborted)?;
            }
            StageFailure::Degraded { stage, .. } => {
                self.degraded.push(*stage);
            }
        }
        Ok(self.current)
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
