//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, stage.rs):
//!     Loading → IdentityResolved → ContractsBound → OverlayConstructed
//!             → IngestionStarted → Bootstrapping → Serving
//!
//! Shutdown (shutdown.rs):
//!     Trigger → ingestion processes stop → error streams close
//!             → server stops accepting → drain in-flight requests
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: no stage starts before its inputs exist
//! - Fatal failures abort before any network-facing state is created
//! - Listener binds last (traffic only when ready)

pub mod shutdown;
pub mod signals;
pub mod stage;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{shutdown_signal, spawn_signal_handler};
pub use stage::{InvalidTransition, Stage, StageFailure, StageTracker};
pub use startup::{BootstrapOutcome, Dependencies, Orchestrator, RunningNode, StartupError};
