//! State module for tracking harvest progress
//!
//! - `RunPhase`: the orchestrator's phase machine (init, discover or resume,
//!   dispatch, drain, shut down, done)
//! - `Progress`: completion counting with decile reporting

mod progress;
mod run_phase;

pub use progress::Progress;
pub use run_phase::RunPhase;
