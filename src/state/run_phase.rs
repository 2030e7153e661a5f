/// Run phase definitions for the harvest orchestrator
///
/// A run moves through these phases in order; the only branch is whether the
/// pending list comes from discovery or from a pending snapshot.
use std::fmt;

/// Represents the current phase of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Configuration loaded, nothing started
    Init,

    /// Fetching the listing page and building the pending list
    Discovering,

    /// Rebuilding the pending list from a pending snapshot
    Resuming,

    /// Pushing pending units onto the worker queue
    Dispatching,

    /// Waiting for one completion per dispatched unit
    Draining,

    /// Queue and sink input closed, waiting for the sink to finish
    ShuttingDown,

    /// Sink acknowledged; run finished
    Done,
}

impl RunPhase {
    /// Returns true if moving from this phase to `next` is allowed
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        use RunPhase::*;
        matches!(
            (self, next),
            (Init, Discovering)
                | (Init, Resuming)
                | (Discovering, Dispatching)
                | (Resuming, Dispatching)
                | (Dispatching, Draining)
                | (Dispatching, ShuttingDown)
                | (Draining, ShuttingDown)
                | (ShuttingDown, Done)
        )
    }

    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true while workers may still be enriching units
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Dispatching | Self::Draining)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Discovering => "discovering",
            Self::Resuming => "resuming",
            Self::Dispatching => "dispatching",
            Self::Draining => "draining",
            Self::ShuttingDown => "shutting_down",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
