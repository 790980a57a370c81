//! Driver phases
//!
//! ```text
//! INIT → WARMUP → GA_PHASE → CONFIGURE → RL_INIT → RL_LOOP → DONE
//! ```
//!
//! Strictly sequential; nothing branches back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Init,
    Warmup,
    GaPhase,
    Configure,
    RlInit,
    RlLoop,
    Done,
}

impl Phase {
    /// Successor in the fixed sequence; `Done` has none
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::Warmup),
            Phase::Warmup => Some(Phase::GaPhase),
            Phase::GaPhase => Some(Phase::Configure),
            Phase::Configure => Some(Phase::RlInit),
            Phase::RlInit => Some(Phase::RlLoop),
            Phase::RlLoop => Some(Phase::Done),
            Phase::Done => None,
        }
    }

    /// Whether the driver may move from `self` to `to`
    ///
    /// Forward moves only. Jumping straight to `Done` is allowed from any
    /// phase (abort and fallback).
    pub fn can_enter(self, to: Phase) -> bool {
        (to == Phase::Done && self != Phase::Done) || self.next() == Some(to)
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Done
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::Warmup => "WARMUP",
            Phase::GaPhase => "GA_PHASE",
            Phase::Configure => "CONFIGURE",
            Phase::RlInit => "RL_INIT",
            Phase::RlLoop => "RL_LOOP",
            Phase::Done => "DONE",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
