//! Execution phases for lifecycle hooks

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the five fixed points around terraform execution where hooks run
///
/// Phases are traversed at most once per deployment attempt, strictly in
/// order: `pre-init → post-init → pre-plan → [plan | apply] → post-plan
/// (plan only) | post-apply (apply/rollback only)`. Sequencing is owned by
/// the caller's pipeline; the runner's unit of work is one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookPhase {
    #[serde(rename = "pre-init")]
    PreInit,

    #[serde(rename = "post-init")]
    PostInit,

    #[serde(rename = "pre-plan")]
    PrePlan,

    #[serde(rename = "post-plan")]
    PostPlan,

    #[serde(rename = "post-apply")]
    PostApply,
}

impl HookPhase {
    /// The wire spelling, as exposed in `TF_BD_PHASE`
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::PreInit => "pre-init",
            HookPhase::PostInit => "post-init",
            HookPhase::PrePlan => "pre-plan",
            HookPhase::PostPlan => "post-plan",
            HookPhase::PostApply => "post-apply",
        }
    }
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
