//! Entity kinds shown by the dashboard and their execution phases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of entity a view lists or shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Registered task definitions.
    Task,
    /// Registered workflow graphs.
    Workflow,
    /// Launch plans bound to workflows.
    LaunchPlan,
    /// Workflow or task executions.
    Execution,
    /// Per-node executions inside a workflow execution.
    NodeExecution,
}

impl EntityKind {
    /// Whether views of this kind can contain data that changes on its own.
    pub const fn has_phase(self) -> bool {
        matches!(self, Self::Execution | Self::NodeExecution)
    }
}

/// Phase of an execution as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    /// Phase not reported yet.
    Undefined,
    /// Accepted, waiting for resources.
    Queued,
    /// Running.
    Running,
    /// Finishing successfully.
    Succeeding,
    /// Finished successfully.
    Succeeded,
    /// Finishing with a failure.
    Failing,
    /// Finished with a failure.
    Failed,
    /// Abort requested.
    Aborting,
    /// Aborted.
    Aborted,
    /// Exceeded its deadline.
    TimedOut,
    /// Recovered from a previous execution.
    Recovered,
}

impl ExecutionPhase {
    /// All phases, in lifecycle order.
    pub const ALL: [Self; 11] = [
        Self::Undefined,
        Self::Queued,
        Self::Running,
        Self::Succeeding,
        Self::Succeeded,
        Self::Failing,
        Self::Failed,
        Self::Aborting,
        Self::Aborted,
        Self::TimedOut,
        Self::Recovered,
    ];

    /// Wire name of the phase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeding => "succeeding",
            Self::Succeeded => "succeeded",
            Self::Failing => "failing",
            Self::Failed => "failed",
            Self::Aborting => "aborting",
            Self::Aborted => "aborted",
            Self::TimedOut => "timed_out",
            Self::Recovered => "recovered",
        }
    }

    /// No further change is expected after a terminal phase.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Aborted | Self::TimedOut | Self::Recovered
        )
    }

    /// Phases treated as in-progress by default. `Undefined` is excluded:
    /// an unknown status is not assumed live.
    pub fn in_progress_defaults() -> Vec<String> {
        Self::ALL
            .iter()
            .filter(|p| !p.is_terminal() && **p != Self::Undefined)
            .map(|p| p.as_str().to_string())
            .collect()
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| format!("unknown execution phase `{s}`"))
    }
}

/// Anything that exposes a status the liveness check can inspect.
pub trait StatusBearing {
    /// Current status, or `None` when the status is not known.
    fn status(&self) -> Option<&str>;
}

/// Summary row of an execution list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    /// Execution name (unique within project/domain).
    pub name: String,
    /// Project the execution belongs to.
    pub project: String,
    /// Domain the execution belongs to.
    pub domain: String,
    /// Current phase.
    pub phase: ExecutionPhase,
    /// Creation time, milliseconds since epoch.
    pub created_at_ms: u128,
}

impl StatusBearing for ExecutionSummary {
    fn status(&self) -> Option<&str> {
        Some(self.phase.as_str())
    }
}

impl StatusBearing for ExecutionPhase {
    fn status(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: StatusBearing> StatusBearing for Option<T> {
    fn status(&self) -> Option<&str> {
        self.as_ref().and_then(StatusBearing::status)
    }
}
