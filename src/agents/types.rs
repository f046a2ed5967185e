use serde::{Deserialize, Serialize};
use std::fmt;

/// What a processing agent is doing right now.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AgentStatus {
    /// Waiting for work.
    Idle,
    /// Running a place against a work item.
    Working,
    /// Holding off because the node is paused. Queued work is retained.
    Paused,
    /// Worker loop has exited.
    Stopped,
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentStatus::Idle => "Idle",
            AgentStatus::Working => "Working",
            AgentStatus::Paused => "Paused",
            AgentStatus::Stopped => "Stopped",
        };
        f.write_str(label)
    }
}

/// Point-in-time view of one agent, as served by the agents endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSnapshot {
    pub name: String,
    pub status: AgentStatus,
    /// Key of the place currently running, if any.
    pub place: Option<String>,
    /// Short name of the item being processed, if any.
    pub item: Option<String>,
    pub processed: u64,
}

impl AgentSnapshot {
    pub fn idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: AgentStatus::Idle,
            place: None,
            item: None,
            processed: 0,
        }
    }
}

impl fmt::Display for AgentSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.status)?;
        if let (Some(place), Some(item)) = (&self.place, &self.item) {
            write!(f, " {} <- {}", place, item)?;
        }
        write!(f, " (processed {})", self.processed)
    }
}

pub fn agent_name(index: usize) -> String {
    format!("Agent-{:02}", index + 1)
}
