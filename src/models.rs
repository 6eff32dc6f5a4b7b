use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ThoughtChainError};

/// Kind of chain chosen by the kickoff classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThoughtKind {
    Reflect,
    Learn,
}

impl fmt::Display for ThoughtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThoughtKind::Reflect => write!(f, "REFLECT"),
            ThoughtKind::Learn => write!(f, "LEARN"),
        }
    }
}

/// Kind of an individual step response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Reflect,
    Act,
    Final,
}

impl StepKind {
    /// A terminal step ends the chain
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepKind::Final)
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Reflect => write!(f, "reflect"),
            StepKind::Act => write!(f, "act"),
            StepKind::Final => write!(f, "final"),
        }
    }
}

/// Result of the engine's classify/kickoff operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KickoffResponse {
    pub thought_type: ThoughtKind,
    pub rationale: String,
}

/// One reflect/act response appended while stepping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    pub kind: StepKind,
    pub rationale: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Reported status of a chain, derived from the record flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThoughtStatus {
    Running,
    Complete,
    Error,
}

impl fmt::Display for ThoughtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThoughtStatus::Running => write!(f, "running"),
            ThoughtStatus::Complete => write!(f, "complete"),
            ThoughtStatus::Error => write!(f, "error"),
        }
    }
}

/// Core thought record structure, one per chain, persisted whole on every
/// mutation. `steps` and `status_log` are append-only; replaying `kickoff`
/// then `steps` in order fully determines the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThoughtRecord {
    pub id: String,
    pub model: String,
    #[serde(default)]
    pub kickoff: Option<KickoffResponse>,
    #[serde(default)]
    pub steps: Vec<StepResponse>,
    #[serde(default)]
    pub status_log: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub errored: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ThoughtRecord {
    /// Create a new record for the given session id and engine model
    pub fn new(id: String, model: String) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id,
            model,
            kickoff: None,
            steps: Vec::new(),
            status_log: Vec::new(),
            completed: false,
            errored: false,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Derived status; an errored chain reports as error even if it was
    /// also marked complete by an older writer.
    pub fn status(&self) -> ThoughtStatus {
        if self.errored {
            ThoughtStatus::Error
        } else if self.completed {
            ThoughtStatus::Complete
        } else {
            ThoughtStatus::Running
        }
    }

    pub fn set_kickoff(&mut self, kickoff: KickoffResponse) {
        self.kickoff = Some(kickoff);
        self.touch();
    }

    pub fn push_step(&mut self, step: StepResponse) {
        self.steps.push(step);
        self.touch();
    }

    pub fn push_status(&mut self, message: impl Into<String>) {
        self.status_log.push(message.into());
        self.touch();
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
        self.touch();
    }

    pub fn mark_errored(&mut self) {
        self.errored = true;
        self.touch();
    }

    /// Parsed `updated_at`, used for recency ordering in listings
    pub fn updated_at_time(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.updated_at).map_err(|e| {
            ThoughtChainError::validation("updated_at", format!("not RFC 3339: {}", e))
        })
    }

    /// Strict structural validation, applied at the persistence boundary.
    /// A malformed record is surfaced as an error, never coerced.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ThoughtChainError::validation("id", "must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ThoughtChainError::validation("model", "must not be empty"));
        }
        DateTime::parse_from_rfc3339(&self.created_at).map_err(|e| {
            ThoughtChainError::validation("created_at", format!("not RFC 3339: {}", e))
        })?;
        self.updated_at_time()?;
        if self.kickoff.is_none() && !self.steps.is_empty() {
            return Err(ThoughtChainError::validation(
                "steps",
                "steps present without a kickoff",
            ));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now().to_rfc3339();
    }
}
