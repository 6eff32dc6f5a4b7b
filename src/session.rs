use std::fmt;
use std::sync::Arc;

use crate::engine::ReasoningEngine;
use crate::error::{Result, ThoughtChainError};
use crate::models::{KickoffResponse, StepResponse, ThoughtRecord};
use crate::repository::ThoughtRepository;

/// Session state, derived from the record rather than stored alongside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingTrigger,
    Classifying,
    Stepping,
    Complete,
    Errored,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::AwaitingTrigger => write!(f, "awaiting-trigger"),
            SessionState::Classifying => write!(f, "classifying"),
            SessionState::Stepping => write!(f, "stepping"),
            SessionState::Complete => write!(f, "complete"),
            SessionState::Errored => write!(f, "errored"),
        }
    }
}

/// Outcome of one continue action
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// A step was appended and the chain keeps going
    Advanced(StepResponse),
    /// A terminal step was appended and the chain is now complete
    Completed(StepResponse),
    /// The chain is in a terminal state; nothing was mutated
    NoOp,
}

/// Drives a single thought chain from trigger to completion. Every state
/// transition persists the whole record before returning, so a crash
/// between actions never loses more than the in-flight engine call. A
/// failed save leaves the in-memory record untouched.
pub struct ThoughtSession<R, E> {
    repository: Arc<R>,
    engine: Arc<E>,
    record: ThoughtRecord,
}

impl<R: ThoughtRepository, E: ReasoningEngine> ThoughtSession<R, E> {
    /// Create and persist a fresh record for `id`, leaving the session
    /// ready to classify.
    pub async fn trigger(
        repository: Arc<R>,
        engine: Arc<E>,
        id: String,
        model: &str,
    ) -> Result<Self> {
        let mut record = ThoughtRecord::new(id, model.to_string());
        record.push_status(format!("Thought initiated {}", record.id));
        record.push_status(format!("Thought Model: {}", model));
        repository.save_thought(&record).await?;
        tracing::info!("Triggered thought chain {} (model {})", record.id, model);
        Ok(Self {
            repository,
            engine,
            record,
        })
    }

    /// Rebind a previously persisted record. A record whose kickoff is
    /// already set resumes directly in the stepping state.
    pub fn resume(repository: Arc<R>, engine: Arc<E>, record: ThoughtRecord) -> Self {
        let session = Self {
            repository,
            engine,
            record,
        };
        tracing::info!(
            "Resumed thought chain {} in state {}",
            session.record.id,
            session.state()
        );
        session
    }

    pub fn record(&self) -> &ThoughtRecord {
        &self.record
    }

    pub fn state(&self) -> SessionState {
        if self.record.errored {
            SessionState::Errored
        } else if self.record.completed {
            SessionState::Complete
        } else if self.record.kickoff.is_none() {
            SessionState::Classifying
        } else {
            SessionState::Stepping
        }
    }

    /// Run the engine's classify operation, at most once per record. A
    /// resumed session whose kickoff is already set skips the call.
    pub async fn classify(&mut self) -> Result<KickoffResponse> {
        if let Some(kickoff) = &self.record.kickoff {
            tracing::debug!("Thought {} already classified, skipping", self.record.id);
            return Ok(kickoff.clone());
        }
        if self.state() != SessionState::Classifying {
            return Err(ThoughtChainError::InvalidState(format!(
                "classify is not permitted in state {}",
                self.state()
            )));
        }
        match self.engine.classify(&self.record.model).await {
            Ok(kickoff) => {
                let mut updated = self.record.clone();
                updated.set_kickoff(kickoff.clone());
                updated.push_status(format!("Thought Type: {}", kickoff.thought_type));
                self.repository.save_thought(&updated).await?;
                self.record = updated;
                Ok(kickoff)
            }
            Err(err) => {
                tracing::error!("Classify failed for thought {}: {}", self.record.id, err);
                self.fail(format!("Engine failure: {}", err)).await?;
                Err(err)
            }
        }
    }

    /// The continue action: ask the engine for the next step and append it.
    /// In a terminal state this is a no-op; before classification it is an
    /// invalid action.
    pub async fn advance(&mut self) -> Result<StepOutcome> {
        match self.state() {
            SessionState::Complete | SessionState::Errored => {
                tracing::debug!(
                    "Continue ignored for thought {} in state {}",
                    self.record.id,
                    self.state()
                );
                return Ok(StepOutcome::NoOp);
            }
            SessionState::Stepping => {}
            state => {
                return Err(ThoughtChainError::InvalidState(format!(
                    "continue is not permitted in state {}",
                    state
                )));
            }
        }
        let rationale = match &self.record.kickoff {
            Some(kickoff) => kickoff.rationale.clone(),
            None => {
                return Err(ThoughtChainError::InvalidState(
                    "continue requires a classified thought".to_string(),
                ));
            }
        };
        match self
            .engine
            .step(&self.record.model, &rationale, &self.record.steps)
            .await
        {
            Ok(step) => {
                let terminal = step.kind.is_terminal();
                let mut updated = self.record.clone();
                updated.push_step(step.clone());
                updated.push_status(format!("Action: {}", step.kind));
                if terminal {
                    updated.mark_completed();
                    updated.push_status("Thought chain complete");
                }
                self.repository.save_thought(&updated).await?;
                self.record = updated;
                if terminal {
                    tracing::info!("Thought chain {} complete", self.record.id);
                    Ok(StepOutcome::Completed(step))
                } else {
                    Ok(StepOutcome::Advanced(step))
                }
            }
            Err(err) => {
                tracing::error!("Step failed for thought {}: {}", self.record.id, err);
                self.fail(format!("Engine failure: {}", err)).await?;
                Err(err)
            }
        }
    }

    /// Append a human-readable progress message and persist
    pub async fn add_status(&mut self, message: impl Into<String>) -> Result<()> {
        let mut updated = self.record.clone();
        updated.push_status(message.into());
        self.repository.save_thought(&updated).await?;
        self.record = updated;
        Ok(())
    }

    async fn fail(&mut self, message: String) -> Result<()> {
        let mut updated = self.record.clone();
        updated.mark_errored();
        updated.push_status(message);
        self.repository.save_thought(&updated).await?;
        self.record = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KickoffResponse, ThoughtKind};
    use crate::repository::MockThoughtRepository;
    use async_trait::async_trait;

    struct NoopEngine;

    #[async_trait]
    impl ReasoningEngine for NoopEngine {
        async fn classify(&self, _model: &str) -> Result<KickoffResponse> {
            Err(ThoughtChainError::Engine("unexpected classify".to_string()))
        }

        async fn step(
            &self,
            _model: &str,
            _rationale: &str,
            _history: &[StepResponse],
        ) -> Result<StepResponse> {
            Err(ThoughtChainError::Engine("unexpected step".to_string()))
        }
    }

    fn classified_record() -> ThoughtRecord {
        let mut record = ThoughtRecord::new("t-1".to_string(), "gpt-4".to_string());
        record.set_kickoff(KickoffResponse {
            thought_type: ThoughtKind::Reflect,
            rationale: "R1".to_string(),
        });
        record
    }

    #[tokio::test]
    async fn failed_save_leaves_memory_unchanged() {
        let mut repository = MockThoughtRepository::new();
        repository
            .expect_save_thought()
            .times(1)
            .returning(|_| Err(ThoughtChainError::Io(std::io::Error::other("disk full"))));

        let record = classified_record();
        let before = record.clone();
        let mut session =
            ThoughtSession::resume(Arc::new(repository), Arc::new(NoopEngine), record);

        let result = session.add_status("should not stick").await;
        assert!(matches!(result, Err(ThoughtChainError::Io(_))));
        assert_eq!(session.record(), &before);
    }

    #[tokio::test]
    async fn continue_before_classify_is_invalid() {
        let repository = MockThoughtRepository::new();
        let record = ThoughtRecord::new("t-2".to_string(), "gpt-4".to_string());
        let mut session =
            ThoughtSession::resume(Arc::new(repository), Arc::new(NoopEngine), record);

        assert_eq!(session.state(), SessionState::Classifying);
        assert!(matches!(
            session.advance().await,
            Err(ThoughtChainError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn classify_after_error_is_invalid() {
        let repository = MockThoughtRepository::new();
        let mut record = ThoughtRecord::new("t-3".to_string(), "gpt-4".to_string());
        record.mark_errored();
        let mut session =
            ThoughtSession::resume(Arc::new(repository), Arc::new(NoopEngine), record);

        assert_eq!(session.state(), SessionState::Errored);
        assert!(matches!(
            session.classify().await,
            Err(ThoughtChainError::InvalidState(_))
        ));
    }
}
