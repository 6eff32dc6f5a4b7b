use async_trait::async_trait;

use crate::error::Result;
use crate::models::{KickoffResponse, StepResponse};

/// External reasoning engine collaborator. Both operations are blocking
/// from the caller's perspective: an action that invokes the engine does
/// not return until the call completes or fails. Failures surface as
/// [`crate::error::ThoughtChainError::Engine`] and drive the owning chain
/// into its errored state; the core never retries on its own.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// Classify a fresh chain, producing its kickoff rationale. Invoked at
    /// most once per thought record.
    async fn classify(&self, model: &str) -> Result<KickoffResponse>;

    /// Produce the next step given the kickoff rationale and the full
    /// ordered history of prior steps.
    async fn step(
        &self,
        model: &str,
        rationale: &str,
        history: &[StepResponse],
    ) -> Result<StepResponse>;
}
