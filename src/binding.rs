use std::sync::Arc;

use crate::engine::ReasoningEngine;
use crate::error::{Result, ThoughtChainError};
use crate::repository::ThoughtRepository;
use crate::session::{SessionState, ThoughtSession};

/// Maps a user-visible session identifier to a [`ThoughtSession`]. The
/// identifier doubles as the thought id, so reloading the same handle
/// resumes the same chain.
///
/// Binding the same identifier from two independent session contexts at
/// once is unsafe: both will read-modify-write the whole record and the
/// last writer wins on persistence. This is surfaced, not handled.
pub struct SessionBinding<R, E> {
    repository: Arc<R>,
    engine: Arc<E>,
    session_id: String,
    session: Option<ThoughtSession<R, E>>,
}

impl<R: ThoughtRepository, E: ReasoningEngine> SessionBinding<R, E> {
    /// Resolve a binding. An explicit identifier loads the matching record
    /// when one exists and otherwise starts fresh under that identifier;
    /// with no identifier a new one is generated.
    pub async fn bind(
        repository: Arc<R>,
        engine: Arc<E>,
        requested: Option<&str>,
    ) -> Result<Self> {
        let (session_id, session) = match requested {
            Some(id) => {
                let session = match repository.get_thought(id).await? {
                    Some(record) => {
                        if !record.completed && !record.errored {
                            tracing::warn!(
                                "Binding incomplete thought {}; concurrent processing of the \
                                 same thought is last-writer-wins",
                                id
                            );
                        }
                        Some(ThoughtSession::resume(
                            repository.clone(),
                            engine.clone(),
                            record,
                        ))
                    }
                    None => None,
                };
                (id.to_string(), session)
            }
            None => (generate_session_id(), None),
        };
        Ok(Self {
            repository,
            engine,
            session_id,
            session,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state())
            .unwrap_or(SessionState::AwaitingTrigger)
    }

    /// Start a new chain under the bound identifier. At most one chain may
    /// be in flight per session; triggering over an existing one is an
    /// invalid action (clear first).
    pub async fn trigger(&mut self, model: &str) -> Result<()> {
        if self.session.is_some() {
            return Err(ThoughtChainError::InvalidState(format!(
                "a thought chain is already bound to session {}",
                self.session_id
            )));
        }
        let session = ThoughtSession::trigger(
            self.repository.clone(),
            self.engine.clone(),
            self.session_id.clone(),
            model,
        )
        .await?;
        self.session = Some(session);
        Ok(())
    }

    pub fn session(&self) -> Option<&ThoughtSession<R, E>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut ThoughtSession<R, E>> {
        self.session.as_mut()
    }

    /// Discard the in-memory binding and detach to a fresh identifier. The
    /// persisted record is untouched and stays listable.
    pub fn clear(&mut self) {
        tracing::info!("Cleared session {}", self.session_id);
        self.session = None;
        self.session_id = generate_session_id();
    }
}

pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Derive the session identifier from an external addressable handle, the
/// `s` query parameter of a page URL (`?s=<id>`).
pub fn session_id_from_handle(query: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key == "s" && !value.is_empty() {
                Some(value.to_string())
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_parsing_extracts_session_param() {
        assert_eq!(
            session_id_from_handle("?s=abc-123"),
            Some("abc-123".to_string())
        );
        assert_eq!(
            session_id_from_handle("tab=main&s=abc-123"),
            Some("abc-123".to_string())
        );
        assert_eq!(session_id_from_handle("?s="), None);
        assert_eq!(session_id_from_handle("?tab=main"), None);
        assert_eq!(session_id_from_handle(""), None);
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
