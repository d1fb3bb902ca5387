//! Message dispatcher: turns a submitted draft into a user message, one
//! backend round-trip, and an assistant reply.
//!
//! A submit is split into three steps so the network call can run off the
//! store-owning task:
//!
//! 1. [`Dispatcher::begin`] appends the user message and returns a
//!    [`PendingRequest`] tagged with that message's id.
//! 2. [`Dispatcher::fetch`] performs the request. It touches no state and
//!    may run concurrently with other fetches.
//! 3. [`Dispatcher::complete`] appends the reply to the consultation the
//!    request was issued from, whatever is active by then.
//!
//! No queueing, deduplication, or retry. Replies land in completion order.

use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::compose::Draft;
use crate::consultation::Message;
use crate::error::AppError;
use crate::format::format_response;
use crate::payload::ChatResponse;
use crate::store::ConversationStore;

/// User-visible reply text for a failed request.
pub fn error_text(err: &BackendError) -> String {
    format!("⚠️ Sorry, I couldn't reach the legal analysis service. Error: {err}")
}

/// An issued request awaiting its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub consultation_id: String,
    /// Id of the user message that triggered the request.
    pub request_id: i64,
    pub message: String,
}

#[derive(Debug)]
pub struct Completion {
    pub pending: PendingRequest,
    pub result: Result<ChatResponse, BackendError>,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    backend: Backend,
}

impl Dispatcher {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Append the user message, creating a consultation first when none is
    /// active.
    pub fn begin(&self, store: &mut ConversationStore, draft: Draft) -> Result<PendingRequest, AppError> {
        let consultation_id = match store.active_id() {
            Some(id) => id.to_string(),
            None => store.create(),
        };
        let message = draft.text.clone();
        let request_id =
            store.append_message(&consultation_id, Message::user(draft.text, draft.attachments))?;
        info!(
            consultation = %consultation_id,
            request_id,
            content_len = message.len(),
            "message submitted"
        );
        Ok(PendingRequest { consultation_id, request_id, message })
    }

    pub async fn fetch(&self, pending: PendingRequest) -> Completion {
        debug!(request_id = pending.request_id, backend = self.backend.name(), "dispatching");
        let result = self.backend.classify(&pending.message).await;
        Completion { pending, result }
    }

    /// Append the reply for `completion`. Failures become an error reply with
    /// no payload. Returns the reply's message id.
    pub fn complete(&self, store: &mut ConversationStore, completion: Completion) -> Result<i64, AppError> {
        let Completion { pending, result } = completion;
        let reply = match result {
            Ok(response) => {
                debug!(
                    request_id = pending.request_id,
                    category = %response.category,
                    "request completed"
                );
                Message::assistant(format_response(&response), Some(response), Some(pending.request_id))
            }
            Err(e) => {
                warn!(request_id = pending.request_id, error = %e, "request failed");
                Message::assistant(error_text(&e), None, Some(pending.request_id))
            }
        };
        store.append_message(&pending.consultation_id, reply)
    }

    /// `begin`, `fetch`, and `complete` in sequence.
    pub async fn send(&self, store: &mut ConversationStore, draft: Draft) -> Result<i64, AppError> {
        let pending = self.begin(store, draft)?;
        let completion = self.fetch(pending).await;
        self.complete(store, completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OfflineBackend;
    use crate::consultation::Role;
    use crate::storage::MemoryStorage;
    use crate::store::Theme;
    use std::sync::Arc;

    fn store() -> ConversationStore {
        ConversationStore::load(Arc::new(MemoryStorage::new()), Theme::Light)
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Backend::Offline(OfflineBackend))
    }

    fn draft(text: &str) -> Draft {
        Draft { text: text.into(), attachments: Vec::new() }
    }

    #[tokio::test]
    async fn send_without_active_creates_one_consultation() {
        let mut store = store();
        let d = dispatcher();
        d.send(&mut store, draft("My neighbour keeps threatening my family at night"))
            .await
            .unwrap();

        assert_eq!(store.consultations().len(), 1);
        let c = store.active().unwrap();
        assert_eq!(c.title, "My neighbour keeps threatening...");
        assert_eq!(c.messages.len(), 2);
        assert_eq!(c.messages[0].role, Role::User);
        assert_eq!(c.messages[1].role, Role::Assistant);
        assert_eq!(c.messages[1].reply_to, Some(c.messages[0].id));
        assert!(c.messages[1].has_details());
    }

    #[tokio::test]
    async fn send_reuses_active_consultation() {
        let mut store = store();
        let id = store.create();
        let d = dispatcher();
        d.send(&mut store, draft("first")).await.unwrap();
        d.send(&mut store, draft("second")).await.unwrap();
        assert_eq!(store.consultations().len(), 1);
        assert_eq!(store.get(&id).unwrap().messages.len(), 4);
        assert_eq!(store.get(&id).unwrap().title, "first");
    }

    #[test]
    fn failure_reply_has_no_payload() {
        let mut store = store();
        let d = dispatcher();
        let pending = d.begin(&mut store, draft("hello")).unwrap();
        let request_id = pending.request_id;
        let completion = Completion {
            pending,
            result: Err(BackendError::Request("connection refused".into())),
        };
        d.complete(&mut store, completion).unwrap();

        let reply = store.active().unwrap().messages.last().unwrap().clone();
        assert_eq!(reply.role, Role::Assistant);
        assert!(reply.text.contains("connection refused"));
        assert!(reply.text.starts_with("⚠️ Sorry, I couldn't reach the legal analysis service."));
        assert!(reply.data.is_none());
        assert_eq!(reply.reply_to, Some(request_id));
    }

    #[tokio::test]
    async fn reply_lands_in_issuing_consultation() {
        let mut store = store();
        let d = dispatcher();
        let pending = d.begin(&mut store, draft("about my lease")).unwrap();
        let first = pending.consultation_id.clone();

        let second = store.create();
        let completion = d.fetch(pending).await;
        d.complete(&mut store, completion).unwrap();

        assert_eq!(store.active_id(), Some(second.as_str()));
        assert!(store.get(&second).unwrap().is_empty());
        assert_eq!(store.get(&first).unwrap().messages.len(), 2);
    }

    #[tokio::test]
    async fn reply_for_deleted_consultation_is_not_found() {
        let mut store = store();
        let d = dispatcher();
        let pending = d.begin(&mut store, draft("hello")).unwrap();
        store.delete(&pending.consultation_id);
        let completion = d.fetch(pending).await;
        assert!(matches!(d.complete(&mut store, completion), Err(AppError::NotFound(_))));
    }
}
