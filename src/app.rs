//! Client state: the conversation store, the compose buffer, the dispatcher,
//! and the transient UI flags around them.
//!
//! `App` is owned by a single task. Network calls happen outside it via
//! [`Dispatcher::fetch`]; their results come back through [`App::finish`].

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::backend::Backend;
use crate::compose::Composer;
use crate::config::Config;
use crate::consultation::Consultation;
use crate::dispatch::{Completion, Dispatcher, PendingRequest};
use crate::error::AppError;
use crate::payload::ChatResponse;
use crate::storage::Storage;
use crate::store::ConversationStore;

pub struct App {
    store: ConversationStore,
    composer: Composer,
    dispatcher: Dispatcher,
    /// Outstanding requests per consultation id; drives the typing indicator.
    in_flight: HashMap<String, usize>,
    sidebar_open: bool,
    assistant_name: String,
}

impl App {
    pub fn new(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, AppError> {
        let backend = Backend::build(&config.backend)?;
        Ok(Self::with_backend(config, storage, backend))
    }

    pub fn with_backend(config: &Config, storage: Arc<dyn Storage>, backend: Backend) -> Self {
        let store = ConversationStore::load(storage, config.ui.default_theme);
        info!(backend = backend.name(), assistant = %config.client.name, "app ready");
        Self {
            store,
            composer: Composer::new(),
            dispatcher: Dispatcher::new(backend),
            in_flight: HashMap::new(),
            sidebar_open: config.ui.show_sidebar,
            assistant_name: config.client.name.clone(),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConversationStore {
        &mut self.store
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }

    // ── Sending ───────────────────────────────────────────────────────

    /// Submit the compose buffer. `Ok(None)` when there is nothing to send.
    pub fn submit(&mut self) -> Result<Option<PendingRequest>, AppError> {
        let Some(draft) = self.composer.take_draft() else {
            return Ok(None);
        };
        let pending = self.dispatcher.begin(&mut self.store, draft)?;
        *self.in_flight.entry(pending.consultation_id.clone()).or_default() += 1;
        Ok(Some(pending))
    }

    /// Apply a finished request. The typing count drops even when the
    /// consultation has since been deleted.
    pub fn finish(&mut self, completion: Completion) -> Result<i64, AppError> {
        let id = &completion.pending.consultation_id;
        if let Some(count) = self.in_flight.get_mut(id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.in_flight.remove(id);
            }
        }
        self.dispatcher.complete(&mut self.store, completion)
    }

    pub fn is_typing(&self, consultation_id: &str) -> bool {
        self.in_flight.get(consultation_id).is_some_and(|n| *n > 0)
    }

    pub fn pending_total(&self) -> usize {
        self.in_flight.values().sum()
    }

    // ── Consultations ─────────────────────────────────────────────────

    pub fn new_consultation(&mut self) -> String {
        self.store.create()
    }

    /// Select the consultation at `index` (0-based, list order).
    pub fn open(&mut self, index: usize) -> Result<&Consultation, AppError> {
        let id = self.id_at(index)?;
        self.store.select(&id)?;
        self.store
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("consultation {id}")))
    }

    /// Delete the consultation at `index` (0-based). Returns its title.
    pub fn delete(&mut self, index: usize) -> Result<String, AppError> {
        let id = self.id_at(index)?;
        let title = self
            .store
            .get(&id)
            .map(|c| c.title.clone())
            .unwrap_or_default();
        self.store.delete(&id);
        debug!(%id, "consultation removed by user");
        Ok(title)
    }

    /// Payload of the latest assistant reply in the active consultation.
    pub fn latest_details(&self) -> Option<&ChatResponse> {
        self.store
            .active()?
            .last_assistant_with_details()?
            .data
            .as_ref()
    }

    fn id_at(&self, index: usize) -> Result<String, AppError> {
        self.store
            .consultations()
            .get(index)
            .map(|c| c.id.clone())
            .ok_or_else(|| AppError::NotFound(format!("consultation #{}", index + 1)))
    }
}
