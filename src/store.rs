//! Conversation store: the set of consultations plus the active pointer.
//!
//! Every mutation persists through the injected [`Storage`] port:
//! - the whole consultation list under [`CONSULTATIONS_KEY`]
//! - the active id under [`ACTIVE_CONSULTATION_KEY`] (cleared when none)
//! - the theme under [`THEME_KEY`]
//!
//! Persistence is best-effort: a failed write is logged and the in-memory
//! state is kept as is.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::consultation::{Consultation, Message};
use crate::error::AppError;
use crate::storage::{ACTIVE_CONSULTATION_KEY, CONSULTATIONS_KEY, Storage, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(AppError::Config(format!("unknown theme '{other}'"))),
        }
    }
}

pub struct ConversationStore {
    storage: Arc<dyn Storage>,
    /// Most recently created first.
    consultations: Vec<Consultation>,
    active_id: Option<String>,
    theme: Theme,
}

impl ConversationStore {
    /// Restore state from `storage`. Missing or unreadable values fall back
    /// to an empty list, no active consultation, and `default_theme`.
    pub fn load(storage: Arc<dyn Storage>, default_theme: Theme) -> Self {
        let consultations = match storage.read(CONSULTATIONS_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<Vec<Consultation>>(&raw).unwrap_or_else(|e| {
                warn!(storage = storage.name(), error = %e, "discarding malformed consultation list");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(storage = storage.name(), error = %e, "cannot read consultation list");
                Vec::new()
            }
        };

        let active_id = match storage.read(ACTIVE_CONSULTATION_KEY) {
            Ok(id) => id.filter(|id| consultations.iter().any(|c| &c.id == id)),
            Err(e) => {
                warn!(storage = storage.name(), error = %e, "cannot read active consultation");
                None
            }
        };

        let theme = match storage.read(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or(default_theme),
            Ok(None) => default_theme,
            Err(e) => {
                warn!(storage = storage.name(), error = %e, "cannot read theme");
                default_theme
            }
        };

        info!(
            storage = storage.name(),
            consultations = consultations.len(),
            active = ?active_id,
            %theme,
            "conversation store loaded"
        );

        Self { storage, consultations, active_id, theme }
    }

    pub fn consultations(&self) -> &[Consultation] {
        &self.consultations
    }

    pub fn get(&self, id: &str) -> Option<&Consultation> {
        self.consultations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Consultation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    // ── Mutations ─────────────────────────────────────────────────────

    /// Create an empty consultation, make it active, and return its id.
    pub fn create(&mut self) -> String {
        let consultation = Consultation::new();
        let id = consultation.id.clone();
        self.consultations.insert(0, consultation);
        self.active_id = Some(id.clone());
        debug!(%id, "consultation created");
        self.persist_consultations();
        self.persist_active();
        id
    }

    /// Make `id` the active consultation.
    pub fn select(&mut self, id: &str) -> Result<(), AppError> {
        if self.get(id).is_none() {
            return Err(AppError::NotFound(format!("consultation {id}")));
        }
        self.active_id = Some(id.to_string());
        self.persist_active();
        Ok(())
    }

    /// Append `message` to consultation `id`. Returns the assigned message id.
    pub fn append_message(&mut self, id: &str, message: Message) -> Result<i64, AppError> {
        let consultation = self
            .consultations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("consultation {id}")))?;
        let message_id = consultation.push(message);
        debug!(consultation = %id, message_id, "message appended");
        self.persist_consultations();
        Ok(message_id)
    }

    /// Delete consultation `id`. Clears the active pointer if it pointed
    /// there. Returns `false` if no such consultation existed.
    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.consultations.len();
        self.consultations.retain(|c| c.id != id);
        if self.consultations.len() == before {
            return false;
        }
        debug!(%id, "consultation deleted");
        self.persist_consultations();
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
            self.persist_active();
        }
        true
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        if let Err(e) = self.storage.write(THEME_KEY, theme.as_str()) {
            warn!(storage = self.storage.name(), error = %e, "theme not persisted");
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let next = self.theme.toggled();
        self.set_theme(next);
        next
    }

    // ── Persistence ───────────────────────────────────────────────────

    fn persist_consultations(&self) {
        let raw = match serde_json::to_string(&self.consultations) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "cannot serialise consultations");
                return;
            }
        };
        if let Err(e) = self.storage.write(CONSULTATIONS_KEY, &raw) {
            warn!(storage = self.storage.name(), error = %e, "consultations not persisted");
        }
    }

    fn persist_active(&self) {
        let result = match &self.active_id {
            Some(id) => self.storage.write(ACTIVE_CONSULTATION_KEY, id),
            None => self.storage.clear(ACTIVE_CONSULTATION_KEY).map(|_| ()),
        };
        if let Err(e) = result {
            warn!(storage = self.storage.name(), error = %e, "active consultation not persisted");
        }
    }
}
