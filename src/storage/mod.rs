//! Persistence port for durable key-value storage for client state.
//!
//! [`ConversationStore`](crate::store::ConversationStore) never touches the
//! filesystem directly; it reads and writes string values under the fixed
//! keys below through a [`Storage`] implementation. Production uses
//! [`FileStorage`]; tests and `--offline` dry runs use [`MemoryStorage`].

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::error::AppError;

/// Theme preference (`"light"` / `"dark"`).
pub const THEME_KEY: &str = "theme";
/// Serialized consultation list (JSON array).
pub const CONSULTATIONS_KEY: &str = "consultations";
/// Id of the active consultation; absent when none is active.
pub const ACTIVE_CONSULTATION_KEY: &str = "active_consultation";

/// Pluggable string key-value storage.
pub trait Storage: Send + Sync {
    /// Short name used in log fields (e.g. `"file"`).
    fn name(&self) -> &str;

    fn read(&self, key: &str) -> Result<Option<String>, AppError>;

    fn write(&self, key: &str, value: &str) -> Result<(), AppError>;

    /// Remove `key`. Returns `true` if a value was present.
    fn clear(&self, key: &str) -> Result<bool, AppError>;
}
