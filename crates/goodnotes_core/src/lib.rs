//! Core domain logic for GoodNotes.
//! Notes live as markdown documents in date directories; action items and
//! settings live in flat YAML record files. This crate owns every invariant.

pub mod codec;
pub mod config;
pub mod logging;
pub mod model;
pub mod naming;
pub mod repo;
pub mod service;
pub mod storage;

pub use codec::{decode_note, encode_note, DocumentError};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::action_item::{ActionItem, ActionItemCreate, ActionItemUpdate};
pub use model::note::{Note, NoteCreate, NoteId, NoteUpdate};
pub use model::settings::{Settings, SettingsUpdate};
pub use model::ValidationError;
pub use repo::{
    ActionItemRepository, ActionItemStore, NoteIndex, NoteRepository, NoteStore,
    SettingsRepository, SettingsStore, StoreError, StoreResult,
};
pub use service::{NoteDetail, NoteDraft, NoteService, NoteServiceError};
pub use storage::{FileSystem, FsError, LocalFileSystem};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Stores wired to the layout of `config`.
pub fn open_service(
    config: &AppConfig,
) -> NoteService<NoteStore<LocalFileSystem>, ActionItemStore<LocalFileSystem>> {
    NoteService::new(
        NoteStore::open(&config.notes_dir, &config.index_file),
        ActionItemStore::open(&config.action_items_file),
    )
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
