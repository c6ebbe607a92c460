//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate calls across stores into note-level use-cases.
//! - Keep CLI and API layers decoupled from storage details.

pub mod note_service;

pub use note_service::{NoteDetail, NoteDraft, NoteService, NoteServiceError, NoteServiceResult};
