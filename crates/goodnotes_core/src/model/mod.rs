//! Domain model for notes, action items and settings.
//!
//! # Responsibility
//! - Define the canonical records exchanged between stores and callers.
//! - Own input normalization and validation shared by every write path.
//!
//! # Invariants
//! - Note and action-item titles are never blank once persisted.
//! - Timestamps are local wall-clock times with sub-second precision.

pub mod action_item;
pub mod note;
pub mod settings;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Input rejected before it reaches storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Note title is blank after trim.
    EmptyTitle,
    /// Note title spans more than one line.
    MultilineTitle,
    /// Action item title is blank after trim.
    EmptyActionItemTitle,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "note title must not be blank"),
            Self::MultilineTitle => write!(f, "note title must be a single line"),
            Self::EmptyActionItemTitle => write!(f, "action item title must not be blank"),
        }
    }
}

impl Error for ValidationError {}
