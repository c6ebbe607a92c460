//! Application settings record.

use serde::{Deserialize, Serialize};

/// User-editable settings persisted next to the notes tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub notes_directory: Option<String>,
    #[serde(default, alias = "elasticsearch_url")]
    pub search_url: Option<String>,
    #[serde(default, alias = "elasticsearch_enabled")]
    pub search_enabled: bool,
}

/// Partial settings update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub notes_directory: Option<String>,
    #[serde(default)]
    pub search_url: Option<String>,
    #[serde(default)]
    pub search_enabled: Option<bool>,
}

impl Settings {
    pub fn apply(&mut self, update: &SettingsUpdate) {
        if let Some(dir) = update.notes_directory.as_ref() {
            self.notes_directory = Some(dir.clone());
        }
        if let Some(url) = update.search_url.as_ref() {
            self.search_url = Some(url.clone());
        }
        if let Some(enabled) = update.search_enabled {
            self.search_enabled = enabled;
        }
    }
}
