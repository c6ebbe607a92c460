//! Settings repository backed by one flat YAML file.
//!
//! # Invariants
//! - A missing file is seeded with the configured defaults on first access.
//! - A corrupt file falls back to defaults in memory and is replaced on the
//!   next update.

use super::record_file::{load_yaml, save_yaml};
use super::{Lifecycle, StoreError, StoreResult};
use crate::model::settings::{Settings, SettingsUpdate};
use crate::storage::{FileSystem, LocalFileSystem};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait SettingsRepository {
    fn get(&self) -> StoreResult<Settings>;
    /// Merges `update` into the stored settings and returns the result.
    fn update(&self, update: &SettingsUpdate) -> StoreResult<Settings>;
}

pub struct SettingsStore<F: FileSystem = LocalFileSystem> {
    fs: F,
    path: PathBuf,
    defaults: Settings,
    settings: Mutex<Lifecycle<Settings>>,
}

impl SettingsStore<LocalFileSystem> {
    pub fn open(path: impl Into<PathBuf>, defaults: Settings) -> Self {
        Self::new(LocalFileSystem::new(), path, defaults)
    }
}

impl<F: FileSystem> SettingsStore<F> {
    pub fn new(fs: F, path: impl Into<PathBuf>, defaults: Settings) -> Self {
        Self {
            fs,
            path: path.into(),
            defaults,
            settings: Mutex::new(Lifecycle::unloaded()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> StoreResult<Settings> {
        match load_yaml::<Settings, _>(&self.fs, &self.path) {
            Ok(Some(settings)) => Ok(settings),
            Ok(None) => {
                save_yaml(&self.fs, &self.path, &self.defaults)?;
                info!(
                    "event=settings_seed module=repo status=ok path={}",
                    self.path.display()
                );
                Ok(self.defaults.clone())
            }
            Err(StoreError::MalformedDocument { path, reason }) => {
                warn!(
                    "event=settings_load module=repo status=fallback path={} reason={}",
                    path.display(),
                    reason
                );
                Ok(self.defaults.clone())
            }
            Err(err) => Err(err),
        }
    }
}

impl<F: FileSystem> SettingsRepository for SettingsStore<F> {
    fn get(&self) -> StoreResult<Settings> {
        let mut state = self.settings.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(state.get_or_load(|| self.load())?.clone())
    }

    fn update(&self, update: &SettingsUpdate) -> StoreResult<Settings> {
        let mut state = self.settings.lock().map_err(|_| StoreError::LockPoisoned)?;
        let current = state.get_or_load(|| self.load())?;
        let mut next = current.clone();
        next.apply(update);
        save_yaml(&self.fs, &self.path, &next)?;
        *current = next.clone();
        info!("event=settings_update module=repo status=ok");
        Ok(next)
    }
}
