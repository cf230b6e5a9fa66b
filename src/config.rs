use crate::error::MuteError;
use crate::foreground::DEFAULT_POLL_INTERVAL;
use crate::models::TrackerMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const SETTINGS_FILE: &str = "mute_in_background.toml";

/// Intervalle minimal accepté pour le mode poll
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackerKind {
    #[default]
    Push,
    Poll,
}

/// Réglages persistés à côté de l'exécutable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enregistrer l'application au démarrage de la session
    pub run_at_login: bool,
    /// Fermer la console ne quitte pas le programme
    pub minimize_on_close: bool,
    pub tracker: TrackerKind,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            run_at_login: false,
            minimize_on_close: false,
            tracker: TrackerKind::Push,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl Settings {
    /// `mute_in_background.toml` dans le dossier de l'exécutable
    pub fn default_path() -> PathBuf {
        let mut p = std::env::current_exe().unwrap_or_default();
        p.set_file_name(SETTINGS_FILE);
        p
    }

    /// Lecture stricte
    pub fn load_from(path: &Path) -> Result<Self, MuteError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MuteError::Settings(format!("{}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| MuteError::Settings(format!("{}: {e}", path.display())))
    }

    /// Fichier absent : valeurs par défaut. Fichier invalide : valeurs par défaut + avertissement.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        Self::load_from(path).unwrap_or_else(|e| {
            warn!("réglages ignorés: {e}");
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), MuteError> {
        let content = toml::to_string(self).map_err(|e| MuteError::Settings(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| MuteError::Settings(format!("{}: {e}", path.display())))
    }

    pub fn tracker_mode(&self) -> TrackerMode {
        match self.tracker {
            TrackerKind::Push => TrackerMode::Push,
            TrackerKind::Poll => TrackerMode::Poll {
                interval: Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS)),
            },
        }
    }
}

/// Réglage modifiable à chaud depuis la console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    RunAtLogin(bool),
    MinimizeOnClose(bool),
}

/// Réglages tels qu'écrits sur disque, avec leur fichier.
///
/// Les surcharges de la ligne de commande ne passent pas par ici et ne sont
/// donc jamais enregistrées.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
    stored: Settings,
}

impl SettingsFile {
    pub fn load(path: PathBuf) -> Self {
        let stored = Settings::load_or_default(&path);
        Self { path, stored }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &Settings {
        &self.stored
    }

    /// Applique et enregistre. Retourne `false` si la valeur était déjà celle-ci
    /// (rien n'est écrit).
    pub fn apply(&mut self, change: SettingChange) -> Result<bool, MuteError> {
        let mut next = self.stored.clone();
        match change {
            SettingChange::RunAtLogin(on) => next.run_at_login = on,
            SettingChange::MinimizeOnClose(on) => next.minimize_on_close = on,
        }
        if next == self.stored {
            return Ok(false);
        }

        next.save(&self.path)?;
        self.stored = next;
        Ok(true)
    }
}
