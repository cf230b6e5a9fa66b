use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identité stable d'une application : le nom du fichier exécutable,
/// normalisé (minuscules, sans chemin, toujours terminé par `.exe`).
///
/// Deux installations différentes d'un même `foo.exe` sont indiscernables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ApplicationIdentity(String);

impl ApplicationIdentity {
    /// Construit une identité à partir d'un nom saisi, d'un nom court ou
    /// d'un chemin complet rapporté par l'OS (seul le nom de fichier compte).
    /// Retourne `None` si le nom est vide après normalisation.
    pub fn new(raw: &str) -> Option<Self> {
        let file_name = raw
            .trim()
            .rsplit(|c| c == '\\' || c == '/')
            .next()
            .unwrap_or_default()
            .trim();

        if file_name.is_empty() {
            return None;
        }

        let mut canonical = file_name.to_lowercase();
        // Un point dans le nom n'est pas une extension : "Microsoft.Photos"
        if !canonical.ends_with(".exe") {
            canonical.push_str(".exe");
        }
        Some(Self(canonical))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ApplicationIdentity {
    type Err = crate::error::MuteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or_else(|| crate::error::MuteError::InvalidIdentity(s.to_string()))
    }
}

impl TryFrom<String> for ApplicationIdentity {
    type Error = crate::error::MuteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ApplicationIdentity> for String {
    fn from(value: ApplicationIdentity) -> Self {
        value.0
    }
}

/// Dernière application observée au premier plan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ForegroundState {
    /// Aucune évaluation depuis l'activation (ou après désactivation)
    #[default]
    Unknown,
    /// Aucune application identifiable n'a le focus
    Nothing,
    App(ApplicationIdentity),
}

impl ForegroundState {
    pub fn identity(&self) -> Option<&ApplicationIdentity> {
        match self {
            ForegroundState::App(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is(&self, identity: &ApplicationIdentity) -> bool {
        self.identity() == Some(identity)
    }

    pub(crate) fn from_target(target: Option<ApplicationIdentity>) -> Self {
        match target {
            Some(identity) => ForegroundState::App(identity),
            None => ForegroundState::Nothing,
        }
    }
}

/// Stratégie de suivi du premier plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerMode {
    /// Notification de l'OS (hook d'événement)
    #[default]
    Push,
    /// Interrogation périodique
    Poll { interval: Duration },
}

/// Vue ponctuelle d'une session audio vivante
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub pid: u32,
    pub muted: bool,
}

/// Session audio étiquetée avec l'identité de son processus (sélecteur, dump de debug)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub pid: u32,
    pub identity: Option<ApplicationIdentity>,
    pub muted: bool,
}

// Textes de statut affichés par la couche UI
pub const STATUS_DISABLED: &str = "Auto-Mute DISABLED";
pub const STATUS_NO_APPS: &str = "No apps to mute";

pub fn status_unmuted(identity: &ApplicationIdentity) -> String {
    format!("Unmuted: {}", identity)
}

pub fn status_muting(count: usize) -> String {
    format!("Muting {} app(s)", count)
}

pub fn status_failed(reason: &impl fmt::Display) -> String {
    format!("Auto-Mute FAILED: {}", reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_case_insensitive_and_path_free() {
        let a = ApplicationIdentity::new("C:\\Program Files\\Music\\MUSIC.EXE").unwrap();
        let b = ApplicationIdentity::new("music.exe").unwrap();
        let c = ApplicationIdentity::new("  Music ").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "music.exe");
    }

    #[test]
    fn dotted_name_matches_its_executable_path() {
        let typed = ApplicationIdentity::new("Microsoft.Photos").unwrap();
        let resolved =
            ApplicationIdentity::new("C:\\Program Files\\WindowsApps\\Microsoft.Photos.exe").unwrap();
        assert_eq!(typed, resolved);
        assert_eq!(typed.as_str(), "microsoft.photos.exe");

        // jamais de double extension
        assert_eq!(ApplicationIdentity::new("Game.EXE").unwrap().as_str(), "game.exe");
    }

    #[test]
    fn empty_identity_is_rejected() {
        assert!(ApplicationIdentity::new("   ").is_none());
        assert!(ApplicationIdentity::new("C:\\Apps\\").is_none());
        assert!("".parse::<ApplicationIdentity>().is_err());
    }

    #[test]
    fn identity_serializes_as_plain_string() {
        let id = ApplicationIdentity::new("Chat").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"chat.exe\"");
        let back: ApplicationIdentity = serde_json::from_str("\"CHAT.EXE\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn foreground_state_identity() {
        let id = ApplicationIdentity::new("a.exe").unwrap();
        assert!(ForegroundState::App(id.clone()).is(&id));
        assert!(!ForegroundState::Nothing.is(&id));
        assert_eq!(ForegroundState::from_target(None), ForegroundState::Nothing);
        assert_eq!(ForegroundState::default(), ForegroundState::Unknown);
    }

    #[test]
    fn status_texts() {
        let id = ApplicationIdentity::new("music.exe").unwrap();
        assert_eq!(status_unmuted(&id), "Unmuted: music.exe");
        assert_eq!(status_muting(2), "Muting 2 app(s)");
        assert_eq!(status_failed(&"boom"), "Auto-Mute FAILED: boom");
    }
}
