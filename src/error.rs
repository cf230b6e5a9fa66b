use thiserror::Error;

/// Échecs remontés par le moteur à la couche UI.
///
/// Les erreurs d'appels OS ponctuels (session disparue, processus terminé)
/// ne passent jamais par ici : elles sont absorbées sur place.
#[derive(Debug, Error)]
pub enum MuteError {
    #[error("foreground hook could not be installed: {0}")]
    HookInstall(String),

    #[error("audio session notifications unavailable: {0}")]
    SessionWatch(String),

    #[error("audio backend unavailable: {0}")]
    Audio(String),

    #[error("automatic muting is only supported on Windows")]
    UnsupportedPlatform,

    #[error("invalid application name: {0:?}")]
    InvalidIdentity(String),

    #[error("settings error: {0}")]
    Settings(String),

    #[error("mute engine is no longer running")]
    EngineClosed,
}
