#[cfg(windows)]
pub mod windows;

use crate::models::ApplicationIdentity;

/// Résolution pid -> identité d'application.
///
/// Le pid est supposé potentiellement périmé : un processus terminé donne
/// `None`, jamais une erreur. Aucune nouvelle tentative.
pub trait ProcessResolver: Send + Sync {
    fn resolve(&self, pid: u32) -> Option<ApplicationIdentity>;
}
