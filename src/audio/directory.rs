use super::backend::{AudioBackend, AudioSessionControl};
use crate::engine::EventSender;
use crate::guard::Subscription;
use crate::models::{ApplicationIdentity, SessionInfo, SessionSnapshot};
use crate::process::ProcessResolver;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Annuaire des sessions audio : ré-énumère avant chaque lecture ou écriture.
pub struct SessionDirectory {
    backend: Box<dyn AudioBackend>,
    resolver: Arc<dyn ProcessResolver>,
}

impl SessionDirectory {
    pub fn new(backend: Box<dyn AudioBackend>, resolver: Arc<dyn ProcessResolver>) -> Self {
        Self { backend, resolver }
    }

    /// Sessions vivantes, hors sons système (pid 0) et sessions expirées
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        self.live_sessions()
            .iter()
            .filter_map(|session| {
                let muted = session.is_muted().ok()?;
                Some(SessionSnapshot {
                    pid: session.process_id(),
                    muted,
                })
            })
            .collect()
    }

    /// Même énumération que `snapshot`, étiquetée par application
    pub fn describe(&self) -> Vec<SessionInfo> {
        self.live_sessions()
            .iter()
            .filter_map(|session| {
                let pid = session.process_id();
                let muted = session.is_muted().ok()?;
                Some(SessionInfo {
                    pid,
                    identity: self.resolver.resolve(pid),
                    muted,
                })
            })
            .collect()
    }

    /// Applique `muted` à toutes les sessions de `identity`.
    ///
    /// Une session déjà dans l'état voulu n'est pas réécrite. Retourne le
    /// nombre de sessions effectivement modifiées.
    pub fn set_mute(&self, identity: &ApplicationIdentity, muted: bool) -> usize {
        let mut changed = 0;

        for session in self.live_sessions() {
            let pid = session.process_id();
            // Processus terminé entre l'énumération et ici : on passe
            let Some(owner) = self.resolver.resolve(pid) else {
                continue;
            };
            if &owner != identity {
                continue;
            }
            if Self::apply(session.as_ref(), muted) {
                changed += 1;
            }
        }

        debug!(app = %identity, muted, changed, "set_mute");
        changed
    }

    /// Rétablit le son de toutes les sessions, quelle que soit l'application
    pub fn unmute_all(&self) -> usize {
        let changed = self
            .live_sessions()
            .iter()
            .filter(|session| Self::apply(session.as_ref(), false))
            .count();

        debug!(changed, "unmute_all");
        changed
    }

    pub fn watch_session_created(&self, events: EventSender) -> Result<Subscription> {
        self.backend.watch_session_created(events)
    }

    fn apply(session: &dyn AudioSessionControl, muted: bool) -> bool {
        match session.is_muted() {
            Ok(current) if current == muted => false,
            Ok(_) => match session.set_muted(muted) {
                Ok(()) => true,
                Err(e) => {
                    debug!(pid = session.process_id(), "session ignorée: {e:#}");
                    false
                }
            },
            Err(e) => {
                debug!(pid = session.process_id(), "session ignorée: {e:#}");
                false
            }
        }
    }

    fn live_sessions(&self) -> Vec<Box<dyn AudioSessionControl>> {
        match self.backend.sessions() {
            Ok(sessions) => sessions
                .into_iter()
                .filter(|s| s.process_id() != 0 && !s.is_expired())
                .collect(),
            Err(e) => {
                warn!("énumération des sessions audio impossible: {e:#}");
                Vec::new()
            }
        }
    }
}
