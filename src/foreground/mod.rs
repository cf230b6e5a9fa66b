//! Suivi de l'application au premier plan.
//!
//! Deux stratégies équivalentes alimentent le même `ForegroundTracker` :
//! - push : hook d'événement de l'OS (`WindowSystem::install_foreground_hook`)
//! - poll : interrogation périodique (`spawn_poller`)
//!
//! Dans les deux cas seuls des pid bruts sont postés au contexte
//! propriétaire ; la résolution, la liste d'exclusion et la dé-duplication
//! se font dans le tracker.

#[cfg(windows)]
pub mod windows;

use crate::engine::{EngineEvent, EventSender};
use crate::guard::ForegroundWatch;
use crate::models::{ApplicationIdentity, ForegroundState};
use crate::process::ProcessResolver;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

/// Intervalle par défaut du mode poll
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Fenêtres du shell Windows, jamais considérées comme cible de premier plan
pub const SHELL_PROCESSES: [&str; 3] = [
    "explorer.exe",
    "shellexperiencehost.exe",
    "searchui.exe",
];

/// Accès au sous-système de fenêtrage
pub trait WindowSystem: Send + Sync {
    /// pid propriétaire de la fenêtre au premier plan, si résoluble
    fn foreground_pid(&self) -> Option<u32>;

    /// Installe le hook "fenêtre de premier plan changée".
    /// Chaque événement poste `EngineEvent::Foreground`.
    fn install_foreground_hook(&self, events: EventSender) -> Result<ForegroundWatch>;
}

/// Résolution + liste d'exclusion + dé-duplication des changements de focus
#[derive(Debug, Default)]
pub struct ForegroundTracker {
    state: ForegroundState,
}

impl ForegroundTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &ForegroundState {
        &self.state
    }

    /// Événement brut. Retourne la nouvelle cible (`None` = aucune
    /// application) seulement s'il s'agit d'une vraie transition.
    pub fn observe(
        &mut self,
        pid: Option<u32>,
        resolver: &dyn ProcessResolver,
    ) -> Option<Option<ApplicationIdentity>> {
        // Fenêtre sans pid résoluble : aucun changement d'état
        let pid = pid.filter(|&pid| pid != 0)?;
        let identity = resolver.resolve(pid)?;
        let target = Self::target(identity);

        let next = ForegroundState::from_target(target.clone());
        if next == self.state {
            trace!(?next, "premier plan inchangé");
            return None;
        }

        debug!(?next, "changement de premier plan");
        self.state = next;
        Some(target)
    }

    /// Évaluation synthétique forcée (activation) : un premier plan
    /// non résoluble vaut "aucune application".
    pub fn force(
        &mut self,
        pid: Option<u32>,
        resolver: &dyn ProcessResolver,
    ) -> Option<ApplicationIdentity> {
        let target = pid
            .filter(|&pid| pid != 0)
            .and_then(|pid| resolver.resolve(pid))
            .and_then(Self::target);

        self.state = ForegroundState::from_target(target.clone());
        debug!(state = ?self.state, "évaluation initiale du premier plan");
        target
    }

    pub fn reset(&mut self) {
        self.state = ForegroundState::Unknown;
    }

    pub fn is_shell(identity: &ApplicationIdentity) -> bool {
        SHELL_PROCESSES.contains(&identity.as_str())
    }

    fn target(identity: ApplicationIdentity) -> Option<ApplicationIdentity> {
        if Self::is_shell(&identity) {
            None
        } else {
            Some(identity)
        }
    }
}

/// Mode poll : interroge le premier plan à intervalle fixe et poste le pid
/// quand il change. La tâche est annulée à la libération de la garde.
///
/// Doit être appelé dans un runtime tokio.
pub fn spawn_poller(
    window: Arc<dyn WindowSystem>,
    every: Duration,
    events: EventSender,
) -> ForegroundWatch {
    let task = tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_pid = None;

        loop {
            ticker.tick().await;

            let pid = window.foreground_pid();
            if pid == last_pid {
                continue;
            }
            last_pid = pid;

            if events.send(EngineEvent::Foreground { pid }).is_err() {
                break;
            }
        }
    });

    debug!(interval_ms = every.as_millis() as u64, "suivi du premier plan par interrogation");
    ForegroundWatch::new(move || task.abort())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<u32, &'static str>);

    impl ProcessResolver for MapResolver {
        fn resolve(&self, pid: u32) -> Option<ApplicationIdentity> {
            self.0.get(&pid).and_then(|name| ApplicationIdentity::new(name))
        }
    }

    fn resolver() -> MapResolver {
        MapResolver(HashMap::from([
            (10, "music.exe"),
            (11, "Music.exe"),
            (20, "chat.exe"),
            (30, "explorer.exe"),
            (31, "SearchUI.exe"),
        ]))
    }

    fn id(name: &str) -> ApplicationIdentity {
        ApplicationIdentity::new(name).unwrap()
    }

    #[test]
    fn duplicate_identity_is_suppressed() {
        let r = resolver();
        let mut tracker = ForegroundTracker::new();
        assert_eq!(tracker.observe(Some(10), &r), Some(Some(id("music.exe"))));
        // autre pid, même application
        assert_eq!(tracker.observe(Some(11), &r), None);
        assert_eq!(tracker.observe(Some(20), &r), Some(Some(id("chat.exe"))));
    }

    #[test]
    fn unresolvable_window_is_ignored() {
        let r = resolver();
        let mut tracker = ForegroundTracker::new();
        tracker.observe(Some(10), &r);
        assert_eq!(tracker.observe(None, &r), None);
        assert_eq!(tracker.observe(Some(0), &r), None);
        assert_eq!(tracker.observe(Some(999), &r), None);
        assert!(tracker.current().is(&id("music.exe")));
    }

    #[test]
    fn shell_windows_count_as_no_application() {
        let r = resolver();
        let mut tracker = ForegroundTracker::new();
        tracker.observe(Some(10), &r);
        assert_eq!(tracker.observe(Some(30), &r), Some(None));
        assert_eq!(tracker.current(), &ForegroundState::Nothing);
        // un autre processus du shell ne redéclenche rien
        assert_eq!(tracker.observe(Some(31), &r), None);
    }

    #[test]
    fn force_always_sets_state() {
        let r = resolver();
        let mut tracker = ForegroundTracker::new();
        assert_eq!(tracker.force(None, &r), None);
        assert_eq!(tracker.current(), &ForegroundState::Nothing);
        assert_eq!(tracker.force(Some(20), &r), Some(id("chat.exe")));
        tracker.reset();
        assert_eq!(tracker.current(), &ForegroundState::Unknown);
    }
}
