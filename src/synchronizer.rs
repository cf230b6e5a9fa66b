use crate::audio::SessionDirectory;
use crate::engine::EventSender;
use crate::error::MuteError;
use crate::foreground::{self, ForegroundTracker, WindowSystem};
use crate::guard::{ForegroundWatch, Subscription};
use crate::models::{
    status_failed, status_muting, status_unmuted, ApplicationIdentity, ForegroundState,
    SessionInfo, TrackerMode, STATUS_DISABLED, STATUS_NO_APPS,
};
use crate::monitored::MonitoredSet;
use crate::platform::Platform;
use crate::process::ProcessResolver;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Moteur de synchronisation des mises en sourdine.
///
/// Possède tout l'état partagé (ensemble surveillé, premier plan, hooks) et
/// ne doit être manipulé que depuis le contexte propriétaire.
pub struct MuteSynchronizer {
    directory: SessionDirectory,
    resolver: Arc<dyn ProcessResolver>,
    window: Arc<dyn WindowSystem>,
    mode: TrackerMode,
    events: EventSender,
    monitored: MonitoredSet,
    tracker: ForegroundTracker,
    foreground_watch: Option<ForegroundWatch>,
    session_watch: Option<Subscription>,
    status: String,
    shut_down: bool,
}

impl MuteSynchronizer {
    pub fn new(platform: Platform, mode: TrackerMode, events: EventSender) -> Self {
        let Platform {
            audio,
            resolver,
            window,
        } = platform;

        Self {
            directory: SessionDirectory::new(audio, Arc::clone(&resolver)),
            resolver,
            window,
            mode,
            events,
            monitored: MonitoredSet::new(),
            tracker: ForegroundTracker::new(),
            foreground_watch: None,
            session_watch: None,
            status: STATUS_DISABLED.to_string(),
            shut_down: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.foreground_watch.is_some()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn monitored(&self) -> &MonitoredSet {
        &self.monitored
    }

    pub fn foreground(&self) -> &ForegroundState {
        self.tracker.current()
    }

    pub fn sessions(&self) -> Vec<SessionInfo> {
        self.directory.describe()
    }

    /// Disabled -> Enabled : installe le suivi du premier plan et
    /// l'abonnement aux sessions, puis évalue immédiatement la fenêtre active.
    pub fn enable(&mut self) -> Result<(), MuteError> {
        if self.is_enabled() {
            return Ok(());
        }

        let session_watch = match self.directory.watch_session_created(self.events.clone()) {
            Ok(watch) => watch,
            Err(e) => return Err(self.fail(MuteError::SessionWatch(format!("{e:#}")))),
        };

        let foreground_watch = match self.mode {
            TrackerMode::Push => self.window.install_foreground_hook(self.events.clone()),
            TrackerMode::Poll { interval } => Ok(foreground::spawn_poller(
                Arc::clone(&self.window),
                interval,
                self.events.clone(),
            )),
        };
        let foreground_watch = match foreground_watch {
            Ok(watch) => watch,
            Err(e) => {
                session_watch.release();
                return Err(self.fail(MuteError::HookInstall(format!("{e:#}"))));
            }
        };

        self.foreground_watch = Some(foreground_watch);
        self.session_watch = Some(session_watch);
        info!(mode = ?self.mode, "auto-mute activé");

        // Transition synthétique : état connu sans attendre l'OS
        let pid = self.window.foreground_pid();
        self.tracker.force(pid, self.resolver.as_ref());
        self.assert_mutes();
        Ok(())
    }

    /// Enabled -> Disabled : retire les hooks et rétablit le son partout.
    pub fn disable(&mut self) {
        let was_enabled = self.is_enabled();
        self.foreground_watch = None;
        self.session_watch = None;

        self.directory.unmute_all();
        self.tracker.reset();
        self.status = STATUS_DISABLED.to_string();

        if was_enabled {
            info!("auto-mute désactivé");
        }
    }

    /// Événement brut du suivi de premier plan
    pub fn handle_foreground(&mut self, pid: Option<u32>) {
        if !self.is_enabled() {
            return;
        }
        if self.tracker.observe(pid, self.resolver.as_ref()).is_some() {
            self.assert_mutes();
        }
    }

    /// Nouvelle session audio : une application surveillée en arrière-plan
    /// ne doit pas être entendue avant la prochaine transition.
    pub fn handle_session_created(&mut self, pid: u32) {
        if !self.is_enabled() {
            return;
        }
        let Some(identity) = self.resolver.resolve(pid) else {
            return;
        };
        if self.monitored.contains(&identity) && !self.tracker.current().is(&identity) {
            debug!(pid, app = %identity, "nouvelle session en arrière-plan");
            self.directory.set_mute(&identity, true);
        }
    }

    /// Ajoute une application ; muette immédiatement si active et hors premier plan.
    /// Retourne `false` si elle était déjà surveillée.
    pub fn add(&mut self, identity: ApplicationIdentity) -> bool {
        if !self.monitored.add(identity.clone()) {
            return false;
        }
        info!(app = %identity, "application surveillée");

        if self.is_enabled() && !self.tracker.current().is(&identity) {
            self.directory.set_mute(&identity, true);
        }
        self.refresh_status();
        true
    }

    /// Rétablit toujours le son de l'application, même désactivé, puis la retire.
    pub fn remove(&mut self, identity: &ApplicationIdentity) -> bool {
        self.directory.set_mute(identity, false);
        let removed = self.monitored.remove(identity);
        if removed {
            info!(app = %identity, "application retirée");
        }
        self.refresh_status();
        removed
    }

    /// Arrêt : désactive, vide l'ensemble surveillé
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.disable();
        self.monitored.clear();
        self.shut_down = true;
        info!("moteur arrêté");
    }

    // Ré-affirme l'état voulu de toutes les applications surveillées
    fn assert_mutes(&mut self) {
        if self.monitored.is_empty() {
            self.status = STATUS_NO_APPS.to_string();
            return;
        }

        let active = self
            .tracker
            .current()
            .identity()
            .filter(|identity| self.monitored.contains(identity))
            .cloned();

        match &active {
            Some(active) => {
                self.directory.set_mute(active, false);
                for other in self.monitored.iter().filter(|app| *app != active) {
                    self.directory.set_mute(other, true);
                }
            }
            None => {
                for app in self.monitored.iter() {
                    self.directory.set_mute(app, true);
                }
            }
        }
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        if !self.is_enabled() {
            return;
        }
        self.status = if self.monitored.is_empty() {
            STATUS_NO_APPS.to_string()
        } else {
            match self.tracker.current().identity() {
                Some(active) if self.monitored.contains(active) => status_unmuted(active),
                _ => status_muting(self.monitored.len()),
            }
        };
    }

    fn fail(&mut self, error: MuteError) -> MuteError {
        warn!("activation impossible: {error}");
        self.status = status_failed(&error);
        error
    }
}

impl Drop for MuteSynchronizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
