#![allow(dead_code)]

use anyhow::{anyhow, Result};
use mute_in_background::engine::{EngineEvent, EventSender};
use mute_in_background::{
    ApplicationIdentity, AudioBackend, AudioSessionControl, ForegroundWatch, MuteSynchronizer,
    Platform, ProcessResolver, Subscription, TrackerMode, WindowSystem,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub struct FakeSession {
    pub pid: u32,
    pub muted: bool,
    pub expired: bool,
    pub writes: usize,
}

/// État simulé de l'OS : processus, sessions audio, fenêtre active, hooks
#[derive(Default)]
pub struct World {
    pub processes: HashMap<u32, String>,
    pub sessions: Vec<FakeSession>,
    pub foreground: Option<u32>,
    pub enumerations: usize,
    pub failing_writes: HashSet<u32>,
    pub fail_hook: bool,
    pub fail_session_watch: bool,
    pub hooks_installed: usize,
    pub hooks_released: usize,
    pub session_watches: usize,
    pub session_unwatches: usize,
    pub hook_events: Option<EventSender>,
    pub session_events: Option<EventSender>,
}

#[derive(Clone, Default)]
pub struct FakeOs(Arc<Mutex<World>>);

impl FakeOs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world(&self) -> MutexGuard<'_, World> {
        self.0.lock().unwrap()
    }

    pub fn spawn(&self, pid: u32, name: &str) -> &Self {
        self.world().processes.insert(pid, name.to_string());
        self
    }

    pub fn exit(&self, pid: u32) {
        self.world().processes.remove(&pid);
    }

    /// Nouvelle session audio (sans notification)
    pub fn open_session(&self, pid: u32, muted: bool) -> &Self {
        self.world().sessions.push(FakeSession {
            pid,
            muted,
            expired: false,
            writes: 0,
        });
        self
    }

    pub fn expire_sessions_of(&self, pid: u32) {
        for session in self.world().sessions.iter_mut().filter(|s| s.pid == pid) {
            session.expired = true;
        }
    }

    /// Processus + une session, le cas courant
    pub fn app(&self, pid: u32, name: &str) -> &Self {
        self.spawn(pid, name).open_session(pid, false)
    }

    /// Nouvelle session + notification de création comme le ferait l'OS
    pub fn start_stream(&self, pid: u32) {
        self.open_session(pid, false);
        let sender = self.world().session_events.clone();
        if let Some(sender) = sender {
            sender.send(EngineEvent::SessionCreated { pid }).unwrap();
        }
    }

    /// Change la fenêtre active et émet l'événement du hook s'il est installé
    pub fn focus(&self, pid: Option<u32>) {
        self.world().foreground = pid;
        let sender = self.world().hook_events.clone();
        if let Some(sender) = sender {
            sender.send(EngineEvent::Foreground { pid }).unwrap();
        }
    }

    /// `Some(true)` si toutes les sessions vivantes de l'application sont muettes
    pub fn app_muted(&self, name: &str) -> Option<bool> {
        let target = ApplicationIdentity::new(name)?;
        let world = self.world();
        let states: Vec<bool> = world
            .sessions
            .iter()
            .filter(|s| !s.expired)
            .filter(|s| {
                world
                    .processes
                    .get(&s.pid)
                    .and_then(|n| ApplicationIdentity::new(n))
                    .as_ref()
                    == Some(&target)
            })
            .map(|s| s.muted)
            .collect();

        if states.is_empty() {
            None
        } else {
            Some(states.iter().all(|&m| m))
        }
    }

    pub fn is_muted(&self, name: &str) -> bool {
        self.app_muted(name) == Some(true)
    }

    pub fn muted_count(&self) -> usize {
        self.world().sessions.iter().filter(|s| s.muted).count()
    }

    pub fn total_writes(&self) -> usize {
        self.world().sessions.iter().map(|s| s.writes).sum()
    }

    pub fn platform(&self) -> Platform {
        Platform {
            audio: Box::new(FakeAudio(self.clone())),
            resolver: Arc::new(FakeResolver(self.clone())),
            window: Arc::new(FakeWindow(self.clone())),
        }
    }

    /// Synchroniseur en mode push branché sur ce faux OS
    pub fn synchronizer(&self) -> (MuteSynchronizer, mute_in_background::engine::EventReceiver) {
        let (events, receiver) = mute_in_background::engine::channel();
        (
            MuteSynchronizer::new(self.platform(), TrackerMode::Push, events),
            receiver,
        )
    }
}

pub struct FakeResolver(pub FakeOs);

impl ProcessResolver for FakeResolver {
    fn resolve(&self, pid: u32) -> Option<ApplicationIdentity> {
        let world = self.0.world();
        world
            .processes
            .get(&pid)
            .and_then(|name| ApplicationIdentity::new(name))
    }
}

pub struct FakeWindow(pub FakeOs);

impl WindowSystem for FakeWindow {
    fn foreground_pid(&self) -> Option<u32> {
        self.0.world().foreground
    }

    fn install_foreground_hook(&self, events: EventSender) -> Result<ForegroundWatch> {
        let mut world = self.0.world();
        if world.fail_hook {
            return Err(anyhow!("SetWinEventHook refused"));
        }
        world.hooks_installed += 1;
        world.hook_events = Some(events);

        let os = self.0.clone();
        Ok(ForegroundWatch::new(move || {
            let mut world = os.world();
            world.hooks_released += 1;
            world.hook_events = None;
        }))
    }
}

pub struct FakeAudio(pub FakeOs);

struct FakeSessionControl {
    os: FakeOs,
    index: usize,
    pid: u32,
}

impl AudioSessionControl for FakeSessionControl {
    fn process_id(&self) -> u32 {
        self.pid
    }

    fn is_expired(&self) -> bool {
        self.os.world().sessions[self.index].expired
    }

    fn is_muted(&self) -> Result<bool> {
        Ok(self.os.world().sessions[self.index].muted)
    }

    fn set_muted(&self, muted: bool) -> Result<()> {
        let mut world = self.os.world();
        if world.failing_writes.contains(&self.pid) {
            return Err(anyhow!("AUDCLNT_E_DEVICE_INVALIDATED"));
        }
        let session = &mut world.sessions[self.index];
        session.muted = muted;
        session.writes += 1;
        Ok(())
    }
}

impl AudioBackend for FakeAudio {
    fn sessions(&self) -> Result<Vec<Box<dyn AudioSessionControl>>> {
        let mut world = self.0.world();
        world.enumerations += 1;
        Ok(world
            .sessions
            .iter()
            .enumerate()
            .map(|(index, s)| {
                Box::new(FakeSessionControl {
                    os: self.0.clone(),
                    index,
                    pid: s.pid,
                }) as Box<dyn AudioSessionControl>
            })
            .collect())
    }

    fn watch_session_created(&self, events: EventSender) -> Result<Subscription> {
        let mut world = self.0.world();
        if world.fail_session_watch {
            return Err(anyhow!("RegisterSessionNotification failed"));
        }
        world.session_watches += 1;
        world.session_events = Some(events);

        let os = self.0.clone();
        Ok(Subscription::new(move || {
            let mut world = os.world();
            world.session_unwatches += 1;
            world.session_events = None;
        }))
    }
}

pub fn id(name: &str) -> ApplicationIdentity {
    ApplicationIdentity::new(name).unwrap()
}

/// Livre au synchroniseur tous les événements en attente
pub fn drain(
    sync: &mut MuteSynchronizer,
    receiver: &mut mute_in_background::engine::EventReceiver,
) {
    while let Ok(event) = receiver.try_recv() {
        match event {
            EngineEvent::Foreground { pid } => sync.handle_foreground(pid),
            EngineEvent::SessionCreated { pid } => sync.handle_session_created(pid),
            EngineEvent::Command(_) => {}
        }
    }
}
