use crate::error::MuteError;
use crate::models::{ApplicationIdentity, SessionInfo};
use crate::synchronizer::MuteSynchronizer;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace};

/// Canal vers le contexte propriétaire. Utilisable depuis n'importe quel
/// thread (hook, callback COM, console) sans runtime tokio.
pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub type Reply<T> = oneshot::Sender<T>;

/// Tout ce qui touche l'état partagé passe par ce canal
#[derive(Debug)]
pub enum EngineEvent {
    /// pid de la nouvelle fenêtre de premier plan (`None` si aucune)
    Foreground { pid: Option<u32> },
    /// Un processus vient d'ouvrir une session audio
    SessionCreated { pid: u32 },
    Command(Command),
}

/// Requêtes de la couche UI
#[derive(Debug)]
pub enum Command {
    Enable { reply: Reply<Result<(), MuteError>> },
    Disable { reply: Reply<()> },
    Add { app: ApplicationIdentity, reply: Reply<bool> },
    Remove { app: ApplicationIdentity, reply: Reply<bool> },
    Monitored { reply: Reply<Vec<ApplicationIdentity>> },
    Sessions { reply: Reply<Vec<SessionInfo>> },
    Status { reply: Reply<MuteStatus> },
    Shutdown,
}

/// État exposé à l'UI
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MuteStatus {
    pub enabled: bool,
    pub foreground: Option<ApplicationIdentity>,
    pub text: String,
}

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Boucle du contexte propriétaire : traite les événements un par un,
/// chacun jusqu'à son terme.
pub struct Engine {
    synchronizer: MuteSynchronizer,
    events: EventReceiver,
}

impl Engine {
    pub fn new(synchronizer: MuteSynchronizer, events: EventReceiver) -> Self {
        Self {
            synchronizer,
            events,
        }
    }

    pub fn synchronizer(&self) -> &MuteSynchronizer {
        &self.synchronizer
    }

    /// Tourne jusqu'à `Command::Shutdown` puis rétablit le son partout
    pub async fn run(mut self) -> MuteSynchronizer {
        while let Some(event) = self.events.recv().await {
            if !self.dispatch(event) {
                break;
            }
        }
        self.synchronizer.shutdown();
        self.synchronizer
    }

    /// Retourne `false` quand la boucle doit s'arrêter
    pub fn dispatch(&mut self, event: EngineEvent) -> bool {
        trace!(?event, "événement");
        let sync = &mut self.synchronizer;

        match event {
            EngineEvent::Foreground { pid } => sync.handle_foreground(pid),
            EngineEvent::SessionCreated { pid } => sync.handle_session_created(pid),
            EngineEvent::Command(command) => match command {
                Command::Enable { reply } => {
                    let _ = reply.send(sync.enable());
                }
                Command::Disable { reply } => {
                    sync.disable();
                    let _ = reply.send(());
                }
                Command::Add { app, reply } => {
                    let _ = reply.send(sync.add(app));
                }
                Command::Remove { app, reply } => {
                    let _ = reply.send(sync.remove(&app));
                }
                Command::Monitored { reply } => {
                    let _ = reply.send(sync.monitored().to_vec());
                }
                Command::Sessions { reply } => {
                    let _ = reply.send(sync.sessions());
                }
                Command::Status { reply } => {
                    let _ = reply.send(MuteStatus {
                        enabled: sync.is_enabled(),
                        foreground: sync.foreground().identity().cloned(),
                        text: sync.status().to_string(),
                    });
                }
                Command::Shutdown => {
                    debug!("arrêt demandé");
                    return false;
                }
            },
        }
        true
    }
}

/// Poignée clonable de la couche UI vers le moteur
#[derive(Debug, Clone)]
pub struct EngineHandle {
    events: EventSender,
}

impl EngineHandle {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    pub async fn enable(&self) -> Result<(), MuteError> {
        self.call(|reply| Command::Enable { reply }).await?
    }

    pub async fn disable(&self) -> Result<(), MuteError> {
        self.call(|reply| Command::Disable { reply }).await
    }

    pub async fn add(&self, app: ApplicationIdentity) -> Result<bool, MuteError> {
        self.call(|reply| Command::Add { app, reply }).await
    }

    pub async fn remove(&self, app: ApplicationIdentity) -> Result<bool, MuteError> {
        self.call(|reply| Command::Remove { app, reply }).await
    }

    pub async fn monitored(&self) -> Result<Vec<ApplicationIdentity>, MuteError> {
        self.call(|reply| Command::Monitored { reply }).await
    }

    pub async fn sessions(&self) -> Result<Vec<SessionInfo>, MuteError> {
        self.call(|reply| Command::Sessions { reply }).await
    }

    pub async fn status(&self) -> Result<MuteStatus, MuteError> {
        self.call(|reply| Command::Status { reply }).await
    }

    pub fn shutdown(&self) {
        let _ = self.events.send(EngineEvent::Command(Command::Shutdown));
    }

    pub async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> Result<T, MuteError> {
        self.post(make)?.await.map_err(|_| MuteError::EngineClosed)
    }

    /// Variante bloquante pour les threads hors runtime (console)
    pub fn call_blocking<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, MuteError> {
        self.post(make)?
            .blocking_recv()
            .map_err(|_| MuteError::EngineClosed)
    }

    fn post<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<oneshot::Receiver<T>, MuteError> {
        let (reply, response) = oneshot::channel();
        self.events
            .send(EngineEvent::Command(make(reply)))
            .map_err(|_| MuteError::EngineClosed)?;
        Ok(response)
    }
}
