pub mod audio;
pub mod autostart;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod foreground;
pub mod guard;
pub mod models;
pub mod monitored;
pub mod platform;
pub mod process;
pub mod synchronizer;

pub use audio::{AudioBackend, AudioSessionControl, SessionDirectory};
pub use config::{SettingChange, Settings, SettingsFile, TrackerKind};
pub use engine::{Command, Engine, EngineEvent, EngineHandle, EventSender, MuteStatus};
pub use error::MuteError;
pub use foreground::{ForegroundTracker, WindowSystem};
pub use guard::{ForegroundWatch, ScopedRelease, Subscription};
pub use models::{
    ApplicationIdentity, ForegroundState, SessionInfo, SessionSnapshot, TrackerMode,
};
pub use monitored::MonitoredSet;
pub use platform::{create_platform, Platform};
pub use process::ProcessResolver;
pub use synchronizer::MuteSynchronizer;
