use super::backend::{AudioBackend, AudioSessionControl};
use crate::engine::{EngineEvent, EventSender};
use crate::guard::Subscription;
use anyhow::{Context, Result};
use tracing::{debug, trace};
use windows::core::{implement, Interface, Ref};
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;

/// Sessions du périphérique de rendu par défaut via Core Audio.
///
/// Initialise COM à la construction et le libère au `Drop` : à créer et
/// détruire sur le même thread (le contexte propriétaire).
pub struct WindowsAudioBackend {
    // COM initialisé par ce thread, à équilibrer par CoUninitialize
    _not_send: std::marker::PhantomData<*const ()>,
}

impl WindowsAudioBackend {
    /// Initialise COM (MTA) sur le thread propriétaire
    pub fn new() -> Result<Self> {
        unsafe {
            // S_FALSE (déjà initialisé) compte aussi : un appel, une libération
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .context("CoInitializeEx")?;
        }
        Ok(Self {
            _not_send: std::marker::PhantomData,
        })
    }

    fn session_manager(&self) -> Result<IAudioSessionManager2> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)?;
            let device = enumerator.GetDefaultAudioEndpoint(eRender, eMultimedia)?;
            let manager: IAudioSessionManager2 = device.Activate(CLSCTX_ALL, None)?;
            Ok(manager)
        }
    }
}

impl Drop for WindowsAudioBackend {
    fn drop(&mut self) {
        unsafe { CoUninitialize() };
        debug!("COM libéré");
    }
}

struct WindowsAudioSession {
    control: IAudioSessionControl2,
    volume: ISimpleAudioVolume,
}

impl AudioSessionControl for WindowsAudioSession {
    fn process_id(&self) -> u32 {
        unsafe { self.control.GetProcessId().unwrap_or(0) }
    }

    fn is_expired(&self) -> bool {
        unsafe {
            self.control
                .GetState()
                .map(|state| state == AudioSessionStateExpired)
                .unwrap_or(true)
        }
    }

    fn is_muted(&self) -> Result<bool> {
        unsafe { Ok(self.volume.GetMute()?.as_bool()) }
    }

    fn set_muted(&self, muted: bool) -> Result<()> {
        unsafe {
            self.volume.SetMute(muted, std::ptr::null())?;
        }
        Ok(())
    }
}

impl AudioBackend for WindowsAudioBackend {
    fn sessions(&self) -> Result<Vec<Box<dyn AudioSessionControl>>> {
        let manager = self.session_manager()?;
        let mut sessions: Vec<Box<dyn AudioSessionControl>> = Vec::new();

        unsafe {
            let enumerator = manager.GetSessionEnumerator()?;
            let count = enumerator.GetCount()?;

            for i in 0..count {
                let Ok(session) = enumerator.GetSession(i) else {
                    continue;
                };
                let (Ok(control), Ok(volume)) = (
                    session.cast::<IAudioSessionControl2>(),
                    session.cast::<ISimpleAudioVolume>(),
                ) else {
                    continue;
                };
                sessions.push(Box::new(WindowsAudioSession { control, volume }));
            }
        }

        trace!(count = sessions.len(), "sessions énumérées");
        Ok(sessions)
    }

    fn watch_session_created(&self, events: EventSender) -> Result<Subscription> {
        let manager = self.session_manager()?;
        let notifier: IAudioSessionNotification = SessionCreatedNotifier { events }.into();

        unsafe {
            // Les notifications ne sont émises qu'après une première énumération
            let _ = manager.GetSessionEnumerator()?;
            manager
                .RegisterSessionNotification(&notifier)
                .context("RegisterSessionNotification")?;
        }
        debug!("abonnement aux nouvelles sessions audio");

        Ok(Subscription::new(move || unsafe {
            let _ = manager.UnregisterSessionNotification(&notifier);
            debug!("désabonnement des nouvelles sessions audio");
        }))
    }
}

#[implement(IAudioSessionNotification)]
struct SessionCreatedNotifier {
    events: EventSender,
}

impl IAudioSessionNotification_Impl for SessionCreatedNotifier_Impl {
    // Appelé sur un thread COM : on ne fait que poster le pid
    fn OnSessionCreated(&self, newsession: Ref<IAudioSessionControl>) -> windows::core::Result<()> {
        if let Ok(session) = newsession.ok() {
            if let Ok(control) = session.cast::<IAudioSessionControl2>() {
                let pid = unsafe { control.GetProcessId().unwrap_or(0) };
                if pid != 0 {
                    let _ = self.events.send(EngineEvent::SessionCreated { pid });
                }
            }
        }
        Ok(())
    }
}
