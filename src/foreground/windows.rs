use super::WindowSystem;
use crate::engine::{EngineEvent, EventSender};
use crate::guard::ForegroundWatch;
use anyhow::{anyhow, Context, Result};
use std::cell::RefCell;
use std::sync::mpsc;
use tracing::{debug, warn};
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Accessibility::{SetWinEventHook, UnhookWinEvent, HWINEVENTHOOK};
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, GetForegroundWindow, GetMessageW, GetWindowThreadProcessId, PeekMessageW,
    PostThreadMessageW, TranslateMessage, EVENT_SYSTEM_FOREGROUND, MSG, OBJID_WINDOW,
    PM_NOREMOVE, WINEVENT_OUTOFCONTEXT, WINEVENT_SKIPOWNPROCESS, WM_QUIT,
};

thread_local! {
    // Canal vers le contexte propriétaire, propre au thread du hook
    static HOOK_EVENTS: RefCell<Option<EventSender>> = const { RefCell::new(None) };
}

pub struct WindowsWindowSystem;

impl WindowsWindowSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSystem for WindowsWindowSystem {
    fn foreground_pid(&self) -> Option<u32> {
        unsafe { window_pid(GetForegroundWindow()) }
    }

    fn install_foreground_hook(&self, events: EventSender) -> Result<ForegroundWatch> {
        let (ready_tx, ready_rx) = mpsc::channel();

        // Un hook hors contexte est livré via la boucle de messages du thread qui l'installe
        let thread = std::thread::Builder::new()
            .name("foreground-hook".into())
            .spawn(move || hook_thread(events, ready_tx))
            .context("thread du hook")?;

        let thread_id = ready_rx
            .recv()
            .map_err(|_| anyhow!("le thread du hook s'est arrêté prématurément"))?
            .map_err(|e| anyhow!(e))?;

        debug!(thread_id, "hook EVENT_SYSTEM_FOREGROUND installé");

        Ok(ForegroundWatch::new(move || {
            unsafe {
                if let Err(e) = PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) {
                    warn!("arrêt du thread du hook impossible: {e}");
                    return;
                }
            }
            let _ = thread.join();
            debug!("hook EVENT_SYSTEM_FOREGROUND retiré");
        }))
    }
}

fn hook_thread(events: EventSender, ready: mpsc::Sender<Result<u32, String>>) {
    HOOK_EVENTS.with(|slot| *slot.borrow_mut() = Some(events));

    unsafe {
        // Force la création de la file de messages avant d'annoncer le thread
        let mut msg = MSG::default();
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);

        let hook = SetWinEventHook(
            EVENT_SYSTEM_FOREGROUND,
            EVENT_SYSTEM_FOREGROUND,
            None,
            Some(on_win_event),
            0,
            0,
            WINEVENT_OUTOFCONTEXT | WINEVENT_SKIPOWNPROCESS,
        );

        if hook.is_invalid() {
            let _ = ready.send(Err("SetWinEventHook a échoué".to_string()));
            HOOK_EVENTS.with(|slot| slot.borrow_mut().take());
            return;
        }

        let _ = ready.send(Ok(GetCurrentThreadId()));

        // 0 = WM_QUIT, -1 = erreur
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        let _ = UnhookWinEvent(hook);
    }

    HOOK_EVENTS.with(|slot| slot.borrow_mut().take());
}

unsafe extern "system" fn on_win_event(
    _hook: HWINEVENTHOOK,
    _event: u32,
    hwnd: HWND,
    id_object: i32,
    _id_child: i32,
    _event_thread: u32,
    _event_time: u32,
) {
    // Seuls les changements de fenêtre de premier niveau nous intéressent
    if id_object != OBJID_WINDOW.0 {
        return;
    }

    let pid = window_pid(hwnd);
    HOOK_EVENTS.with(|slot| {
        if let Some(events) = slot.borrow().as_ref() {
            let _ = events.send(EngineEvent::Foreground { pid });
        }
    });
}

unsafe fn window_pid(hwnd: HWND) -> Option<u32> {
    if hwnd.is_invalid() {
        return None;
    }
    let mut pid = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut pid));
    (pid != 0).then_some(pid)
}
