use crate::audio::AudioBackend;
use crate::error::MuteError;
use crate::foreground::WindowSystem;
use crate::process::ProcessResolver;
use std::sync::Arc;

/// Collaborateurs OS injectés dans le synchroniseur
pub struct Platform {
    pub audio: Box<dyn AudioBackend>,
    pub resolver: Arc<dyn ProcessResolver>,
    pub window: Arc<dyn WindowSystem>,
}

/// Implémentations natives. À appeler sur le thread propriétaire
/// (initialisation COM).
#[cfg(windows)]
pub fn create_platform() -> Result<Platform, MuteError> {
    use crate::audio::windows::WindowsAudioBackend;
    use crate::foreground::windows::WindowsWindowSystem;
    use crate::process::windows::WindowsProcessResolver;

    let audio = WindowsAudioBackend::new().map_err(|e| MuteError::Audio(format!("{e:#}")))?;

    Ok(Platform {
        audio: Box::new(audio),
        resolver: Arc::new(WindowsProcessResolver::new()),
        window: Arc::new(WindowsWindowSystem::new()),
    })
}

#[cfg(not(windows))]
pub fn create_platform() -> Result<Platform, MuteError> {
    Err(MuteError::UnsupportedPlatform)
}
