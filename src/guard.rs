/// Ressource OS libérée exactement une fois : explicitement via `release`
/// ou automatiquement au `Drop` (y compris en cas de sortie anormale).
pub struct ScopedRelease {
    release: Option<Box<dyn FnOnce()>>,
}

/// Hook de premier plan installé (push ou poll)
pub type ForegroundWatch = ScopedRelease;

/// Abonnement aux créations de sessions audio
pub type Subscription = ScopedRelease;

impl ScopedRelease {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for ScopedRelease {
    fn drop(&mut self) {
        self.run();
    }
}

impl std::fmt::Debug for ScopedRelease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedRelease")
            .field("armed", &self.release.is_some())
            .finish()
    }
}
