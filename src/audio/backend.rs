use crate::engine::EventSender;
use crate::guard::Subscription;
use anyhow::Result;

/// Une session audio obtenue par une énumération.
///
/// Les handles ne sont jamais conservés d'un appel à l'autre : la collection
/// de l'OS devient périmée dès qu'un processus démarre ou arrête un flux.
pub trait AudioSessionControl {
    /// 0 pour la pseudo-session des sons système
    fn process_id(&self) -> u32;

    fn is_expired(&self) -> bool;

    fn is_muted(&self) -> Result<bool>;

    fn set_muted(&self, muted: bool) -> Result<()>;
}

pub trait AudioBackend {
    /// Toutes les sessions actuelles du périphérique de rendu par défaut (rôle multimédia)
    fn sessions(&self) -> Result<Vec<Box<dyn AudioSessionControl>>>;

    /// S'abonner aux nouvelles sessions. Le callback ne fait que poster
    /// `EngineEvent::SessionCreated` vers le contexte propriétaire.
    fn watch_session_created(&self, events: EventSender) -> Result<Subscription>;
}
