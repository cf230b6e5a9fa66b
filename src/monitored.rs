use crate::models::ApplicationIdentity;

/// Applications choisies par l'utilisateur pour la mise en sourdine automatique.
///
/// Unicité garantie, ordre d'insertion conservé pour l'affichage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitoredSet {
    apps: Vec<ApplicationIdentity>,
}

impl MonitoredSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retourne `false` si l'application était déjà surveillée
    pub fn add(&mut self, identity: ApplicationIdentity) -> bool {
        if self.contains(&identity) {
            return false;
        }
        self.apps.push(identity);
        true
    }

    pub fn remove(&mut self, identity: &ApplicationIdentity) -> bool {
        let before = self.apps.len();
        self.apps.retain(|app| app != identity);
        self.apps.len() != before
    }

    pub fn contains(&self, identity: &ApplicationIdentity) -> bool {
        self.apps.iter().any(|app| app == identity)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApplicationIdentity> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn clear(&mut self) {
        self.apps.clear();
    }

    pub fn to_vec(&self) -> Vec<ApplicationIdentity> {
        self.apps.clone()
    }
}
