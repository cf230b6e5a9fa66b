mod backend;
mod directory;

#[cfg(windows)]
pub mod windows;

pub use backend::{AudioBackend, AudioSessionControl};
pub use directory::SessionDirectory;
