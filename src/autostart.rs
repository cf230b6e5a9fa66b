//! Lancement à l'ouverture de session (clé `Run` de HKCU).

use anyhow::Result;

pub const APP_NAME: &str = "MuteInBackground";

/// Aligne l'entrée `Run` sur le réglage `run_at_login`
pub fn sync_autostart(enabled: bool) -> Result<()> {
    if enabled {
        register_autostart()
    } else {
        unregister_autostart()
    }
}

#[cfg(windows)]
const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

/// Écrit (ou réécrit) l'entrée de démarrage pointant vers l'exécutable courant.
/// Idempotent.
#[cfg(windows)]
pub fn register_autostart() -> Result<()> {
    use anyhow::Context;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::System::Registry::{RegCloseKey, RegSetValueExW, KEY_SET_VALUE, REG_SZ};

    let exe = std::env::current_exe().context("chemin de l'exécutable")?;
    let value = format!("\"{}\"", exe.display());

    // REG_SZ : UTF-16 terminé par un nul
    let data: Vec<u8> = value
        .encode_utf16()
        .chain(std::iter::once(0))
        .flat_map(|unit| unit.to_le_bytes())
        .collect();

    let name = HSTRING::from(APP_NAME);

    unsafe {
        let key = open_run_key(KEY_SET_VALUE)?;
        let result = RegSetValueExW(key, PCWSTR(name.as_ptr()), Some(0), REG_SZ, Some(&data));
        let _ = RegCloseKey(key);
        result.ok().context("écriture de la clé Run")?;
    }

    tracing::info!(value = %value, "démarrage automatique enregistré");
    Ok(())
}

/// Supprime l'entrée de démarrage. Une entrée absente n'est pas une erreur.
#[cfg(windows)]
pub fn unregister_autostart() -> Result<()> {
    use anyhow::Context;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::Foundation::ERROR_FILE_NOT_FOUND;
    use windows::Win32::System::Registry::{RegCloseKey, RegDeleteValueW, KEY_SET_VALUE};

    let name = HSTRING::from(APP_NAME);

    unsafe {
        let key = open_run_key(KEY_SET_VALUE)?;
        let result = RegDeleteValueW(key, PCWSTR(name.as_ptr()));
        let _ = RegCloseKey(key);

        if result == ERROR_FILE_NOT_FOUND {
            tracing::debug!("démarrage automatique déjà absent");
            return Ok(());
        }
        result.ok().context("suppression de la valeur Run")?;
    }

    tracing::info!("démarrage automatique retiré");
    Ok(())
}

#[cfg(windows)]
unsafe fn open_run_key(
    access: windows::Win32::System::Registry::REG_SAM_FLAGS,
) -> Result<windows::Win32::System::Registry::HKEY> {
    use anyhow::Context;
    use windows::core::{HSTRING, PCWSTR};
    use windows::Win32::System::Registry::{RegOpenKeyExW, HKEY, HKEY_CURRENT_USER};

    let key_path = HSTRING::from(RUN_KEY);
    let mut key = HKEY::default();
    RegOpenKeyExW(
        HKEY_CURRENT_USER,
        PCWSTR(key_path.as_ptr()),
        Some(0),
        access,
        &mut key,
    )
    .ok()
    .context("ouverture de la clé Run")?;
    Ok(key)
}

#[cfg(not(windows))]
pub fn register_autostart() -> Result<()> {
    tracing::debug!("démarrage automatique non géré sur cette plateforme");
    Ok(())
}

#[cfg(not(windows))]
pub fn unregister_autostart() -> Result<()> {
    tracing::debug!("démarrage automatique non géré sur cette plateforme");
    Ok(())
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;

    #[test]
    fn sync_is_a_no_op_off_windows() {
        assert!(sync_autostart(true).is_ok());
        assert!(sync_autostart(false).is_ok());
    }
}
