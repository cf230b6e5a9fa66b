//! Interface console : commandes texte lues sur stdin, exécutées via
//! `EngineHandle` depuis un thread dédié.

use crate::autostart;
use crate::config::{SettingChange, SettingsFile};
use crate::engine::{Command, EngineHandle};
use crate::error::MuteError;
use crate::models::ApplicationIdentity;
use std::io::BufRead;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Enable,
    Disable,
    Add(ApplicationIdentity),
    Remove(ApplicationIdentity),
    List,
    Sessions,
    Status,
    /// `None` : afficher les réglages enregistrés
    Settings(Option<SettingChange>),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commandes:
  enable            - activer l'auto-mute
  disable           - désactiver et rétablir le son
  add <exe>         - surveiller une application (ex: 'add spotify.exe')
  remove <exe>      - ne plus surveiller (le son est rétabli)
  list              - applications surveillées
  sessions          - sessions audio actuelles
  status            - état courant
  settings          - réglages enregistrés
  settings run_at_login on|off
  settings minimize_on_close on|off
  quit              - quitter";

/// `Ok(None)` pour une ligne vide
pub fn parse(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let app = || {
        ApplicationIdentity::new(rest).ok_or_else(|| format!("'{verb}' attend un nom d'exécutable"))
    };

    let command = match verb.to_lowercase().as_str() {
        "enable" | "on" => ConsoleCommand::Enable,
        "disable" | "off" => ConsoleCommand::Disable,
        "add" => ConsoleCommand::Add(app()?),
        "remove" | "rm" => ConsoleCommand::Remove(app()?),
        "list" | "ls" => ConsoleCommand::List,
        "sessions" => ConsoleCommand::Sessions,
        "status" => ConsoleCommand::Status,
        "settings" => ConsoleCommand::Settings(parse_setting(rest)?),
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(format!("commande inconnue: {other}")),
    };
    Ok(Some(command))
}

fn parse_setting(rest: &str) -> Result<Option<SettingChange>, String> {
    let mut words = rest.split_whitespace();
    let Some(name) = words.next() else {
        return Ok(None);
    };

    let on = match words.next().map(str::to_lowercase).as_deref() {
        Some("on" | "true" | "1") => true,
        Some("off" | "false" | "0") => false,
        _ => return Err(format!("'settings {name}' attend on ou off")),
    };

    match name.to_lowercase().as_str() {
        "run_at_login" => Ok(Some(SettingChange::RunAtLogin(on))),
        "minimize_on_close" => Ok(Some(SettingChange::MinimizeOnClose(on))),
        other => Err(format!("réglage inconnu: {other}")),
    }
}

/// Exécute une commande et retourne le texte à afficher
pub fn execute(
    handle: &EngineHandle,
    settings: &mut SettingsFile,
    command: ConsoleCommand,
) -> Result<String, MuteError> {
    let output = match command {
        ConsoleCommand::Enable => {
            handle.call_blocking(|reply| Command::Enable { reply })??;
            status_line(handle)?
        }
        ConsoleCommand::Disable => {
            handle.call_blocking(|reply| Command::Disable { reply })?;
            status_line(handle)?
        }
        ConsoleCommand::Add(app) => {
            let name = app.to_string();
            if handle.call_blocking(|reply| Command::Add { app, reply })? {
                format!("✅ {name} ajouté")
            } else {
                format!("{name} est déjà surveillé")
            }
        }
        ConsoleCommand::Remove(app) => {
            let name = app.to_string();
            if handle.call_blocking(|reply| Command::Remove { app, reply })? {
                format!("✅ {name} retiré")
            } else {
                format!("{name} n'était pas surveillé (son rétabli)")
            }
        }
        ConsoleCommand::List => {
            let apps = handle.call_blocking(|reply| Command::Monitored { reply })?;
            to_json(&apps)
        }
        ConsoleCommand::Sessions => {
            let sessions = handle.call_blocking(|reply| Command::Sessions { reply })?;
            to_json(&sessions)
        }
        ConsoleCommand::Status => status_line(handle)?,
        ConsoleCommand::Settings(None) => to_json(settings.settings()),
        ConsoleCommand::Settings(Some(change)) => {
            if !settings.apply(change)? {
                "réglage inchangé".to_string()
            } else {
                if let SettingChange::RunAtLogin(on) = change {
                    if let Err(e) = autostart::sync_autostart(on) {
                        warn!("mise à jour du démarrage automatique impossible: {e:#}");
                    }
                }
                format!("✅ réglages enregistrés dans {}", settings.path().display())
            }
        }
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Quit => {
            handle.shutdown();
            "Arrêt...".to_string()
        }
    };
    Ok(output)
}

/// Boucle de lecture de stdin. Retourne à la fin de l'entrée ou sur `quit`.
pub fn run(handle: &EngineHandle, settings: &mut SettingsFile, input: impl BufRead) {
    for line in input.lines() {
        let Ok(line) = line else {
            break;
        };

        match parse(&line) {
            Ok(Some(command)) => {
                let quit = command == ConsoleCommand::Quit;
                match execute(handle, settings, command) {
                    Ok(output) => println!("{output}"),
                    Err(e) => {
                        eprintln!("❌ {e}");
                        if matches!(e, MuteError::EngineClosed) {
                            return;
                        }
                    }
                }
                if quit {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("❌ {e}"),
        }
    }
}

fn status_line(handle: &EngineHandle) -> Result<String, MuteError> {
    let status = handle.call_blocking(|reply| Command::Status { reply })?;
    Ok(status.text)
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
