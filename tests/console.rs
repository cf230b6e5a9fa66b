mod helpers;

use helpers::{id, FakeOs};
use mute_in_background::console::{self, ConsoleCommand};
use mute_in_background::engine::{self, Engine, EngineHandle};
use mute_in_background::{MuteSynchronizer, SettingChange, Settings, SettingsFile, TrackerMode};
use std::io::Cursor;
use std::thread;
use tempfile::TempDir;

fn settings_file(dir: &TempDir) -> SettingsFile {
    SettingsFile::load(dir.path().join("mute_in_background.toml"))
}

/// Moteur sur son propre thread, comme dans le binaire : la console
/// bloque sur les réponses depuis un autre thread.
fn spawn_engine(os: &FakeOs) -> (EngineHandle, thread::JoinHandle<Vec<String>>) {
    let (events, receiver) = engine::channel();
    let handle = EngineHandle::new(events.clone());
    let os = os.clone();

    let thread = thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let sync = MuteSynchronizer::new(os.platform(), TrackerMode::Push, events);
        let sync = runtime.block_on(Engine::new(sync, receiver).run());
        sync.monitored().iter().map(|a| a.to_string()).collect()
    });

    (handle, thread)
}

#[test]
fn scripted_session_drives_the_engine() {
    let os = FakeOs::new();
    os.app(1, "music.exe").app(2, "chat.exe");
    os.world().foreground = Some(2);
    let (handle, engine) = spawn_engine(&os);
    let dir = TempDir::new().unwrap();
    let mut settings = settings_file(&dir);
    let mut execute = |command| console::execute(&handle, &mut settings, command);

    let output = execute(ConsoleCommand::Add(id("music"))).unwrap();
    assert!(output.contains("music.exe"));

    let output = execute(ConsoleCommand::Enable).unwrap();
    assert_eq!(output, "Muting 1 app(s)");
    assert!(os.is_muted("music.exe"));

    let output = execute(ConsoleCommand::List).unwrap();
    assert!(output.contains("\"music.exe\""));

    let output = execute(ConsoleCommand::Disable).unwrap();
    assert_eq!(output, "Auto-Mute DISABLED");
    assert!(!os.is_muted("music.exe"));

    execute(ConsoleCommand::Quit).unwrap();
    assert!(engine.join().unwrap().is_empty());
}

#[test]
fn run_stops_on_quit_and_skips_bad_lines() {
    let os = FakeOs::new();
    os.app(1, "music.exe");
    let (handle, engine) = spawn_engine(&os);

    let dir = TempDir::new().unwrap();

    let script = "\nadd\nfrobnicate\nadd music.exe\non\nquit\nadd chat.exe\n";
    console::run(&handle, &mut settings_file(&dir), Cursor::new(script));

    engine.join().unwrap();
    // la ligne après `quit` n'est pas lue, et l'arrêt a rétabli le son
    assert_eq!(os.muted_count(), 0);
    assert_eq!(os.world().hooks_installed, 1);
    assert_eq!(os.world().hooks_released, 1);
}

#[test]
fn commands_after_shutdown_report_a_closed_engine() {
    let os = FakeOs::new();
    let (handle, engine) = spawn_engine(&os);
    handle.shutdown();
    engine.join().unwrap();

    let dir = TempDir::new().unwrap();
    let result = console::execute(&handle, &mut settings_file(&dir), ConsoleCommand::Status);
    assert!(result.is_err());
}

#[test]
fn settings_command_persists_the_change() {
    let os = FakeOs::new();
    let (handle, engine) = spawn_engine(&os);
    let dir = TempDir::new().unwrap();
    let mut settings = settings_file(&dir);

    let script = "settings minimize_on_close on\nsettings minimize_on_close on\nquit\n";
    console::run(&handle, &mut settings, Cursor::new(script));
    engine.join().unwrap();

    assert!(settings.settings().minimize_on_close);
    let stored = Settings::load_from(settings.path()).unwrap();
    assert!(stored.minimize_on_close);
    assert!(!stored.run_at_login);

    // déjà actif : rien à écrire
    assert!(!settings.apply(SettingChange::MinimizeOnClose(true)).unwrap());
}
