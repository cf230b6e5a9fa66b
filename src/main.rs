use clap::{Parser, ValueEnum};
use mute_in_background::{
    autostart, console, create_platform, engine, ApplicationIdentity, Engine, EngineHandle,
    MuteSynchronizer, Settings, SettingsFile, TrackerKind,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TrackerArg {
    Push,
    Poll,
}

/// Coupe le son des applications surveillées quand elles perdent le focus
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Applications à surveiller dès le démarrage (ex: spotify.exe)
    apps: Vec<String>,

    /// Fichier de réglages (par défaut à côté de l'exécutable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stratégie de suivi du premier plan
    #[arg(long, value_enum)]
    tracker: Option<TrackerArg>,

    /// Intervalle du mode poll en millisecondes
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Ne pas activer l'auto-mute au démarrage
    #[arg(long)]
    disabled: bool,

    /// Journalisation détaillée
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "mute_in_background=debug" } else { "mute_in_background=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Réglages effectifs = fichier + surcharges CLI (jamais enregistrées)
fn effective_settings(args: &Args, file: &SettingsFile) -> Settings {
    let mut settings = file.settings().clone();

    if let Some(tracker) = args.tracker {
        settings.tracker = match tracker {
            TrackerArg::Push => TrackerKind::Push,
            TrackerArg::Poll => TrackerKind::Poll,
        };
    }
    if let Some(ms) = args.poll_interval_ms {
        settings.poll_interval_ms = ms;
    }
    settings
}

// Un seul contexte propriétaire : runtime mono-thread
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut settings_file =
        SettingsFile::load(args.config.clone().unwrap_or_else(Settings::default_path));
    let settings = effective_settings(&args, &settings_file);
    info!(?settings, "réglages chargés");

    // Ajoute ou retire l'entrée Run selon le réglage
    if let Err(e) = autostart::sync_autostart(settings.run_at_login) {
        warn!("mise à jour du démarrage automatique impossible: {e:#}");
    }

    let platform = create_platform()?;
    let (events, receiver) = engine::channel();
    let mut synchronizer =
        MuteSynchronizer::new(platform, settings.tracker_mode(), events.clone());

    for app in &args.apps {
        match ApplicationIdentity::new(app) {
            Some(identity) => {
                synchronizer.add(identity);
            }
            None => warn!(app = %app, "nom d'application ignoré"),
        }
    }

    if !args.disabled {
        if let Err(e) = synchronizer.enable() {
            warn!("{e}");
        }
    }
    println!("📊 {}", synchronizer.status());

    let handle = EngineHandle::new(events);

    // Ctrl+C : arrêt propre, le son est rétabli partout
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_handle.shutdown();
        }
    });

    let console_handle = handle.clone();
    std::thread::spawn(move || {
        println!("{}", console::HELP);
        console::run(&console_handle, &mut settings_file, std::io::stdin().lock());

        // valeur courante : modifiable depuis la console
        if settings_file.settings().minimize_on_close {
            info!("console fermée, le moteur continue (Ctrl+C pour quitter)");
        } else {
            console_handle.shutdown();
        }
    });

    Engine::new(synchronizer, receiver).run().await;
    info!("👋 terminé");
    Ok(())
}
