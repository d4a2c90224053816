mod api;
mod cli;
mod controller;
mod form;
mod logging;
mod paths;
mod settings;
mod storage;
mod theme;
mod tui;

use anyhow::{Context, Result, bail};
use api::BackendClient;
use clap::Parser;
use cli::{Cli, Command, PrefsCommand};
use controller::{FormController, NoticeKind, WatchConfig};
use form::{ControlId, FormState};
use settings::Settings;
use storage::{FilePreferenceStore, PreferenceStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(err) = logging::init() {
        eprintln!("Warning: logging disabled ({err:#}).");
    }

    let mut settings = match settings::load_or_create_settings() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("Warning: failed to load settings ({err:#}). Using defaults.");
            Settings::default()
        }
    };
    if let Some(server) = cli.server {
        settings.server_url = server;
    }
    if let Some(policy) = cli.transitions {
        settings.transition_policy = policy;
    }

    match cli.command {
        None | Some(Command::Tui) => {
            tui::run_tui(&settings).await?;
        }
        Some(Command::Generate(args)) => {
            let store = FilePreferenceStore::open_default_or_empty()?;
            let mut controller = FormController::load(
                WatchConfig::default(),
                settings.transition_policy,
                store,
                FormState::default(),
            );
            if let Some(subject) = args.subject {
                controller.set_value(ControlId::VideoSubject, subject);
            }
            let request = controller.generate_video();

            if args.dry_run {
                println!("{}", serde_json::to_string_pretty(&request)?);
                return Ok(());
            }

            let client = BackendClient::new(&settings.server_url)?;
            println!("Submitting to {} ...", client.generate_url());
            let outcome = client.generate(&request).await;
            controller.finish_generation(outcome);
            report_notices(&mut controller)?;
        }
        Some(Command::Cancel) => {
            let store = FilePreferenceStore::open_default_or_empty()?;
            let mut controller = FormController::load(
                WatchConfig::default(),
                settings.transition_policy,
                store,
                FormState::default(),
            );
            controller.cancel_generation();
            let client = BackendClient::new(&settings.server_url)?;
            let outcome = client.cancel().await;
            controller.finish_cancel(outcome);
            report_notices(&mut controller)?;
        }
        Some(Command::Prefs(args)) => match args.command {
            PrefsCommand::List(list_args) => {
                let store = FilePreferenceStore::open_default().context("failed opening preferences")?;
                let entries = store.entries();
                if list_args.json {
                    let object = entries
                        .into_iter()
                        .map(|(key, value)| (key, serde_json::Value::String(value)))
                        .collect::<serde_json::Map<_, _>>();
                    println!("{}", serde_json::to_string_pretty(&object)?);
                    return Ok(());
                }

                if entries.is_empty() {
                    println!("No stored preferences in {}.", store.path().display());
                    return Ok(());
                }

                println!("{:<28}  {:<20}  VALUE", "KEY", "CONTROL");
                for (key, value) in &entries {
                    let control = key
                        .strip_suffix("Value")
                        .and_then(ControlId::from_id)
                        .map_or("-", ControlId::label);
                    println!("{key:<28}  {control:<20}  {value}");
                }
            }
        },
    }

    Ok(())
}

/// Prints queued notices; a failure notice makes the command fail.
fn report_notices<S: PreferenceStore>(controller: &mut FormController<S>) -> Result<()> {
    let mut failed = false;
    for notice in controller.drain_notices() {
        match notice.kind {
            NoticeKind::Message => println!("{}", notice.text),
            NoticeKind::Failure => {
                eprintln!("{}", notice.text);
                failed = true;
            }
        }
    }
    if failed {
        let log = logging::log_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "the log file".to_owned());
        bail!("backend request failed; details in {log}");
    }
    Ok(())
}
