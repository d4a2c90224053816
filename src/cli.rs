use crate::settings::TransitionPolicy;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "genvid-tui",
    version,
    about = "Terminal front end for a video-generation backend"
)]
pub struct Cli {
    /// Backend origin, overriding the configured `server_url`.
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// How action buttons follow request outcomes, overriding settings.
    #[arg(long, global = true, value_enum)]
    pub transitions: Option<TransitionPolicy>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive generation form.
    Tui,
    /// Submit one generation request built from stored preferences.
    Generate(GenerateArgs),
    /// Ask the backend to cancel the running generation.
    Cancel,
    /// Inspect stored form preferences.
    Prefs(PrefsArgs),
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Video subject; replaces the stored subject for this request only.
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Print the request body instead of sending it.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct PrefsArgs {
    #[command(subcommand)]
    pub command: PrefsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// List every stored preference entry.
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print machine-readable JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
