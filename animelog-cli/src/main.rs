mod commands;
mod config;
mod tracing_setup;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};

use crate::commands::migrate::{run_migrate, MigrateArgs};
use crate::commands::serve::{run_serve, ServeArgs};
use crate::config::{run_config, ConfigArgs};
use crate::tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "animelog",
    author,
    version,
    about = "Track anime and manga progress with metadata from MyAnimeList (Jikan)"
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the `telemetry` feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the REST API server
    Serve(ServeArgs),
    /// Create or repair the database schema
    Migrate(MigrateArgs),
    /// Inspect or create the configuration file
    Config(ConfigArgs),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
struct CompletionsArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    })?;

    let result = match cli.command {
        Commands::Serve(args) => run_serve(args).await,
        Commands::Migrate(args) => run_migrate(args).await,
        Commands::Config(args) => run_config(args),
        Commands::Completions(args) => {
            run_completions(args);
            Ok(())
        }
    };

    tracing_setup::shutdown_otel();
    result
}

fn run_completions(args: CompletionsArgs) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut stdout = std::io::stdout();

    match args.shell {
        Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut stdout),
        Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut stdout),
        Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut stdout),
        Shell::PowerShell => generate(shells::PowerShell, &mut cmd, name, &mut stdout),
        Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut stdout),
    }
}
