//! `animelog config` subcommands

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use animelog_core::AnimelogConfig;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the config file location
    Path,
    /// Print the effective configuration (file + environment), secret masked
    Show {
        /// Read this file instead of ~/.animelog/config.toml
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check that the effective configuration can start the server
    Validate {
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,
    },
}

/// Resolve configuration from an explicit file or the default location,
/// then apply environment overrides.
pub fn load(path: Option<&Path>) -> Result<AnimelogConfig> {
    match path {
        Some(path) => {
            let mut config = AnimelogConfig::load_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?;
            config.apply_env(|key| std::env::var(key).ok());
            Ok(config)
        }
        None => AnimelogConfig::load().context("Failed to load config"),
    }
}

pub fn run_config(args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Path => {
            println!("{}", AnimelogConfig::config_path().display());
            Ok(())
        }
        ConfigCommands::Show { config } => run_show(config.as_deref()),
        ConfigCommands::Init { force } => run_init(&AnimelogConfig::config_path(), force),
        ConfigCommands::Validate { config } => run_validate(config.as_deref()),
    }
}

fn run_show(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}

fn run_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let rendered = toml::to_string_pretty(&AnimelogConfig::default())
        .context("Failed to serialize default config")?;
    let content = format!(
        "# animelog configuration\n# Environment variables (JWT_SECRET, DATABASE_URL, PORT, ...) override these values.\n\n{}",
        rendered
    );
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("✓ Wrote {}", path.display());
    println!("  Set auth.jwt_secret (or JWT_SECRET) before running `animelog serve`");
    Ok(())
}

fn run_validate(path: Option<&Path>) -> Result<()> {
    let config = load(path)?;
    config.validate().context("Invalid configuration")?;

    println!("✓ Configuration is valid");
    println!("  bind:     {}", config.server.bind);
    println!("  database: {}", config.database.redacted_url());
    println!("  jikan:    {}", config.jikan.base_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_parseable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".animelog/config.toml");

        run_init(&path, false).unwrap();
        let config = AnimelogConfig::load_file(&path).unwrap();
        assert_eq!(config.server.bind.port(), 5001);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server]\n").unwrap();

        assert!(run_init(&path, false).is_err());
        run_init(&path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("[jikan]"));
    }
}
