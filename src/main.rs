use std::path::PathBuf;
use std::process::exit;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

mod apps;
mod common;
mod icon;
mod launch;
mod platform;
mod profile;

use apps::AppCatalog;
use icon::cache::IconCache;
use icon::IconService;
use launch::Launcher;
use platform::Platform;
use profile::{KeyConfig, KeyboardProfile};

#[derive(Parser)]
#[command(name = "gridkey")]
#[command(about = "Keyboard grid launcher backend: icon resolution and program launching")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an icon for a target and print it as a PNG data URI
    Icon {
        /// File path, command, URL or app identifier
        target: String,
        /// Image file to use instead of OS extraction
        #[arg(long)]
        icon_path: Option<String>,
        /// Launch arguments (part of the cache identity)
        #[arg(long)]
        arguments: Option<String>,
    },
    /// Launch a target detached from this process
    Launch {
        /// File path, command, URL or app identifier
        target: String,
        /// Argument string, quote-grouped
        #[arg(long)]
        arguments: Option<String>,
        /// Working directory for the child
        #[arg(long)]
        working_directory: Option<String>,
        /// Request elevation (Windows only)
        #[arg(long)]
        run_as_admin: bool,
    },
    /// List installed applications
    Apps {
        /// Rescan now instead of serving the cached list
        #[arg(long)]
        refresh: bool,
    },
    /// Operate on a key from a saved keyboard profile
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Icon cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum KeyAction {
    /// Resolve the icon for a profile key
    Icon {
        tab: String,
        key: String,
        /// Profile file (defaults to the config directory)
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Launch a profile key
    Launch {
        tab: String,
        key: String,
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Create or replace a profile key
    Set {
        tab: String,
        key: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        file_path: Option<String>,
        #[arg(long)]
        arguments: Option<String>,
        #[arg(long)]
        working_directory: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        run_as_admin: bool,
        #[arg(long)]
        icon_path: Option<String>,
        #[arg(long)]
        profile: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Delete expired icon cache entries now
    Sweep,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let platform = Platform::current();

    match cli.command {
        Commands::Icon {
            target,
            icon_path,
            arguments,
        } => {
            let key = KeyConfig {
                file_path: target,
                icon_path,
                arguments,
                ..Default::default()
            };
            resolve_icon(platform, &key).await
        }
        Commands::Launch {
            target,
            arguments,
            working_directory,
            run_as_admin,
        } => {
            let key = KeyConfig {
                file_path: target,
                arguments,
                working_directory,
                run_as_admin,
                ..Default::default()
            };
            Launcher::new(platform).launch(&key).await?;
            Ok(())
        }
        Commands::Apps { refresh } => {
            let catalog = AppCatalog::open_default(platform)?;
            let apps = if refresh {
                catalog.refresh().await
            } else {
                catalog.list().await
            };
            for app in &apps {
                println!("{}\t{}", app.label, app.file_path);
            }
            Ok(())
        }
        Commands::Key { action } => match action {
            KeyAction::Icon { tab, key, profile } => {
                let key = load_profile_key(&tab, &key, profile)?;
                resolve_icon(platform, &key).await
            }
            KeyAction::Launch { tab, key, profile } => {
                let key = load_profile_key(&tab, &key, profile)?;
                Launcher::new(platform).launch(&key).await?;
                Ok(())
            }
            KeyAction::Set {
                tab,
                key,
                label,
                file_path,
                arguments,
                working_directory,
                description,
                run_as_admin,
                icon_path,
                profile,
            } => {
                let path = profile_path(profile)?;
                let mut doc = if path.exists() {
                    KeyboardProfile::load(&path)
                        .with_context(|| format!("failed to load profile from {}", path.display()))?
                } else {
                    KeyboardProfile::default()
                };

                doc.set_key(KeyConfig {
                    tab_id: tab,
                    id: key,
                    label: label.unwrap_or_default(),
                    file_path: file_path.unwrap_or_default(),
                    arguments,
                    working_directory,
                    description,
                    run_as_admin,
                    icon_path,
                });
                doc.save(&path)
                    .with_context(|| format!("failed to save profile to {}", path.display()))?;
                Ok(())
            }
        },
        Commands::Cache { action } => match action {
            CacheAction::Sweep => {
                let cache = IconCache::open_default()?;
                let removed = cache.sweep().context("failed to sweep icon cache")?;
                println!("Removed {removed} expired icon cache entries");
                Ok(())
            }
        },
    }
}

async fn resolve_icon(platform: Platform, key: &KeyConfig) -> Result<()> {
    let cache = IconCache::open_default()?;
    cache.schedule_sweep();

    let service = IconService::new(platform, cache);
    match service.resolve(key).await {
        Some(data_uri) => {
            println!("{data_uri}");
            Ok(())
        }
        None => {
            eprintln!("{}", "No icon available".yellow());
            exit(1);
        }
    }
}

fn profile_path(profile: Option<PathBuf>) -> Result<PathBuf> {
    match profile {
        Some(path) => Ok(path),
        None => common::paths::default_profile_path(),
    }
}

fn load_profile_key(tab: &str, key: &str, profile: Option<PathBuf>) -> Result<KeyConfig> {
    let path = profile_path(profile)?;
    let profile = KeyboardProfile::load(&path)
        .with_context(|| format!("failed to load profile from {}", path.display()))?;
    profile
        .find_key(tab, key)
        .cloned()
        .with_context(|| format!("no key '{key}' on tab '{tab}'"))
}
