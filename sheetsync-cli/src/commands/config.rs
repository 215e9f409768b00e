//! `sheetsync config`: inspect or create the config file.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use sheetsync_core::{
    config::{self as sheetsync_config, TOKEN_ENV_VARS},
    Config,
};

use super::load_config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration (token redacted).
    Show,
    /// Print the config file location.
    Path,
    /// Write a default config file if none exists.
    Init,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "setting")]
    key: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Path => {
            println!("{}", sheetsync_config::config_path()?.display());
            Ok(())
        }
        ConfigCommand::Init => {
            let path = sheetsync_config::config_path()?;
            if path.exists() {
                println!("{} {} already exists", "·".dimmed(), path.display());
                return Ok(());
            }
            sheetsync_config::save(&Config::default())
                .context("failed to write default config")?;
            println!("{} wrote {}", "✓".green(), path.display());
            println!(
                "  set a token with `token:` in that file or via {}",
                TOKEN_ENV_VARS.join(" / ")
            );
            Ok(())
        }
        ConfigCommand::Show => {
            let config = load_config()?;
            let mut table = Table::new(rows(&config));
            table.with(Style::rounded());
            println!("{table}");
            Ok(())
        }
    }
}

fn rows(config: &Config) -> Vec<SettingRow> {
    vec![
        SettingRow {
            key: "api_base",
            value: config.api_base.clone(),
        },
        SettingRow {
            key: "token",
            value: redact(config.token.as_deref()),
        },
        SettingRow {
            key: "cache_ttl_secs",
            value: config.cache_ttl_secs.to_string(),
        },
        SettingRow {
            key: "timeout_secs",
            value: config.timeout_secs.to_string(),
        },
        SettingRow {
            key: "default_branch",
            value: config.default_branch.to_string(),
        },
        SettingRow {
            key: "commit_message",
            value: config.commit_message.clone(),
        },
    ]
}

fn redact(token: Option<&str>) -> String {
    match token {
        None => "(not set)".to_owned(),
        Some(token) if token.len() > 8 => {
            format!("{}…", token.chars().take(4).collect::<String>())
        }
        Some(_) => "****".to_owned(),
    }
}
