//! CLI argument definitions for the Buzz chat server.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use buzz_core::config::BuzzConfig;
use clap::Parser;
use std::path::PathBuf;

/// Buzz - a social media expert chat assistant served in the browser.
#[derive(Parser, Debug)]
#[command(name = "buzz", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Address to bind the HTTP server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > BUZZ_CONFIG env var > ~/.buzz/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(|name| std::env::var(name).ok())
    }

    fn resolve_config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("BUZZ_CONFIG") {
            return PathBuf::from(p);
        }
        match lookup(home_var()) {
            Some(home) => PathBuf::from(home).join(".buzz").join("config.toml"),
            None => PathBuf::from("config.toml"),
        }
    }

    /// Resolve the HTTP server port.
    ///
    /// Priority: --port flag > BUZZ_PORT env var > config file value.
    fn resolve_port_with<F>(&self, config_port: u16, lookup: F) -> u16
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = lookup("BUZZ_PORT").and_then(|v| v.parse::<u16>().ok()) {
            return p;
        }
        config_port
    }

    /// Apply the flags and env vars that override file values.
    pub fn apply_overrides(&self, config: &mut BuzzConfig) {
        self.apply_overrides_with(config, |name| std::env::var(name).ok());
    }

    fn apply_overrides_with<F>(&self, config: &mut BuzzConfig, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        config.general.port = self.resolve_port_with(config.general.port, lookup);
        if let Some(ref host) = self.host {
            config.general.host = host.clone();
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

fn home_var() -> &'static str {
    if cfg!(target_os = "windows") {
        "USERPROFILE"
    } else {
        "HOME"
    }
}
