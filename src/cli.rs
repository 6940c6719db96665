use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::inspect::View;

#[derive(Debug, Parser)]
#[command(name = "api-probe")]
#[command(about = "Run named checks against a financial-data API and print what came back")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Probe config JSON; the builtin AAPL checks are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Answer calls from recorded JSON files in this directory instead of HTTP
    #[arg(long, env = "API_PROBE_FIXTURES")]
    pub fixtures: Option<PathBuf>,

    /// Replace the `symbol` query parameter of every check
    #[arg(short, long)]
    pub symbol: Option<String>,

    /// Run only the named check (repeatable)
    #[arg(long = "only")]
    pub only: Vec<String>,

    /// Override a check's view, e.g. `--view chart=raw-dump` (repeatable)
    #[arg(long = "view", value_parser = parse_view_override)]
    pub views: Vec<(String, View)>,

    /// Exit with status 1 when any check fails
    #[arg(long)]
    pub strict: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the configured checks (default)
    Run,
    /// Print the configured checks and exit
    List,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Fold command line selections into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        for name in self.only.iter().chain(self.views.iter().map(|(name, _)| name)) {
            if config.check(name).is_none() {
                return Err(AppError::message(format!("no check named `{name}` is configured")));
            }
        }

        for (name, view) in &self.views {
            if let Some(check) = config
                .checks
                .iter_mut()
                .find(|check| check.name.eq_ignore_ascii_case(name))
            {
                check.view = *view;
            }
        }

        if let Some(symbol) = self.symbol.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            config.override_symbol(symbol);
        }

        config.retain_checks(&self.only);
        Ok(())
    }
}

fn parse_view_override(raw: &str) -> std::result::Result<(String, View), String> {
    let (name, view) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <check>=<view>, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing check name in `{raw}`"));
    }
    let view = view.parse::<View>().map_err(|err| err.to_string())?;
    Ok((name.to_string(), view))
}
