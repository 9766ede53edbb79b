// ===============================
// src/config.rs
// ===============================
use clap::Parser;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Who generates client traffic for the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowMode {
    Mock,
    Off,
}

impl FlowMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mock" => Some(FlowMode::Mock),
            "off" | "none" => Some(FlowMode::Off),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowMode::Mock => "mock",
            FlowMode::Off => "off",
        }
    }
}

/// Command-line overrides; anything left unset falls back to the environment.
#[derive(Parser, Debug, Default)]
#[command(name = "venue_sim", about = "Simulated order venue")]
pub struct Cli {
    /// Engine inbound queue depth
    #[arg(long)]
    pub queue_depth: Option<usize>,
    /// Append JSONL events here
    #[arg(long)]
    pub record_file: Option<String>,
    #[arg(long)]
    pub metrics_port: Option<u16>,
    /// mock | off
    #[arg(long)]
    pub flow: Option<String>,
    #[arg(long)]
    pub flow_interval_ms: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct Args {
    pub queue_depth: usize,
    pub record_file: Option<String>,
    pub metrics_port: u16,

    pub flow_mode: FlowMode,
    pub flow_symbols: Vec<String>,
    pub flow_users: Vec<String>,
    pub flow_interval_ms: u64,
}

fn split_list(raw: Option<String>, upper: bool, default: &[&str]) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .map(|x| if upper { x.to_ascii_uppercase() } else { x.to_string() })
            .collect::<Vec<_>>()
    })
    .filter(|v| !v.is_empty())
    .unwrap_or_else(|| default.iter().map(|s| s.to_string()).collect())
}

// Unset or blank -> None; set but unparseable -> Error::Config naming the key.
fn parsed<T: FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key}={v:?} is not a valid value"))),
    }
}

fn parse_flow_mode(key: &str, raw: Option<&str>) -> Result<Option<FlowMode>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(v) => FlowMode::parse(v)
            .map(Some)
            .ok_or_else(|| Error::Config(format!("{key}={v:?}: expected mock or off"))),
    }
}

fn nonzero_depth(key: &str, n: usize) -> Result<usize> {
    if n == 0 {
        return Err(Error::Config(format!("{key} must be greater than zero")));
    }
    Ok(n)
}

impl Args {
    /// `get` resolves a key to its raw value (the process env in `load`).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let queue_depth = match parsed("ENGINE_QUEUE_DEPTH", get("ENGINE_QUEUE_DEPTH"))? {
            Some(n) => nonzero_depth("ENGINE_QUEUE_DEPTH", n)?,
            None => 1024,
        };
        let record_file = get("RECORD_FILE").filter(|s| !s.is_empty());
        let metrics_port = parsed("METRICS_PORT", get("METRICS_PORT"))?.unwrap_or(9898);

        let flow_mode =
            parse_flow_mode("FLOW_MODE", get("FLOW_MODE").as_deref())?.unwrap_or(FlowMode::Mock);
        let flow_symbols = split_list(get("FLOW_SYMBOLS"), true, &["ABC", "XYZ"]);
        let flow_users = split_list(get("FLOW_USERS"), false, &["u1", "u2", "u3"]);
        let flow_interval_ms = parsed("FLOW_INTERVAL_MS", get("FLOW_INTERVAL_MS"))?.unwrap_or(50);

        Ok(Args {
            queue_depth,
            record_file,
            metrics_port,
            flow_mode,
            flow_symbols,
            flow_users,
            flow_interval_ms,
        })
    }

    pub fn apply(mut self, cli: Cli) -> Result<Self> {
        if let Some(n) = cli.queue_depth {
            self.queue_depth = nonzero_depth("--queue-depth", n)?;
        }
        if cli.record_file.is_some() {
            self.record_file = cli.record_file;
        }
        if let Some(p) = cli.metrics_port {
            self.metrics_port = p;
        }
        if let Some(mode) = parse_flow_mode("--flow", cli.flow.as_deref())? {
            self.flow_mode = mode;
        }
        if let Some(ms) = cli.flow_interval_ms {
            self.flow_interval_ms = ms;
        }
        Ok(self)
    }
}

pub fn load() -> Result<Args> {
    // .env first so RECORD_FILE, FLOW_* etc. are visible below
    let _ = dotenv();
    Args::from_lookup(|k| env::var(k).ok())?.apply(Cli::parse())
}
