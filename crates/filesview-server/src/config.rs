//! Command line and config file handling.
//!
//! Settings come from an optional RON file, overridden and extended by
//! command line flags:
//!
//! ```ron
//! (
//!     bind: "127.0.0.1:5051",
//!     attach: [
//!         (path: "/var/log", name: "/logs"),
//!         (path: "~/builds", name: "/builds"),
//!     ],
//! )
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;

use crate::constants::{DEFAULT_BIND_ADDRESS, DEFAULT_HTTP_PORT};

/// Serve attached directories read-only over HTTP.
#[derive(Debug, Parser)]
#[command(name = "filesview-server", version)]
pub struct Cli {
    /// Address to listen on [default: 127.0.0.1:5051]
    #[arg(long)]
    pub bind: Option<SocketAddr>,

    /// RON config file with bind address and attachments
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Attach a real path under a virtual name (repeatable)
    #[arg(long = "attach", value_name = "REAL=VIRTUAL", value_parser = parse_attachment)]
    pub attach: Vec<Attachment>,
}

/// A real path to attach under a virtual name at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Attachment {
    pub path: PathBuf,
    pub name: String,
}

impl Attachment {
    /// The path with a leading `~` expanded.
    pub fn expanded_path(&self) -> PathBuf {
        shellexpand::tilde(&self.path.to_string_lossy()).as_ref().into()
    }
}

fn parse_attachment(s: &str) -> Result<Attachment, String> {
    let (path, name) = s
        .split_once('=')
        .ok_or_else(|| format!("expected REAL=VIRTUAL, got '{s}'"))?;
    if path.is_empty() || name.is_empty() {
        return Err(format!("expected REAL=VIRTUAL, got '{s}'"));
    }
    Ok(Attachment {
        path: PathBuf::from(path),
        name: name.to_string(),
    })
}

/// Effective server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub attach: Vec<Attachment>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let ip: IpAddr = DEFAULT_BIND_ADDRESS
            .parse()
            .unwrap_or(IpAddr::from([127, 0, 0, 1]));
        Self {
            bind: SocketAddr::new(ip, DEFAULT_HTTP_PORT),
            attach: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Parse a RON config document.
    pub fn from_ron(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Load a RON config file; `~` in the path is expanded.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let path: PathBuf = shellexpand::tilde(&path.to_string_lossy()).as_ref().into();
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Build the effective config: file (if any), then CLI overrides.
    ///
    /// `--bind` replaces the file's address; `--attach` entries are applied
    /// after the file's, so they win on name clashes.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        config.attach.extend(cli.attach.iter().cloned());
        Ok(config)
    }
}
