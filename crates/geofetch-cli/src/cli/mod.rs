use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use geofetch::{GeoFetcher, ReqwestClient, RuntimeMode, SecurityConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod check;
mod fetch;

#[derive(Clone, Debug, Parser)]
#[command(name = "geofetch", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// Security configuration file (TOML)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Relax HTTPS-only for loopback hosts (refused when GEOFETCH_ENV is production)
    #[arg(long, global = true)]
    pub dev: bool,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Validate a URL against the security policy without fetching it
    #[command(alias = "c", name = "check")]
    Check(check::CheckArg),
    /// Fetch, verify and parse a geography document
    #[command(alias = "f", name = "fetch")]
    Fetch(fetch::FetchArg),
}

impl App {
    /// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
    pub fn init_tracing(&self) {
        let default = if self.verbose { "debug" } else { "info" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let geo = self.loader()?;
        match &self.cmd {
            Commands::Check(arg) => arg.run(&geo),
            Commands::Fetch(arg) => arg.run(&geo).await,
        }
    }

    fn loader(&self) -> anyhow::Result<GeoFetcher<ReqwestClient>> {
        let mode = RuntimeMode::from_env();
        debug!(?mode, "runtime mode");
        let mut geo = GeoFetcher::new(mode)?;
        if let Some(path) = &self.config {
            geo = geo.with_config(load_config(path)?)?;
        }
        if self.dev {
            geo.enable_development_mode()?;
        }
        Ok(geo)
    }
}

fn load_config(path: &Path) -> anyhow::Result<SecurityConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    SecurityConfig::from_toml_str(&text)
        .with_context(|| format!("invalid config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check() {
        let app = App::try_parse_from(["geofetch", "check", "https://cdn.example.com/us.json"]).unwrap();
        assert!(matches!(app.cmd, Commands::Check(_)));
        assert!(!app.dev);
    }

    #[test]
    fn test_parse_fetch_with_options() {
        let app = App::try_parse_from([
            "geofetch",
            "fetch",
            "https://cdn.example.com/us.json",
            "--integrity",
            "sha384-abc",
            "--strict",
            "--dev",
            "--config",
            "geofetch.toml",
        ])
        .unwrap();
        assert!(app.dev);
        assert_eq!(app.config.as_deref(), Some(Path::new("geofetch.toml")));
        let Commands::Fetch(arg) = app.cmd else {
            panic!("expected fetch");
        };
        assert_eq!(arg.integrity.as_deref(), Some("sha384-abc"));
        assert!(arg.strict);
    }

    #[test]
    fn test_url_is_required() {
        assert!(App::try_parse_from(["geofetch", "fetch"]).is_err());
    }
}
