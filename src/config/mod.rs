//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::{DEFAULT_ENTITY_TTL, TtlPolicy};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "aula";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4100;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;

/// Command-line arguments for the Aula gateway binary.
#[derive(Debug, Parser)]
#[command(name = "aula", version, about = "Aula cache and notification gateway")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "AULA_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the gateway (WebSocket fan-out plus the invalidation endpoint).
    Serve(Box<ServeArgs>),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the cache store connection URL (redis://…).
    #[arg(long = "cache-url", value_name = "URL")]
    pub cache_url: Option<String>,

    /// Override the entity snapshot TTL.
    #[arg(long = "cache-entity-ttl-seconds", value_name = "SECONDS")]
    pub cache_entity_ttl_seconds: Option<u64>,

    /// Override the per-user listing TTL.
    #[arg(long = "cache-user-listing-ttl-seconds", value_name = "SECONDS")]
    pub cache_user_listing_ttl_seconds: Option<u64>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Connection URL for the shared key-value store. When absent the
    /// gateway runs against the in-process store.
    pub url: Option<String>,
    pub ttl: TtlPolicy,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix("AULA").separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.cache_url.as_ref() {
            self.cache.url = Some(url.clone());
        }
        if let Some(seconds) = overrides.cache_entity_ttl_seconds {
            self.cache.entity_ttl_seconds = Some(seconds);
        }
        if let Some(seconds) = overrides.cache_user_listing_ttl_seconds {
            self.cache.user_listing_ttl_seconds = Some(seconds);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let url = cache.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let entity_secs = cache
        .entity_ttl_seconds
        .unwrap_or(DEFAULT_ENTITY_TTL.as_secs());
    if entity_secs == 0 {
        return Err(LoadError::invalid(
            "cache.entity_ttl_seconds",
            "must be greater than zero",
        ));
    }

    let user_listing_secs = cache
        .user_listing_ttl_seconds
        .unwrap_or(DEFAULT_ENTITY_TTL.as_secs());
    if user_listing_secs == 0 {
        return Err(LoadError::invalid(
            "cache.user_listing_ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        url,
        ttl: TtlPolicy {
            entity: Duration::from_secs(entity_secs),
            user_listing: Duration::from_secs(user_listing_secs),
        },
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    url: Option<String>,
    entity_ttl_seconds: Option<u64>,
    user_listing_ttl_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let settings = Settings::from_raw(RawSettings::default()).expect("defaults");
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.cache.ttl.entity, DEFAULT_ENTITY_TTL);
        assert_eq!(settings.cache.ttl.user_listing, DEFAULT_ENTITY_TTL);
        assert!(settings.cache.url.is_none());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.apply_serve_overrides(&ServeOverrides {
            server_port: Some(5000),
            cache_entity_ttl_seconds: Some(60),
            cache_user_listing_ttl_seconds: Some(120),
            ..ServeOverrides::default()
        });

        let settings = Settings::from_raw(raw).expect("valid");
        assert_eq!(settings.server.addr.port(), 5000);
        assert_eq!(settings.cache.ttl.entity, Duration::from_secs(60));
        assert_eq!(settings.cache.ttl.user_listing, Duration::from_secs(120));
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(0);
        assert!(matches!(
            Settings::from_raw(raw),
            Err(LoadError::Invalid { key, .. }) if key == "server.port"
        ));
    }

    #[test]
    fn blank_cache_url_is_treated_as_unset() {
        let mut raw = RawSettings::default();
        raw.cache.url = Some("   ".to_string());
        let settings = Settings::from_raw(raw).expect("valid");
        assert!(settings.cache.url.is_none());
    }
}
