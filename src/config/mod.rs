//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "talentdesk";
const ENV_PREFIX: &str = "TALENTDESK";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_REDIS_POOL_SIZE: u64 = 16;
const DEFAULT_REDIS_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_TX_TIMEOUT_SECS: u64 = 20;
const DEFAULT_TX_UPLOAD_TIMEOUT_SECS: u64 = 35;
const DEFAULT_TX_BULK_TIMEOUT_SECS: u64 = 100;
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_IMAGE_HOST_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments for the talentdesk binary.
#[derive(Debug, Parser)]
#[command(
    name = "talentdesk",
    version,
    about = "Onboarding and account-management backend"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "TALENTDESK_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP API.
    Serve(Box<ServeArgs>),
    /// Apply pending database migrations and exit.
    Migrate(MigrateArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DatabaseOverride {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub database: DatabaseOverride,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

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

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the snapshot cache backend (memory|redis).
    #[arg(long = "cache-backend", value_name = "BACKEND")]
    pub cache_backend: Option<String>,

    /// Override the Redis URL used by the redis cache backend.
    #[arg(long = "cache-redis-url", value_name = "URL")]
    pub cache_redis_url: Option<String>,
}

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub transactions: TransactionSettings,
    pub listing: ListingSettings,
    pub image_host: ImageHostSettings,
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
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    /// Upper bound for acquiring a pooled connection; doubles as the
    /// transaction max-wait.
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Memory,
    Redis,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(format!("unknown cache backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub redis_url: Option<String>,
    pub redis_pool_size: NonZeroUsize,
    pub redis_timeout: Duration,
}

/// Wall-clock budgets for serializable transactions.
#[derive(Debug, Clone, Copy)]
pub struct TransactionSettings {
    pub default_timeout: Duration,
    pub upload_timeout: Duration,
    pub bulk_timeout: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct ListingSettings {
    pub default_page_size: NonZeroU32,
    pub max_page_size: NonZeroU32,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            default_page_size: NonZeroU32::new(DEFAULT_PAGE_SIZE as u32)
                .unwrap_or(NonZeroU32::MIN),
            max_page_size: NonZeroU32::new(DEFAULT_MAX_PAGE_SIZE as u32)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageHostSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
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

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Migrate(args)) => raw.apply_database_override(&args.database),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    transactions: RawTransactionSettings,
    listing: RawListingSettings,
    image_host: RawImageHostSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(backend) = overrides.cache_backend.as_ref() {
            self.cache.backend = Some(backend.clone());
        }
        if let Some(url) = overrides.cache_redis_url.as_ref() {
            self.cache.redis_url = Some(url.clone());
        }
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            cache,
            transactions,
            listing,
            image_host,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            transactions: build_transaction_settings(transactions)?,
            listing: build_listing_settings(listing)?,
            image_host: build_image_host_settings(image_host)?,
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

    let graceful_shutdown = positive_secs(
        server.graceful_shutdown_seconds,
        DEFAULT_GRACEFUL_SHUTDOWN_SECS,
        "server.graceful_shutdown_seconds",
    )?;

    Ok(ServerSettings {
        addr,
        graceful_shutdown,
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

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    let acquire_timeout = positive_secs(
        database.acquire_timeout_seconds,
        DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
        "database.acquire_timeout_seconds",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
        acquire_timeout,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let backend = match cache.backend {
        Some(value) => CacheBackendKind::from_str(&value)
            .map_err(|reason| LoadError::invalid("cache.backend", reason))?,
        None => CacheBackendKind::Memory,
    };

    let redis_url = non_blank(cache.redis_url);
    if backend == CacheBackendKind::Redis && redis_url.is_none() {
        return Err(LoadError::invalid(
            "cache.redis_url",
            "required when cache.backend is `redis`",
        ));
    }

    let pool_size = cache.redis_pool_size.unwrap_or(DEFAULT_REDIS_POOL_SIZE);
    let redis_pool_size = usize::try_from(pool_size)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| LoadError::invalid("cache.redis_pool_size", "must be greater than zero"))?;

    let timeout_ms = cache.redis_timeout_ms.unwrap_or(DEFAULT_REDIS_TIMEOUT_MS);
    if timeout_ms == 0 {
        return Err(LoadError::invalid(
            "cache.redis_timeout_ms",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        backend,
        redis_url,
        redis_pool_size,
        redis_timeout: Duration::from_millis(timeout_ms),
    })
}

fn build_transaction_settings(
    transactions: RawTransactionSettings,
) -> Result<TransactionSettings, LoadError> {
    let default_timeout = positive_secs(
        transactions.default_timeout_seconds,
        DEFAULT_TX_TIMEOUT_SECS,
        "transactions.default_timeout_seconds",
    )?;
    let upload_timeout = positive_secs(
        transactions.upload_timeout_seconds,
        DEFAULT_TX_UPLOAD_TIMEOUT_SECS,
        "transactions.upload_timeout_seconds",
    )?;
    let bulk_timeout = positive_secs(
        transactions.bulk_timeout_seconds,
        DEFAULT_TX_BULK_TIMEOUT_SECS,
        "transactions.bulk_timeout_seconds",
    )?;

    Ok(TransactionSettings {
        default_timeout,
        upload_timeout,
        bulk_timeout,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let default_page_size = non_zero_u32(
        listing.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        "listing.default_page_size",
    )?;
    let max_page_size = non_zero_u32(
        listing.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE),
        "listing.max_page_size",
    )?;

    if default_page_size > max_page_size {
        return Err(LoadError::invalid(
            "listing.default_page_size",
            "must not exceed listing.max_page_size",
        ));
    }

    Ok(ListingSettings {
        default_page_size,
        max_page_size,
    })
}

fn build_image_host_settings(
    image_host: RawImageHostSettings,
) -> Result<ImageHostSettings, LoadError> {
    let timeout = positive_secs(
        image_host.timeout_seconds,
        DEFAULT_IMAGE_HOST_TIMEOUT_SECS,
        "image_host.timeout_seconds",
    )?;

    Ok(ImageHostSettings {
        endpoint: non_blank(image_host.endpoint),
        api_key: non_blank(image_host.api_key),
        timeout,
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
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    backend: Option<String>,
    redis_url: Option<String>,
    redis_pool_size: Option<u64>,
    redis_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTransactionSettings {
    default_timeout_seconds: Option<u64>,
    upload_timeout_seconds: Option<u64>,
    bulk_timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    default_page_size: Option<u64>,
    max_page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawImageHostSettings {
    endpoint: Option<String>,
    api_key: Option<String>,
    timeout_seconds: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn positive_secs(
    value: Option<u64>,
    default: u64,
    key: &'static str,
) -> Result<Duration, LoadError> {
    let seconds = value.unwrap_or(default);
    if seconds == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(seconds))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
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
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.database.max_connections.get(), 8);
        assert_eq!(settings.database.acquire_timeout, Duration::from_secs(5));
        assert_eq!(settings.cache.backend, CacheBackendKind::Memory);
        assert_eq!(settings.transactions.default_timeout, Duration::from_secs(20));
        assert_eq!(settings.transactions.upload_timeout, Duration::from_secs(35));
        assert_eq!(settings.transactions.bulk_timeout, Duration::from_secs(100));
        assert_eq!(settings.listing.default_page_size.get(), 10);
        assert_eq!(settings.listing.max_page_size.get(), 100);
        assert!(settings.image_host.endpoint.is_none());
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn redis_backend_requires_url() {
        let mut raw = RawSettings::default();
        raw.cache.backend = Some("redis".to_string());

        let err = Settings::from_raw(raw).expect_err("missing redis url");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.redis_url",
                ..
            }
        ));
    }

    #[test]
    fn unknown_cache_backend_is_rejected() {
        let mut raw = RawSettings::default();
        raw.cache.backend = Some("memcached".to_string());

        let err = Settings::from_raw(raw).expect_err("unknown backend");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "cache.backend",
                ..
            }
        ));
    }

    #[test]
    fn zero_transaction_budget_is_rejected() {
        let mut raw = RawSettings::default();
        raw.transactions.upload_timeout_seconds = Some(0);

        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn default_page_size_cannot_exceed_maximum() {
        let mut raw = RawSettings::default();
        raw.listing.default_page_size = Some(50);
        raw.listing.max_page_size = Some(20);

        let err = Settings::from_raw(raw).expect_err("inverted page sizes");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "listing.default_page_size",
                ..
            }
        ));
    }

    #[test]
    fn blank_database_url_is_treated_as_missing() {
        let mut raw = RawSettings::default();
        raw.database.url = Some("   ".to_string());

        let settings = Settings::from_raw(raw).expect("valid settings");
        assert!(settings.database.url.is_none());
    }

    #[test]
    fn default_to_serve_command() {
        let args = CliArgs::parse_from(["talentdesk"]);
        let command = args
            .command
            .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
        assert!(matches!(command, Command::Serve(_)));
    }

    #[test]
    fn parse_migrate_arguments() {
        let args = CliArgs::parse_from([
            "talentdesk",
            "migrate",
            "--database-url",
            "postgres://example",
        ]);

        match args.command.expect("migrate command") {
            Command::Migrate(migrate) => {
                assert_eq!(
                    migrate.database.database_url.as_deref(),
                    Some("postgres://example")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }

    #[test]
    fn parse_serve_overrides() {
        let args = CliArgs::parse_from([
            "talentdesk",
            "serve",
            "--server-host",
            "0.0.0.0",
            "--cache-backend",
            "redis",
            "--cache-redis-url",
            "redis://cache:6379",
        ]);

        match args.command.expect("serve command") {
            Command::Serve(serve) => {
                assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
                assert_eq!(serve.overrides.cache_backend.as_deref(), Some("redis"));
                assert_eq!(
                    serve.overrides.cache_redis_url.as_deref(),
                    Some("redis://cache:6379")
                );
            }
            _ => panic!("wrong command parsed"),
        }
    }
}
