//! [`Config`] of the server.

use common::money::Currency;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use smart_default::SmartDefault;

/// Environment variables prefix overriding [`Config`] values, like
/// `CONF.SERVER.PORT=8081`.
const ENV_PREFIX: &str = "CONF";

/// Server configuration, one field per section.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `[server]` section.
    pub server: Server,

    /// `[service]` section.
    pub service: Service,

    /// `[postgres]` section.
    pub postgres: Postgres,

    /// `[log]` section.
    pub log: Log,
}

impl Config {
    /// Loads the [`Config`] from the file at `path`, overridden by the
    /// [`ENV_PREFIX`]ed environment variables.
    ///
    /// The file may be missing. Every omitted value falls back to its
    /// default.
    ///
    /// # Errors
    ///
    /// If the file is malformed, or some value has a wrong type.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("."),
            )
            .build()?
            .try_deserialize()
    }
}

/// `[server]` section of the [`Config`].
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Address to listen on.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to listen on.
    #[default(8080)]
    pub port: u16,

    /// [CORS] settings of the REST API.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] settings.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// Origins the browsers may call the API from.
    ///
    /// `*` allows any origin.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// `[service]` section of the [`Config`].
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [`Currency`] of the prices and amounts accepted by the API.
    #[default(Currency::Thb)]
    pub currency: Currency,
}

impl From<Service> for service::Config {
    fn from(Service { currency }: Service) -> Self {
        Self { currency }
    }
}

/// `[postgres]` section of the [`Config`].
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host of the database server.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port of the database server.
    #[default(5432)]
    pub port: u16,

    /// Role to log in as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password of the `user`.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database holding the dealership tables.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(pg: Postgres) -> Self {
        Self {
            host: Some(pg.host),
            port: Some(pg.port),
            user: Some(pg.user),
            password: Some(pg.password),
            dbname: Some(pg.dbname),
            ..Self::default()
        }
    }
}

/// `[log]` section of the [`Config`].
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Most verbose level being printed.
    pub level: LogLevel,
}

/// Verbosity of the logs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Everything, including per-statement details.
    Trace,

    /// Details useful while debugging.
    Debug,

    /// Served requests and lifecycle events.
    #[default]
    Info,

    /// Rejected requests and recoverable failures.
    Warn,

    /// Failures only.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::money::Currency;

    use super::{Config, LogLevel};

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let conf = Config::new("surely/missing/config").unwrap();

        assert_eq!(conf.server.host, "0.0.0.0");
        assert_eq!(conf.server.port, 8080);
        assert_eq!(conf.server.cors.origins, ["*"]);
        assert_eq!(conf.service.currency, Currency::Thb);
        assert_eq!(conf.postgres.port, 5432);
        assert_eq!(conf.log.level, LogLevel::Info);
    }

    #[test]
    fn converts_service_section() {
        let conf = super::Service {
            currency: Currency::Usd,
        };

        let service: service::Config = conf.into();

        assert_eq!(service.currency, Currency::Usd);
    }
}
