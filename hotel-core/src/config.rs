use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where notifications are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSink {
    Log,
    Outbox,
}

impl FromStr for NotificationSink {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "log" => Ok(NotificationSink::Log),
            "outbox" => Ok(NotificationSink::Outbox),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub secret_key: Option<String>,
    pub listen_addr: SocketAddr,
    pub tax_rate: BigDecimal,
    pub service_charge_rate: BigDecimal,
    pub notification_sink: NotificationSink,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: None,
            secret_key: None,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8100)),
            tax_rate: BigDecimal::new(16.into(), 2),
            service_charge_rate: BigDecimal::new(10.into(), 2),
            notification_sink: NotificationSink::Log,
        }
    }
}

impl AppConfig {
    /// Reads `.env` (when present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            database_url: lookup("DATABASE_URL"),
            secret_key: lookup("SECRET_KEY"),
            listen_addr: parse_or(&lookup, "LISTEN_ADDR", defaults.listen_addr)?,
            tax_rate: parse_rate(&lookup, "TAX_RATE", defaults.tax_rate)?,
            service_charge_rate: parse_rate(
                &lookup,
                "SERVICE_CHARGE_RATE",
                defaults.service_charge_rate,
            )?,
            notification_sink: parse_or(&lookup, "NOTIFICATION_SINK", defaults.notification_sink)?,
        };
        Ok(config)
    }

    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing("DATABASE_URL"))
    }

    pub fn require_secret_key(&self) -> Result<&str, ConfigError> {
        self.secret_key
            .as_deref()
            .ok_or(ConfigError::Missing("SECRET_KEY"))
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

fn parse_rate(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: BigDecimal,
) -> Result<BigDecimal, ConfigError> {
    let rate: BigDecimal = parse_or(lookup, name, default)?;
    if rate < BigDecimal::from(0) || rate > BigDecimal::from(1) {
        return Err(ConfigError::Invalid {
            name,
            value: rate.to_string(),
        });
    }
    Ok(rate)
}
