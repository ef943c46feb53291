use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::cards::verification::FraudPolicy;
use crate::tokens::MAX_BATCH_SIZE;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub registry: RegistryConfig,
    pub distribution: DistributionConfig,
    pub seed_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let fraud_policy = match env::var("RATION_FRAUD_POLICY") {
            Ok(raw) => FraudPolicy::parse(&raw).ok_or(ConfigError::InvalidFraudPolicy(raw))?,
            Err(_) => FraudPolicy::default(),
        };
        let verification_timeout =
            millis_from_env("RATION_VERIFICATION_TIMEOUT_MS", DEFAULT_VERIFICATION_TIMEOUT_MS)?;

        let card_numbers = match env::var("RATION_CARD_NUMBER_SCHEME") {
            Ok(raw) => {
                CardNumberScheme::parse(&raw).ok_or(ConfigError::InvalidNumberScheme(raw))?
            }
            Err(_) => CardNumberScheme::Random,
        };
        let card_number_prefix =
            env::var("RATION_CARD_NUMBER_PREFIX").unwrap_or_else(|_| "RC".to_string());

        let parallelism = env::var("RATION_DISTRIBUTION_PARALLELISM")
            .unwrap_or_else(|_| DEFAULT_PARALLELISM.to_string())
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidNumber("RATION_DISTRIBUTION_PARALLELISM"))?;
        let send_timeout = millis_from_env("RATION_SEND_TIMEOUT_MS", DEFAULT_SEND_TIMEOUT_MS)?;

        let seed_path = env::var("RATION_SEED_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            registry: RegistryConfig {
                fraud_policy,
                verification_timeout,
                card_numbers,
                card_number_prefix,
            },
            distribution: DistributionConfig::new(parallelism, send_timeout),
            seed_path,
        })
    }
}

const DEFAULT_VERIFICATION_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SEND_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_PARALLELISM: usize = 10;

fn millis_from_env(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let millis = match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber(key))?,
        Err(_) => default,
    };
    Ok(Duration::from_millis(millis))
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Card number format issued on approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardNumberScheme {
    /// Prefix followed by eight random uppercase hex characters.
    Random,
    /// Prefix followed by a zero-padded counter.
    Sequential,
}

impl CardNumberScheme {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" => Some(Self::Random),
            "sequential" | "counter" => Some(Self::Sequential),
            _ => None,
        }
    }
}

/// Intake and adjudication settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub fraud_policy: FraudPolicy,
    pub verification_timeout: Duration,
    pub card_numbers: CardNumberScheme,
    pub card_number_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            fraud_policy: FraudPolicy::default(),
            verification_timeout: Duration::from_millis(DEFAULT_VERIFICATION_TIMEOUT_MS),
            card_numbers: CardNumberScheme::Random,
            card_number_prefix: "RC".to_string(),
        }
    }
}

/// Bulk token dispatch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DistributionConfig {
    pub parallelism: usize,
    pub send_timeout: Duration,
}

impl DistributionConfig {
    /// Parallelism is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn new(parallelism: usize, send_timeout: Duration) -> Self {
        Self {
            parallelism: parallelism.clamp(1, MAX_BATCH_SIZE),
            send_timeout,
        }
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_PARALLELISM,
            Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS),
        )
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFraudPolicy(String),
    InvalidNumberScheme(String),
    InvalidNumber(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFraudPolicy(value) => write!(
                f,
                "RATION_FRAUD_POLICY must be 'auto' or 'advisory' (found '{value}')"
            ),
            ConfigError::InvalidNumberScheme(value) => write!(
                f,
                "RATION_CARD_NUMBER_SCHEME must be 'random' or 'sequential' (found '{value}')"
            ),
            ConfigError::InvalidNumber(key) => write!(f, "{key} must be a non-negative integer"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFraudPolicy(_)
            | ConfigError::InvalidNumberScheme(_)
            | ConfigError::InvalidNumber(_) => None,
        }
    }
}
