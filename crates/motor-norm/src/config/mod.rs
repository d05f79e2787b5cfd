use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const DEFAULT_SENDER_ID: &str = "MOTOR-NORM";
const DEFAULT_DEEPLINK_BASE: &str = "https://portal.motor-norm.local/access";

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
    pub norm: NormConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            norm: NormConfig::from_env()?,
        })
    }
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

/// Interchange settings: who we are on the wire and how long things live.
#[derive(Debug, Clone)]
pub struct NormConfig {
    pub sender_id: String,
    pub outbound_timeout: Duration,
    pub quote_validity_days: u32,
    pub deeplink_base_url: Url,
    /// Replaces the embedded severity table when set.
    pub severity_table: Option<PathBuf>,
}

impl NormConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sender_id = env::var("NORM_SENDER_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_SENDER_ID.to_string());

        let timeout_secs = bounded("NORM_OUTBOUND_TIMEOUT_SECS", 30, 1, 120)?;
        let quote_validity_days = bounded("NORM_QUOTE_VALIDITY_DAYS", 30, 1, 365)?;

        let base = env::var("NORM_DEEPLINK_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_DEEPLINK_BASE.to_string());
        let deeplink_base_url = Url::parse(&base).map_err(|source| ConfigError::InvalidUrl {
            variable: "NORM_DEEPLINK_BASE_URL",
            source,
        })?;

        let severity_table = env::var("NORM_SEVERITY_TABLE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            sender_id,
            outbound_timeout: Duration::from_secs(u64::from(timeout_secs)),
            quote_validity_days,
            deeplink_base_url,
            severity_table,
        })
    }
}

fn bounded(variable: &'static str, default: u32, min: u32, max: u32) -> Result<u32, ConfigError> {
    let Ok(raw) = env::var(variable) else {
        return Ok(default);
    };
    match raw.trim().parse::<u32>() {
        Ok(value) if (min..=max).contains(&value) => Ok(value),
        _ => Err(ConfigError::OutOfRange { variable, min, max }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    OutOfRange {
        variable: &'static str,
        min: u32,
        max: u32,
    },
    InvalidUrl {
        variable: &'static str,
        source: url::ParseError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::OutOfRange { variable, min, max } => {
                write!(f, "{variable} must be a whole number between {min} and {max}")
            }
            ConfigError::InvalidUrl { variable, .. } => {
                write!(f, "{variable} must be an absolute URL")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::OutOfRange { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidUrl { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for variable in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "NORM_SENDER_ID",
            "NORM_OUTBOUND_TIMEOUT_SECS",
            "NORM_QUOTE_VALIDITY_DAYS",
            "NORM_DEEPLINK_BASE_URL",
            "NORM_SEVERITY_TABLE",
        ] {
            env::remove_var(variable);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.norm.sender_id, "MOTOR-NORM");
        assert_eq!(config.norm.outbound_timeout, Duration::from_secs(30));
        assert_eq!(config.norm.quote_validity_days, 30);
        assert_eq!(
            config.norm.deeplink_base_url.as_str(),
            "https://portal.motor-norm.local/access"
        );
        assert!(config.norm.severity_table.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_timeout_outside_bounds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("NORM_OUTBOUND_TIMEOUT_SECS", "600");
        let err = AppConfig::load().expect_err("timeout too large");
        assert!(err.to_string().contains("NORM_OUTBOUND_TIMEOUT_SECS"));
        reset_env();
    }

    #[test]
    fn reads_norm_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("NORM_SENDER_ID", "VU-4711");
        env::set_var("NORM_QUOTE_VALIDITY_DAYS", "14");
        env::set_var("NORM_SEVERITY_TABLE", "/etc/motor-norm/severity.csv");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.norm.sender_id, "VU-4711");
        assert_eq!(config.norm.quote_validity_days, 14);
        assert_eq!(
            config.norm.severity_table,
            Some(PathBuf::from("/etc/motor-norm/severity.csv"))
        );
        reset_env();
    }

    #[test]
    fn rejects_relative_deeplink_base() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("NORM_DEEPLINK_BASE_URL", "portal/access");
        let err = AppConfig::load().expect_err("relative url rejected");
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
        reset_env();
    }
}
