use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub booking: BookingConfig,
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

        let booking = BookingConfig::from_env(environment)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            booking,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Booking workflow settings.
#[derive(Debug, Clone, Default)]
pub struct BookingConfig {
    /// Operator addresses notified when a slot is booked.
    pub operator_emails: Vec<String>,
    /// Same-email ownership bypass for end-to-end testing. Never honored in production.
    pub allow_applicant_self_booking: bool,
    pub seed_path: Option<PathBuf>,
}

impl BookingConfig {
    fn from_env(environment: AppEnvironment) -> Result<Self, ConfigError> {
        let operator_emails = env::var("BOOKING_OPERATOR_EMAILS")
            .map(|raw| parse_email_list(&raw))
            .unwrap_or_default();

        let allow_applicant_self_booking = match env::var("BOOKING_ALLOW_APPLICANT_SELF_BOOKING") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "BOOKING_ALLOW_APPLICANT_SELF_BOOKING",
                value: raw,
            })?,
            Err(_) => false,
        };
        if allow_applicant_self_booking && environment == AppEnvironment::Production {
            return Err(ConfigError::SelfBookingInProduction);
        }

        let seed_path = env::var("BOOKING_SEED_FILE")
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            operator_emails,
            allow_applicant_self_booking,
            seed_path,
        })
    }
}

fn parse_email_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    SelfBookingInProduction,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false (found '{value}')")
            }
            ConfigError::SelfBookingInProduction => write!(
                f,
                "BOOKING_ALLOW_APPLICANT_SELF_BOOKING cannot be enabled when APP_ENV=production"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::SelfBookingInProduction => None,
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("BOOKING_OPERATOR_EMAILS");
        env::remove_var("BOOKING_ALLOW_APPLICANT_SELF_BOOKING");
        env::remove_var("BOOKING_SEED_FILE");
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
        assert!(config.booking.operator_emails.is_empty());
        assert!(!config.booking.allow_applicant_self_booking);
        assert!(config.booking.seed_path.is_none());
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
    fn operator_emails_drop_blank_entries() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var(
            "BOOKING_OPERATOR_EMAILS",
            " ops@example.com, ,talent@example.com,",
        );
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.booking.operator_emails,
            vec!["ops@example.com".to_string(), "talent@example.com".to_string()]
        );
    }

    #[test]
    fn self_booking_is_rejected_in_production() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BOOKING_ALLOW_APPLICANT_SELF_BOOKING", "true");
        let config = AppConfig::load().expect("development allows the bypass");
        assert!(config.booking.allow_applicant_self_booking);

        env::set_var("APP_ENV", "production");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::SelfBookingInProduction)
        ));

        env::set_var("APP_ENV", "test");
        env::set_var("BOOKING_ALLOW_APPLICANT_SELF_BOOKING", "maybe");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidFlag { .. })
        ));
        reset_env();
    }
}
