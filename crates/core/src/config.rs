use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::vcap::{BoundService, VcapApplication, VcapServices};

/// Name of the bound service carrying database credentials.
pub const DATABASE_SERVICE_NAME: &str = "chaos-galago-db";
/// Name of the bound service carrying platform credentials.
pub const PLATFORM_SERVICE_NAME: &str = "cf-service";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_parse<T: std::str::FromStr>(profile: &str, key: &str, default: T) -> T {
    profiled_env_parse_any(profile, &[key], default)
}

/// Like [`profiled_env_parse`], trying each key in order.
fn profiled_env_parse_any<T: std::str::FromStr>(profile: &str, keys: &[&str], default: T) -> T {
    keys.iter()
        .find_map(|key| profiled_env_opt(profile, key))
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub database: DatabaseConfig,
    pub platform: PlatformConfig,
    pub engine: EngineConfig,
    pub broker: BrokerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// When `profile` is set (e.g. `PROD`, usually from `HAVOC_PROFILE`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    ///
    /// Service bindings in `VCAP_SERVICES` win over plain env vars for the
    /// database and platform sections.
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let services = VcapServices::from_env().unwrap_or_default();
        Self {
            profile: p.to_string(),
            database: services
                .find(DATABASE_SERVICE_NAME)
                .map(DatabaseConfig::from_service)
                .unwrap_or_else(|| DatabaseConfig::from_env_profiled(p)),
            platform: services
                .find(PLATFORM_SERVICE_NAME)
                .map(PlatformConfig::from_service)
                .unwrap_or_else(|| PlatformConfig::from_env_profiled(p)),
            engine: EngineConfig::from_env_profiled(p),
            broker: BrokerConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  database:  host={}, port={}, db={}, configured={}",
            self.database.host, self.database.port, self.database.database,
            self.database.is_configured()
        );
        tracing::info!(
            "  platform:  api={}, login={}, user={}, skip_ssl_validation={}",
            self.platform.api_address(),
            self.platform.login_address(),
            self.platform.username.as_deref().unwrap_or("(none)"),
            self.platform.skip_ssl_validation
        );
        tracing::info!(
            "  engine:    tick={}s, unit_timeout={}s",
            self.engine.tick_interval_secs, self.engine.unit_timeout_secs
        );
        tracing::info!(
            "  broker:    {}:{}, defaults p={} f={}m",
            self.broker.host, self.broker.port,
            self.broker.default_probability, self.broker.default_frequency
        );
    }
}

// ── Database ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_parse(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "havoc"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_parse(p, "PG_MAX_CONNECTIONS", 5),
        }
    }

    /// Build from a bound database service. Accepts both `host`/`hostname`
    /// and `database`/`name` spellings.
    pub fn from_service(service: &BoundService) -> Self {
        Self {
            host: service
                .credential_any(&["host", "hostname"])
                .unwrap_or_else(|| "localhost".to_string()),
            port: service
                .credential("port")
                .and_then(|p| p.parse().ok())
                .unwrap_or(5432),
            database: service
                .credential_any(&["database", "name"])
                .unwrap_or_else(|| "havoc".to_string()),
            username: service.credential("username"),
            password: service.credential("password"),
            ssl_mode: service
                .credential("sslmode")
                .unwrap_or_else(|| "prefer".to_string()),
            max_connections: 5,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.username.is_some()
    }
}

// ── Platform (Cloud Foundry) ──────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// System domain; API and login endpoints are derived from it.
    pub domain: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub skip_ssl_validation: bool,
}

impl PlatformConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            domain: profiled_env_opt(p, "CF_DOMAIN"),
            username: profiled_env_opt(p, "CF_USERNAME"),
            password: profiled_env_opt(p, "CF_PASSWORD"),
            skip_ssl_validation: profiled_env_or(p, "CF_SKIP_SSL_VALIDATION", "false") == "true",
        }
    }

    pub fn from_service(service: &BoundService) -> Self {
        Self {
            domain: service.credential("domain"),
            username: service.credential("username"),
            password: service.credential("password"),
            skip_ssl_validation: service.credential_bool("skipsslvalidation"),
        }
    }

    pub fn api_address(&self) -> String {
        format!("https://api.{}", self.domain.as_deref().unwrap_or(""))
    }

    pub fn login_address(&self) -> String {
        format!("https://login.{}", self.domain.as_deref().unwrap_or(""))
    }

    pub fn is_configured(&self) -> bool {
        self.domain.is_some() && self.username.is_some()
    }
}

// ── Engine ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between scheduler ticks.
    pub tick_interval_secs: u64,
    /// Upper bound for a single platform call made on behalf of one app.
    pub unit_timeout_secs: u64,
}

impl EngineConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            tick_interval_secs: profiled_env_parse(p, "TICK_INTERVAL_SECS", 60),
            unit_timeout_secs: profiled_env_parse(p, "UNIT_TIMEOUT_SECS", 30),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_secs.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            unit_timeout_secs: 30,
        }
    }
}

// ── Broker ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    /// Probability assigned to newly provisioned instances.
    pub default_probability: f64,
    /// Frequency (minutes) assigned to newly provisioned instances.
    pub default_frequency: i32,
    /// Directory holding `catalog.json`; the built-in catalog is served when unset.
    pub catalog_path: Option<PathBuf>,
    /// Public host the dashboard links point at.
    pub public_uri: Option<String>,
}

impl BrokerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 8080),
            default_probability: profiled_env_parse_any(
                p,
                &["DEFAULT_PROBABILITY", "PROBABILITY"],
                0.2,
            ),
            default_frequency: profiled_env_parse_any(p, &["DEFAULT_FREQUENCY", "FREQUENCY"], 5),
            catalog_path: profiled_env_opt(p, "CATALOG_PATH").map(PathBuf::from),
            public_uri: profiled_env_opt(p, "BROKER_PUBLIC_URI")
                .or_else(|| VcapApplication::from_env().and_then(|app| app.public_uri())),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            default_probability: 0.2,
            default_frequency: 5,
            catalog_path: None,
            public_uri: None,
        }
    }
}
