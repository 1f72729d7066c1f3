use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::visibility::{QuadrantThresholds, ReportOptions, DEFAULT_TOP_OPPORTUNITIES};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

/// Upstream data-provider credentials. Token exchange and refresh happen in
/// a separate ingestion service; this service only needs the credentials
/// present so operators can verify the deployment is wired up.
#[derive(Clone, Debug)]
pub struct ProvidersConfig {
    pub search_console: SearchConsoleConfig,
    pub ai_index: AiIndexConfig,
}

#[derive(Clone, Debug)]
pub struct SearchConsoleConfig {
    pub enabled: bool,
    pub client_id: Option<String>,
    pub client_secret: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct AiIndexConfig {
    pub enabled: bool,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
}

/// Quadrant thresholds and ranking limit for region reports.
#[derive(Clone, Copy, Debug)]
pub struct ReportConfig {
    pub presence_floor: f64,
    pub presence_strong: f64,
    pub demand_high: f64,
    pub top_limit: usize,
}

impl ReportConfig {
    pub fn to_options(self) -> ReportOptions {
        ReportOptions {
            thresholds: QuadrantThresholds {
                presence_floor: self.presence_floor,
                presence_strong: self.presence_strong,
                demand_high: self.demand_high,
            },
            top_limit: self.top_limit,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub search_console_client_id: Option<String>,
    pub search_console_client_secret: Option<String>,
    pub ai_index_api_key: Option<String>,
    pub report_top_limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://rankscope.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                health_check_port: 8081,
                graceful_shutdown_secs: 15,
            },
            providers: ProvidersConfig {
                search_console: SearchConsoleConfig {
                    enabled: false,
                    client_id: None,
                    client_secret: None,
                },
                ai_index: AiIndexConfig { enabled: false, api_key: None, base_url: None },
            },
            report: ReportConfig {
                presence_floor: 5.0,
                presence_strong: 60.0,
                demand_high: 50.0,
                top_limit: DEFAULT_TOP_OPPORTUNITIES,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("rankscope.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(providers) = patch.providers {
            if let Some(search_console) = providers.search_console {
                if let Some(enabled) = search_console.enabled {
                    self.providers.search_console.enabled = enabled;
                }
                if let Some(client_id) = search_console.client_id {
                    self.providers.search_console.client_id = Some(client_id);
                }
                if let Some(client_secret_value) = search_console.client_secret {
                    self.providers.search_console.client_secret =
                        Some(secret_value(client_secret_value));
                }
            }
            if let Some(ai_index) = providers.ai_index {
                if let Some(enabled) = ai_index.enabled {
                    self.providers.ai_index.enabled = enabled;
                }
                if let Some(api_key_value) = ai_index.api_key {
                    self.providers.ai_index.api_key = Some(secret_value(api_key_value));
                }
                if let Some(base_url) = ai_index.base_url {
                    self.providers.ai_index.base_url = Some(base_url);
                }
            }
        }

        if let Some(report) = patch.report {
            if let Some(presence_floor) = report.presence_floor {
                self.report.presence_floor = presence_floor;
            }
            if let Some(presence_strong) = report.presence_strong {
                self.report.presence_strong = presence_strong;
            }
            if let Some(demand_high) = report.demand_high {
                self.report.demand_high = demand_high;
            }
            if let Some(top_limit) = report.top_limit {
                self.report.top_limit = top_limit;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RANKSCOPE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("RANKSCOPE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("RANKSCOPE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("RANKSCOPE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RANKSCOPE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RANKSCOPE_SERVER_PORT") {
            self.server.port = parse_u16("RANKSCOPE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("RANKSCOPE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("RANKSCOPE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("RANKSCOPE_SEARCH_CONSOLE_ENABLED") {
            self.providers.search_console.enabled =
                parse_bool("RANKSCOPE_SEARCH_CONSOLE_ENABLED", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_SEARCH_CONSOLE_CLIENT_ID") {
            self.providers.search_console.client_id = Some(value);
        }
        if let Some(value) = read_env("RANKSCOPE_SEARCH_CONSOLE_CLIENT_SECRET") {
            self.providers.search_console.client_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("RANKSCOPE_AI_INDEX_ENABLED") {
            self.providers.ai_index.enabled = parse_bool("RANKSCOPE_AI_INDEX_ENABLED", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_AI_INDEX_API_KEY") {
            self.providers.ai_index.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("RANKSCOPE_AI_INDEX_BASE_URL") {
            self.providers.ai_index.base_url = Some(value);
        }

        if let Some(value) = read_env("RANKSCOPE_REPORT_PRESENCE_FLOOR") {
            self.report.presence_floor = parse_f64("RANKSCOPE_REPORT_PRESENCE_FLOOR", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_REPORT_PRESENCE_STRONG") {
            self.report.presence_strong = parse_f64("RANKSCOPE_REPORT_PRESENCE_STRONG", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_REPORT_DEMAND_HIGH") {
            self.report.demand_high = parse_f64("RANKSCOPE_REPORT_DEMAND_HIGH", &value)?;
        }
        if let Some(value) = read_env("RANKSCOPE_REPORT_TOP_LIMIT") {
            self.report.top_limit = parse_u32("RANKSCOPE_REPORT_TOP_LIMIT", &value)? as usize;
        }

        let log_level =
            read_env("RANKSCOPE_LOGGING_LEVEL").or_else(|| read_env("RANKSCOPE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RANKSCOPE_LOGGING_FORMAT").or_else(|| read_env("RANKSCOPE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(client_id) = overrides.search_console_client_id {
            self.providers.search_console.client_id = Some(client_id);
        }
        if let Some(client_secret) = overrides.search_console_client_secret {
            self.providers.search_console.client_secret = Some(secret_value(client_secret));
        }
        if let Some(api_key) = overrides.ai_index_api_key {
            self.providers.ai_index.api_key = Some(secret_value(api_key));
        }
        if let Some(top_limit) = overrides.report_top_limit {
            self.report.top_limit = top_limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_providers(&self.providers)?;
        validate_report(&self.report)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("rankscope.toml"), PathBuf::from("config/rankscope.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_providers(providers: &ProvidersConfig) -> Result<(), ConfigError> {
    if providers.search_console.enabled {
        let missing_id = providers
            .search_console
            .client_id
            .as_ref()
            .map(|value| value.trim().is_empty())
            .unwrap_or(true);
        if missing_id {
            return Err(ConfigError::Validation(
                "providers.search_console.client_id is required when the provider is enabled"
                    .to_string(),
            ));
        }

        let missing_secret = providers
            .search_console
            .client_secret
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_secret {
            return Err(ConfigError::Validation(
                "providers.search_console.client_secret is required when the provider is enabled"
                    .to_string(),
            ));
        }
    }

    if providers.ai_index.enabled {
        let missing_key = providers
            .ai_index
            .api_key
            .as_ref()
            .map(|value| value.expose_secret().trim().is_empty())
            .unwrap_or(true);
        if missing_key {
            return Err(ConfigError::Validation(
                "providers.ai_index.api_key is required when the provider is enabled".to_string(),
            ));
        }
    }

    if let Some(base_url) = &providers.ai_index.base_url {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "providers.ai_index.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_report(report: &ReportConfig) -> Result<(), ConfigError> {
    let in_range = |value: f64| (0.0..=100.0).contains(&value);
    if !in_range(report.presence_floor)
        || !in_range(report.presence_strong)
        || !in_range(report.demand_high)
    {
        return Err(ConfigError::Validation(
            "report thresholds must be in range 0..=100".to_string(),
        ));
    }

    if report.presence_floor >= report.presence_strong {
        return Err(ConfigError::Validation(
            "report.presence_floor must be below report.presence_strong".to_string(),
        ));
    }

    if report.top_limit == 0 || report.top_limit > 50 {
        return Err(ConfigError::Validation(
            "report.top_limit must be in range 1..=50".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    providers: Option<ProvidersPatch>,
    report: Option<ReportPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersPatch {
    search_console: Option<SearchConsolePatch>,
    ai_index: Option<AiIndexPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchConsolePatch {
    enabled: Option<bool>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AiIndexPatch {
    enabled: Option<bool>,
    api_key: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReportPatch {
    presence_floor: Option<f64>,
    presence_strong: Option<f64>,
    demand_high: Option<f64>,
    top_limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
