use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rankscope_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "RANKSCOPE_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "RANKSCOPE_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "RANKSCOPE_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "RANKSCOPE_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "RANKSCOPE_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        source("server.health_check_port", "RANKSCOPE_SERVER_HEALTH_CHECK_PORT"),
    ));

    lines.push(render_line(
        "providers.search_console.enabled",
        &config.providers.search_console.enabled.to_string(),
        source("providers.search_console.enabled", "RANKSCOPE_SEARCH_CONSOLE_ENABLED"),
    ));
    lines.push(render_line(
        "providers.search_console.client_id",
        config.providers.search_console.client_id.as_deref().unwrap_or("<unset>"),
        source("providers.search_console.client_id", "RANKSCOPE_SEARCH_CONSOLE_CLIENT_ID"),
    ));
    let client_secret = if config.providers.search_console.client_secret.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    };
    lines.push(render_line(
        "providers.search_console.client_secret",
        client_secret,
        source("providers.search_console.client_secret", "RANKSCOPE_SEARCH_CONSOLE_CLIENT_SECRET"),
    ));
    lines.push(render_line(
        "providers.ai_index.enabled",
        &config.providers.ai_index.enabled.to_string(),
        source("providers.ai_index.enabled", "RANKSCOPE_AI_INDEX_ENABLED"),
    ));
    let api_key = if config.providers.ai_index.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "providers.ai_index.api_key",
        api_key,
        source("providers.ai_index.api_key", "RANKSCOPE_AI_INDEX_API_KEY"),
    ));

    lines.push(render_line(
        "report.presence_floor",
        &config.report.presence_floor.to_string(),
        source("report.presence_floor", "RANKSCOPE_REPORT_PRESENCE_FLOOR"),
    ));
    lines.push(render_line(
        "report.presence_strong",
        &config.report.presence_strong.to_string(),
        source("report.presence_strong", "RANKSCOPE_REPORT_PRESENCE_STRONG"),
    ));
    lines.push(render_line(
        "report.demand_high",
        &config.report.demand_high.to_string(),
        source("report.demand_high", "RANKSCOPE_REPORT_DEMAND_HIGH"),
    ));
    lines.push(render_line(
        "report.top_limit",
        &config.report.top_limit.to_string(),
        source("report.top_limit", "RANKSCOPE_REPORT_TOP_LIMIT"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "RANKSCOPE_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "RANKSCOPE_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("rankscope.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/rankscope.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
