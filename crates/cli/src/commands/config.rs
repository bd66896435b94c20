use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use toml::Value;
use unikron_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, ENV_KEYS};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let values = [
        ("catalog.path", config.catalog.path.display().to_string()),
        ("catalog.area_square_meters", config.catalog.area_square_meters.normalize().to_string()),
        ("render.api_key", redact_secret(config.render.api_key.as_ref())),
        ("render.endpoint", config.render.endpoint.clone()),
        ("render.timeout_secs", config.render.timeout_secs.to_string()),
        ("llm.api_key", redact_secret(config.llm.api_key.as_ref())),
        ("llm.base_url", config.llm.base_url.clone()),
        ("llm.model", config.llm.model.clone()),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string()),
        ("payment.secret_key", redact_secret(config.payment.secret_key.as_ref())),
        ("payment.api_base_url", config.payment.api_base_url.clone()),
        ("payment.public_base_url", config.payment.public_base_url.clone()),
        ("payment.currency", config.payment.currency.clone()),
        ("payment.timeout_secs", config.payment.timeout_secs.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", config.logging.format.as_str().to_string()),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, value) in values {
        let source = field_source(key_path, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let env_keys = ENV_KEYS
        .iter()
        .find(|(path, _)| *path == key_path)
        .map(|(_, keys)| *keys)
        .unwrap_or_default();
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
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

/// Keeps the key family visible (`sk_test_***`) and nothing else.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let mut parts = trimmed.splitn(3, '_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(family), Some(mode), Some(_)) if family.len() == 2 => format!("{family}_{mode}_***"),
        _ => "<redacted>".to_string(),
    }
}
