use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::selection::{SquareMeters, DEFAULT_AREA_SQUARE_METERS, MAX_AREA_SQUARE_METERS};
use crate::errors::DomainError;

pub const DEFAULT_CONFIG_FILE: &str = "unikron.toml";
pub const DEFAULT_CATALOG_PATH: &str = "config/inventory.json";
pub const DEFAULT_RENDER_ENDPOINT: &str = "https://api.nanobanana.ai/v1/image-to-image";
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.0-flash-thinking-exp";
pub const DEFAULT_PAYMENT_API_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub render: RenderConfig,
    pub llm: LlmConfig,
    pub payment: PaymentConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub area_square_meters: Decimal,
}

impl CatalogConfig {
    pub fn default_area(&self) -> Result<SquareMeters, DomainError> {
        SquareMeters::new(self.area_square_meters)
    }
}

#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub api_key: Option<SecretString>,
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub secret_key: Option<SecretString>,
    pub api_base_url: String,
    pub public_base_url: String,
    pub currency: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
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

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub area_square_meters: Option<Decimal>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub llm_model: Option<String>,
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

/// Environment keys read by [`AppConfig::load`], primary name first, then legacy aliases.
pub const ENV_KEYS: &[(&str, &[&str])] = &[
    ("catalog.path", &["UNIKRON_CATALOG_PATH"]),
    ("catalog.area_square_meters", &["UNIKRON_CATALOG_AREA_SQUARE_METERS"]),
    ("render.api_key", &["UNIKRON_RENDER_API_KEY", "NANO_BANANA_API_KEY"]),
    ("render.endpoint", &["UNIKRON_RENDER_ENDPOINT"]),
    ("render.timeout_secs", &["UNIKRON_RENDER_TIMEOUT_SECS"]),
    ("llm.api_key", &["UNIKRON_LLM_API_KEY", "GEMINI_API_KEY"]),
    ("llm.base_url", &["UNIKRON_LLM_BASE_URL"]),
    ("llm.model", &["UNIKRON_LLM_MODEL"]),
    ("llm.timeout_secs", &["UNIKRON_LLM_TIMEOUT_SECS"]),
    ("payment.secret_key", &["UNIKRON_PAYMENT_SECRET_KEY", "STRIPE_SECRET_KEY"]),
    ("payment.api_base_url", &["UNIKRON_PAYMENT_API_BASE_URL"]),
    ("payment.public_base_url", &["UNIKRON_PAYMENT_PUBLIC_BASE_URL", "NEXT_PUBLIC_BASE_URL"]),
    ("payment.currency", &["UNIKRON_PAYMENT_CURRENCY"]),
    ("payment.timeout_secs", &["UNIKRON_PAYMENT_TIMEOUT_SECS"]),
    ("server.bind_address", &["UNIKRON_SERVER_BIND_ADDRESS"]),
    ("server.port", &["UNIKRON_SERVER_PORT"]),
    ("server.graceful_shutdown_secs", &["UNIKRON_SERVER_GRACEFUL_SHUTDOWN_SECS"]),
    ("logging.level", &["UNIKRON_LOGGING_LEVEL", "UNIKRON_LOG_LEVEL"]),
    ("logging.format", &["UNIKRON_LOGGING_FORMAT", "UNIKRON_LOG_FORMAT"]),
];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                path: PathBuf::from(DEFAULT_CATALOG_PATH),
                area_square_meters: Decimal::from(DEFAULT_AREA_SQUARE_METERS),
            },
            render: RenderConfig {
                api_key: None,
                endpoint: DEFAULT_RENDER_ENDPOINT.to_string(),
                timeout_secs: 60,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                model: DEFAULT_LLM_MODEL.to_string(),
                timeout_secs: 30,
            },
            payment: PaymentConfig {
                secret_key: None,
                api_base_url: DEFAULT_PAYMENT_API_BASE_URL.to_string(),
                public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
                currency: "usd".to_string(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

// Blank keys count as "not configured" rather than as an empty credential.
fn optional_secret(value: String) -> Option<SecretString> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.into())
    }
}

impl FromStr for LogFormat {
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
            if let Some(area_square_meters) = catalog.area_square_meters {
                self.catalog.area_square_meters = area_square_meters;
            }
        }

        if let Some(render) = patch.render {
            if let Some(render_api_key_value) = render.api_key {
                self.render.api_key = optional_secret(render_api_key_value);
            }
            if let Some(endpoint) = render.endpoint {
                self.render.endpoint = endpoint;
            }
            if let Some(timeout_secs) = render.timeout_secs {
                self.render.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = optional_secret(llm_api_key_value);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(payment) = patch.payment {
            if let Some(payment_secret_key_value) = payment.secret_key {
                self.payment.secret_key = optional_secret(payment_secret_key_value);
            }
            if let Some(api_base_url) = payment.api_base_url {
                self.payment.api_base_url = api_base_url;
            }
            if let Some(public_base_url) = payment.public_base_url {
                self.payment.public_base_url = public_base_url;
            }
            if let Some(currency) = payment.currency {
                self.payment.currency = currency;
            }
            if let Some(timeout_secs) = payment.timeout_secs {
                self.payment.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
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
        if let Some(value) = read_env("UNIKRON_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("UNIKRON_CATALOG_AREA_SQUARE_METERS") {
            self.catalog.area_square_meters =
                parse_decimal("UNIKRON_CATALOG_AREA_SQUARE_METERS", &value)?;
        }

        if let Some(value) = read_env_aliased("UNIKRON_RENDER_API_KEY", "NANO_BANANA_API_KEY") {
            self.render.api_key = optional_secret(value);
        }
        if let Some(value) = read_env("UNIKRON_RENDER_ENDPOINT") {
            self.render.endpoint = value;
        }
        if let Some(value) = read_env("UNIKRON_RENDER_TIMEOUT_SECS") {
            self.render.timeout_secs = parse_u64("UNIKRON_RENDER_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_aliased("UNIKRON_LLM_API_KEY", "GEMINI_API_KEY") {
            self.llm.api_key = optional_secret(value);
        }
        if let Some(value) = read_env("UNIKRON_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("UNIKRON_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("UNIKRON_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("UNIKRON_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env_aliased("UNIKRON_PAYMENT_SECRET_KEY", "STRIPE_SECRET_KEY") {
            self.payment.secret_key = optional_secret(value);
        }
        if let Some(value) = read_env("UNIKRON_PAYMENT_API_BASE_URL") {
            self.payment.api_base_url = value;
        }
        if let Some(value) =
            read_env_aliased("UNIKRON_PAYMENT_PUBLIC_BASE_URL", "NEXT_PUBLIC_BASE_URL")
        {
            self.payment.public_base_url = value;
        }
        if let Some(value) = read_env("UNIKRON_PAYMENT_CURRENCY") {
            self.payment.currency = value;
        }
        if let Some(value) = read_env("UNIKRON_PAYMENT_TIMEOUT_SECS") {
            self.payment.timeout_secs = parse_u64("UNIKRON_PAYMENT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("UNIKRON_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("UNIKRON_SERVER_PORT") {
            self.server.port = parse_u16("UNIKRON_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("UNIKRON_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("UNIKRON_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env_aliased("UNIKRON_LOGGING_LEVEL", "UNIKRON_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env_aliased("UNIKRON_LOGGING_FORMAT", "UNIKRON_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(area_square_meters) = overrides.area_square_meters {
            self.catalog.area_square_meters = area_square_meters;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_render(&self.render)?;
        validate_llm(&self.llm)?;
        validate_payment(&self.payment)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
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

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
    }

    let area = catalog.area_square_meters;
    if area < Decimal::ZERO || area > Decimal::from(MAX_AREA_SQUARE_METERS) {
        return Err(ConfigError::Validation(format!(
            "catalog.area_square_meters must be in range 0..={MAX_AREA_SQUARE_METERS} (got {area})"
        )));
    }

    Ok(())
}

fn validate_render(render: &RenderConfig) -> Result<(), ConfigError> {
    validate_http_url("render.endpoint", &render.endpoint)?;
    validate_timeout("render.timeout_secs", render.timeout_secs)
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_http_url("llm.base_url", &llm.base_url)?;
    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    validate_timeout("llm.timeout_secs", llm.timeout_secs)
}

fn validate_payment(payment: &PaymentConfig) -> Result<(), ConfigError> {
    validate_http_url("payment.api_base_url", &payment.api_base_url)?;
    validate_http_url("payment.public_base_url", &payment.public_base_url)?;

    let currency = payment.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ConfigError::Validation(
            "payment.currency must be a three-letter ISO currency code (e.g. `usd`)".to_string(),
        ));
    }

    // Stripe secret keys are `sk_live_...`/`sk_test_...`; restricted keys are `rk_...`.
    if let Some(secret_key) = &payment.secret_key {
        let key = secret_key.expose_secret();
        if !key.starts_with("sk_") && !key.starts_with("rk_") {
            let hint = if key.starts_with("pk_") {
                " (hint: you may have used the publishable key instead of the secret key)"
            } else {
                ""
            };
            return Err(ConfigError::Validation(format!(
                "payment.secret_key must start with `sk_` or `rk_`{hint}"
            )));
        }
    }

    validate_timeout("payment.timeout_secs", payment.timeout_secs)
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
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

fn validate_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_timeout(key: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!("{key} must be in range 1..=300")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_env_aliased(key: &str, alias: &str) -> Option<String> {
    read_env(key).or_else(|| read_env(alias))
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
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

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value.trim()).map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    render: Option<RenderPatch>,
    llm: Option<LlmPatch>,
    payment: Option<PaymentPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    area_square_meters: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct RenderPatch {
    api_key: Option<String>,
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentPatch {
    secret_key: Option<String>,
    api_base_url: Option<String>,
    public_base_url: Option<String>,
    currency: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
