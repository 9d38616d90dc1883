use std::path::{Path, PathBuf};

use clap::Args;
use serde::Deserialize;

use worker::config::ServerList;
use worker::{KafkaConfig, KafkaSettings, WorkerConfig, WorkerSettings};

use super::error::AppError;
use super::logging::{LoggingConfig, LoggingSettings};

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub kafka: KafkaSettings,
    pub worker: WorkerSettings,
    pub logging: LoggingSettings,
}

/// `config.toml` → `config.{env}.toml` рядом с ним.
pub fn overlay_path(base: &Path, environment: &str) -> PathBuf {
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("config");
    base.with_file_name(format!("{stem}.{environment}.toml"))
}

fn read_table(path: &Path) -> Result<Option<toml::Table>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).map_err(|e| AppError::Config {
        context: "read",
        detail: format!("'{}': {e}", path.display()),
    })?;
    let table = content.parse::<toml::Table>().map_err(|e| AppError::Config {
        context: "parse",
        detail: format!("'{}': {e}", path.display()),
    })?;
    Ok(Some(table))
}

/// Ключи overlay заменяют ключи base; вложенные таблицы сливаются рекурсивно.
fn merge(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(over) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge(existing, over);
                continue;
            }
            base.insert(key, toml::Value::Table(over));
        } else {
            base.insert(key, value);
        }
    }
}

/// Base file plus optional environment overlay. Missing files are not an
/// error: every setting has a default.
pub fn load_config(path: &Path, environment: &str) -> Result<Config, AppError> {
    let mut table = read_table(path)?.unwrap_or_default();
    let overlay = overlay_path(path, environment);
    if let Some(over) = read_table(&overlay)? {
        tracing::debug!(path = %overlay.display(), "applying config overlay");
        merge(&mut table, over);
    }
    toml::Value::Table(table).try_into().map_err(|e| AppError::Config {
        context: "parse",
        detail: format!("'{}': {e}", path.display()),
    })
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    /// Путь к config.toml
    #[arg(long, default_value = "config.toml", env = "ELASTIC_LOG_EVENT_CONFIG")]
    pub config: PathBuf,

    /// Окружение: подмешивает config.{environment}.toml
    #[arg(long, default_value = "production", env = "APP_ENVIRONMENT")]
    pub environment: String,

    /// Адреса брокеров через запятую
    #[arg(long, env = "KAFKA_BOOTSTRAP_SERVERS")]
    pub bootstrap_servers: Option<String>,

    /// Topic для публикации
    #[arg(long, env = "KAFKA_TOPIC")]
    pub topic: Option<String>,

    /// client.id продюсера
    #[arg(long, env = "KAFKA_CLIENT_ID")]
    pub client_id: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

/// Итоговая конфигурация после мержа: config.toml < config.{env}.toml < env/CLI
#[derive(Debug)]
pub struct Effective {
    pub environment: String,
    pub kafka: KafkaConfig,
    pub worker: WorkerConfig,
    pub logging: LoggingConfig,
}

impl Effective {
    pub fn new(args: &RunArgs) -> Result<Self, AppError> {
        let cfg = load_config(&args.config, &args.environment)?;
        Self::from_parts(args, cfg)
    }

    fn from_parts(args: &RunArgs, cfg: Config) -> Result<Self, AppError> {
        let mut kafka = cfg.kafka;
        if let Some(servers) = &args.bootstrap_servers {
            kafka.bootstrap_servers = Some(ServerList::One(servers.clone()));
        }
        if let Some(topic) = &args.topic {
            kafka.topic = Some(topic.clone());
        }
        if let Some(client_id) = &args.client_id {
            kafka.client_id = Some(client_id.clone());
        }

        Ok(Self {
            environment: args.environment.clone(),
            kafka: KafkaConfig::from_settings(kafka),
            worker: WorkerConfig::from_settings(cfg.worker),
            logging: LoggingConfig::from_settings(cfg.logging)?,
        })
    }
}
