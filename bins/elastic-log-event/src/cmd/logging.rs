use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use super::error::AppError;

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    Json,
}

/// Секция `[logging]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Фильтр по умолчанию, если `RUST_LOG` не задан.
    pub level: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn from_settings(s: LoggingSettings) -> Result<Self, AppError> {
        let level = match s.level {
            Some(l) if !l.trim().is_empty() => l.trim().to_string(),
            _ => DEFAULT_LEVEL.to_string(),
        };
        // Reject bad directives here, before the subscriber exists.
        EnvFilter::try_new(&level).map_err(|e| AppError::Config {
            context: "logging",
            detail: format!("level '{level}': {e}"),
        })?;
        Ok(Self {
            level,
            format: s.format.unwrap_or_default(),
        })
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(cfg: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match cfg.format {
        LogFormat::Full => builder.init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_full() {
        let cfg = LoggingConfig::from_settings(LoggingSettings::default()).unwrap();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Full);
    }

    #[test]
    fn accepts_per_target_directives() {
        let cfg = LoggingConfig::from_settings(LoggingSettings {
            level: Some("warn,worker=debug".into()),
            format: Some(LogFormat::Compact),
        })
        .unwrap();
        assert_eq!(cfg.level, "warn,worker=debug");
    }

    #[test]
    fn rejects_garbage_level() {
        let err = LoggingConfig::from_settings(LoggingSettings {
            level: Some("worker=notalevel".into()),
            format: None,
        })
        .unwrap_err();
        assert!(matches!(err, AppError::Config { context: "logging", .. }));
    }

    #[test]
    fn format_names_are_snake_case() {
        #[derive(Deserialize)]
        struct Wrap {
            format: LogFormat,
        }
        let w: Wrap = toml::from_str(r#"format = "compact""#).unwrap();
        assert_eq!(w.format, LogFormat::Compact);
    }
}
