use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "localhost:9092";
pub const DEFAULT_TOPIC: &str = "app-logs";
pub const DEFAULT_CLIENT_ID: &str = "ElasticLogEvent";
pub const DEFAULT_MESSAGE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_ACKS: &str = "all";

pub const DEFAULT_SERVICE: &str = "KafkaLoggingApp";
pub const DEFAULT_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 1000;
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 10_000;

// ═══════════════════════════════════════════════════════════════
//  Raw settings (секция [kafka])
// ═══════════════════════════════════════════════════════════════

/// Список брокеров: строка через запятую (`"a:9092,b:9092"`) или массив.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ServerList {
    One(String),
    Many(Vec<String>),
}

impl ServerList {
    fn into_addrs(self) -> Vec<String> {
        let raw = match self {
            ServerList::One(s) => s.split(',').map(str::to_string).collect(),
            ServerList::Many(v) => v,
        };
        raw.into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Секция `[kafka]` как она пришла из внешнего источника. Все поля опциональны.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KafkaSettings {
    pub bootstrap_servers: Option<ServerList>,
    pub topic: Option<String>,
    pub client_id: Option<String>,
    pub message_timeout_ms: Option<u64>,
    pub acks: Option<String>,
}

// ═══════════════════════════════════════════════════════════════
//  KafkaConfig (immutable, defaults applied)
// ═══════════════════════════════════════════════════════════════

/// Broker addresses, target topic and client id with defaults substituted.
///
/// Built once at startup and never mutated. Broker addresses are not
/// validated here; the broker client rejects malformed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConfig {
    bootstrap_servers: Vec<String>,
    topic: String,
    client_id: String,
    message_timeout_ms: u64,
    acks: String,
}

impl KafkaConfig {
    pub fn from_settings(s: KafkaSettings) -> Self {
        let mut bootstrap_servers = s.bootstrap_servers.map(ServerList::into_addrs).unwrap_or_default();
        if bootstrap_servers.is_empty() {
            bootstrap_servers.push(DEFAULT_BOOTSTRAP_SERVERS.to_string());
        }

        Self {
            bootstrap_servers,
            topic: non_empty_or(s.topic, DEFAULT_TOPIC),
            client_id: non_empty_or(s.client_id, DEFAULT_CLIENT_ID),
            message_timeout_ms: s.message_timeout_ms.unwrap_or(DEFAULT_MESSAGE_TIMEOUT_MS),
            acks: non_empty_or(s.acks, DEFAULT_ACKS),
        }
    }

    pub fn bootstrap_servers(&self) -> &[String] {
        &self.bootstrap_servers
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn message_timeout_ms(&self) -> u64 {
        self.message_timeout_ms
    }

    pub fn acks(&self) -> &str {
        &self.acks
    }
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self::from_settings(KafkaSettings::default())
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => default.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Worker settings (секция [worker])
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerSettings {
    /// Пауза между успешными публикациями, мс.
    pub interval_ms: Option<u64>,
    /// Пауза после неудачной публикации, мс.
    pub retry_backoff_ms: Option<u64>,
    /// Значение поля `service` в событии.
    pub service: Option<String>,
    /// Seed для генератора длительностей (0 = энтропия ОС).
    pub seed: Option<u64>,
    /// Сколько ждать завершения цикла после сигнала остановки, мс.
    pub shutdown_timeout_ms: Option<u64>,
}

/// Cadence and event parameters of the publishing loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    interval: Duration,
    retry_backoff: Duration,
    service: String,
    seed: Option<u64>,
    shutdown_timeout: Duration,
}

impl WorkerConfig {
    pub fn from_settings(s: WorkerSettings) -> Self {
        Self {
            interval: Duration::from_millis(s.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS)),
            retry_backoff: Duration::from_millis(s.retry_backoff_ms.unwrap_or(DEFAULT_RETRY_BACKOFF_MS)),
            service: non_empty_or(s.service, DEFAULT_SERVICE),
            seed: s.seed.filter(|&seed| seed != 0),
            shutdown_timeout: Duration::from_millis(
                s.shutdown_timeout_ms.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_MS),
            ),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from_settings(WorkerSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_documented_defaults() {
        let cfg = KafkaConfig::from_settings(KafkaSettings::default());
        assert_eq!(cfg.bootstrap_servers(), ["localhost:9092"]);
        assert_eq!(cfg.topic(), "app-logs");
        assert_eq!(cfg.client_id(), "ElasticLogEvent");
        assert_eq!(cfg.message_timeout_ms(), 5000);
        assert_eq!(cfg.acks(), "all");
    }

    #[test]
    fn defaults_are_idempotent() {
        assert_eq!(KafkaConfig::default(), KafkaConfig::default());
        let again = KafkaConfig::from_settings(KafkaSettings {
            bootstrap_servers: Some(ServerList::One(DEFAULT_BOOTSTRAP_SERVERS.into())),
            topic: Some(DEFAULT_TOPIC.into()),
            client_id: Some(DEFAULT_CLIENT_ID.into()),
            ..Default::default()
        });
        assert_eq!(again, KafkaConfig::default());
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = KafkaConfig::from_settings(KafkaSettings {
            bootstrap_servers: Some(ServerList::One(" , ".into())),
            topic: Some("   ".into()),
            client_id: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(cfg, KafkaConfig::default());
    }

    #[test]
    fn comma_separated_servers_are_split_and_trimmed() {
        let cfg = KafkaConfig::from_settings(KafkaSettings {
            bootstrap_servers: Some(ServerList::One("k1:9092, k2:9092,,k3:9093 ".into())),
            ..Default::default()
        });
        assert_eq!(cfg.bootstrap_servers(), ["k1:9092", "k2:9092", "k3:9093"]);
    }

    #[test]
    fn servers_accept_toml_string_or_array() {
        let s: KafkaSettings = toml::from_str(r#"bootstrap_servers = "a:1,b:2""#).unwrap();
        assert_eq!(KafkaConfig::from_settings(s).bootstrap_servers(), ["a:1", "b:2"]);

        let s: KafkaSettings = toml::from_str(r#"bootstrap_servers = ["a:1", "b:2"]"#).unwrap();
        assert_eq!(KafkaConfig::from_settings(s).bootstrap_servers(), ["a:1", "b:2"]);
    }

    #[test]
    fn worker_defaults() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.interval(), Duration::from_secs(5));
        assert_eq!(cfg.retry_backoff(), Duration::from_secs(1));
        assert_eq!(cfg.service(), "KafkaLoggingApp");
        assert_eq!(cfg.seed(), None);
        assert_eq!(cfg.shutdown_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn zero_seed_means_entropy() {
        let cfg = WorkerConfig::from_settings(WorkerSettings { seed: Some(0), ..Default::default() });
        assert_eq!(cfg.seed(), None);
        let cfg = WorkerConfig::from_settings(WorkerSettings { seed: Some(42), ..Default::default() });
        assert_eq!(cfg.seed(), Some(42));
    }
}
