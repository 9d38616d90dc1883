use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Serialize, Serializer};

pub const EVENT_TYPE: &str = "JobExecution";

/// Upper bound (exclusive) of the sampled job duration, seconds.
const MAX_DURATION_SECS: f64 = 10.0;

/// Структурированное событие, публикуемое на каждой итерации.
///
/// Порядок полей при сериализации фиксирован:
/// `eventType, service, messageNumber, durationSeconds, timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub event_type: &'static str,
    pub service: String,
    pub message_number: u64,
    pub duration_seconds: f64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Сгенерировать событие с номером `seq` и случайной длительностью.
    pub fn generate<R: Rng>(seq: u64, service: &str, rng: &mut R, now: DateTime<Utc>) -> Self {
        Self {
            event_type: EVENT_TYPE,
            service: service.to_string(),
            message_number: seq,
            duration_seconds: round2(rng.gen_range(0.0..MAX_DURATION_SECS)),
            timestamp: now,
        }
    }

    /// Compact JSON, the message value sent to the broker.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// ISO-8601 UTC with microseconds, e.g. `2026-10-19T08:15:42.123456Z`.
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 42).unwrap()
    }

    #[test]
    fn serializes_exactly_five_fields_in_order() {
        let mut rng = StdRng::seed_from_u64(7);
        let event = LogEvent::generate(3, "KafkaLoggingApp", &mut rng, fixed_now());
        let json = String::from_utf8(event.to_json().unwrap()).unwrap();

        let keys = ["\"eventType\"", "\"service\"", "\"messageNumber\"", "\"durationSeconds\"", "\"timestamp\""];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).expect(k)).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "field order: {json}");

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 5);
        assert_eq!(obj["eventType"], "JobExecution");
        assert_eq!(obj["service"], "KafkaLoggingApp");
        assert_eq!(obj["messageNumber"], 3);
        assert!(!json.contains(' '), "compact form expected: {json}");
    }

    #[test]
    fn timestamp_is_utc_with_fraction() {
        let mut rng = StdRng::seed_from_u64(1);
        let event = LogEvent::generate(1, "svc", &mut rng, fixed_now());
        let value: serde_json::Value = serde_json::from_slice(&event.to_json().unwrap()).unwrap();
        assert_eq!(value["timestamp"], "2026-10-19T08:15:42.000000Z");

        let parsed = DateTime::parse_from_rfc3339(value["timestamp"].as_str().unwrap()).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), fixed_now());
    }

    #[test]
    fn duration_is_in_range_with_two_decimals() {
        let mut rng = StdRng::seed_from_u64(99);
        for seq in 1..=2000 {
            let event = LogEvent::generate(seq, "svc", &mut rng, fixed_now());
            let d = event.duration_seconds;
            assert!((0.0..=10.0).contains(&d), "out of range: {d}");
            assert!(((d * 100.0).round() - d * 100.0).abs() < 1e-6, "not 2 decimals: {d}");
        }
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(9.999), 10.0);
        assert_eq!(round2(0.0), 0.0);
    }
}
