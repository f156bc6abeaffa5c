use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Most recent switches kept in history.
pub const MAX_SWITCH_RECORDS: usize = 100;

/// Most recent speed samples kept per registry URL.
pub const MAX_SPEED_RECORDS_PER_URL: usize = 10;

/// One registry switch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitchRecord {
    /// ISO-8601 local timestamp.
    pub timestamp: String,
    pub from: String,
    pub to: String,
}

/// One speed-test sample for a registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeedRecord {
    pub timestamp: String,
    /// Round-trip time in milliseconds; 0.0 when the probe failed.
    pub speed: f64,
    pub success: bool,
}

/// Usage history, persisted as `history.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct History {
    #[serde(default)]
    pub registry_switches: Vec<SwitchRecord>,

    #[serde(default)]
    pub speed_tests: HashMap<String, Vec<SpeedRecord>>,

    #[serde(default)]
    pub last_used_registry: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl History {
    /// Append a switch record and evict the oldest beyond the cap.
    pub fn record_switch(&mut self, from: &str, to: &str) {
        self.registry_switches.push(SwitchRecord {
            timestamp: now_timestamp(),
            from: from.to_string(),
            to: to.to_string(),
        });
        if self.registry_switches.len() > MAX_SWITCH_RECORDS {
            let excess = self.registry_switches.len() - MAX_SWITCH_RECORDS;
            self.registry_switches.drain(..excess);
        }
        self.last_used_registry = Some(to.to_string());
    }

    /// Append a speed sample for `url` and evict the oldest beyond the cap.
    pub fn record_speed_test(&mut self, url: &str, speed: f64, success: bool) {
        let samples = self.speed_tests.entry(url.to_string()).or_default();
        samples.push(SpeedRecord {
            timestamp: now_timestamp(),
            speed,
            success,
        });
        if samples.len() > MAX_SPEED_RECORDS_PER_URL {
            let excess = samples.len() - MAX_SPEED_RECORDS_PER_URL;
            samples.drain(..excess);
        }
    }

    /// Mean latency over the retained successful samples for `url`.
    ///
    /// Returns 0.0 when no sample exists or none succeeded.
    pub fn average_speed(&self, url: &str) -> f64 {
        let Some(samples) = self.speed_tests.get(url) else {
            return 0.0;
        };
        let successful: Vec<f64> = samples
            .iter()
            .filter(|s| s.success)
            .map(|s| s.speed)
            .collect();
        if successful.is_empty() {
            return 0.0;
        }
        successful.iter().sum::<f64>() / successful.len() as f64
    }
}

fn now_timestamp() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_history_capped() {
        let mut h = History::default();
        for i in 0..250 {
            h.record_switch("https://a.example/", &format!("https://b{i}.example/"));
        }
        assert_eq!(h.registry_switches.len(), MAX_SWITCH_RECORDS);
        // Most recent call last, oldest evicted first
        assert_eq!(
            h.registry_switches.last().unwrap().to,
            "https://b249.example/"
        );
        assert_eq!(
            h.registry_switches.first().unwrap().to,
            "https://b150.example/"
        );
        assert_eq!(h.last_used_registry.as_deref(), Some("https://b249.example/"));
    }

    #[test]
    fn test_speed_samples_capped_per_url() {
        let mut h = History::default();
        let url = "https://registry.npmmirror.com/";
        for i in 0..25 {
            h.record_speed_test(url, i as f64, true);
        }
        let samples = &h.speed_tests[url];
        assert_eq!(samples.len(), MAX_SPEED_RECORDS_PER_URL);
        assert_eq!(samples.first().unwrap().speed, 15.0);
        assert_eq!(samples.last().unwrap().speed, 24.0);
    }

    #[test]
    fn test_average_speed_ignores_failures() {
        let mut h = History::default();
        let url = "https://registry.npmjs.org/";
        h.record_speed_test(url, 100.0, true);
        h.record_speed_test(url, 0.0, false);
        h.record_speed_test(url, 200.0, true);
        assert_eq!(h.average_speed(url), 150.0);
    }

    #[test]
    fn test_average_speed_only_over_retained_samples() {
        let mut h = History::default();
        let url = "https://registry.npmjs.org/";
        // These fall off once the cap is reached
        h.record_speed_test(url, 10_000.0, true);
        h.record_speed_test(url, 10_000.0, true);
        for _ in 0..MAX_SPEED_RECORDS_PER_URL {
            h.record_speed_test(url, 50.0, true);
        }
        assert_eq!(h.average_speed(url), 50.0);
    }

    #[test]
    fn test_average_speed_unknown_or_all_failed() {
        let mut h = History::default();
        assert_eq!(h.average_speed("https://nowhere.example/"), 0.0);

        h.record_speed_test("https://down.example/", 0.0, false);
        assert_eq!(h.average_speed("https://down.example/"), 0.0);
    }
}
