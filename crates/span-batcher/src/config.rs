// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::collector::SPANS_PATH;
use crate::errors::ConfigError;

const DEFAULT_COLLECTOR_URL: &str = "http://localhost:9411";
const DEFAULT_MAX_BATCH_ELEMENTS: u32 = 200;
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 250;
const DEFAULT_QUEUE_CAPACITY: usize = 10_000;
const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";
const DEFAULT_LISTEN_PORT: u16 = 9410;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// collector base URI, the span ingest path is appended to it
    pub collector_url: String,
    /// element count past which the next append flushes the batch
    pub max_batch_elements: u32,
    pub flush_interval: Duration,
    /// capacity of the queue between the relay and the batch consumer
    pub queue_capacity: usize,
    /// no timeout when unset
    pub collector_timeout: Option<Duration>,
    pub collector_connect_timeout: Option<Duration>,
    pub https_proxy: Option<String>,
    pub listen_host: String,
    pub listen_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            max_batch_elements: DEFAULT_MAX_BATCH_ELEMENTS,
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            collector_timeout: None,
            collector_connect_timeout: None,
            https_proxy: None,
            listen_host: DEFAULT_LISTEN_HOST.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
        }
    }
}

impl Config {
    pub fn new() -> Result<Config, ConfigError> {
        let defaults = Config::default();

        let collector_url =
            env::var("SPAN_RELAY_COLLECTOR_URL").unwrap_or(defaults.collector_url);

        // a batch may hold one element past the threshold, so the count must stay representable
        let max_batch_elements = parse_env::<u32>("SPAN_RELAY_MAX_BATCH_ELEMENTS")?
            .unwrap_or(defaults.max_batch_elements);
        if max_batch_elements == 0 || max_batch_elements == u32::MAX {
            return Err(invalid(
                "SPAN_RELAY_MAX_BATCH_ELEMENTS",
                max_batch_elements,
                "must be between 1 and 4294967294",
            ));
        }

        let flush_interval_ms = parse_env::<u64>("SPAN_RELAY_FLUSH_INTERVAL_MS")?
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_MS);
        if flush_interval_ms == 0 {
            return Err(invalid(
                "SPAN_RELAY_FLUSH_INTERVAL_MS",
                flush_interval_ms,
                "must be greater than 0",
            ));
        }

        let queue_capacity = parse_env::<usize>("SPAN_RELAY_QUEUE_CAPACITY")?
            .unwrap_or(defaults.queue_capacity);
        if queue_capacity == 0 {
            return Err(invalid(
                "SPAN_RELAY_QUEUE_CAPACITY",
                queue_capacity,
                "must be greater than 0",
            ));
        }

        let collector_timeout =
            parse_env::<u64>("SPAN_RELAY_COLLECTOR_TIMEOUT_MS")?.map(Duration::from_millis);
        let collector_connect_timeout = parse_env::<u64>("SPAN_RELAY_COLLECTOR_CONNECT_TIMEOUT_MS")?
            .map(Duration::from_millis);

        let https_proxy = env::var("SPAN_RELAY_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();

        let listen_host = env::var("SPAN_RELAY_LISTEN_HOST").unwrap_or(defaults.listen_host);
        let listen_port =
            parse_env::<u16>("SPAN_RELAY_LISTEN_PORT")?.unwrap_or(defaults.listen_port);

        Ok(Config {
            collector_url,
            max_batch_elements,
            flush_interval: Duration::from_millis(flush_interval_ms),
            queue_capacity,
            collector_timeout,
            collector_connect_timeout,
            https_proxy,
            listen_host,
            listen_port,
        })
    }

    pub fn spans_url(&self) -> String {
        format!("{}{SPANS_PATH}", self.collector_url.trim_end_matches('/'))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.listen_host, self.listen_port)
    }
}

fn parse_env<T>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(key, &value, e)),
        Err(_) => Ok(None),
    }
}

fn invalid(
    key: &'static str,
    value: impl ToString,
    reason: impl std::fmt::Display,
) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 10] = [
        "SPAN_RELAY_COLLECTOR_URL",
        "SPAN_RELAY_MAX_BATCH_ELEMENTS",
        "SPAN_RELAY_FLUSH_INTERVAL_MS",
        "SPAN_RELAY_QUEUE_CAPACITY",
        "SPAN_RELAY_COLLECTOR_TIMEOUT_MS",
        "SPAN_RELAY_COLLECTOR_CONNECT_TIMEOUT_MS",
        "SPAN_RELAY_PROXY_HTTPS",
        "HTTPS_PROXY",
        "SPAN_RELAY_LISTEN_HOST",
        "SPAN_RELAY_LISTEN_PORT",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = Config::new().expect("failed to create config");
        assert_eq!(config, Config::default());
        assert_eq!(config.max_batch_elements, 200);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
        assert_eq!(config.queue_capacity, 10_000);
        assert_eq!(config.collector_timeout, None);
        assert_eq!(config.spans_url(), "http://localhost:9411/api/v1/spans");
        assert_eq!(config.listen_addr(), "0.0.0.0:9410");
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("SPAN_RELAY_COLLECTOR_URL", "http://collector:9411/");
        env::set_var("SPAN_RELAY_MAX_BATCH_ELEMENTS", "500");
        env::set_var("SPAN_RELAY_FLUSH_INTERVAL_MS", "1000");
        env::set_var("SPAN_RELAY_COLLECTOR_TIMEOUT_MS", "5000");
        env::set_var("SPAN_RELAY_COLLECTOR_CONNECT_TIMEOUT_MS", "1000");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");
        env::set_var("SPAN_RELAY_LISTEN_PORT", "19410");

        let config = Config::new().expect("failed to create config");
        clear_env();

        assert_eq!(config.spans_url(), "http://collector:9411/api/v1/spans");
        assert_eq!(config.max_batch_elements, 500);
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert_eq!(config.collector_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.collector_connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.listen_port, 19410);
    }

    #[test]
    #[serial]
    fn test_relay_proxy_wins_over_https_proxy() {
        clear_env();
        env::set_var("SPAN_RELAY_PROXY_HTTPS", "http://relay-proxy:3128");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");

        let config = Config::new().expect("failed to create config");
        clear_env();

        assert_eq!(config.https_proxy.as_deref(), Some("http://relay-proxy:3128"));
    }

    #[test]
    #[serial]
    fn test_unparsable_value_is_rejected() {
        clear_env();
        env::set_var("SPAN_RELAY_QUEUE_CAPACITY", "lots");
        let result = Config::new();
        clear_env();

        match result {
            Err(ConfigError::Invalid { key, value, .. }) => {
                assert_eq!(key, "SPAN_RELAY_QUEUE_CAPACITY");
                assert_eq!(value, "lots");
            }
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    #[serial]
    fn test_zero_values_are_rejected() {
        for key in [
            "SPAN_RELAY_MAX_BATCH_ELEMENTS",
            "SPAN_RELAY_FLUSH_INTERVAL_MS",
            "SPAN_RELAY_QUEUE_CAPACITY",
        ] {
            clear_env();
            env::set_var(key, "0");
            let result = Config::new();
            clear_env();
            assert!(
                matches!(result, Err(ConfigError::Invalid { key: k, .. }) if k == key),
                "{key} accepted 0"
            );
        }
    }
}
