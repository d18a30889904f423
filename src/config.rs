//! # Global runtime configuration.
//!
//! [`AppConfig`] carries everything the orchestrator needs to bring a
//! process up: bus endpoint, service identity inputs, reconnect knobs,
//! the concurrency [`Strategy`], and subscription filtering.
//!
//! Config is consumed once, at construction:
//! `App::builder(config)` → registrations → `build()` → `run()`.
//!
//! ## Sentinel values
//! - `client_id = None` → derive one from the service name and host
//! - `include_filter = None` → subscribe to every registered topic
//! - `num_queues` is only meaningful under [`Strategy::Threaded`]

use std::time::Duration;

/// Concurrency strategy for the whole process.
///
/// Selected once at construction and fixed for the process lifetime.
/// The two strategies are mutually exclusive:
///
/// - [`Cooperative`](Strategy::Cooperative): every task, interval task,
///   the HTTP listener, and bus delivery run as suspending units
///   multiplexed on one scheduler.
/// - [`Threaded`](Strategy::Threaded): every task runs on its own OS
///   thread; control returns to the caller once everything is launched.
///
/// Every registered task's execution mode must match the strategy; a
/// mismatch is a configuration error raised before anything is scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Single-scheduler cooperative multiplexing of suspending units.
    #[default]
    Cooperative,
    /// One preemptible OS thread per blocking unit.
    Threaded,
}

impl Strategy {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Strategy::Cooperative => "cooperative",
            Strategy::Threaded => "threaded",
        }
    }
}

/// Global configuration for a colony process.
///
/// ## Field semantics
/// - `host`/`port`: bus broker endpoint
/// - `service_name`: logical name of this microservice
/// - `client_id`: explicit bus client id (`None` = derive from hostname)
/// - `allow_reconnect`: whether the bus client retries lost connections
/// - `max_reconnect_attempts`: retry budget before the connection is fatal
/// - `reconnect_wait`: pause between reconnect attempts
/// - `strategy`: process-wide concurrency strategy
/// - `num_queues`: parallel queue-group consumers per topic (threaded only)
/// - `queue_group`: bus queue group for load-balancing deliveries
/// - `publish_topics`: topics this service intends to publish to
/// - `include_filter`: if set, only topics containing at least one of these
///   substrings are subscribed
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Bus broker host.
    pub host: String,
    /// Bus broker port.
    pub port: u16,
    /// Logical service name, used in identity derivation and logging.
    pub service_name: String,
    /// Explicit bus client id. `None` derives `service__host__rand`.
    pub client_id: Option<String>,
    /// Allow the bus client to reconnect after a lost connection.
    pub allow_reconnect: bool,
    /// Reconnect attempts before the connection failure becomes fatal.
    pub max_reconnect_attempts: usize,
    /// Pause between reconnect attempts.
    pub reconnect_wait: Duration,
    /// Process-wide concurrency strategy.
    pub strategy: Strategy,
    /// Parallel queue consumers per topic. Only read under
    /// [`Strategy::Threaded`]; minimum 1 (clamped by the bus client).
    pub num_queues: usize,
    /// Queue group for distributing deliveries across competing clients.
    /// Empty string = no queue group.
    pub queue_group: String,
    /// Topics this service publishes to.
    pub publish_topics: Vec<String>,
    /// Topic-inclusion filter (substring containment). `None` = no filtering.
    pub include_filter: Option<Vec<String>>,
}

impl AppConfig {
    /// Creates a config for the given broker endpoint and service name,
    /// with default knobs.
    pub fn new(host: impl Into<String>, port: u16, service_name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            service_name: service_name.into(),
            ..Self::default()
        }
    }

    /// Bus endpoint as a `host:port` address string.
    pub fn bus_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Queue consumer count clamped to a minimum of 1.
    #[inline]
    pub fn num_queues_clamped(&self) -> usize {
        self.num_queues.max(1)
    }
}

impl Default for AppConfig {
    /// Default configuration:
    ///
    /// - `host = "127.0.0.1"`, `port = 4222`
    /// - `allow_reconnect = false`, `max_reconnect_attempts = 60`,
    ///   `reconnect_wait = 2s`
    /// - `strategy = Cooperative`, `num_queues = 1`
    /// - no queue group, no publish topics, no include filter
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4222,
            service_name: "colony_service".to_string(),
            client_id: None,
            allow_reconnect: false,
            max_reconnect_attempts: 60,
            reconnect_wait: Duration::from_secs(2),
            strategy: Strategy::Cooperative,
            num_queues: 1,
            queue_group: String::new(),
            publish_topics: Vec::new(),
            include_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.strategy, Strategy::Cooperative);
        assert!(!cfg.allow_reconnect);
        assert_eq!(cfg.max_reconnect_attempts, 60);
        assert_eq!(cfg.reconnect_wait, Duration::from_secs(2));
        assert!(cfg.include_filter.is_none());
    }

    #[test]
    fn test_num_queues_clamped() {
        let mut cfg = AppConfig::default();
        cfg.num_queues = 0;
        assert_eq!(cfg.num_queues_clamped(), 1);
        cfg.num_queues = 4;
        assert_eq!(cfg.num_queues_clamped(), 4);
    }

    #[test]
    fn test_bus_addr() {
        let cfg = AppConfig::new("nats.local", 4222, "svc");
        assert_eq!(cfg.bus_addr(), "nats.local:4222");
    }
}
