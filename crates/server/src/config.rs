use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use cardio_core::rules::{MissingDataPolicy, RuleConfig};
use cardio_core::types::PatientId;
use cardio_events::{HubConfig, NotifyChannel};
use cardio_pipeline::{EvaluatorConfig, SchedulerConfig};

use crate::error::ServerError;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local simulation run.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    /// HTTP and WebSocket port.
    pub port: u16,
    /// Line-protocol ingest port; `0` disables the listener.
    pub tcp_ingest_port: u16,
    /// CSV broadcast port; `0` disables the listener.
    pub tcp_output_port: u16,
    /// Patients `1..=patient_count` are registered at startup.
    pub patient_count: usize,
    pub tick_period: Duration,
    pub startup_jitter: Duration,
    /// Ticks per patient; `None` runs until shutdown.
    pub max_runs: Option<u64>,
    pub simulation_seed: Option<u64>,
    pub strict_missing_data: bool,
    pub notify_channels: Vec<NotifyChannel>,
    pub subscriber_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            tcp_ingest_port: 8081,
            tcp_output_port: 8082,
            patient_count: 50,
            tick_period: Duration::from_millis(1000),
            startup_jitter: Duration::from_millis(5000),
            max_runs: Some(5),
            simulation_seed: None,
            strict_missing_data: false,
            notify_channels: vec![NotifyChannel::Email, NotifyChannel::Sms],
            subscriber_buffer: 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default     |
    /// |-----------------------|-------------|
    /// | `HOST`                | `0.0.0.0`   |
    /// | `PORT`                | `8080`      |
    /// | `TCP_INGEST_PORT`     | `8081`      |
    /// | `TCP_OUTPUT_PORT`     | `8082`      |
    /// | `PATIENT_COUNT`       | `50`        |
    /// | `TICK_PERIOD_MS`      | `1000`      |
    /// | `STARTUP_JITTER_MS`   | `5000`      |
    /// | `MAX_RUNS`            | `5` (`0` = unbounded) |
    /// | `SIMULATION_SEED`     | unset       |
    /// | `STRICT_MISSING_DATA` | `false`     |
    /// | `NOTIFY_CHANNELS`     | `email,sms` |
    /// | `SUBSCRIBER_BUFFER`   | `1024`      |
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let defaults = Self::default();

        let tick_period_ms: u64 = parse_or(&lookup, "TICK_PERIOD_MS", 1000)?;
        if tick_period_ms == 0 {
            return Err(invalid("TICK_PERIOD_MS", "must be greater than 0"));
        }

        let subscriber_buffer: usize =
            parse_or(&lookup, "SUBSCRIBER_BUFFER", defaults.subscriber_buffer)?;
        if subscriber_buffer == 0 {
            return Err(invalid("SUBSCRIBER_BUFFER", "must be greater than 0"));
        }

        let max_runs: u64 = parse_or(&lookup, "MAX_RUNS", 5)?;

        let simulation_seed = match lookup("SIMULATION_SEED") {
            Some(raw) if !raw.trim().is_empty() => Some(parse_value("SIMULATION_SEED", &raw)?),
            _ => None,
        };

        let strict_missing_data = match lookup("STRICT_MISSING_DATA") {
            Some(raw) => parse_bool("STRICT_MISSING_DATA", &raw)?,
            None => defaults.strict_missing_data,
        };

        let notify_channels = match lookup("NOTIFY_CHANNELS") {
            Some(raw) => NotifyChannel::parse_list(&raw)
                .map_err(|e| invalid("NOTIFY_CHANNELS", e.to_string()))?,
            None => defaults.notify_channels.clone(),
        };

        Ok(Self {
            host: parse_or(&lookup, "HOST", defaults.host)?,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            tcp_ingest_port: parse_or(&lookup, "TCP_INGEST_PORT", defaults.tcp_ingest_port)?,
            tcp_output_port: parse_or(&lookup, "TCP_OUTPUT_PORT", defaults.tcp_output_port)?,
            patient_count: parse_or(&lookup, "PATIENT_COUNT", defaults.patient_count)?,
            tick_period: Duration::from_millis(tick_period_ms),
            startup_jitter: Duration::from_millis(parse_or(&lookup, "STARTUP_JITTER_MS", 5000)?),
            max_runs: (max_runs > 0).then_some(max_runs),
            simulation_seed,
            strict_missing_data,
            notify_channels,
            subscriber_buffer,
        })
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn tcp_ingest_addr(&self) -> Option<SocketAddr> {
        (self.tcp_ingest_port != 0).then(|| SocketAddr::new(self.host, self.tcp_ingest_port))
    }

    pub fn tcp_output_addr(&self) -> Option<SocketAddr> {
        (self.tcp_output_port != 0).then(|| SocketAddr::new(self.host, self.tcp_output_port))
    }

    pub fn patient_ids(&self) -> Vec<PatientId> {
        (1..=self.patient_count as PatientId).collect()
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            period: self.tick_period,
            startup_jitter: self.startup_jitter,
            max_runs: self.max_runs,
            seed: self.simulation_seed,
            ..SchedulerConfig::default()
        }
    }

    pub fn evaluator_config(&self) -> EvaluatorConfig {
        let missing_data = if self.strict_missing_data {
            MissingDataPolicy::Strict
        } else {
            MissingDataPolicy::Sentinel
        };
        EvaluatorConfig {
            rules: RuleConfig {
                missing_data,
                ..RuleConfig::default()
            },
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            subscriber_buffer: self.subscriber_buffer,
        }
    }
}

fn invalid(var: &'static str, reason: impl Into<String>) -> ServerError {
    ServerError::Config {
        var,
        reason: reason.into(),
    }
}

fn parse_value<T>(var: &'static str, raw: &str) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| invalid(var, format!("{raw:?}: {e}")))
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ServerError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(var, format!("{raw:?} is not a boolean"))),
    }
}
