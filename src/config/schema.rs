//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the controller.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the rollout controller.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RolloutConfig {
    /// Feature-flag source settings.
    pub flags: FlagsConfig,

    /// Load balancer administration settings.
    pub balancer: BalancerConfig,

    /// Reconciliation loop cadence.
    pub controller: ControllerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Feature-flag source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FlagsConfig {
    /// Base URL of the flag API (e.g., "http://unleash:4242/api").
    pub url: String,

    /// Application name announced at registration.
    pub app_name: String,

    /// Instance id; derived from the host when unset.
    pub instance_id: Option<String>,

    /// Prefix shared by all controlled feature names.
    pub feature_prefix: String,

    /// Value of the `Authorization` header, if the source requires one.
    pub api_token: Option<String>,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Minimum seconds between two fetches of the same feature.
    pub min_refetch_secs: u64,
}

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4242/api".to_string(),
            app_name: "kubernetes-legacy-loadbalancer".to_string(),
            instance_id: None,
            feature_prefix: "kubernetes.loadbalance.legacy.".to_string(),
            api_token: None,
            request_timeout_ms: 1000,
            min_refetch_secs: 10,
        }
    }
}

/// Load balancer administration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Directory holding one admin socket per balancer process.
    pub socket_dir: String,

    /// Timeout for one socket exchange in milliseconds.
    pub timeout_ms: u64,

    /// Suffix naming the legacy pool (`<app>-<legacy_suffix>`).
    pub legacy_suffix: String,

    /// Suffix naming the new pool (`<app>-<new_suffix>`).
    pub new_suffix: String,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            socket_dir: "/var/run/haproxy".to_string(),
            timeout_ms: 1000,
            legacy_suffix: "legacy".to_string(),
            new_suffix: "kubernetes".to_string(),
        }
    }
}

/// Reconciliation loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Sleep between ticks in seconds.
    pub tick_interval_secs: u64,

    /// Ticks run before the application set is rediscovered.
    pub ticks_per_discovery: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            ticks_per_discovery: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
