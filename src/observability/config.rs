// Observability configuration module

use crate::constants::{DEFAULT_SAMPLING_RATIO, DEFAULT_SERVICE_NAME, DEFAULT_SLOW_THRESHOLD_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main observability configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// OpenTelemetry tracing configuration
    #[serde(default)]
    pub tracing: TracingConfig,

    /// Slow command warning configuration
    #[serde(default)]
    pub slow_call: SlowCallConfig,
}

/// OpenTelemetry tracing configuration
///
/// When disabled, the hook still creates lightweight local spans so every
/// slow-command warning carries trace and span identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Export spans through an OpenTelemetry provider
    #[serde(default)]
    pub enabled: bool,

    /// Exporter type: "otlp", "jaeger", "zipkin", or "none"
    #[serde(default = "default_exporter")]
    pub exporter: String,

    /// OTLP endpoint (e.g., "http://localhost:4317")
    #[serde(default)]
    pub otlp_endpoint: Option<String>,

    /// Jaeger endpoint (e.g., "http://localhost:4317" for Jaeger's OTLP receiver)
    #[serde(default)]
    pub jaeger_endpoint: Option<String>,

    /// Zipkin endpoint (e.g., "http://localhost:9411/api/v2/spans")
    #[serde(default)]
    pub zipkin_endpoint: Option<String>,

    /// Service name for traces (default: "redis-duration-hook")
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Sampling ratio (0.0 to 1.0, default: 1.0 = sample all)
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            exporter: default_exporter(),
            otlp_endpoint: None,
            jaeger_endpoint: None,
            zipkin_endpoint: None,
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
        }
    }
}

/// Slow command warning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlowCallConfig {
    /// Commands at or above this many milliseconds are logged (default: 100)
    #[serde(default = "default_slow_threshold_ms")]
    pub threshold_ms: u64,
}

impl SlowCallConfig {
    pub fn threshold(&self) -> Duration {
        Duration::from_millis(self.threshold_ms)
    }
}

impl Default for SlowCallConfig {
    fn default() -> Self {
        Self {
            threshold_ms: default_slow_threshold_ms(),
        }
    }
}

// Default value functions
fn default_exporter() -> String {
    "otlp".to_string()
}

fn default_service_name() -> String {
    DEFAULT_SERVICE_NAME.to_string()
}

fn default_sampling_ratio() -> f64 {
    DEFAULT_SAMPLING_RATIO
}

fn default_slow_threshold_ms() -> u64 {
    DEFAULT_SLOW_THRESHOLD_MS
}

/// Exporter type enum for validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExporterType {
    Otlp,
    Jaeger,
    Zipkin,
    None,
}

impl TracingConfig {
    /// Parse exporter type from string
    pub fn exporter_type(&self) -> ExporterType {
        match self.exporter.to_lowercase().as_str() {
            "otlp" => ExporterType::Otlp,
            "jaeger" => ExporterType::Jaeger,
            "zipkin" => ExporterType::Zipkin,
            _ => ExporterType::None,
        }
    }

    /// Endpoint for the selected exporter, if any
    pub fn endpoint(&self) -> Option<&str> {
        match self.exporter_type() {
            ExporterType::Otlp => self.otlp_endpoint.as_deref(),
            ExporterType::Jaeger => self.jaeger_endpoint.as_deref(),
            ExporterType::Zipkin => self.zipkin_endpoint.as_deref(),
            ExporterType::None => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }

        match self.exporter_type() {
            ExporterType::Otlp if self.otlp_endpoint.is_none() => {
                return Err("OTLP exporter requires otlp_endpoint".to_string());
            }
            ExporterType::Jaeger if self.jaeger_endpoint.is_none() => {
                return Err("Jaeger exporter requires jaeger_endpoint".to_string());
            }
            ExporterType::Zipkin if self.zipkin_endpoint.is_none() => {
                return Err("Zipkin exporter requires zipkin_endpoint".to_string());
            }
            _ => {}
        }

        if !(0.0..=1.0).contains(&self.sampling_ratio) {
            return Err(format!(
                "sampling_ratio must be between 0.0 and 1.0, got {}",
                self.sampling_ratio
            ));
        }

        Ok(())
    }
}
