// OpenTelemetry tracing module
//
// Owns the tracer provider lifecycle and hands the hook a `CommandTracer`:
// an OpenTelemetry-backed one when tracing is enabled, the local fallback
// otherwise.

use crate::observability::config::{ExporterType, TracingConfig};
use crate::observability::span::{CommandTracer, LocalTracer, OtelTracer};
use opentelemetry::trace::TracerProvider as TracerProviderTrait;
use opentelemetry_sdk::trace::TracerProvider;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// OpenTelemetry tracer manager
pub struct TracingManager {
    config: TracingConfig,
    provider: Option<Arc<TracerProvider>>,
}

impl TracingManager {
    /// Create a new tracing manager from config
    pub fn new(config: TracingConfig) -> Self {
        Self {
            config,
            provider: None,
        }
    }

    /// Initialize the tracer provider
    pub fn init(&mut self) -> Result<(), TracingError> {
        if !self.config.enabled {
            return Ok(());
        }

        self.config.validate().map_err(TracingError::ConfigError)?;

        let provider = self.create_provider()?;
        self.provider = Some(Arc::new(provider));

        tracing::info!(
            service_name = %self.config.service_name,
            exporter = %self.config.exporter,
            sampling_ratio = self.config.sampling_ratio,
            "OpenTelemetry tracer provider initialized"
        );

        Ok(())
    }

    /// Install a global subscriber that exports `tracing` spans through the
    /// provider and writes JSON logs to stdout
    pub fn init_subscriber(&self) -> Result<(), TracingError> {
        let Some(provider) = &self.provider else {
            return Ok(());
        };

        let tracer = provider.tracer(self.config.service_name.clone());
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| TracingError::InitError(e.to_string()))
    }

    /// Tracer for the duration hook
    ///
    /// Falls back to [`LocalTracer`] when tracing is disabled or `init` has not
    /// run, so the hook never depends on a backend being present.
    pub fn tracer(&self) -> Arc<dyn CommandTracer> {
        match &self.provider {
            Some(provider) => Arc::new(OtelTracer::new(
                provider.tracer(self.config.service_name.clone()),
            )),
            None => Arc::new(LocalTracer::new()),
        }
    }

    fn create_provider(&self) -> Result<TracerProvider, TracingError> {
        use opentelemetry_sdk::trace::Sampler;

        let sampler = if (self.config.sampling_ratio - 1.0).abs() < f64::EPSILON {
            Sampler::AlwaysOn
        } else if self.config.sampling_ratio <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(self.config.sampling_ratio)
        };

        match self.config.exporter_type() {
            // Jaeger and Zipkin collectors are reached through their OTLP receivers
            ExporterType::Otlp | ExporterType::Jaeger | ExporterType::Zipkin => {
                self.create_otlp_provider(sampler)
            }
            ExporterType::None => Ok(TracerProvider::builder().with_sampler(sampler).build()),
        }
    }

    fn create_otlp_provider(
        &self,
        sampler: opentelemetry_sdk::trace::Sampler,
    ) -> Result<TracerProvider, TracingError> {
        use opentelemetry_otlp::WithExportConfig;
        use opentelemetry_sdk::runtime;

        let endpoint = self.config.endpoint().ok_or_else(|| {
            TracingError::ConfigError("No endpoint configured for exporter".to_string())
        })?;

        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()
            .map_err(|e| TracingError::ExporterError(e.to_string()))?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_sampler(sampler)
            .build();

        Ok(provider)
    }

    /// Shutdown the tracer provider
    pub fn shutdown(&self) {
        if let Some(provider) = &self.provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
    }

    /// Check if tracing is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.provider.is_some()
    }
}

/// Tracing error types
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to initialize tracer: {0}")]
    InitError(String),

    #[error("Failed to create exporter: {0}")]
    ExporterError(String),

    #[error("Failed to start span: {0}")]
    SpanStart(String),
}
