// Observability module: slow call logging, command spans and tracer setup

pub mod config;
pub mod slow_query;
pub mod span;
pub mod threshold;
pub mod tracing;

pub use self::config::{ExporterType, ObservabilityConfig, SlowCallConfig, TracingConfig};
pub use self::slow_query::SlowCallLogger;
pub use self::span::{
    span_from_context, CommandSpan, CommandTracer, LocalSpan, LocalTracer, OtelSpan, OtelTracer,
};
pub use self::threshold::{global_slow_threshold, set_slow_threshold, slow_threshold, SlowThreshold};
pub use self::tracing::{TracingError, TracingManager};
