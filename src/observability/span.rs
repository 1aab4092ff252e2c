//! Span adapter
//!
//! A minimal "start span / read identifiers / end span" capability over a
//! tracing backend. The hook only talks to [`CommandTracer`] and
//! [`CommandSpan`], so it behaves the same whether or not an OpenTelemetry
//! provider is wired up.
//!
//! Two tracers are provided:
//!
//! - [`LocalTracer`]: the default. Needs no backend, cannot fail, and mints
//!   random W3C-sized identifiers. They are locally random, not guaranteed to
//!   be globally unique.
//! - [`OtelTracer`]: delegates to an OpenTelemetry tracer (client-kind spans).
//!   Root spans join the caller's active span (the current `tracing` span or
//!   the attached OpenTelemetry context). When the backend hands back an
//!   unusable span context, as the noop tracer does when no provider is
//!   installed, it degrades to a local span.

use crate::context::{Context, ContextKey};
use crate::hook::command::Command;
use crate::observability::tracing::TracingError;
use opentelemetry::trace::{
    Span as _, SpanContext, SpanId, SpanKind, Status, TraceContextExt, TraceFlags, TraceId,
    TraceState, Tracer as _,
};
use opentelemetry::KeyValue;
use opentelemetry_sdk::trace::{IdGenerator, RandomIdGenerator};
use parking_lot::Mutex;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Slot holding the in-flight `Arc<dyn CommandSpan>`
pub(crate) const SPAN_KEY: ContextKey = ContextKey::new("redis_duration_hook.span");

/// Handle to one traced unit of work
pub trait CommandSpan: Send + Sync {
    /// Operation name given to [`CommandTracer::start`]
    fn name(&self) -> &str;

    /// Backend span context (trace id, span id, flags)
    fn span_context(&self) -> SpanContext;

    /// Lowercase hex trace id and span id, for log lines
    fn ids(&self) -> (String, String) {
        let context = self.span_context();
        (
            context.trace_id().to_string(),
            context.span_id().to_string(),
        )
    }

    /// Annotate the span with the commands that ran under it
    fn record_outcome(&self, _commands: &[Command]) {}

    /// Finalize the span
    fn end(&self);

    fn is_ended(&self) -> bool;
}

impl fmt::Debug for dyn CommandSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (trace_id, span_id) = self.ids();
        f.debug_struct("CommandSpan")
            .field("name", &self.name())
            .field("trace_id", &trace_id)
            .field("span_id", &span_id)
            .field("ended", &self.is_ended())
            .finish()
    }
}

/// Capability to begin spans
#[cfg_attr(test, mockall::automock)]
pub trait CommandTracer: Send + Sync {
    /// Begin a span named `operation` as a child of the span in `parent`, or
    /// as a root when `parent` carries none. The returned context holds the
    /// new span.
    fn start(&self, parent: &Context, operation: &str) -> Result<Context, TracingError>;
}

/// Span held by the context under the span slot, if any
pub fn span_from_context(ctx: &Context) -> Option<&Arc<dyn CommandSpan>> {
    ctx.value::<Arc<dyn CommandSpan>>(&SPAN_KEY)
}

fn parent_span_context(ctx: &Context) -> Option<SpanContext> {
    span_from_context(ctx)
        .map(|span| span.span_context())
        .filter(SpanContext::is_valid)
}

/// The caller's active span: the current `tracing` span when it is exported
/// through `tracing-opentelemetry`, else the attached OpenTelemetry context
fn ambient_span_context() -> Option<SpanContext> {
    let from_tracing = tracing::Span::current().context();
    [from_tracing, opentelemetry::Context::current()]
        .into_iter()
        .map(|cx| cx.span().span_context().clone())
        .find(SpanContext::is_valid)
}

fn with_span(parent: &Context, span: Arc<dyn CommandSpan>) -> Context {
    parent.with_value(SPAN_KEY, span)
}

// =============================================================================
// Local spans
// =============================================================================

/// Backend-free span
#[derive(Debug)]
pub struct LocalSpan {
    name: String,
    context: SpanContext,
    ended: AtomicBool,
}

impl LocalSpan {
    fn new(name: &str, trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            name: name.to_string(),
            context: SpanContext::new(
                trace_id,
                span_id,
                TraceFlags::SAMPLED,
                false,
                TraceState::default(),
            ),
            ended: AtomicBool::new(false),
        }
    }
}

impl CommandSpan for LocalSpan {
    fn name(&self) -> &str {
        &self.name
    }

    fn span_context(&self) -> SpanContext {
        self.context.clone()
    }

    fn end(&self) {
        self.ended.store(true, Ordering::Release);
    }

    fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

/// Default tracer; works without any tracing backend
#[derive(Debug, Default)]
pub struct LocalTracer {
    ids: RandomIdGenerator,
}

impl LocalTracer {
    pub fn new() -> Self {
        Self::default()
    }

    fn new_trace_id(&self) -> TraceId {
        loop {
            let id = self.ids.new_trace_id();
            if id != TraceId::INVALID {
                return id;
            }
        }
    }

    fn new_span_id(&self) -> SpanId {
        loop {
            let id = self.ids.new_span_id();
            if id != SpanId::INVALID {
                return id;
            }
        }
    }

    fn start_span(&self, parent: Option<&SpanContext>, operation: &str) -> LocalSpan {
        let trace_id = match parent {
            Some(parent) => parent.trace_id(),
            None => self.new_trace_id(),
        };
        LocalSpan::new(operation, trace_id, self.new_span_id())
    }
}

impl CommandTracer for LocalTracer {
    fn start(&self, parent: &Context, operation: &str) -> Result<Context, TracingError> {
        let span = self.start_span(parent_span_context(parent).as_ref(), operation);
        Ok(with_span(parent, Arc::new(span)))
    }
}

// =============================================================================
// OpenTelemetry spans
// =============================================================================

/// Span backed by an OpenTelemetry tracer
pub struct OtelSpan<S> {
    name: String,
    context: SpanContext,
    inner: Mutex<S>,
    ended: AtomicBool,
}

impl<S> CommandSpan for OtelSpan<S>
where
    S: opentelemetry::trace::Span + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn span_context(&self) -> SpanContext {
        self.context.clone()
    }

    fn record_outcome(&self, commands: &[Command]) {
        let mut span = self.inner.lock();
        let names: Vec<String> = commands.iter().map(Command::name).collect();
        span.set_attribute(KeyValue::new("db.system", "redis"));
        span.set_attribute(KeyValue::new("redis.cmds", names.join(" ")));

        if let Some(error) = commands.iter().find_map(Command::error) {
            span.set_status(Status::error(error.to_string()));
        }
    }

    fn end(&self) {
        if !self.ended.swap(true, Ordering::AcqRel) {
            self.inner.lock().end();
        }
    }

    fn is_ended(&self) -> bool {
        self.ended.load(Ordering::Acquire)
    }
}

/// Tracer delegating to an OpenTelemetry tracer
pub struct OtelTracer<T> {
    tracer: T,
    fallback: LocalTracer,
}

impl OtelTracer<opentelemetry::global::BoxedTracer> {
    /// Tracer from the globally installed provider
    pub fn global(name: &'static str) -> Self {
        Self::new(opentelemetry::global::tracer(name))
    }
}

impl<T> OtelTracer<T>
where
    T: opentelemetry::trace::Tracer + Send + Sync,
    T::Span: Send + Sync + 'static,
{
    pub fn new(tracer: T) -> Self {
        Self {
            tracer,
            fallback: LocalTracer::new(),
        }
    }
}

impl<T> CommandTracer for OtelTracer<T>
where
    T: opentelemetry::trace::Tracer + Send + Sync,
    T::Span: Send + Sync + 'static,
{
    fn start(&self, parent: &Context, operation: &str) -> Result<Context, TracingError> {
        let parent_context = parent_span_context(parent).or_else(ambient_span_context);
        let otel_parent = match &parent_context {
            Some(span_context) => {
                opentelemetry::Context::new().with_remote_span_context(span_context.clone())
            }
            None => opentelemetry::Context::new(),
        };

        let span = self
            .tracer
            .span_builder(operation.to_string())
            .with_kind(SpanKind::Client)
            .start_with_context(&self.tracer, &otel_parent);
        let context = span.span_context().clone();

        // The noop tracer returns an invalid context, or echoes the parent's.
        let minted = context.is_valid()
            && parent_context
                .as_ref()
                .map_or(true, |parent| parent.span_id() != context.span_id());
        if !minted {
            let local = self
                .fallback
                .start_span(parent_context.as_ref(), operation);
            return Ok(with_span(parent, Arc::new(local)));
        }

        let span = OtelSpan {
            name: operation.to_string(),
            context,
            inner: Mutex::new(span),
            ended: AtomicBool::new(false),
        };
        Ok(with_span(parent, Arc::new(span)))
    }
}
