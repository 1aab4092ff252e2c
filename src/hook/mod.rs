//! Duration hook
//!
//! Interception points the Redis client runs around every command and every
//! pipeline. The `before` stage starts a span and records the start time in a
//! derived [`Context`]; the `after` stage ends the span and logs a
//! slow-command warning when the call reached the slow threshold.
//!
//! Each before/after pair moves through `NOT_STARTED -> STARTED -> ENDED`.
//! Pairs are independent; the only state they share is the threshold.
//!
//! The `after` stages never fail. Missing or mistyped timing data turns the
//! stage into a no-op, and a missing span only drops the trace/span fields
//! from the warning.

pub mod command;
pub mod connection;

use crate::constants::PROTOCOL_NAME;
use crate::context::{Context, ContextKey};
use crate::error::HookError;
use crate::observability::slow_query::SlowCallLogger;
use crate::observability::span::{span_from_context, CommandSpan, CommandTracer, LocalTracer};
use crate::observability::threshold::SlowThreshold;
use command::{Command, PipelineDisplay};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

pub use command::{pipeline_commands, render_pipeline};
pub use connection::HookedConnection;

/// Slot holding the `Instant` recorded by a `before` stage
pub(crate) const START_TIME_KEY: ContextKey = ContextKey::new("redis_duration_hook.start_time");

/// Before/after interception points around single commands and pipelines
///
/// Implementations must tolerate `after` stages whose context never went
/// through the matching `before` stage.
pub trait ProcessHook: Send + Sync {
    fn before_process(&self, ctx: &Context, cmd: Option<&Command>) -> Result<Context, HookError>;

    fn after_process(&self, ctx: &Context, cmd: Option<&Command>) -> Result<(), HookError>;

    fn before_process_pipeline(
        &self,
        ctx: &Context,
        cmds: Option<&[Command]>,
    ) -> Result<Context, HookError>;

    fn after_process_pipeline(
        &self,
        ctx: &Context,
        cmds: Option<&[Command]>,
    ) -> Result<(), HookError>;
}

/// Span and slow-call hook
#[derive(Clone)]
pub struct DurationHook {
    tracer: Arc<dyn CommandTracer>,
    logger: SlowCallLogger,
}

impl DurationHook {
    /// Hook with local spans and the process-wide threshold
    pub fn new() -> Self {
        Self::with_tracer(Arc::new(LocalTracer::new()))
    }

    /// Hook starting spans through `tracer`
    pub fn with_tracer(tracer: Arc<dyn CommandTracer>) -> Self {
        Self {
            tracer,
            logger: SlowCallLogger::global(),
        }
    }

    /// Read the threshold from `threshold` instead of the process-wide setting
    pub fn with_threshold(mut self, threshold: Arc<SlowThreshold>) -> Self {
        self.logger = SlowCallLogger::new(threshold);
        self
    }

    pub fn logger(&self) -> &SlowCallLogger {
        &self.logger
    }

    fn start(&self, ctx: &Context) -> Result<Context, HookError> {
        let ctx = self.tracer.start(ctx, PROTOCOL_NAME)?;
        Ok(ctx.with_value(START_TIME_KEY, Instant::now()))
    }

    fn finish(&self, ctx: &Context, commands: &[Command], rendered: &dyn fmt::Display) {
        let Some(start) = ctx.value::<Instant>(&START_TIME_KEY) else {
            return;
        };
        let elapsed = start.elapsed();

        let span = span_from_context(ctx);
        if let Some(span) = span {
            span.record_outcome(commands);
            span.end();
        }

        let span: Option<&dyn CommandSpan> = span.map(|span| &**span);
        self.logger.log_if_slow(elapsed, rendered, span);
    }
}

impl Default for DurationHook {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DurationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DurationHook")
            .field("threshold", &self.logger.threshold())
            .finish_non_exhaustive()
    }
}

impl ProcessHook for DurationHook {
    fn before_process(&self, ctx: &Context, _cmd: Option<&Command>) -> Result<Context, HookError> {
        self.start(ctx)
    }

    fn after_process(&self, ctx: &Context, cmd: Option<&Command>) -> Result<(), HookError> {
        let commands = cmd.map(std::slice::from_ref).unwrap_or_default();
        self.finish(ctx, commands, &PipelineDisplay(commands));
        Ok(())
    }

    fn before_process_pipeline(
        &self,
        ctx: &Context,
        _cmds: Option<&[Command]>,
    ) -> Result<Context, HookError> {
        self.start(ctx)
    }

    fn after_process_pipeline(
        &self,
        ctx: &Context,
        cmds: Option<&[Command]>,
    ) -> Result<(), HookError> {
        let commands = cmds.unwrap_or_default();
        self.finish(ctx, commands, &PipelineDisplay(commands));
        Ok(())
    }
}
