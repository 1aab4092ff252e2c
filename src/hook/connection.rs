// Hooked Redis connection
//
// Wraps an async Redis connection and runs a `ProcessHook` around every
// command and pipeline. The `after` stage always runs, including when the
// command fails, so spans are closed and slow failures are still reported.

use crate::config::RedisConfig;
use crate::context::Context;
use crate::error::HookError;
use crate::hook::command::{pipeline_commands, Command};
use crate::hook::{DurationHook, ProcessHook};
use redis::aio::{ConnectionLike, ConnectionManager};
use redis::{Client, Cmd, FromRedisValue, Pipeline, RedisError, RedisResult, Value};

/// Async Redis connection with a hook around each round trip
pub struct HookedConnection<C, H = DurationHook> {
    inner: C,
    hook: H,
}

impl HookedConnection<ConnectionManager, DurationHook> {
    /// Connect through a `ConnectionManager` (multiplexed, reconnecting)
    ///
    /// # Errors
    ///
    /// - `HookError::Configuration` if `redis_url` is missing or invalid
    /// - `HookError::ConnectTimeout` if the server does not answer in time
    /// - `HookError::Redis` if the connection is refused
    pub async fn connect(config: &RedisConfig, hook: DurationHook) -> Result<Self, HookError> {
        let redis_url = config
            .redis_url
            .as_ref()
            .ok_or_else(|| HookError::Configuration("redis_url is required".to_string()))?;

        let client = Client::open(redis_url.as_str())
            .map_err(|e| HookError::Configuration(format!("Invalid Redis URL: {}", e)))?;

        let connection =
            tokio::time::timeout(config.connection_timeout(), ConnectionManager::new(client))
                .await
                .map_err(|_| HookError::ConnectTimeout(config.connection_timeout_ms))??;

        tracing::debug!(
            connection_timeout_ms = config.connection_timeout_ms,
            "Connected to Redis"
        );

        Ok(Self::new(connection, hook))
    }
}

impl<C, H> HookedConnection<C, H>
where
    C: ConnectionLike + Send,
    H: ProcessHook,
{
    pub fn new(inner: C, hook: H) -> Self {
        Self { inner, hook }
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Execute one command with the hook around it
    ///
    /// Returns the command's own result; the hook can only fail the call in
    /// its `before` stage. Only transport and server errors are recorded on
    /// the command. The reply is converted to `T` after the `after` stage, so
    /// a nil reply read into a non-optional type fails the call without
    /// marking the command as failed.
    pub async fn query<T: FromRedisValue>(
        &mut self,
        ctx: &Context,
        cmd: &Cmd,
    ) -> Result<T, HookError> {
        let mut command = Command::from(cmd);
        let ctx = self.hook.before_process(ctx, Some(&command))?;

        let reply: RedisResult<Value> = cmd.query_async(&mut self.inner).await;
        if let Err(err) = &reply {
            command = command.with_error(err.to_string());
        }

        self.hook.after_process(&ctx, Some(&command))?;
        convert(reply?)
    }

    /// Execute a pipeline with the hook around it
    pub async fn query_pipeline<T: FromRedisValue>(
        &mut self,
        ctx: &Context,
        pipeline: &Pipeline,
    ) -> Result<T, HookError> {
        let mut commands = pipeline_commands(pipeline);
        let ctx = self
            .hook
            .before_process_pipeline(ctx, Some(commands.as_slice()))?;

        let reply: RedisResult<Value> = pipeline.query_async(&mut self.inner).await;
        if let Err(err) = &reply {
            // The reply does not say which command failed; attribute it to all
            let message = err.to_string();
            commands = commands
                .into_iter()
                .map(|cmd| cmd.with_error(message.clone()))
                .collect();
        }

        self.hook
            .after_process_pipeline(&ctx, Some(commands.as_slice()))?;
        convert(reply?)
    }
}

fn convert<T: FromRedisValue>(reply: Value) -> Result<T, HookError> {
    redis::from_redis_value(reply)
        .map_err(RedisError::from)
        .map_err(HookError::from)
}
