// Hooked connection against a real Redis server
//
// Requires Docker: cargo test --test integration_tests -- --ignored

use super::log_capture;
use redis_duration_hook::observability::SlowThreshold;
use redis_duration_hook::{Context, DurationHook, HookError, HookedConnection, RedisConfig};
use std::sync::Arc;
use std::time::Duration;
use testcontainers::{clients::Cli, RunnableImage};
use testcontainers_modules::redis::Redis;

fn hook_with_threshold(ms: u64) -> DurationHook {
    let threshold = Arc::new(SlowThreshold::new(Duration::from_millis(ms)));
    DurationHook::new().with_threshold(threshold)
}

fn config_for_port(port: u16) -> RedisConfig {
    RedisConfig {
        redis_url: Some(format!("redis://127.0.0.1:{}", port)),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_set_and_get_through_hooked_connection() {
    let docker = Cli::default();
    let redis_container = docker.run(RunnableImage::from(Redis::default()));
    let config = config_for_port(redis_container.get_host_port_ipv4(6379));

    let (_guard, logs) = log_capture::install();
    let mut conn = HookedConnection::connect(&config, hook_with_threshold(1000))
        .await
        .unwrap();
    let ctx = Context::background();

    let _: () = conn
        .query(&ctx, redis::cmd("SET").arg("foo").arg("bar"))
        .await
        .unwrap();
    let value: Option<String> = conn.query(&ctx, redis::cmd("GET").arg("foo")).await.unwrap();
    let missing: Option<String> = conn
        .query(&ctx, redis::cmd("GET").arg("missing"))
        .await
        .unwrap();

    assert_eq!(value.as_deref(), Some("bar"));
    assert_eq!(missing, None);
    assert!(logs.slow_lines().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_blocking_command_is_reported_as_slow() {
    let docker = Cli::default();
    let redis_container = docker.run(RunnableImage::from(Redis::default()));
    let config = config_for_port(redis_container.get_host_port_ipv4(6379));

    let (_guard, logs) = log_capture::install();
    let mut conn = HookedConnection::connect(&config, hook_with_threshold(50))
        .await
        .unwrap();

    // BLPOP on an empty list blocks for the full second and replies nil
    let popped: Option<(String, String)> = conn
        .query(
            &Context::background(),
            redis::cmd("BLPOP").arg("empty-queue").arg(1),
        )
        .await
        .unwrap();

    assert!(popped.is_none());
    let lines = logs.slow_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("BLPOP empty-queue 1"));
    assert!(lines[0].contains("trace="));
}

#[tokio::test]
#[ignore]
async fn test_pipeline_through_hooked_connection() {
    let docker = Cli::default();
    let redis_container = docker.run(RunnableImage::from(Redis::default()));
    let config = config_for_port(redis_container.get_host_port_ipv4(6379));

    let mut conn = HookedConnection::connect(&config, hook_with_threshold(1000))
        .await
        .unwrap();

    let mut pipe = redis::pipe();
    pipe.cmd("INCR").arg("hits");
    pipe.cmd("INCR").arg("hits");
    pipe.cmd("EXPIRE").arg("hits").arg(60).ignore();

    let (first, second): (i64, i64) = conn
        .query_pipeline(&Context::background(), &pipe)
        .await
        .unwrap();
    assert_eq!((first, second), (1, 2));
}

#[tokio::test]
#[ignore]
async fn test_command_error_is_returned_after_hook_runs() {
    let docker = Cli::default();
    let redis_container = docker.run(RunnableImage::from(Redis::default()));
    let config = config_for_port(redis_container.get_host_port_ipv4(6379));

    let (_guard, logs) = log_capture::install();
    let mut conn = HookedConnection::connect(&config, hook_with_threshold(0))
        .await
        .unwrap();
    let ctx = Context::background();

    let _: () = conn
        .query(&ctx, redis::cmd("SET").arg("name").arg("value"))
        .await
        .unwrap();
    let result: Result<i64, HookError> = conn.query(&ctx, redis::cmd("INCR").arg("name")).await;

    assert!(matches!(result, Err(HookError::Redis(_))));
    // Zero threshold: both calls are reported, the failing one included
    assert_eq!(logs.slow_lines().len(), 2);
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let config = RedisConfig {
        redis_url: Some("redis://127.0.0.1:1".to_string()),
        connection_timeout_ms: 500,
    };

    let result = HookedConnection::connect(&config, DurationHook::new()).await;
    assert!(matches!(
        result,
        Err(HookError::Redis(_)) | Err(HookError::ConnectTimeout(500))
    ));
}
