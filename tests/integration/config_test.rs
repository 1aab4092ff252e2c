// Configuration applied to the process-wide threshold

use super::log_capture;
use redis_duration_hook::{slow_threshold, Command, Context, DurationHook, HookConfig, ProcessHook};
use std::io::Write;
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

// The only test in this binary that writes the process-wide threshold
#[test]
fn test_applied_config_drives_default_hooks() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
redis:
  redis_url: "redis://127.0.0.1:6379"
observability:
  slow_call:
    threshold_ms: 5
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = HookConfig::from_file(file.path()).unwrap();
    config.validate().unwrap();
    config.apply();
    assert_eq!(slow_threshold(), Duration::from_millis(5));

    let hook = DurationHook::new();
    let cmd = Command::new(["HGETALL", "session:42"]);
    let (_, logs) = log_capture::capture(|| {
        let ctx = hook.before_process(&Context::background(), Some(&cmd)).unwrap();
        thread::sleep(Duration::from_millis(10));
        hook.after_process(&ctx, Some(&cmd)).unwrap();
    });

    let lines = logs.slow_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("HGETALL session:42"));
    assert!(lines[0].contains("threshold_ms=5"));

    redis_duration_hook::set_slow_threshold(Duration::from_millis(100));
}
