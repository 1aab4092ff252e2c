// Hook lifecycle tests through the public API only

use super::log_capture;
use redis_duration_hook::observability::{span_from_context, SlowThreshold};
use redis_duration_hook::{Command, Context, DurationHook, ProcessHook};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn hook_with_threshold(ms: u64) -> DurationHook {
    let threshold = Arc::new(SlowThreshold::new(Duration::from_millis(ms)));
    DurationHook::new().with_threshold(threshold)
}

#[test]
fn test_fast_command_stays_silent() {
    let hook = hook_with_threshold(100);
    let cmd = Command::new(["GET", "foo"]);

    let (_, logs) = log_capture::capture(|| {
        let ctx = hook.before_process(&Context::background(), Some(&cmd)).unwrap();
        thread::sleep(Duration::from_millis(1));
        hook.after_process(&ctx, Some(&cmd)).unwrap();
    });

    assert!(logs.slow_lines().is_empty(), "{}", logs.contents());
}

#[test]
fn test_slow_command_reports_command_and_ids() {
    let hook = hook_with_threshold(100);
    let cmd = Command::new(["SET", "foo", "bar"]);

    let (ids, logs) = log_capture::capture(|| {
        let ctx = hook.before_process(&Context::background(), Some(&cmd)).unwrap();
        let span = span_from_context(&ctx).expect("before_process starts a span");
        assert_eq!(span.name(), "redis");

        thread::sleep(Duration::from_millis(101));
        hook.after_process(&ctx, Some(&cmd)).unwrap();
        assert!(span.is_ended());
        span.ids()
    });

    let lines = logs.slow_lines();
    assert_eq!(lines.len(), 1, "{}", logs.contents());
    let line = &lines[0];
    assert!(line.contains("slow"));
    assert!(line.contains("SET foo bar"));
    assert!(!ids.0.is_empty() && !ids.1.is_empty());
    assert!(line.contains(&format!("trace={}", ids.0)));
    assert!(line.contains(&format!("span={}", ids.1)));
}

#[test]
fn test_slow_pipeline_reports_one_line() {
    let hook = hook_with_threshold(20);
    let cmds = vec![
        Command::new(["SET", "foo", "bar"]),
        Command::new(["GET", "foo"]),
    ];

    let (_, logs) = log_capture::capture(|| {
        let ctx = hook
            .before_process_pipeline(&Context::background(), Some(cmds.as_slice()))
            .unwrap();
        thread::sleep(Duration::from_millis(25));
        hook.after_process_pipeline(&ctx, Some(cmds.as_slice())).unwrap();
    });

    let lines = logs.slow_lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("SET foo bar; GET foo"));
}

#[test]
fn test_after_without_before_is_silent() {
    let hook = hook_with_threshold(0);
    let cmd = Command::new(["PING"]);

    let (result, logs) =
        log_capture::capture(|| hook.after_process(&Context::background(), Some(&cmd)));

    assert!(result.is_ok());
    assert!(logs.contents().is_empty());
}

#[test]
fn test_absent_pipeline_is_timed_like_a_command() {
    let hook = hook_with_threshold(10);

    let (_, logs) = log_capture::capture(|| {
        let ctx = hook
            .before_process_pipeline(&Context::background(), None)
            .unwrap();
        thread::sleep(Duration::from_millis(15));
        hook.after_process_pipeline(&ctx, None).unwrap();
    });

    assert_eq!(logs.slow_lines().len(), 1);
}

#[test]
fn test_pairs_on_many_threads_with_changing_threshold() {
    let setting = Arc::new(SlowThreshold::new(Duration::from_millis(50)));
    let hook = Arc::new(DurationHook::new().with_threshold(Arc::clone(&setting)));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let hook = Arc::clone(&hook);
            thread::spawn(move || {
                for n in 0..50 {
                    let key = format!("key:{}:{}", i, n);
                    let cmd = Command::new(["GET", key.as_str()]);
                    let ctx = hook.before_process(&Context::background(), Some(&cmd)).unwrap();
                    hook.after_process(&ctx, Some(&cmd)).unwrap();
                }
            })
        })
        .collect();

    for ms in 0..100 {
        setting.store(Duration::from_millis(ms % 7));
    }

    for worker in workers {
        worker.join().unwrap();
    }
}
