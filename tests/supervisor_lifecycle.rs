//! Integration Tests for Supervisor Lifecycle Management
//!
//! These tests define the expected behavior of launching, polling,
//! terminating, and waiting on supervised children.

use overseer::{Error, ProcessCallbacks, ProcessOptions, ProcessSupervisor};
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Route tracing output through the test harness; controlled by RUST_LOG
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Get the appropriate echo command for the current platform
fn echo_command() -> (&'static str, Vec<String>) {
    #[cfg(windows)]
    {
        (
            "cmd.exe",
            vec!["/C".to_string(), "echo".to_string(), "hello".to_string()],
        )
    }
    #[cfg(not(windows))]
    {
        ("/bin/echo", vec!["hello".to_string()])
    }
}

/// Get a command that runs for roughly `seconds` seconds
fn sleep_command(seconds: u32) -> (&'static str, Vec<String>) {
    #[cfg(windows)]
    {
        (
            "cmd.exe",
            vec![
                "/C".to_string(),
                "ping".to_string(),
                "-n".to_string(),
                (seconds + 1).to_string(),
                "127.0.0.1".to_string(),
            ],
        )
    }
    #[cfg(not(windows))]
    {
        ("/bin/sleep", vec![seconds.to_string()])
    }
}

#[test]
fn test_poll_on_empty_registry_returns_false_without_callbacks() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    assert!(!supervisor.has_running_children());
    assert!(!supervisor.poll());
}

#[test]
fn test_event_order_started_then_output_then_exit() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let events = Arc::new(Mutex::new(Vec::<String>::new()));

    let started_events = Arc::clone(&events);
    let stdout_events = Arc::clone(&events);
    let exit_events = Arc::clone(&events);

    let callbacks = ProcessCallbacks {
        on_started: Some(Box::new(move |_ops| {
            started_events.lock().unwrap().push("started".to_string());
        })),
        on_stdout: Some(Box::new(move |_ops, text| {
            stdout_events
                .lock()
                .unwrap()
                .push(format!("stdout:{}", text));
        })),
        on_exit: Some(Box::new(move |status| {
            exit_events.lock().unwrap().push(format!("exit:{}", status));
        })),
        ..Default::default()
    };

    let (program, args) = echo_command();
    supervisor
        .run_program(program, &args, ProcessOptions::default(), callbacks)
        .expect("echo should launch");
    assert!(supervisor.has_running_children());

    assert!(
        supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))),
        "echo child should exit well within the timeout"
    );
    assert!(!supervisor.has_running_children());

    let events = events.lock().unwrap();
    assert_eq!(
        events.first().map(String::as_str),
        Some("started"),
        "on_started must be the first event; got {:?}",
        *events
    );
    assert_eq!(
        events.last().map(String::as_str),
        Some("exit:0"),
        "on_exit(0) must be the last event; got {:?}",
        *events
    );
    assert_eq!(
        events.iter().filter(|e| *e == "started").count(),
        1,
        "on_started must fire exactly once"
    );
    assert_eq!(
        events.iter().filter(|e| e.starts_with("exit:")).count(),
        1,
        "on_exit must fire exactly once"
    );

    // Output may be split across calls but concatenates to "hello"
    let stdout: String = events
        .iter()
        .filter_map(|e| e.strip_prefix("stdout:"))
        .collect();
    assert_eq!(stdout.trim(), "hello");
}

#[test]
fn test_terminate_from_on_started_exits_with_status_15() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let exit_status = Arc::new(AtomicI32::new(i32::MIN));
    let observed = Arc::clone(&exit_status);

    let callbacks = ProcessCallbacks {
        on_started: Some(Box::new(|ops| {
            ops.terminate().expect("terminate should be accepted");
        })),
        on_exit: Some(Box::new(move |status| {
            observed.store(status, Ordering::SeqCst);
        })),
        ..Default::default()
    };

    let (program, args) = sleep_command(5);
    supervisor
        .run_program(program, &args, ProcessOptions::default(), callbacks)
        .expect("sleep should launch");

    assert!(
        supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))),
        "terminated child should exit well before its sleep completes"
    );
    assert_eq!(exit_status.load(Ordering::SeqCst), 15);
}

#[test]
fn test_on_continue_false_terminates_the_child() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let exit_status = Arc::new(AtomicI32::new(i32::MIN));
    let observed = Arc::clone(&exit_status);
    let continue_calls = Arc::new(AtomicUsize::new(0));
    let calls = Arc::clone(&continue_calls);

    let callbacks = ProcessCallbacks {
        on_continue: Some(Box::new(move |_ops| {
            calls.fetch_add(1, Ordering::SeqCst);
            false
        })),
        on_exit: Some(Box::new(move |status| {
            observed.store(status, Ordering::SeqCst);
        })),
        ..Default::default()
    };

    let (program, args) = sleep_command(5);
    supervisor
        .run_program(program, &args, ProcessOptions::default(), callbacks)
        .expect("sleep should launch");

    assert!(supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))));
    assert!(continue_calls.load(Ordering::SeqCst) >= 1);
    assert_eq!(exit_status.load(Ordering::SeqCst), 15);
}

#[test]
fn test_wait_times_out_on_long_running_child() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let (program, args) = sleep_command(5);

    supervisor
        .run_program(
            program,
            &args,
            ProcessOptions::default(),
            ProcessCallbacks::default(),
        )
        .expect("sleep should launch");

    let completed = supervisor.wait(Duration::from_millis(10), Some(Duration::from_millis(50)));
    assert!(!completed, "wait should time out after 50ms");
    assert!(
        supervisor.has_running_children(),
        "the handle must still be registered after a timeout"
    );

    // Cleanup: terminate and drive the handle to its exit
    supervisor.terminate_all();
    assert!(
        supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))),
        "terminated child should be reaped"
    );
}

#[test]
fn test_nonexistent_executable_fails_synchronously_without_callbacks() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let fired = Arc::new(AtomicBool::new(false));

    let started_fired = Arc::clone(&fired);
    let exit_fired = Arc::clone(&fired);
    let error_fired = Arc::clone(&fired);
    let callbacks = ProcessCallbacks {
        on_started: Some(Box::new(move |_| {
            started_fired.store(true, Ordering::SeqCst)
        })),
        on_error: Some(Box::new(move |_, _| {
            error_fired.store(true, Ordering::SeqCst)
        })),
        on_exit: Some(Box::new(move |_| exit_fired.store(true, Ordering::SeqCst))),
        ..Default::default()
    };

    let result = supervisor.run_program(
        "/nonexistent/overseer-test-binary",
        &[],
        ProcessOptions::default(),
        callbacks,
    );

    assert!(matches!(result, Err(Error::LaunchFailed { .. })));
    assert!(!supervisor.has_running_children());

    // Poll a few times to prove nothing was registered
    for _ in 0..5 {
        assert!(!supervisor.poll());
    }
    assert!(
        !fired.load(Ordering::SeqCst),
        "no callback may fire for a failed launch"
    );
}

#[test]
fn test_multiple_children_all_reach_exit() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let exits = Arc::new(AtomicUsize::new(0));

    for _ in 0..3 {
        let exits = Arc::clone(&exits);
        let callbacks = ProcessCallbacks {
            on_exit: Some(Box::new(move |_| {
                exits.fetch_add(1, Ordering::SeqCst);
            })),
            ..Default::default()
        };
        let (program, args) = echo_command();
        supervisor
            .run_program(program, &args, ProcessOptions::default(), callbacks)
            .expect("echo should launch");
    }

    assert!(supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))));
    assert_eq!(exits.load(Ordering::SeqCst), 3);
}

#[cfg(unix)]
#[test]
fn test_terminate_children_takes_down_the_process_group() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let stdout = Arc::new(Mutex::new(String::new()));
    let exit_status = Arc::new(AtomicI32::new(i32::MIN));

    let stdout_sink = Arc::clone(&stdout);
    let observed = Arc::clone(&exit_status);
    let callbacks = ProcessCallbacks {
        on_stdout: Some(Box::new(move |_, text| {
            stdout_sink.lock().unwrap().push_str(text);
        })),
        on_exit: Some(Box::new(move |status| {
            observed.store(status, Ordering::SeqCst);
        })),
        ..Default::default()
    };

    let options = ProcessOptions {
        terminate_children: true,
        ..Default::default()
    };
    // The shell prints its background child's pid and then blocks on it
    supervisor
        .run_command("sleep 30 & echo $!; wait", options, callbacks)
        .expect("shell should launch");

    // Poll until the grandchild pid arrives on stdout
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    let grandchild = loop {
        supervisor.poll();
        if let Ok(pid) = stdout.lock().unwrap().trim().parse::<u32>() {
            break pid;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "grandchild pid never arrived; stdout was {:?}",
            *stdout.lock().unwrap()
        );
        std::thread::sleep(Duration::from_millis(10));
    };

    supervisor.terminate_all();
    assert!(
        supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))),
        "the terminated shell should be reaped"
    );
    assert_eq!(exit_status.load(Ordering::SeqCst), 15);

    // The whole process group was signalled, so the sleeping grandchild
    // must also be gone (kill -0 stops succeeding once it is)
    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    loop {
        let alive = std::process::Command::new("kill")
            .args(["-0", &grandchild.to_string()])
            .status()
            .map(|status| status.success())
            .unwrap_or(false);
        if !alive {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "grandchild pid {} survived group termination",
            grandchild
        );
        std::thread::sleep(Duration::from_millis(20));
    }
}

#[cfg(unix)]
#[test]
fn test_run_command_with_input_assembles_a_result() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let slot = Arc::new(Mutex::new(None));
    let completion_slot = Arc::clone(&slot);

    supervisor
        .run_command_with_input("cat", "piped input", ProcessOptions::default(), move |r| {
            *completion_slot.lock().unwrap() = Some(r);
        })
        .expect("cat should launch");

    assert!(supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))));

    let result = slot.lock().unwrap().take().expect("result must arrive");
    assert_eq!(result.stdout, "piped input");
    assert_eq!(result.exit_status, 0);
    assert!(result.success());
}

#[cfg(unix)]
#[test]
fn test_redirect_stderr_to_stdout_routes_stderr_through_stdout() {
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let stdout = Arc::new(Mutex::new(String::new()));
    let stderr = Arc::new(Mutex::new(String::new()));

    let stdout_sink = Arc::clone(&stdout);
    let stderr_sink = Arc::clone(&stderr);
    let callbacks = ProcessCallbacks {
        on_stdout: Some(Box::new(move |_, text| {
            stdout_sink.lock().unwrap().push_str(text);
        })),
        on_stderr: Some(Box::new(move |_, text| {
            stderr_sink.lock().unwrap().push_str(text);
        })),
        ..Default::default()
    };

    let options = ProcessOptions {
        redirect_stderr_to_stdout: true,
        ..Default::default()
    };
    supervisor
        .run_command("echo to-stderr 1>&2", options, callbacks)
        .expect("shell should launch");

    assert!(supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))));
    assert!(stdout.lock().unwrap().contains("to-stderr"));
    assert!(stderr.lock().unwrap().is_empty());
}

#[cfg(unix)]
#[test]
fn test_working_directory_applies_to_the_child() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_logging();
    let mut supervisor = ProcessSupervisor::new();
    let slot = Arc::new(Mutex::new(None));
    let completion_slot = Arc::clone(&slot);

    let options = ProcessOptions {
        working_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    supervisor
        .run_command_with_input("pwd", "", options, move |r| {
            *completion_slot.lock().unwrap() = Some(r);
        })
        .expect("pwd should launch");

    assert!(supervisor.wait(Duration::from_millis(10), Some(Duration::from_secs(10))));
    let result = slot.lock().unwrap().take().expect("result must arrive");
    // Canonicalize to tolerate symlinked temp roots (e.g. /tmp on macOS)
    let reported = std::path::PathBuf::from(result.stdout.trim());
    assert_eq!(
        reported.canonicalize().ok(),
        dir.path().canonicalize().ok()
    );
}

#[cfg(unix)]
#[test]
fn test_environment_override_reaches_the_child() {
    use std::collections::HashMap;

    init_logging();
    let mut environment = HashMap::new();
    environment.insert("OVERSEER_MARKER".to_string(), "present".to_string());

    let options = ProcessOptions {
        environment: Some(environment),
        inherit_environment: true,
        ..Default::default()
    };

    let result = overseer::run::run_command("echo $OVERSEER_MARKER", options)
        .expect("shell should launch");
    assert_eq!(result.stdout.trim(), "present");
}
