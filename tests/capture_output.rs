// tests/capture_output.rs

use std::error::Error;
use std::time::{Duration, Instant};

use runprog::exec::{Interrupt, LaunchOptions, ProgramExecutor, ProgramState};
use runprog_test_utils::builders::ShellScript;
use runprog_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn three_lines_and_success() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new()
        .stdout("1")
        .stdout("2")
        .stdout("3")
        .command();

    let mut running = with_timeout(exec.execute(args, true, false)).await?;
    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;

    assert_eq!(lines, vec!["1", "2", "3"]);
    assert_eq!(running.exit_code()?, 0);
    Ok(())
}

#[tokio::test]
async fn one_line_then_exit_42() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new().stdout("only line").exit(42).command();
    let mut running = with_timeout(exec.execute(args, true, false)).await?;

    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    assert_eq!(lines, vec!["only line"]);
    assert_eq!(running.exit_code()?, 42);
    Ok(())
}

#[tokio::test]
async fn no_output_gives_an_empty_sequence() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new().command();
    let mut running = with_timeout(exec.execute(args, true, false)).await?;

    assert!(running.is_exited());
    let mut output = running.take_output().ok_or("stdout not captured")?;
    assert_eq!(output.next_line().await, None);
    assert_eq!(running.exit_code()?, 0);
    Ok(())
}

#[tokio::test]
async fn exit_code_reads_are_stable() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new().exit(5).command();
    let running = with_timeout(exec.execute(args, true, false)).await?;

    let first = running.exit_code()?;
    for _ in 0..10 {
        assert_eq!(running.exit_code()?, first);
    }
    assert_eq!(first, 5);
    Ok(())
}

#[tokio::test]
async fn all_output_is_queued_by_the_time_execute_returns() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new()
        .stdout("before")
        .sleep_ms(100)
        .stdout("after")
        .command();
    let mut running = with_timeout(exec.execute(args, true, false)).await?;
    let output = running.take_output().ok_or("stdout not captured")?;

    assert_eq!(output.buffered(), 2);
    assert_eq!(output.collect_lines().await, vec!["before", "after"]);
    Ok(())
}

#[tokio::test]
async fn stderr_is_captured_separately_when_requested() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new()
        .stdout("out 1")
        .stderr("err 1")
        .stdout("out 2")
        .command();
    let mut running = with_timeout(exec.execute(args, true, true)).await?;

    let out = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    let err = running.take_stderr().ok_or("stderr not captured")?.collect_lines().await;

    assert_eq!(out, vec!["out 1", "out 2"]);
    assert_eq!(err, vec!["err 1"]);
    Ok(())
}

#[tokio::test]
async fn uncaptured_streams_have_no_sequence() -> TestResult {
    init_tracing();

    let (exec, args) = ShellScript::new().command();
    let mut running = with_timeout(exec.execute(args, false, false)).await?;

    assert!(running.take_output().is_none());
    assert!(running.take_stderr().is_none());
    assert_eq!(running.exit_code()?, 0);
    Ok(())
}

#[tokio::test]
async fn crlf_and_blank_lines_are_preserved_as_items() -> TestResult {
    init_tracing();

    let exec = ProgramExecutor::new("printf");
    let mut running = with_timeout(exec.execute(["a\\r\\n\\nb\\n"], true, false)).await?;

    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    assert_eq!(lines, vec!["a", "", "b"]);
    Ok(())
}

#[tokio::test]
async fn final_line_without_newline_is_kept() -> TestResult {
    init_tracing();

    let exec = ProgramExecutor::new("printf");
    let mut running = with_timeout(exec.execute(["x\\ny"], true, false)).await?;

    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    assert_eq!(lines, vec!["x", "y"]);
    Ok(())
}

#[tokio::test]
async fn timeout_kills_and_keeps_earlier_lines() -> TestResult {
    init_tracing();

    // The shell's own `sleep` child keeps the pipe open after the shell is
    // killed; the timeout must still end the wait.
    let (exec, args) = ShellScript::new().stdout("started").sleep_ms(30_000).command();
    let options = LaunchOptions::new().timeout(Duration::from_millis(300));

    let mut running = with_timeout(exec.execute_with(&args, &options)).await?;

    assert!(running.timed_out());
    match running.state() {
        ProgramState::Exited(info) => {
            assert_eq!(info.interrupted, Some(Interrupt::TimedOut));
            assert!(!info.status.success());
        }
        other => panic!("expected exited state, got {other:?}"),
    }

    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    assert_eq!(lines, vec!["started"]);
    Ok(())
}

#[tokio::test]
async fn invalid_utf8_does_not_swallow_later_lines() -> TestResult {
    init_tracing();

    let exec = ProgramExecutor::new("sh");
    let mut running = with_timeout(exec.execute(
        ["-c", "echo one; printf 'caf\\351\\n'; echo three"],
        true,
        false,
    ))
    .await?;

    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    assert_eq!(lines, vec!["one", "caf\u{FFFD}", "three"]);
    assert_eq!(running.exit_code()?, 0);
    Ok(())
}

#[tokio::test]
async fn timeout_bounds_a_pipe_held_open_by_a_background_child() -> TestResult {
    init_tracing();

    let exec = ProgramExecutor::new("sh");
    let options = LaunchOptions::new().timeout(Duration::from_millis(300));

    let started = Instant::now();
    let mut running = with_timeout(exec.execute_with(["-c", "sleep 4 & echo hi"], &options)).await?;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(running.timed_out());
    // The shell itself exited normally; only the drain was cut short.
    assert_eq!(running.exit_code()?, 0);

    let lines = running.take_output().ok_or("stdout not captured")?.collect_lines().await;
    assert_eq!(lines, vec!["hi"]);
    Ok(())
}

#[test]
fn blocking_consumer_outside_the_runtime() -> TestResult {
    init_tracing();

    let rt = tokio::runtime::Runtime::new()?;
    let mut running = rt.block_on(async {
        let (exec, args) = ShellScript::new().stdout("x").stdout("y").command();
        exec.execute(args, true, false).await
    })?;

    let lines: Vec<String> = running
        .take_output()
        .ok_or("stdout not captured")?
        .into_blocking()
        .collect();

    assert_eq!(lines, vec!["x", "y"]);
    assert_eq!(running.exit_code()?, 0);
    Ok(())
}
