// src/exec/running.rs

//! Handle for one launched child process.
//!
//! A [`RunningProgram`] owns the child and one reader task per captured
//! stream. Each reader turns the pipe into lines and pushes them into an
//! [`OutputQueue`]; the handle keeps its own producer clone per queue and
//! drops it only after the exit has been observed and the reader has hit
//! EOF. That ordering is what guarantees the consumer never sees the end of
//! the sequence before a line the child wrote before exiting.

use std::fmt;
use std::future::pending;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::errors::{Result, RunError};
use crate::exec::output::{output_queue, OutputLines, OutputQueue};

/// Why a process was stopped before it exited on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    TimedOut,
    Cancelled,
}

/// Final state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    /// OS exit code, or `-1` when the process was terminated by a signal.
    pub code: i32,
    pub status: ExitStatus,
    pub interrupted: Option<Interrupt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramState {
    WaitingForExit,
    Exited(ExitInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::Stdout => f.write_str("stdout"),
            StreamKind::Stderr => f.write_str("stderr"),
        }
    }
}

/// One captured pipe: the consumer half (until taken), the handle's own
/// producer clone, and the reader task.
#[derive(Debug)]
struct CapturedStream {
    lines: Option<OutputLines>,
    completion: Option<OutputQueue>,
    reader: Option<JoinHandle<()>>,
}

impl CapturedStream {
    fn start<R>(program: &str, kind: StreamKind, pipe: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (queue, lines) = output_queue();
        let producer = queue.clone();
        let program = program.to_string();

        let reader = tokio::spawn(async move {
            let mut pipe = BufReader::new(pipe);
            let mut buf = Vec::new();
            let mut consumer_gone = false;
            loop {
                buf.clear();
                match pipe.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        // Keep reading even if nobody listens, so the child
                        // never stalls on a full pipe.
                        if consumer_gone {
                            continue;
                        }
                        let line = decode_line(&buf);
                        trace!(program = %program, stream = %kind, "{}", line);
                        if !producer.push(line) {
                            consumer_gone = true;
                            debug!(
                                program = %program,
                                stream = %kind,
                                "output consumer dropped; discarding further lines"
                            );
                        }
                    }
                    Err(e) => {
                        warn!(
                            program = %program,
                            stream = %kind,
                            error = %e,
                            "failed reading output; stopping capture"
                        );
                        break;
                    }
                }
            }
            debug!(program = %program, stream = %kind, "output reader reached end of stream");
        });

        Self {
            lines: Some(lines),
            completion: Some(queue),
            reader: Some(reader),
        }
    }

    /// Wait for the reader to hit EOF, then signal completion.
    async fn finish(&mut self, program: &str, kind: StreamKind) {
        // The handle stays in place until the join completes, so an
        // interrupted finish can still be aborted by `abandon`.
        if let Some(reader) = self.reader.as_mut() {
            let joined = reader.await;
            self.reader = None;
            if let Err(e) = joined {
                warn!(program = %program, stream = %kind, error = %e, "output reader task failed");
            }
        }
        if let Some(queue) = self.completion.take() {
            queue.complete();
        }
    }

    /// Stop the reader without waiting for EOF. Lines already queued stay.
    async fn abandon(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            let _ = reader.await;
        }
        if let Some(queue) = self.completion.take() {
            queue.complete();
        }
    }
}

/// One raw line without its `\n` / `\r\n`, invalid UTF-8 replaced.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// A launched child process plus its output capture.
#[derive(Debug)]
pub struct RunningProgram {
    program: String,
    pid: Option<u32>,
    child: Child,
    started: Instant,
    timeout: Option<Duration>,
    stdout: Option<CapturedStream>,
    stderr: Option<CapturedStream>,
    state: ProgramState,
}

impl RunningProgram {
    /// Wrap a freshly spawned child and start reading its piped streams.
    ///
    /// Must be called from within a Tokio runtime.
    pub(crate) fn attach(program: String, mut child: Child, timeout: Option<Duration>) -> Self {
        let pid = child.id();
        let stdout = child
            .stdout
            .take()
            .map(|pipe| CapturedStream::start(&program, StreamKind::Stdout, pipe));
        let stderr = child
            .stderr
            .take()
            .map(|pipe| CapturedStream::start(&program, StreamKind::Stderr, pipe));

        Self {
            program,
            pid,
            child,
            started: Instant::now(),
            timeout,
            stdout,
            stderr,
            state: ProgramState::WaitingForExit,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// OS process id, if the child was still alive when attached.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn state(&self) -> ProgramState {
        self.state
    }

    pub fn is_exited(&self) -> bool {
        matches!(self.state, ProgramState::Exited(_))
    }

    pub fn exit_info(&self) -> Option<ExitInfo> {
        match self.state {
            ProgramState::Exited(info) => Some(info),
            ProgramState::WaitingForExit => None,
        }
    }

    /// `true` if the process was killed because it outlived its timeout.
    pub fn timed_out(&self) -> bool {
        self.exit_info()
            .is_some_and(|info| info.interrupted == Some(Interrupt::TimedOut))
    }

    /// Exit code of the finished process.
    ///
    /// Returns [`RunError::NotExited`] while the process is still running.
    pub fn exit_code(&self) -> Result<i32> {
        match self.state {
            ProgramState::Exited(info) => Ok(info.code),
            ProgramState::WaitingForExit => Err(RunError::NotExited(self.program.clone())),
        }
    }

    /// Captured stdout lines. `None` if stdout was not captured or the
    /// sequence was already taken.
    pub fn take_output(&mut self) -> Option<OutputLines> {
        self.stdout.as_mut().and_then(|s| s.lines.take())
    }

    /// Captured stderr lines, same rules as [`RunningProgram::take_output`].
    pub fn take_stderr(&mut self) -> Option<OutputLines> {
        self.stderr.as_mut().and_then(|s| s.lines.take())
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// Without a configured timeout this waits forever. Calling it again
    /// after exit returns the same code.
    pub async fn wait(&mut self) -> Result<i32> {
        self.wait_inner(None).await
    }

    /// Like [`RunningProgram::wait`], but kills the child when `cancel`
    /// fires. Dropping the sender is not treated as a cancellation.
    pub async fn wait_or_cancel(&mut self, cancel: oneshot::Receiver<()>) -> Result<i32> {
        self.wait_inner(Some(cancel)).await
    }

    async fn wait_inner(&mut self, cancel: Option<oneshot::Receiver<()>>) -> Result<i32> {
        if let ProgramState::Exited(info) = self.state {
            return Ok(info.code);
        }

        let deadline = self.timeout.map(|t| self.started + t);
        let timer = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => pending::<()>().await,
            }
        };
        let cancelled = async move {
            match cancel {
                Some(rx) => {
                    if rx.await.is_err() {
                        pending::<()>().await;
                    }
                }
                None => pending::<()>().await,
            }
        };
        // Bounds both the exit itself and the drain of the pipes afterwards.
        let interrupt = async move {
            tokio::select! {
                () = timer => Interrupt::TimedOut,
                () = cancelled => Interrupt::Cancelled,
            }
        };
        tokio::pin!(interrupt);

        let outcome = tokio::select! {
            res = self.child.wait() => Ok(res),
            why = &mut interrupt => Err(why),
        };

        let (status, interrupted) = match outcome {
            Ok(Ok(status)) => {
                let drained = tokio::select! {
                    () = self.finish_streams() => None,
                    why = &mut interrupt => Some(why),
                };
                if let Some(why) = drained {
                    warn!(
                        program = %self.program,
                        pid = ?self.pid,
                        reason = ?why,
                        "process exited but its output pipes are still open; abandoning capture"
                    );
                    self.abandon_streams().await;
                }
                (status, drained)
            }
            Ok(Err(source)) => {
                self.abandon_streams().await;
                return Err(RunError::Wait {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(why) => {
                info!(
                    program = %self.program,
                    pid = ?self.pid,
                    reason = ?why,
                    "stopping process before it exited"
                );
                if let Err(e) = self.child.start_kill() {
                    warn!(program = %self.program, error = %e, "failed to kill child process");
                }
                let waited = self.child.wait().await;
                self.abandon_streams().await;
                let status = waited.map_err(|source| RunError::Wait {
                    program: self.program.clone(),
                    source,
                })?;
                (status, Some(why))
            }
        };

        let code = status.code().unwrap_or(-1);
        info!(
            program = %self.program,
            pid = ?self.pid,
            exit_code = code,
            success = status.success(),
            interrupted = ?interrupted,
            "process exited"
        );

        self.state = ProgramState::Exited(ExitInfo {
            code,
            status,
            interrupted,
        });
        Ok(code)
    }

    async fn finish_streams(&mut self) {
        if let Some(stream) = self.stdout.as_mut() {
            stream.finish(&self.program, StreamKind::Stdout).await;
        }
        if let Some(stream) = self.stderr.as_mut() {
            stream.finish(&self.program, StreamKind::Stderr).await;
        }
    }

    async fn abandon_streams(&mut self) {
        for stream in [self.stdout.as_mut(), self.stderr.as_mut()].into_iter().flatten() {
            stream.abandon().await;
        }
    }
}
