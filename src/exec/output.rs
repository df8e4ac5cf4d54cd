// src/exec/output.rs

//! The queue that carries captured lines from a reader task to the caller.
//!
//! Each captured stream gets one unbounded channel. The reader task pushes
//! every line through a cloned [`OutputQueue`]; the running program keeps the
//! original handle and drops it only once the process has exited and the
//! reader has drained the pipe. The consumer side ([`OutputLines`]) therefore
//! sees `None` exactly when the process is gone *and* every line has been
//! delivered.

use tokio::sync::mpsc;

/// Create a connected producer/consumer pair.
pub fn output_queue() -> (OutputQueue, OutputLines) {
    let (tx, rx) = mpsc::unbounded_channel();
    (OutputQueue { tx }, OutputLines { rx })
}

/// Producer half. Cheap to clone; completion is signalled when the last clone
/// is dropped (or [`OutputQueue::complete`] is called on it).
#[derive(Debug, Clone)]
pub struct OutputQueue {
    tx: mpsc::UnboundedSender<String>,
}

impl OutputQueue {
    /// Append a line. Returns `false` if the consumer is gone.
    pub fn push(&self, line: String) -> bool {
        self.tx.send(line).is_ok()
    }

    /// Give up this producer handle.
    pub fn complete(self) {
        drop(self);
    }
}

/// Consumer half: a one-shot, ordered sequence of output lines.
#[derive(Debug)]
pub struct OutputLines {
    rx: mpsc::UnboundedReceiver<String>,
}

impl OutputLines {
    /// Next line, waiting if none is buffered yet.
    ///
    /// Returns `None` once completion was signalled and the buffer is empty.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Drain the whole sequence.
    pub async fn collect_lines(mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.rx.recv().await {
            lines.push(line);
        }
        lines
    }

    /// Number of lines buffered right now.
    pub fn buffered(&self) -> usize {
        self.rx.len()
    }

    /// Switch to a blocking [`Iterator`] for synchronous callers.
    ///
    /// The iterator parks the current thread while waiting, so it must not be
    /// driven from inside an async task.
    pub fn into_blocking(self) -> BlockingLines {
        BlockingLines { rx: self.rx }
    }
}

/// Blocking view of [`OutputLines`].
#[derive(Debug)]
pub struct BlockingLines {
    rx: mpsc::UnboundedReceiver<String>,
}

impl Iterator for BlockingLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.rx.blocking_recv()
    }
}
