//! Log routing: child output into append-only files.
//!
//! The launcher pipes a child's stdout/stderr and spawns one pump task per
//! stream. Each pump reads lines and appends them to the stream's own file
//! and, when configured, to the shared combined file. Files are opened with
//! `append + create` on every (re)start, so restarting a process never
//! truncates what was logged before.
//!
//! ## Rules
//! - Logging is best-effort: it never blocks or kills the supervised
//!   process. After a failed write the destination is disabled for the
//!   remainder of the current run (a diagnostic is emitted via `tracing`).
//! - With `timestamps`, each line is prefixed with wall-clock time.
//! - The stdout pump doubles as the readiness observer for
//!   [`ReadyPolicy::LineMatch`](crate::ReadyPolicy::LineMatch).

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::spec::LogPaths;

/// Where one stream's lines go.
pub(crate) struct LogSink {
    own: Option<File>,
    combined: Option<Arc<Mutex<File>>>,
    timestamps: bool,
}

impl LogSink {
    /// A sink that discards everything (no log paths configured).
    pub(crate) fn discard() -> Self {
        Self {
            own: None,
            combined: None,
            timestamps: false,
        }
    }

    async fn write_line(&mut self, line: &str) {
        let rendered = if self.timestamps {
            format!("{}: {line}\n", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"))
        } else {
            format!("{line}\n")
        };

        let mut own_failed = false;
        if let Some(file) = self.own.as_mut() {
            if let Err(e) = write_and_flush(file, rendered.as_bytes()).await {
                warn!(error = %e, "log write failed; disabling destination for this run");
                own_failed = true;
            }
        }
        if own_failed {
            self.own = None;
        }

        let mut combined_failed = false;
        if let Some(combined) = self.combined.as_ref() {
            let mut guard = combined.lock().await;
            if let Err(e) = write_and_flush(&mut guard, rendered.as_bytes()).await {
                warn!(error = %e, "combined log write failed; disabling for this run");
                combined_failed = true;
            }
        }
        if combined_failed {
            self.combined = None;
        }
    }
}

async fn write_and_flush(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// Opens the stdout and stderr sinks for one spawn attempt.
///
/// Open failures are logged and degrade to a discarding destination; a
/// process is never refused because its log file could not be opened.
pub(crate) async fn open_sinks(logs: Option<&LogPaths>) -> (LogSink, LogSink) {
    let Some(logs) = logs else {
        return (LogSink::discard(), LogSink::discard());
    };

    let combined = match logs.combined.as_deref() {
        Some(path) => open_append(path).await.map(|f| Arc::new(Mutex::new(f))),
        None => None,
    };

    let stdout = LogSink {
        own: open_append(&logs.stdout).await,
        combined: combined.clone(),
        timestamps: logs.timestamps,
    };
    let stderr = LogSink {
        own: open_append(&logs.stderr).await,
        combined,
        timestamps: logs.timestamps,
    };
    (stdout, stderr)
}

async fn open_append(path: &Path) -> Option<File> {
    match OpenOptions::new().append(true).create(true).open(path).await {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not open log file");
            None
        }
    }
}

/// Readiness observer attached to the stdout pump.
pub(crate) struct ReadyWatch {
    needle: String,
    notify: Arc<Notify>,
    fired: bool,
}

impl ReadyWatch {
    pub(crate) fn new(needle: String) -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        (
            Self {
                needle,
                notify: notify.clone(),
                fired: false,
            },
            notify,
        )
    }

    fn observe(&mut self, line: &str) {
        if !self.fired && line.contains(&self.needle) {
            self.fired = true;
            self.notify.notify_one();
        }
    }
}

/// Spawns a pump task copying lines from `reader` into `sink`.
///
/// The task ends when the stream reaches EOF (child exited) or a read
/// error occurs.
pub(crate) fn spawn_pump<R>(
    reader: R,
    mut sink: LogSink,
    mut ready: Option<ReadyWatch>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(watch) = ready.as_mut() {
                        watch.observe(&line);
                    }
                    sink.write_line(&line).await;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "log pump read failed");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read(path: &Path) -> String {
        tokio::fs::read_to_string(path).await.expect("read log")
    }

    #[tokio::test]
    async fn pump_appends_lines_without_truncating() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.log");
        let logs = LogPaths::new(&out, dir.path().join("err.log"));

        let (stdout, _stderr) = open_sinks(Some(&logs)).await;
        spawn_pump(&b"first\n"[..], stdout, None).await.expect("pump");

        // A second run must append, not truncate.
        let (stdout, _stderr) = open_sinks(Some(&logs)).await;
        spawn_pump(&b"second\n"[..], stdout, None).await.expect("pump");

        assert_eq!(read(&out).await, "first\nsecond\n");
    }

    #[tokio::test]
    async fn combined_receives_both_streams() {
        let dir = tempfile::tempdir().expect("tempdir");
        let all = dir.path().join("all.log");
        let logs = LogPaths::new(dir.path().join("out.log"), dir.path().join("err.log"))
            .combined(&all);

        let (stdout, stderr) = open_sinks(Some(&logs)).await;
        spawn_pump(&b"to stdout\n"[..], stdout, None)
            .await
            .expect("pump");
        spawn_pump(&b"to stderr\n"[..], stderr, None)
            .await
            .expect("pump");

        let merged = read(&all).await;
        assert!(merged.contains("to stdout"));
        assert!(merged.contains("to stderr"));
    }

    #[tokio::test]
    async fn timestamps_prefix_every_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("out.log");
        let logs = LogPaths::new(&out, dir.path().join("err.log")).timestamps();

        let (stdout, _stderr) = open_sinks(Some(&logs)).await;
        spawn_pump(&b"hello\n"[..], stdout, None).await.expect("pump");

        let content = read(&out).await;
        assert!(content.ends_with("hello\n"));
        assert!(content.len() > "hello\n".len(), "missing prefix: {content:?}");
    }

    #[tokio::test]
    async fn ready_watch_fires_on_matching_line() {
        let (mut watch, notify) = ReadyWatch::new("listening".into());
        watch.observe("booting");
        watch.observe("listening on :3000");

        tokio::time::timeout(std::time::Duration::from_secs(1), notify.notified())
            .await
            .expect("ready notification");
    }

    #[tokio::test]
    async fn discard_sink_drops_everything() {
        spawn_pump(&b"nowhere\n"[..], LogSink::discard(), None)
            .await
            .expect("pump");
    }
}
