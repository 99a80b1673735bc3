//! Blocking-to-async log streaming bridge.
//!
//! The Docker log endpoint is consumed as a blocking sequence of byte chunks.
//! Chunks carry no line alignment, so the bridge re-buffers them into whole
//! lines and hands those to the async consumer through a bounded queue.
//! Chunk reading runs on a `spawn_blocking` worker drawn from a fixed-size
//! pool, so the runtime is never blocked by the underlying I/O.
//!
//! Queue protocol: zero or more `Line` items, at most one `Error` marker,
//! then exactly one `Eof` sentinel. The sentinel is sent on every path, so a
//! consumer loop always terminates. The worker sends with `blocking_send`,
//! which blocks at capacity (backpressure) and fails once the consumer drops
//! the receiver — that failure is the worker's cancellation signal between
//! chunks.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Semaphore};
use tracing::debug;

use crate::error::DockerError;

/// Default number of concurrent bridge workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default bounded queue capacity per session.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// A blocking, chunked byte source. `next_chunk` may block the calling
/// thread; `Ok(None)` means the source is exhausted.
pub trait ChunkSource: Send + 'static {
    fn next_chunk(&mut self) -> Result<Option<Bytes>, DockerError>;
}

/// One item on the bridge queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogItem {
    /// A complete decoded line (trailing newline included), or the final
    /// newline-less remainder of the stream.
    Line(String),
    /// Terminal read failure; followed by `Eof`.
    Error(String),
    /// End-of-stream sentinel, always the last item.
    Eof,
}

/// Accumulates undelimited byte fragments across chunk boundaries and splits
/// them on newline. Holds at most one trailing partial line.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw chunk, decoding as UTF-8 with replacement characters for
    /// invalid sequences.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buf.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Split off the next complete line, including its newline.
    pub fn next_line(&mut self) -> Option<String> {
        let idx = self.buf.find('\n')?;
        let rest = self.buf.split_off(idx + 1);
        Some(std::mem::replace(&mut self.buf, rest))
    }

    /// Flush any remaining partial content (no trailing newline).
    pub fn take_remainder(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buf))
        }
    }
}

/// Shared bridge: a worker pool plus per-session bounded queues.
///
/// The pool is the only point of contention across concurrent log sessions;
/// excess sessions wait for a free worker before their first chunk is read.
pub struct LogStreamBridge {
    workers: Arc<Semaphore>,
    queue_capacity: usize,
}

impl Default for LogStreamBridge {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS, DEFAULT_QUEUE_CAPACITY)
    }
}

impl LogStreamBridge {
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers: Arc::new(Semaphore::new(workers.max(1))),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Start streaming `source` on a pooled worker.
    ///
    /// The returned receiver yields items in source order and is guaranteed
    /// to end with exactly one [`LogItem::Eof`] (possibly preceded by one
    /// [`LogItem::Error`]), unless the consumer drops it first.
    pub fn spawn<S: ChunkSource>(&self, source: S) -> mpsc::Receiver<LogItem> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let workers = Arc::clone(&self.workers);

        tokio::spawn(async move {
            // Closed only if the bridge itself is being torn down.
            let Ok(permit) = workers.acquire_owned().await else {
                return;
            };
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                pump(source, &tx);
            });
        });

        rx
    }
}

/// Blocking pump: chunks → lines → queue. Runs on a worker thread.
fn pump<S: ChunkSource>(mut source: S, tx: &mpsc::Sender<LogItem>) {
    let mut buffer = LineBuffer::new();

    loop {
        match source.next_chunk() {
            Ok(Some(chunk)) => {
                buffer.push_chunk(&chunk);
                while let Some(line) = buffer.next_line() {
                    if tx.blocking_send(LogItem::Line(line)).is_err() {
                        debug!("log consumer gone, stopping bridge worker");
                        return;
                    }
                }
            }
            Ok(None) => {
                if let Some(rest) = buffer.take_remainder() {
                    if tx.blocking_send(LogItem::Line(rest)).is_err() {
                        return;
                    }
                }
                break;
            }
            Err(e) => {
                debug!(error = %e, "log source failed mid-stream");
                if tx.blocking_send(LogItem::Error(e.to_string())).is_err() {
                    return;
                }
                break;
            }
        }
    }

    let _ = tx.blocking_send(LogItem::Eof);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    /// Source that replays a fixed list of chunks.
    struct ScriptedSource {
        chunks: std::vec::IntoIter<Result<Bytes, DockerError>>,
    }

    impl ScriptedSource {
        fn new(chunks: Vec<Result<Bytes, DockerError>>) -> Self {
            Self {
                chunks: chunks.into_iter(),
            }
        }

        fn lines(parts: &[&str]) -> Self {
            Self::new(
                parts
                    .iter()
                    .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
                    .collect(),
            )
        }
    }

    impl ChunkSource for ScriptedSource {
        fn next_chunk(&mut self) -> Result<Option<Bytes>, DockerError> {
            self.chunks.next().transpose()
        }
    }

    async fn drain(mut rx: mpsc::Receiver<LogItem>) -> Vec<LogItem> {
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            let done = item == LogItem::Eof;
            items.push(item);
            if done {
                break;
            }
        }
        items
    }

    #[test]
    fn line_buffer_reassembles_across_boundaries() {
        let mut buf = LineBuffer::new();
        buf.push_chunk(b"hel");
        assert_eq!(buf.next_line(), None);
        buf.push_chunk(b"lo\nwor");
        assert_eq!(buf.next_line(), Some("hello\n".to_string()));
        assert_eq!(buf.next_line(), None);
        buf.push_chunk(b"ld\n");
        assert_eq!(buf.next_line(), Some("world\n".to_string()));
        assert_eq!(buf.take_remainder(), None);
    }

    #[test]
    fn line_buffer_flushes_trailing_partial() {
        let mut buf = LineBuffer::new();
        buf.push_chunk(b"one\ntwo");
        assert_eq!(buf.next_line(), Some("one\n".to_string()));
        assert_eq!(buf.take_remainder(), Some("two".to_string()));
        assert_eq!(buf.take_remainder(), None);
    }

    #[test]
    fn line_buffer_substitutes_invalid_utf8() {
        let mut buf = LineBuffer::new();
        buf.push_chunk(b"ok \xff\xfe\n");
        let line = buf.next_line().unwrap();
        assert!(line.starts_with("ok "));
        assert!(line.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn bridge_reconstructs_lines_independent_of_chunking() {
        let bridge = LogStreamBridge::default();
        let rx = bridge.spawn(ScriptedSource::lines(&["hel", "lo\nwor", "ld\n"]));
        let items = drain(rx).await;
        assert_eq!(
            items,
            vec![
                LogItem::Line("hello\n".to_string()),
                LogItem::Line("world\n".to_string()),
                LogItem::Eof,
            ]
        );
    }

    #[tokio::test]
    async fn bridge_flushes_final_partial_line() {
        let bridge = LogStreamBridge::default();
        let rx = bridge.spawn(ScriptedSource::lines(&["a\nno-newline"]));
        let items = drain(rx).await;
        assert_eq!(
            items,
            vec![
                LogItem::Line("a\n".to_string()),
                LogItem::Line("no-newline".to_string()),
                LogItem::Eof,
            ]
        );
    }

    #[tokio::test]
    async fn mid_stream_error_yields_one_marker_then_sentinel() {
        let bridge = LogStreamBridge::default();
        let rx = bridge.spawn(ScriptedSource::new(vec![
            Ok(Bytes::from_static(b"hello\n")),
            Err(DockerError::Stream("connection reset".to_string())),
        ]));
        let items = drain(rx).await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], LogItem::Line("hello\n".to_string()));
        assert!(matches!(&items[1], LogItem::Error(m) if m.contains("connection reset")));
        assert_eq!(items[2], LogItem::Eof);
    }

    #[tokio::test]
    async fn immediate_error_still_terminates_with_sentinel() {
        let bridge = LogStreamBridge::default();
        let rx = bridge.spawn(ScriptedSource::new(vec![Err(DockerError::Stream(
            "boom".to_string(),
        ))]));
        let items = drain(rx).await;
        assert!(matches!(items[0], LogItem::Error(_)));
        assert_eq!(items[1], LogItem::Eof);
    }

    #[tokio::test]
    async fn empty_source_yields_only_sentinel() {
        let bridge = LogStreamBridge::default();
        let rx = bridge.spawn(ScriptedSource::new(Vec::new()));
        assert_eq!(drain(rx).await, vec![LogItem::Eof]);
    }

    /// Endless source flagging when it is dropped (worker exited).
    struct EndlessSource {
        dropped: Arc<AtomicBool>,
    }

    impl ChunkSource for EndlessSource {
        fn next_chunk(&mut self) -> Result<Option<Bytes>, DockerError> {
            std::thread::sleep(Duration::from_millis(1));
            Ok(Some(Bytes::from_static(b"tick\n")))
        }
    }

    impl Drop for EndlessSource {
        fn drop(&mut self) {
            self.dropped.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn worker_stops_when_consumer_disconnects() {
        let bridge = LogStreamBridge::new(1, 4);
        let dropped = Arc::new(AtomicBool::new(false));
        let mut rx = bridge.spawn(EndlessSource {
            dropped: Arc::clone(&dropped),
        });

        assert!(rx.recv().await.is_some());
        drop(rx);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while !dropped.load(Ordering::SeqCst) {
            assert!(
                tokio::time::Instant::now() < deadline,
                "bridge worker did not stop after consumer disconnect"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn pool_permits_are_released_between_sessions() {
        let bridge = LogStreamBridge::new(1, 4);
        for _ in 0..3 {
            let rx = bridge.spawn(ScriptedSource::lines(&["x\n"]));
            let items = drain(rx).await;
            assert_eq!(items.last(), Some(&LogItem::Eof));
        }
    }
}
