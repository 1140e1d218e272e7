//! Mock source handle for testing.

use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::Notify;

use crate::ingest::{SourceHandle, SourceStream};

/// In-memory implementation of [`SourceHandle`].
///
/// Provides controllable behavior for testing:
/// - Serve a fixed byte payload
/// - Fail on open, or fail mid-stream after N bytes
/// - Panic on open, or panic mid-stream after N bytes
/// - Hold `open()` until released, to keep a job in `Ingesting`
///
/// # Example
///
/// ```rust,ignore
/// use vidstage_core::testing::MockSource;
///
/// let source = MockSource::from_bytes(vec![0u8; 1024]).fail_after(512);
/// orchestrator.submit_selection(Arc::new(source))?;
/// ```
#[derive(Debug, Clone)]
pub struct MockSource {
    label: String,
    data: Arc<Vec<u8>>,
    fail_open: bool,
    fail_at: Option<usize>,
    panic_open: bool,
    panic_at: Option<usize>,
    gate: Option<Arc<Notify>>,
    opens: Arc<AtomicUsize>,
}

impl MockSource {
    /// A source that yields `data` then EOF.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self {
            label: "mock://source".to_string(),
            data: Arc::new(data),
            fail_open: false,
            fail_at: None,
            panic_open: false,
            panic_at: None,
            gate: None,
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose `open()` always fails.
    pub fn failing_open() -> Self {
        let mut source = Self::from_bytes(Vec::new());
        source.fail_open = true;
        source
    }

    /// A source whose `open()` panics.
    pub fn panicking_open() -> Self {
        let mut source = Self::from_bytes(Vec::new());
        source.panic_open = true;
        source
    }

    /// Panic inside the reader once `bytes` have been delivered.
    pub fn panic_after(mut self, bytes: usize) -> Self {
        self.panic_at = Some(bytes);
        self
    }

    /// Fail with an I/O error once `bytes` have been delivered.
    pub fn fail_after(mut self, bytes: usize) -> Self {
        self.fail_at = Some(bytes);
        self
    }

    /// Make `open()` wait until [`release`](Self::release) is called.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Let a pending (or the next) `open()` through.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    /// Number of times `open()` was called.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceHandle for MockSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn open(&self) -> io::Result<SourceStream> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        if self.panic_open {
            panic!("simulated source panic on open");
        }

        if self.fail_open {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "simulated open failure",
            ));
        }

        Ok(Box::new(MockReader {
            data: Arc::clone(&self.data),
            pos: 0,
            fail_at: self.fail_at,
            panic_at: self.panic_at,
        }))
    }
}

struct MockReader {
    data: Arc<Vec<u8>>,
    pos: usize,
    fail_at: Option<usize>,
    panic_at: Option<usize>,
}

impl AsyncRead for MockReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if matches!(self.panic_at, Some(panic_at) if self.pos >= panic_at) {
            panic!("simulated source panic after {} bytes", self.pos);
        }

        let limit = match self.fail_at {
            Some(fail_at) if self.pos >= fail_at => {
                return Poll::Ready(Err(io::Error::other("simulated read failure")));
            }
            Some(fail_at) => fail_at.min(self.data.len()),
            None => self.data.len(),
        };
        let limit = match self.panic_at {
            Some(panic_at) => panic_at.min(limit),
            None => limit,
        };

        let n = buf.remaining().min(limit - self.pos);
        let start = self.pos;
        buf.put_slice(&self.data[start..start + n]);
        self.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_reads_all_bytes() {
        let source = MockSource::from_bytes(vec![3u8; 10_000]);
        let mut stream = source.open().await.unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        assert_eq!(out.len(), 10_000);
        assert_eq!(source.open_count(), 1);
    }

    #[tokio::test]
    async fn test_fail_after() {
        let source = MockSource::from_bytes(vec![3u8; 10_000]).fail_after(100);
        let mut stream = source.open().await.unwrap();
        let mut first = vec![0u8; 100];
        stream.read_exact(&mut first).await.unwrap();
        let mut rest = Vec::new();
        assert!(stream.read_to_end(&mut rest).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_open() {
        assert!(MockSource::failing_open().open().await.is_err());
    }

    #[tokio::test]
    async fn test_panic_after_delivers_prefix() {
        let source = MockSource::from_bytes(vec![3u8; 1000]).panic_after(100);
        let mut stream = source.open().await.unwrap();
        let mut first = vec![0u8; 100];
        stream.read_exact(&mut first).await.unwrap();
        assert_eq!(first, vec![3u8; 100]);
    }

    #[tokio::test]
    #[should_panic(expected = "simulated source panic on open")]
    async fn test_panicking_open() {
        let _ = MockSource::panicking_open().open().await;
    }

    #[tokio::test]
    async fn test_gate_released_before_open() {
        let source = MockSource::from_bytes(vec![1u8; 4]).gated();
        source.release();
        assert!(source.open().await.is_ok());
    }
}
