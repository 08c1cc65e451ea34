//! Pull-based cell sequence over a [`ScanCursor`].

use crate::{
    error::Result,
    models::Cell,
    scanner::{CursorPhase, ScanCursor},
    timeouts::HBaseLinkTimeouts,
};
use futures_util::Stream;
use log::{debug, warn};
use std::collections::VecDeque;
use std::time::Duration;

/// Lazily scans a table, one page at a time.
///
/// The scanner is opened on the first pull, and a new page is only fetched
/// once every cell of the previous one has been handed out. When the gateway
/// reports exhaustion the scanner is deleted and the sequence ends. An error
/// ends the sequence after being yielded once.
///
/// A pull whose future is dropped mid-call (for example by a timeout) is not
/// retried: the next pull yields [`HBaseLinkError::ProtocolViolation`] and the
/// sequence ends, since the rows of the interrupted page may already be gone.
///
/// [`HBaseLinkError::ProtocolViolation`]: crate::HBaseLinkError::ProtocolViolation
///
/// Dropping an unfinished stream releases the scanner in the background on the
/// current tokio runtime.
///
/// # Examples
///
/// ```rust,no_run
/// use hbase_link::{HBaseLinkClient, ScanOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HBaseLinkClient::builder()
///     .base_url("http://localhost:8080")
///     .build()?;
///
/// let mut scan = client.scan(ScanOptions::new("users").with_start_row("user_"))?;
/// while let Some(cell) = scan.next().await {
///     let cell = cell?;
///     println!("{} {} = {}", cell.row_key, cell.column, cell.value);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ScanStream {
    cursor: ScanCursor,
    /// Cells of the current page not yet handed out.
    buffer: VecDeque<Cell>,
    finished: bool,
    release_timeout: Duration,
}

impl ScanStream {
    pub fn new(cursor: ScanCursor) -> Self {
        Self {
            cursor,
            buffer: VecDeque::new(),
            finished: false,
            release_timeout: HBaseLinkTimeouts::default().release_timeout,
        }
    }

    pub fn with_release_timeout(mut self, timeout: Duration) -> Self {
        self.release_timeout = timeout;
        self
    }

    pub fn cursor(&self) -> &ScanCursor {
        &self.cursor
    }

    /// `true` once the sequence has ended, normally or with an error.
    pub fn is_finished(&self) -> bool {
        self.finished && self.buffer.is_empty()
    }

    /// Make sure the buffer holds cells. `Ok(false)` means end of sequence.
    async fn fill_buffer(&mut self) -> Result<bool> {
        loop {
            if !self.buffer.is_empty() {
                return Ok(true);
            }
            if self.finished {
                return Ok(false);
            }

            if self.cursor.phase() == CursorPhase::Unopened {
                if let Err(e) = self.cursor.open().await {
                    self.finished = true;
                    return Err(e);
                }
            }

            match self.cursor.page().await {
                Ok(Some(cells)) => self.buffer.extend(cells),
                Ok(None) => {
                    self.finished = true;
                    self.cursor.close().await?;
                    debug!("[SCAN_STREAM] Scan of table={} complete", self.cursor.table());
                    return Ok(false);
                },
                Err(e) => {
                    self.finished = true;
                    return Err(e);
                },
            }
        }
    }

    /// Receive the next cell.
    ///
    /// Returns `None` once the scan is exhausted (or after an error has been
    /// returned).
    pub async fn next(&mut self) -> Option<Result<Cell>> {
        match self.fill_buffer().await {
            Ok(true) => self.buffer.pop_front().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }

    /// Receive every buffered cell of the current page, fetching a page first
    /// if none is buffered.
    pub async fn next_batch(&mut self) -> Option<Result<Vec<Cell>>> {
        match self.fill_buffer().await {
            Ok(true) => Some(Ok(self.buffer.drain(..).collect())),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }

    /// Stop the scan early and release the scanner.
    ///
    /// Calling it again after the first time does nothing.
    pub async fn close(&mut self) -> Result<()> {
        self.finished = true;
        self.buffer.clear();
        self.cursor.close().await
    }

    /// Drain the whole scan into memory.
    pub async fn collect_cells(mut self) -> Result<Vec<Cell>> {
        let mut cells = Vec::new();
        while let Some(batch) = self.next_batch().await {
            cells.extend(batch?);
        }
        Ok(cells)
    }

    /// Adapt into a [`futures_util::Stream`] of cells.
    pub fn into_stream(self) -> impl Stream<Item = Result<Cell>> + Send {
        futures_util::stream::unfold(self, |mut scan| async move {
            scan.next().await.map(|item| (item, scan))
        })
    }
}

impl Drop for ScanStream {
    fn drop(&mut self) {
        let Some((transport, path)) = self.cursor.take_release() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let timeout = self.release_timeout;
                debug!("[SCAN_STREAM] Releasing abandoned scanner {}", path);
                handle.spawn(async move {
                    match tokio::time::timeout(timeout, transport.delete(&path)).await {
                        Ok(Ok(_)) => {},
                        Ok(Err(e)) => warn!("[SCAN_STREAM] Release of {} failed: {}", path, e),
                        Err(_) => warn!("[SCAN_STREAM] Release of {} timed out", path),
                    }
                });
            },
            Err(_) => {
                warn!(
                    "[SCAN_STREAM] No tokio runtime to release scanner {}; it will expire on the server",
                    path
                );
            },
        }
    }
}
