//! Scanner cursor: the open → page → close protocol of a single scan.

use crate::{
    codec::{Encoding, ValueCodec},
    error::{HBaseLinkError, Result},
    models::{Cell, RowSet, ScanOptions, ScanRequest},
    scanner::decode_rows,
    transport::{RestResponse, RestTransport, STATUS_NO_CONTENT},
};
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;

/// Lifecycle phase of a [`ScanCursor`].
///
/// `Exhausted` only allows `close`; `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorPhase {
    Unopened,
    Open,
    Exhausted,
    Closed,
    Failed,
}

impl fmt::Display for CursorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CursorPhase::Unopened => "unopened",
            CursorPhase::Open => "open",
            CursorPhase::Exhausted => "exhausted",
            CursorPhase::Closed => "closed",
            CursorPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A server-side scanner over one table.
///
/// The cursor is single-owner: every operation takes `&mut self`, so at most
/// one protocol call is in flight. Use [`ScanStream`](crate::ScanStream) to
/// consume it as a sequence of cells.
///
/// If the future of `open` or `page` is dropped before the call returns, the
/// gateway may already have acted on it. The cursor never reissues such a
/// call: the next `open` or `page` fails with
/// [`HBaseLinkError::ProtocolViolation`] and the cursor becomes `Failed`.
/// `close` still deletes a scanner whose id is known.
pub struct ScanCursor {
    table: String,
    request: ScanRequest,
    codec: ValueCodec,
    transport: Arc<dyn RestTransport>,
    cursor_id: Option<String>,
    phase: CursorPhase,
    /// Set while a call is awaited; stays set if that call was cancelled.
    in_flight: bool,
}

impl fmt::Debug for ScanCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanCursor")
            .field("table", &self.table)
            .field("request", &self.request)
            .field("encoding", &self.codec.encoding())
            .field("cursor_id", &self.cursor_id)
            .field("phase", &self.phase)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}

impl ScanCursor {
    /// Validate `options` and build the scanner request. No call is issued.
    ///
    /// `default_encoding` applies unless the options carry their own.
    pub fn new(
        transport: Arc<dyn RestTransport>,
        options: ScanOptions,
        default_encoding: Encoding,
    ) -> Result<Self> {
        let codec = ValueCodec::new(options.encoding.unwrap_or(default_encoding));
        let request = ScanRequest::build(&options, &codec)?;
        Ok(Self {
            table: options.table,
            request,
            codec,
            transport,
            cursor_id: None,
            phase: CursorPhase::Unopened,
            in_flight: false,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn request(&self) -> &ScanRequest {
        &self.request
    }

    pub fn encoding(&self) -> Encoding {
        self.codec.encoding()
    }

    /// Identifier assigned by the gateway once the scanner is open.
    pub fn cursor_id(&self) -> Option<&str> {
        self.cursor_id.as_deref()
    }

    pub fn phase(&self) -> CursorPhase {
        self.phase
    }

    fn scanner_path(&self) -> String {
        format!("/{}/scanner", self.table)
    }

    fn cursor_path(&self, id: &str) -> String {
        format!("/{}/scanner/{}", self.table, id)
    }

    fn fail(&mut self, operation: &str, err: HBaseLinkError) -> HBaseLinkError {
        warn!(
            "[SCANNER] {} failed on table={} id={:?}: {}",
            operation, self.table, self.cursor_id, err
        );
        self.phase = CursorPhase::Failed;
        err
    }

    fn expect_phase(&self, operation: &str, expected: CursorPhase) -> Result<()> {
        if self.phase == expected {
            return Ok(());
        }
        Err(HBaseLinkError::ProtocolViolation(format!(
            "{}() requires a {} scanner, but table {} scanner is {}",
            operation, expected, self.table, self.phase
        )))
    }

    fn begin_call(&mut self, operation: &str) -> Result<()> {
        if self.in_flight {
            let err = HBaseLinkError::ProtocolViolation(format!(
                "{}() after an interrupted call; table {} scanner state is unknown",
                operation, self.table
            ));
            return Err(self.fail(operation, err));
        }
        self.in_flight = true;
        Ok(())
    }

    /// Create the scanner on the gateway and return its identifier.
    pub async fn open(&mut self) -> Result<&str> {
        self.expect_phase("open", CursorPhase::Unopened)?;

        let path = self.scanner_path();
        let body = serde_json::to_value(&self.request)?;
        debug!("[SCANNER] Opening scanner at {} with {}", path, body);

        self.begin_call("open")?;
        let result = self.transport.put(&path, &body).await;
        self.in_flight = false;
        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(self.fail("open", e)),
        };
        if !response.is_success() {
            let err = server_error(&response);
            return Err(self.fail("open", err));
        }

        let id = match response.header("location").and_then(parse_cursor_id) {
            Some(id) => id.to_string(),
            None => {
                let err = HBaseLinkError::TransportError(format!(
                    "scanner location header missing or malformed: {:?}",
                    response.header("location")
                ));
                return Err(self.fail("open", err));
            },
        };

        debug!("[SCANNER] Opened scanner id={} on table={}", id, self.table);
        self.phase = CursorPhase::Open;
        Ok(self.cursor_id.insert(id).as_str())
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the gateway reports the scanner exhausted.
    pub async fn page(&mut self) -> Result<Option<Vec<Cell>>> {
        self.expect_phase("page", CursorPhase::Open)?;
        let Some(id) = self.cursor_id.clone() else {
            return Err(self.fail(
                "page",
                HBaseLinkError::ProtocolViolation("open scanner without an id".into()),
            ));
        };

        let path = self.cursor_path(&id);
        self.begin_call("page")?;
        let result = self.transport.get(&path).await;
        self.in_flight = false;
        let response = match result {
            Ok(response) => response,
            Err(e) => return Err(self.fail("page", e)),
        };

        if response.status == STATUS_NO_CONTENT {
            debug!("[SCANNER] Scanner id={} exhausted", id);
            self.phase = CursorPhase::Exhausted;
            return Ok(None);
        }
        if !response.is_success() {
            let err = server_error(&response);
            return Err(self.fail("page", err));
        }

        let row_set = match response.body {
            Some(body) => match serde_json::from_value::<RowSet>(body) {
                Ok(rows) => rows,
                Err(e) => return Err(self.fail("page", e.into())),
            },
            None => RowSet::default(),
        };
        let row_count = row_set.rows.len();
        let cells = match decode_rows(row_set, &self.codec) {
            Ok(cells) => cells,
            Err(e) => return Err(self.fail("page", e)),
        };

        debug!(
            "[SCANNER] Scanner id={} returned rows={} cells={}",
            id,
            row_count,
            cells.len()
        );
        Ok(Some(cells))
    }

    /// Delete the scanner on the gateway.
    ///
    /// Safe to call more than once; only the first call from `Open` or
    /// `Exhausted` issues a delete. The cursor is `Closed` afterwards even
    /// when the delete fails, and the failure is returned for logging.
    /// A scanner whose last call was cancelled is deleted in any phase.
    pub async fn close(&mut self) -> Result<()> {
        let interrupted = self.in_flight && self.cursor_id.is_some();
        match self.phase {
            _ if interrupted => {},
            CursorPhase::Closed | CursorPhase::Failed => return Ok(()),
            CursorPhase::Unopened => {
                // Nothing exists server-side yet
                self.phase = CursorPhase::Closed;
                return Ok(());
            },
            CursorPhase::Open | CursorPhase::Exhausted => {},
        }

        self.phase = CursorPhase::Closed;
        let Some(id) = self.cursor_id.clone() else {
            return Ok(());
        };

        let path = self.cursor_path(&id);
        self.in_flight = true;
        let result = self.transport.delete(&path).await;
        self.in_flight = false;
        match result {
            Ok(true) => {
                debug!("[SCANNER] Closed scanner id={}", id);
                Ok(())
            },
            Ok(false) => {
                debug!("[SCANNER] Scanner id={} was already gone on close", id);
                Ok(())
            },
            Err(e) => {
                warn!("[SCANNER] Failed to delete scanner id={}: {}", id, e);
                Err(e)
            },
        }
    }

    /// Hand over the server-side scanner for a release outside of `close`,
    /// marking the cursor `Closed`. `None` when nothing needs releasing.
    pub(crate) fn take_release(&mut self) -> Option<(Arc<dyn RestTransport>, String)> {
        let live = matches!(self.phase, CursorPhase::Open | CursorPhase::Exhausted);
        if !live && !self.in_flight {
            return None;
        }
        let id = self.cursor_id.clone()?;
        self.phase = CursorPhase::Closed;
        self.in_flight = false;
        Some((Arc::clone(&self.transport), self.cursor_path(&id)))
    }
}

fn server_error(response: &RestResponse) -> HBaseLinkError {
    HBaseLinkError::ServerError {
        status_code: response.status,
        message: response.error_message(),
    }
}

/// Scanner id from a `Location` header: the word after the last `scanner/`.
pub(crate) fn parse_cursor_id(location: &str) -> Option<&str> {
    let (_, id) = location.trim().rsplit_once("scanner/")?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::MockTransport;
    use async_trait::async_trait;
    use serde_json::{json, Value as JsonValue};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn opened_response(id: &str) -> RestResponse {
        RestResponse::new(201).with_header("Location", format!("http://localhost:8080/t/scanner/{}", id))
    }

    fn cursor_with(mock: &Arc<MockTransport>) -> ScanCursor {
        let transport: Arc<dyn RestTransport> = mock.clone();
        ScanCursor::new(transport, ScanOptions::new("t"), Encoding::Utf8).unwrap()
    }

    #[test]
    fn test_parse_cursor_id() {
        assert_eq!(parse_cursor_id("http://h:8080/t/scanner/1453c0d2a"), Some("1453c0d2a"));
        assert_eq!(parse_cursor_id("/t/scanner/abc_1"), Some("abc_1"));
        assert_eq!(parse_cursor_id("http://h:8080/t/scanner/"), None);
        assert_eq!(parse_cursor_id("http://h:8080/t/scanner/a/b"), None);
        assert_eq!(parse_cursor_id("http://h:8080/t/rows"), None);
    }

    #[test]
    fn test_missing_table_fails_at_construction() {
        let mock: Arc<dyn RestTransport> = Arc::new(MockTransport::new());
        let err = ScanCursor::new(mock, ScanOptions::default(), Encoding::Utf8).unwrap_err();
        assert!(matches!(err, HBaseLinkError::MissingRequiredOption(_)));
    }

    #[tokio::test]
    async fn test_page_before_open_is_protocol_violation() {
        let mock = Arc::new(MockTransport::new());
        let mut cursor = cursor_with(&mock);

        let err = cursor.page().await.unwrap_err();
        assert!(matches!(err, HBaseLinkError::ProtocolViolation(_)));
        assert!(mock.calls().is_empty(), "no network call expected");
        assert_eq!(cursor.phase(), CursorPhase::Unopened);
    }

    #[tokio::test]
    async fn test_open_extracts_id_and_posts_request() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("abc123")));
        let mut cursor = cursor_with(&mock);

        assert_eq!(cursor.open().await.unwrap(), "abc123");
        assert_eq!(cursor.phase(), CursorPhase::Open);
        assert_eq!(cursor.cursor_id(), Some("abc123"));

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "PUT");
        assert_eq!(calls[0].path, "/t/scanner");
        assert_eq!(calls[0].body, Some(json!({"batch": 1000})));
    }

    #[tokio::test]
    async fn test_open_twice_is_protocol_violation() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("abc")));
        let mut cursor = cursor_with(&mock);
        cursor.open().await.unwrap();

        assert!(matches!(
            cursor.open().await,
            Err(HBaseLinkError::ProtocolViolation(_))
        ));
        assert_eq!(mock.count("PUT"), 1);
    }

    #[tokio::test]
    async fn test_missing_location_header_fails_cursor() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(RestResponse::new(201)));
        let mut cursor = cursor_with(&mock);

        let err = cursor.open().await.unwrap_err();
        assert!(matches!(err, HBaseLinkError::TransportError(_)));
        assert_eq!(cursor.phase(), CursorPhase::Failed);
    }

    #[tokio::test]
    async fn test_open_transport_error_fails_without_retry() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Err(HBaseLinkError::TransportError("connection reset".into())));
        let mut cursor = cursor_with(&mock);

        assert!(cursor.open().await.unwrap_err().is_transport());
        assert_eq!(cursor.phase(), CursorPhase::Failed);
        assert_eq!(mock.count("PUT"), 1);

        // Failed is terminal: no further calls
        assert!(cursor.page().await.is_err());
        cursor.close().await.unwrap();
        assert_eq!(mock.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_content_exhausts_cursor() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("s1")));
        mock.push_response(Ok(RestResponse::new(204)));
        let mut cursor = cursor_with(&mock);
        cursor.open().await.unwrap();

        assert_eq!(cursor.page().await.unwrap(), None);
        assert_eq!(cursor.phase(), CursorPhase::Exhausted);
        assert!(matches!(
            cursor.page().await,
            Err(HBaseLinkError::ProtocolViolation(_))
        ));
        assert_eq!(mock.count("GET"), 1);
    }

    #[tokio::test]
    async fn test_page_decodes_cells() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("s1")));
        mock.push_response(Ok(RestResponse::new(200).with_body(json!({
            "Row": [{"key": "cjE=", "Cell": [{"column": "Y2Y6YQ==", "timestamp": 5, "$": "eA=="}]}]
        }))));
        let mut cursor = cursor_with(&mock);
        cursor.open().await.unwrap();

        let cells = cursor.page().await.unwrap().unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].row_key.to_string(), "r1");
        assert_eq!(cells[0].timestamp, 5);
        assert_eq!(cursor.phase(), CursorPhase::Open);
        assert_eq!(mock.calls()[1].path, "/t/scanner/s1");
    }

    #[tokio::test]
    async fn test_server_error_on_page_fails_cursor() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("s1")));
        mock.push_response(Ok(RestResponse::new(500).with_body(json!("region offline"))));
        let mut cursor = cursor_with(&mock);
        cursor.open().await.unwrap();

        let err = cursor.page().await.unwrap_err();
        assert!(matches!(
            err,
            HBaseLinkError::ServerError { status_code: 500, ref message } if message == "region offline"
        ));
        assert_eq!(cursor.phase(), CursorPhase::Failed);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("s1")));
        let mut cursor = cursor_with(&mock);
        cursor.open().await.unwrap();

        cursor.close().await.unwrap();
        cursor.close().await.unwrap();
        assert_eq!(cursor.phase(), CursorPhase::Closed);
        assert_eq!(mock.count("DELETE"), 1);
        assert_eq!(mock.calls()[1].path, "/t/scanner/s1");
    }

    #[tokio::test]
    async fn test_close_error_is_surfaced_once() {
        let mock = Arc::new(MockTransport::new());
        mock.push_response(Ok(opened_response("s1")));
        mock.push_delete(Err(HBaseLinkError::TransportError("broken pipe".into())));
        let mut cursor = cursor_with(&mock);
        cursor.open().await.unwrap();

        assert!(cursor.close().await.is_err());
        assert_eq!(cursor.phase(), CursorPhase::Closed);
        assert!(cursor.close().await.is_ok());
        assert_eq!(mock.count("DELETE"), 1);
    }

    #[tokio::test]
    async fn test_close_unopened_issues_no_call() {
        let mock = Arc::new(MockTransport::new());
        let mut cursor = cursor_with(&mock);
        cursor.close().await.unwrap();
        assert_eq!(cursor.phase(), CursorPhase::Closed);
        assert!(mock.calls().is_empty());
        assert!(matches!(
            cursor.open().await,
            Err(HBaseLinkError::ProtocolViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_cursor_encoding_override() {
        let mock: Arc<dyn RestTransport> = Arc::new(MockTransport::new());
        let options = ScanOptions::new("t").with_encoding(Encoding::Raw);
        let cursor = ScanCursor::new(mock, options, Encoding::Utf8).unwrap();
        assert_eq!(cursor.encoding(), Encoding::Raw);
    }

    /// Never answers page calls, and optionally never answers the open.
    #[derive(Default)]
    struct StallingTransport {
        stall_open: bool,
        puts: AtomicUsize,
        gets: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl RestTransport for StallingTransport {
        async fn put(&self, _path: &str, _body: &JsonValue) -> Result<RestResponse> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.stall_open {
                std::future::pending::<()>().await;
            }
            Ok(opened_response("s1"))
        }

        async fn get(&self, _path: &str) -> Result<RestResponse> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }

        async fn delete(&self, _path: &str) -> Result<bool> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_cancelled_page_is_not_reissued() {
        let transport = Arc::new(StallingTransport::default());
        let mut cursor =
            ScanCursor::new(transport.clone(), ScanOptions::new("t"), Encoding::Utf8).unwrap();
        cursor.open().await.unwrap();

        assert!(tokio::time::timeout(Duration::from_millis(10), cursor.page())
            .await
            .is_err());

        let err = cursor.page().await.unwrap_err();
        assert!(matches!(err, HBaseLinkError::ProtocolViolation(_)));
        assert_eq!(cursor.phase(), CursorPhase::Failed);
        assert_eq!(transport.gets.load(Ordering::SeqCst), 1);

        // The scanner id is known, so close still releases it, once
        cursor.close().await.unwrap();
        cursor.close().await.unwrap();
        assert_eq!(cursor.phase(), CursorPhase::Closed);
        assert_eq!(transport.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_open_is_not_reissued() {
        let transport = Arc::new(StallingTransport {
            stall_open: true,
            ..StallingTransport::default()
        });
        let mut cursor =
            ScanCursor::new(transport.clone(), ScanOptions::new("t"), Encoding::Utf8).unwrap();

        assert!(tokio::time::timeout(Duration::from_millis(10), cursor.open())
            .await
            .is_err());

        assert!(matches!(
            cursor.open().await,
            Err(HBaseLinkError::ProtocolViolation(_))
        ));
        assert_eq!(cursor.phase(), CursorPhase::Failed);
        assert_eq!(transport.puts.load(Ordering::SeqCst), 1);

        cursor.close().await.unwrap();
        assert_eq!(transport.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancelled_page_is_released_on_handover() {
        let transport = Arc::new(StallingTransport::default());
        let mut cursor =
            ScanCursor::new(transport.clone(), ScanOptions::new("t"), Encoding::Utf8).unwrap();
        cursor.open().await.unwrap();
        assert!(tokio::time::timeout(Duration::from_millis(10), cursor.page())
            .await
            .is_err());
        assert!(cursor.page().await.is_err());

        let (_, path) = cursor.take_release().unwrap();
        assert_eq!(path, "/t/scanner/s1");
        assert!(cursor.take_release().is_none());
    }
}
