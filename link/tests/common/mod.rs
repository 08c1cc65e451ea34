#![allow(dead_code)]
//! In-memory REST gateway used by the integration tests.
//!
//! Implements the scanner resource the way the HBase REST gateway does:
//! `PUT /{table}/scanner` answers 201 with a `Location` header, `GET` on the
//! scanner returns up to `batch` rows per call and 204 once drained, `DELETE`
//! removes it.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hbase_link::{HBaseLinkClient, HBaseLinkError, RestResponse, RestTransport, Result};
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .is_test(true)
        .try_init();
}

/// One stored cell: column, timestamp, value.
type StoredCell = (Vec<u8>, i64, Vec<u8>);

struct OpenScanner {
    table: String,
    batch: usize,
    pending: VecDeque<(Vec<u8>, Vec<StoredCell>)>,
}

/// Failure injected into the next matching call.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Answer the scanner PUT with this status.
    OpenStatus(u16),
    /// Answer the scanner PUT with 201 but no `Location` header.
    MissingLocation,
    /// Answer the n-th page GET (1-based) with this status.
    PageStatus(usize, u16),
    /// Fail the n-th page GET (1-based) without a response.
    PageTransport(usize),
    /// Fail the next DELETE without a response.
    DeleteTransport,
    /// Serve the n-th page GET (1-based), then hold the response back.
    PageDelay(usize, Duration),
}

#[derive(Default)]
pub struct FakeGateway {
    tables: Mutex<HashMap<String, BTreeMap<Vec<u8>, Vec<StoredCell>>>>,
    scanners: Mutex<HashMap<String, OpenScanner>>,
    faults: Mutex<Vec<Fault>>,
    open_bodies: Mutex<Vec<JsonValue>>,
    next_id: AtomicUsize,
    puts: AtomicUsize,
    gets: AtomicUsize,
    deletes: AtomicUsize,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store a row with text cells.
    pub fn insert_row(&self, table: &str, key: &str, cells: &[(&str, i64, &str)]) {
        let cells = cells
            .iter()
            .map(|(column, ts, value)| (column.as_bytes().to_vec(), *ts, value.as_bytes().to_vec()))
            .collect();
        self.insert_raw_row(table, key.as_bytes(), cells);
    }

    pub fn insert_raw_row(&self, table: &str, key: &[u8], cells: Vec<StoredCell>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_vec(), cells);
    }

    pub fn inject(&self, fault: Fault) {
        self.faults.lock().unwrap().push(fault);
    }

    pub fn client(self: &Arc<Self>) -> HBaseLinkClient {
        HBaseLinkClient::builder()
            .transport(self.clone())
            .build()
            .unwrap()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn open_scanners(&self) -> usize {
        self.scanners.lock().unwrap().len()
    }

    /// Bodies of every scanner PUT, in order.
    pub fn open_bodies(&self) -> Vec<JsonValue> {
        self.open_bodies.lock().unwrap().clone()
    }

    fn take_fault(&self, matches: impl Fn(&Fault) -> bool) -> Option<Fault> {
        let mut faults = self.faults.lock().unwrap();
        let index = faults.iter().position(matches)?;
        Some(faults.remove(index))
    }

    fn decode_bound(body: &JsonValue, key: &str) -> Option<Vec<u8>> {
        body.get(key)
            .and_then(JsonValue::as_str)
            .map(|text| STANDARD.decode(text).unwrap())
    }
}

fn split_scanner_path(path: &str) -> (String, Option<String>) {
    let mut parts = path.trim_start_matches('/').splitn(3, '/');
    let table = parts.next().unwrap_or_default().to_string();
    assert_eq!(parts.next(), Some("scanner"), "unexpected path {}", path);
    (table, parts.next().map(str::to_string))
}

#[async_trait]
impl RestTransport for FakeGateway {
    async fn put(&self, path: &str, body: &JsonValue) -> Result<RestResponse> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.open_bodies.lock().unwrap().push(body.clone());
        let (table, _) = split_scanner_path(path);

        if let Some(Fault::OpenStatus(status)) =
            self.take_fault(|f| matches!(f, Fault::OpenStatus(_)))
        {
            return Ok(RestResponse::new(status).with_body(json!("Not found")));
        }

        let start = Self::decode_bound(body, "startRow");
        let end = Self::decode_bound(body, "endRow");
        let batch = body.get("batch").and_then(JsonValue::as_u64).unwrap_or(1000) as usize;

        let tables = self.tables.lock().unwrap();
        let Some(rows) = tables.get(&table) else {
            return Ok(RestResponse::new(404).with_body(json!("Not found")));
        };
        let pending: VecDeque<_> = rows
            .iter()
            .filter(|(key, _)| start.as_ref().map_or(true, |s| *key >= s))
            .filter(|(key, _)| end.as_ref().map_or(true, |e| *key < e))
            .map(|(key, cells)| (key.clone(), cells.clone()))
            .collect();

        if self.take_fault(|f| matches!(f, Fault::MissingLocation)).is_some() {
            return Ok(RestResponse::new(201));
        }

        let id = format!("scanner{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.scanners.lock().unwrap().insert(
            id.clone(),
            OpenScanner {
                table: table.clone(),
                batch,
                pending,
            },
        );
        Ok(RestResponse::new(201)
            .with_header("Location", format!("http://localhost:8080/{}/scanner/{}", table, id)))
    }

    async fn get(&self, path: &str) -> Result<RestResponse> {
        let call = self.gets.fetch_add(1, Ordering::SeqCst) + 1;
        let (_, id) = split_scanner_path(path);
        let id = id.unwrap_or_default();

        match self.take_fault(|f| {
            matches!(f, Fault::PageStatus(n, _) | Fault::PageTransport(n) if *n == call)
        }) {
            Some(Fault::PageStatus(_, status)) => {
                return Ok(RestResponse::new(status).with_body(json!("Region server unavailable")));
            },
            Some(_) => {
                return Err(HBaseLinkError::TransportError("connection reset".into()));
            },
            None => {},
        }

        let delay = match self.take_fault(|f| matches!(f, Fault::PageDelay(n, _) if *n == call)) {
            Some(Fault::PageDelay(_, delay)) => Some(delay),
            _ => None,
        };
        let response = self.serve_page(&id);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(response)
    }

    async fn delete(&self, path: &str) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.take_fault(|f| matches!(f, Fault::DeleteTransport)).is_some() {
            return Err(HBaseLinkError::TransportError("connection refused".into()));
        }
        let (table, id) = split_scanner_path(path);
        let mut scanners = self.scanners.lock().unwrap();
        match id.as_deref().and_then(|id| scanners.get(id)) {
            Some(scanner) if scanner.table == table => {},
            _ => return Ok(false),
        }
        Ok(id.and_then(|id| scanners.remove(&id)).is_some())
    }
}

impl FakeGateway {
    fn serve_page(&self, id: &str) -> RestResponse {
        let mut scanners = self.scanners.lock().unwrap();
        let Some(scanner) = scanners.get_mut(id) else {
            return RestResponse::new(404).with_body(json!("Not found"));
        };
        if scanner.pending.is_empty() {
            return RestResponse::new(204);
        }

        let take = scanner.batch.min(scanner.pending.len());
        let rows: Vec<JsonValue> = scanner
            .pending
            .drain(..take)
            .map(|(key, cells)| {
                let cells: Vec<JsonValue> = cells
                    .iter()
                    .map(|(column, ts, value)| {
                        json!({
                            "column": STANDARD.encode(column),
                            "timestamp": ts,
                            "$": STANDARD.encode(value),
                        })
                    })
                    .collect();
                json!({ "key": STANDARD.encode(key), "Cell": cells })
            })
            .collect();
        RestResponse::new(200).with_body(json!({ "Row": rows }))
    }
}
