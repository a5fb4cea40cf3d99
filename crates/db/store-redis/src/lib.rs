//! Redis-backed tree store.
//!
//! Keys are stored verbatim, so several forests can share one redis database
//! as long as their namespace names differ. Batches are sent as `MULTI`/`EXEC`
//! pipelines, which gives the same all-or-nothing visibility as the other
//! drivers.

use std::fmt;

use parking_lot::Mutex;
use redis::{Client, Connection, IntoConnectionInfo, RedisError};
use tracing::*;
use zkl2_db_types::{BatchOp, DbError, DbResult, TreeStore, WriteBatch};

const DEFAULT_SCAN_COUNT: usize = 1000;
const MGET_CHUNK: usize = 512;

/// Connection options for the redis driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisDbConfig {
    /// Server address, e.g. `redis://127.0.0.1:6379/0`.
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `COUNT` hint passed to `SCAN` when listing a namespace.
    pub scan_count: usize,
}

impl RedisDbConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            username: None,
            password: None,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username;
        self.password = password;
        self
    }
}

fn to_db_error(err: RedisError) -> DbError {
    if err.is_io_error() {
        DbError::IoError(err.to_string())
    } else {
        DbError::Backend(format!("redis error: {err}"))
    }
}

/// Builds a `SCAN MATCH` glob that matches exactly the keys starting with
/// `prefix`.
fn prefix_glob(prefix: &[u8]) -> Vec<u8> {
    let mut pattern = Vec::with_capacity(prefix.len() + 1);
    for b in prefix {
        if matches!(b, b'*' | b'?' | b'[' | b']' | b'\\') {
            pattern.push(b'\\');
        }
        pattern.push(*b);
    }
    pattern.push(b'*');
    pattern
}

pub struct RedisTreeStore {
    conn: Mutex<Connection>,
    scan_count: usize,
}

impl fmt::Debug for RedisTreeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisTreeStore")
            .field("scan_count", &self.scan_count)
            .finish_non_exhaustive()
    }
}

impl RedisTreeStore {
    /// Connects to the server described by `config`.
    pub fn connect(config: &RedisDbConfig) -> DbResult<Self> {
        let mut info = config
            .url
            .as_str()
            .into_connection_info()
            .map_err(to_db_error)?;
        if config.username.is_some() {
            info.redis.username = config.username.clone();
        }
        if config.password.is_some() {
            info.redis.password = config.password.clone();
        }

        let client = Client::open(info).map_err(to_db_error)?;
        let conn = client.get_connection().map_err(to_db_error)?;
        info!(url = %config.url, "connected redis tree store");

        Ok(Self {
            conn: Mutex::new(conn),
            scan_count: config.scan_count.max(1),
        })
    }

    fn scan_keys(&self, conn: &mut Connection, prefix: &[u8]) -> DbResult<Vec<Vec<u8>>> {
        let pattern = prefix_glob(prefix);
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();
        loop {
            let (next, batch): (u64, Vec<Vec<u8>>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(self.scan_count)
                .query(conn)
                .map_err(to_db_error)?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may return a key more than once.
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

impl TreeStore for RedisTreeStore {
    fn get(&self, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        let mut conn = self.conn.lock();
        redis::cmd("GET")
            .arg(key)
            .query(&mut *conn)
            .map_err(to_db_error)
    }

    fn write_batch(&self, batch: WriteBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.len();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put(k, v) => {
                    pipe.cmd("SET").arg(k).arg(v).ignore();
                }
                BatchOp::Delete(k) => {
                    pipe.cmd("DEL").arg(k).ignore();
                }
            }
        }
        let mut conn = self.conn.lock();
        pipe.query::<()>(&mut *conn).map_err(to_db_error)?;
        trace!(ops, "applied redis batch");
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> DbResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut conn = self.conn.lock();
        let keys = self.scan_keys(&mut conn, prefix)?;

        let mut entries = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(MGET_CHUNK) {
            let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET")
                .arg(chunk.to_vec())
                .query(&mut *conn)
                .map_err(to_db_error)?;
            // A key deleted between SCAN and MGET is simply skipped.
            entries.extend(
                chunk
                    .iter()
                    .zip(values)
                    .filter_map(|(k, v)| v.map(|v| (k.clone(), v))),
            );
        }
        Ok(entries)
    }

    fn persists_history(&self) -> bool {
        true
    }
}
