//! Scripted in-memory native layer shared by the integration tests.
//!
//! A [`FakeServer`] holds result sets, DML row counts, PL/SQL handlers and
//! LOB contents keyed by statement text or locator. Every native call made
//! through a [`FakeCli`] is appended to the call log so tests can assert on
//! what the engine asked for.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use oracle_oci_rs::codec::{
    decode_oracle_date, decode_oracle_number, decode_oracle_timestamp, encode_oracle_date,
    encode_oracle_float, encode_oracle_integer, encode_oracle_number, encode_oracle_timestamp,
};
use oracle_oci_rs::native::constants::*;
use oracle_oci_rs::native::{
    BindAttribute, BindTarget, BufferSpec, BufferView, Cli, ExecuteMode, FetchStatus, Handle,
    HandleAllocator, HandleKind, NativeStatement, StatementType,
};
use oracle_oci_rs::{ColumnMetadata, Connection, EnvironmentConfig, Error, OracleValue, Result};

/// Output values of a PL/SQL block, by bind target.
pub type Outputs = Vec<(BindTarget, OracleValue)>;

/// Simulates a PL/SQL block: receives element 0 of every bind, returns the
/// values to write back.
pub type PlsqlHandler = Arc<dyn Fn(&HashMap<BindTarget, OracleValue>) -> Result<Outputs> + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Prepare(String),
    Bind {
        sql: String,
        target: BindTarget,
        spec: BufferSpec,
    },
    Attribute {
        target: BindTarget,
        attribute: BindAttribute,
    },
    Define {
        position: u32,
        spec: BufferSpec,
    },
    Execute {
        sql: String,
        iters: u32,
        mode: ExecuteMode,
        /// Values per bind: one per iteration, or the array contents.
        binds: Vec<(BindTarget, Vec<OracleValue>)>,
    },
    Fetch {
        requested: u32,
        returned: u32,
    },
    FileOpen(Handle),
    FileClose(Handle),
}

#[derive(Debug, Clone)]
pub struct ResultSet {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Vec<OracleValue>>,
}

#[derive(Default)]
pub struct ServerState {
    queries: HashMap<String, ResultSet>,
    dml_rows: HashMap<String, u64>,
    handlers: HashMap<String, PlsqlHandler>,
    failures: HashMap<String, Error>,
    calls: Vec<Call>,
    lobs: HashMap<Handle, Vec<u8>>,
    files: HashMap<Handle, (String, String)>,
    ref_cursors: HashMap<Handle, String>,
    disconnected: bool,
}

/// Handle allocator tracking how many descriptors are outstanding.
#[derive(Default)]
pub struct FakeAllocator {
    next: AtomicU64,
    live: AtomicI64,
}

impl HandleAllocator for FakeAllocator {
    fn alloc_handle(&self, _kind: HandleKind) -> Result<Handle> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(1000 + self.next.fetch_add(1, Ordering::SeqCst))
    }

    fn free_handle(&self, _kind: HandleKind, _handle: Handle) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Default)]
pub struct FakeServer {
    state: Arc<Mutex<ServerState>>,
    allocator: Arc<FakeAllocator>,
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn connect(&self) -> Connection<FakeCli> {
        self.connect_with(EnvironmentConfig::default())
    }

    pub fn connect_with(&self, config: EnvironmentConfig) -> Connection<FakeCli> {
        Connection::new(
            FakeCli {
                state: self.state.clone(),
                allocator: self.allocator.clone(),
            },
            config,
        )
    }

    pub fn add_query(&self, sql: &str, columns: Vec<ColumnMetadata>, rows: Vec<Vec<OracleValue>>) {
        self.state()
            .queries
            .insert(sql.to_string(), ResultSet { columns, rows });
    }

    /// Rows affected per iteration of a DML statement (default 1).
    pub fn set_dml_rows(&self, sql: &str, rows: u64) {
        self.state().dml_rows.insert(sql.to_string(), rows);
    }

    pub fn on_plsql<F>(&self, sql: &str, handler: F)
    where
        F: Fn(&HashMap<BindTarget, OracleValue>) -> Result<Outputs> + Send + Sync + 'static,
    {
        self.state().handlers.insert(sql.to_string(), Arc::new(handler));
    }

    pub fn fail_execute(&self, sql: &str, error: Error) {
        self.state().failures.insert(sql.to_string(), error);
    }

    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn executes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Execute { .. }))
            .collect()
    }

    pub fn prepares(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Prepare(_)))
            .count()
    }

    pub fn fetches(&self) -> Vec<(u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch {
                    requested,
                    returned,
                } => Some((requested, returned)),
                _ => None,
            })
            .collect()
    }

    pub fn binds(&self) -> Vec<(BindTarget, BufferSpec)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Bind { target, spec, .. } => Some((target, spec)),
                _ => None,
            })
            .collect()
    }

    pub fn lob_contents(&self, locator: Handle) -> Option<Vec<u8>> {
        self.state().lobs.get(&locator).cloned()
    }

    pub fn live_handles(&self) -> i64 {
        self.allocator.live.load(Ordering::SeqCst)
    }
}

pub struct FakeCli {
    state: Arc<Mutex<ServerState>>,
    allocator: Arc<FakeAllocator>,
}

impl FakeCli {
    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    fn prepare_sync(&self, sql: &str) -> Result<FakeStatement> {
        self.state().calls.push(Call::Prepare(sql.to_string()));
        Ok(FakeStatement::new(self.state.clone(), sql))
    }

    fn statement_for_handle(&self, handle: Handle) -> Result<FakeStatement> {
        let sql = self
            .state()
            .ref_cursors
            .get(&handle)
            .cloned()
            .ok_or_else(|| Error::oracle(24338, "statement handle not executed"))?;
        let mut stmt = FakeStatement::new(self.state.clone(), &sql);
        stmt.load_rows();
        Ok(stmt)
    }

    fn read_sync(&self, locator: Handle, offset: u64, amount: u64, buffer: &mut [u8]) -> Result<u64> {
        let state = self.state();
        let data = state
            .lobs
            .get(&locator)
            .ok_or_else(|| Error::oracle(22275, "invalid LOB locator specified"))?;
        let start = (offset.saturating_sub(1) as usize).min(data.len());
        let end = (start + amount as usize).min(data.len());
        let len = (end - start).min(buffer.len());
        buffer[..len].copy_from_slice(&data[start..start + len]);
        Ok(len as u64)
    }
}

impl Cli for FakeCli {
    type Statement = FakeStatement;

    fn is_connected(&self) -> bool {
        !self.state().disconnected
    }

    fn handle_allocator(&self) -> Arc<dyn HandleAllocator> {
        self.allocator.clone()
    }

    async fn prepare(&self, sql: &str) -> Result<FakeStatement> {
        self.prepare_sync(sql)
    }

    fn statement_from_handle(&self, handle: Handle) -> Result<FakeStatement> {
        self.statement_for_handle(handle)
    }

    async fn lob_length(&self, locator: Handle) -> Result<u64> {
        Ok(self
            .state()
            .lobs
            .get(&locator)
            .map(|d| d.len() as u64)
            .unwrap_or(0))
    }

    async fn lob_read(
        &self,
        locator: Handle,
        offset: u64,
        amount: u64,
        _charset_form: u8,
        buffer: &mut [u8],
    ) -> Result<u64> {
        self.read_sync(locator, offset, amount, buffer)
    }

    async fn lob_write(&self, locator: Handle, offset: u64, data: &[u8], _charset_form: u8) -> Result<u64> {
        let mut state = self.state();
        let lob = state.lobs.entry(locator).or_default();
        let start = offset.saturating_sub(1) as usize;
        if lob.len() < start + data.len() {
            lob.resize(start + data.len(), b' ');
        }
        lob[start..start + data.len()].copy_from_slice(data);
        Ok(data.len() as u64)
    }

    async fn lob_trim(&self, locator: Handle, new_size: u64) -> Result<()> {
        if let Some(lob) = self.state().lobs.get_mut(&locator) {
            lob.truncate(new_size as usize);
        }
        Ok(())
    }

    async fn file_open(&self, locator: Handle) -> Result<()> {
        self.state().calls.push(Call::FileOpen(locator));
        Ok(())
    }

    async fn file_close(&self, locator: Handle) -> Result<()> {
        self.state().calls.push(Call::FileClose(locator));
        Ok(())
    }

    async fn file_exists(&self, locator: Handle) -> Result<bool> {
        let state = self.state();
        Ok(state.files.contains_key(&locator) && state.lobs.contains_key(&locator))
    }

    fn file_name(&self, locator: Handle) -> Result<(String, String)> {
        self.state()
            .files
            .get(&locator)
            .cloned()
            .ok_or_else(|| Error::oracle(22285, "non-existent directory or file"))
    }

    fn set_file_name(&self, locator: Handle, directory: &str, name: &str) -> Result<()> {
        let mut state = self.state();
        state
            .files
            .insert(locator, (directory.to_string(), name.to_string()));
        state.lobs.remove(&locator);
        Ok(())
    }
}

pub struct FakeStatement {
    state: Arc<Mutex<ServerState>>,
    sql: String,
    columns: Vec<ColumnMetadata>,
    rows: Vec<Vec<OracleValue>>,
    fetched: usize,
    affected: u64,
}

fn classify(sql: &str) -> StatementType {
    let first = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match first.as_str() {
        "select" | "with" => StatementType::Select,
        "insert" => StatementType::Insert,
        "update" => StatementType::Update,
        "delete" => StatementType::Delete,
        "create" => StatementType::Create,
        "drop" => StatementType::Drop,
        "alter" => StatementType::Alter,
        "begin" => StatementType::Begin,
        "declare" => StatementType::Declare,
        _ => StatementType::Other(0),
    }
}

impl FakeStatement {
    fn new(state: Arc<Mutex<ServerState>>, sql: &str) -> Self {
        let columns = state
            .lock()
            .unwrap()
            .queries
            .get(sql)
            .map(|q| q.columns.clone())
            .unwrap_or_default();
        Self {
            state,
            sql: sql.to_string(),
            columns,
            rows: Vec::new(),
            fetched: 0,
            affected: 0,
        }
    }

    fn load_rows(&mut self) {
        self.rows = self
            .state
            .lock()
            .unwrap()
            .queries
            .get(&self.sql)
            .map(|q| q.rows.clone())
            .unwrap_or_default();
        self.fetched = 0;
    }

    fn execute_sync(&mut self, iters: u32, mode: ExecuteMode, binds: &mut [BufferView<'_>]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let recorded = binds
            .iter()
            .map(|view| {
                let count = match view.actual_elements.as_deref() {
                    Some(n) => *n as usize,
                    None => (iters.max(1) as usize).min(view.capacity()),
                };
                (view.target.clone(), (0..count).map(|i| decode(view, i)).collect())
            })
            .collect();
        state.calls.push(Call::Execute {
            sql: self.sql.clone(),
            iters,
            mode,
            binds: recorded,
        });
        if mode == ExecuteMode::ParseOnly {
            return Ok(());
        }
        if let Some(err) = state.failures.get(&self.sql) {
            return Err(err.clone());
        }

        match classify(&self.sql) {
            StatementType::Select => {
                drop(state);
                self.load_rows();
            }
            t if t.reports_row_count() => {
                let per_iter = state.dml_rows.get(&self.sql).copied().unwrap_or(1);
                self.affected = per_iter * iters as u64;
            }
            _ => {
                let Some(handler) = state.handlers.get(&self.sql).cloned() else {
                    return Ok(());
                };
                let inputs: HashMap<BindTarget, OracleValue> = binds
                    .iter()
                    .map(|view| (view.target.clone(), decode(view, 0)))
                    .collect();
                let outputs = handler(&inputs)?;
                for (target, value) in outputs {
                    let view = binds
                        .iter_mut()
                        .find(|v| v.target == target)
                        .ok_or_else(|| Error::oracle(1036, format!("illegal variable name/number {}", target)))?;
                    match value {
                        OracleValue::Array(items) => {
                            for (i, item) in items.iter().enumerate() {
                                encode(&mut state, view, i, item)?;
                            }
                            if let Some(n) = view.actual_elements.as_deref_mut() {
                                *n = items.len() as u32;
                            }
                        }
                        value => encode(&mut state, view, 0, &value)?,
                    }
                }
            }
        }
        Ok(())
    }

    fn fetch_sync(&mut self, rows: u32, defines: &mut [BufferView<'_>]) -> Result<FetchStatus> {
        let mut state = self.state.lock().unwrap();
        let available = self.rows.len() - self.fetched;
        let count = available.min(rows as usize);
        for i in 0..count {
            let row = &self.rows[self.fetched + i];
            for view in defines.iter_mut() {
                let BindTarget::Position(position) = view.target else {
                    return Err(Error::oracle(1007, "variable not in select list"));
                };
                encode(&mut state, view, i, &row[position as usize - 1])?;
            }
        }
        self.fetched += count;
        state.calls.push(Call::Fetch {
            requested: rows,
            returned: count as u32,
        });
        Ok(if count < rows as usize {
            FetchStatus::NoData
        } else {
            FetchStatus::Rows
        })
    }
}

impl NativeStatement for FakeStatement {
    fn statement_type(&self) -> Result<StatementType> {
        Ok(classify(&self.sql))
    }

    fn bind(&mut self, target: &BindTarget, spec: &BufferSpec) -> Result<()> {
        self.state.lock().unwrap().calls.push(Call::Bind {
            sql: self.sql.clone(),
            target: target.clone(),
            spec: spec.clone(),
        });
        Ok(())
    }

    fn set_bind_attribute(&mut self, target: &BindTarget, attribute: BindAttribute) -> Result<()> {
        self.state.lock().unwrap().calls.push(Call::Attribute {
            target: target.clone(),
            attribute,
        });
        Ok(())
    }

    fn define(&mut self, position: u32, spec: &BufferSpec) -> Result<()> {
        self.state.lock().unwrap().calls.push(Call::Define {
            position,
            spec: spec.clone(),
        });
        Ok(())
    }

    fn column_count(&self) -> Result<u32> {
        Ok(self.columns.len() as u32)
    }

    fn describe_column(&self, position: u32) -> Result<ColumnMetadata> {
        self.columns
            .get(position as usize - 1)
            .cloned()
            .ok_or_else(|| Error::oracle(1007, "variable not in select list"))
    }

    fn bind_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut chars = self.sql.chars().peekable();
        while let Some(c) = chars.next() {
            if c != ':' || chars.peek() == Some(&'=') {
                continue;
            }
            let mut name = String::new();
            while let Some(&n) = chars.peek() {
                if n.is_ascii_alphanumeric() || n == '_' {
                    name.push(n.to_ascii_uppercase());
                    chars.next();
                } else {
                    break;
                }
            }
            if !name.is_empty() {
                names.push(name);
            }
        }
        Ok(names)
    }

    fn row_count(&self) -> Result<u64> {
        Ok(match classify(&self.sql) {
            StatementType::Select => self.fetched as u64,
            _ => self.affected,
        })
    }

    async fn execute(&mut self, iters: u32, mode: ExecuteMode, binds: &mut [BufferView<'_>]) -> Result<()> {
        self.execute_sync(iters, mode, binds)
    }

    async fn fetch(&mut self, rows: u32, defines: &mut [BufferView<'_>]) -> Result<FetchStatus> {
        self.fetch_sync(rows, defines)
    }
}

fn locator(view: &BufferView<'_>, pos: usize) -> Handle {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&view.element(pos)[..8]);
    u64::from_le_bytes(raw)
}

fn number_bytes(value: &OracleValue) -> Result<Vec<u8>> {
    match value {
        OracleValue::Integer(i) => encode_oracle_integer(*i),
        OracleValue::Float(f) => encode_oracle_float(*f),
        OracleValue::Number(text) => encode_oracle_number(text),
        OracleValue::Boolean(b) => encode_oracle_integer(*b as i64),
        other => Err(Error::oracle(1722, format!("invalid number: {:?}", other))),
    }
}

/// Write a server value into element `pos` of a bind or define buffer.
fn encode(state: &mut ServerState, view: &mut BufferView<'_>, pos: usize, value: &OracleValue) -> Result<()> {
    if value.is_null() {
        view.put_null(pos);
        return Ok(());
    }
    match view.wire_type {
        SQLT_CHR | SQLT_AFC => match value {
            OracleValue::String(s) => view.put_bytes(pos, s.as_bytes()),
            other => view.put_bytes(pos, format!("{:?}", other).as_bytes()),
        },
        SQLT_BIN => view.put_bytes(pos, value.as_raw().unwrap_or_default()),
        SQLT_LVC | SQLT_LVB => {
            let payload = match value {
                OracleValue::String(s) => s.as_bytes().to_vec(),
                OracleValue::Raw(r) => r.clone(),
                other => format!("{:?}", other).into_bytes(),
            };
            let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
            bytes.extend_from_slice(&payload);
            view.put_bytes(pos, &bytes);
        }
        SQLT_VNU => {
            let number = number_bytes(value)?;
            let element = view.element_mut(pos);
            element[0] = number.len() as u8;
            element[1..=number.len()].copy_from_slice(&number);
            view.indicator[pos] = IND_NOT_NULL;
        }
        SQLT_BDOUBLE => {
            let f = value.to_f64().unwrap_or_default();
            view.element_mut(pos)[..8].copy_from_slice(&f.to_ne_bytes());
            view.indicator[pos] = IND_NOT_NULL;
        }
        SQLT_DAT => {
            let dt = value.as_date().ok_or_else(|| Error::oracle(1858, "not a date"))?;
            view.element_mut(pos)[..7].copy_from_slice(&encode_oracle_date(&dt)?);
            view.indicator[pos] = IND_NOT_NULL;
        }
        SQLT_TIMESTAMP => {
            let dt = value.as_date().ok_or_else(|| Error::oracle(1858, "not a timestamp"))?;
            view.element_mut(pos)[..11].copy_from_slice(&encode_oracle_timestamp(&dt)?);
            view.indicator[pos] = IND_NOT_NULL;
        }
        SQLT_CLOB | SQLT_BLOB | SQLT_BFILE => {
            let handle = locator(view, pos);
            let content = match value {
                OracleValue::String(s) => s.as_bytes().to_vec(),
                OracleValue::Raw(r) => r.clone(),
                other => format!("{:?}", other).into_bytes(),
            };
            state.lobs.insert(handle, content);
            if view.wire_type == SQLT_BFILE {
                state
                    .files
                    .insert(handle, ("DATA_DIR".to_string(), format!("file{}.dat", handle)));
            }
            view.indicator[pos] = IND_NOT_NULL;
        }
        SQLT_RSET => {
            let handle = locator(view, pos);
            let sql = value
                .as_str()
                .ok_or_else(|| Error::oracle(6550, "ref cursor output must name a query"))?;
            state.ref_cursors.insert(handle, sql.to_string());
            view.indicator[pos] = IND_NOT_NULL;
        }
        other => return Err(Error::oracle(3115, format!("unsupported wire type {}", other))),
    }
    Ok(())
}

/// Read element `pos` of a bind buffer as the server would see it.
fn decode(view: &BufferView<'_>, pos: usize) -> OracleValue {
    if view.is_null(pos) {
        return OracleValue::Null;
    }
    let element = view.element(pos);
    let len = view.length(pos).unwrap_or(0) as usize;
    match view.wire_type {
        SQLT_CHR | SQLT_AFC => OracleValue::String(String::from_utf8_lossy(&element[..len]).into_owned()),
        SQLT_BIN => OracleValue::Raw(element[..len].to_vec()),
        SQLT_LVC | SQLT_LVB => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&element[..4]);
            let n = u32::from_le_bytes(raw) as usize;
            let payload = &element[4..4 + n];
            if view.wire_type == SQLT_LVC {
                OracleValue::String(String::from_utf8_lossy(payload).into_owned())
            } else {
                OracleValue::Raw(payload.to_vec())
            }
        }
        SQLT_VNU => {
            let n = element[0] as usize;
            match decode_oracle_number(&element[1..=n]) {
                Ok(text) => OracleValue::Number(text),
                Err(_) => OracleValue::Null,
            }
        }
        SQLT_BDOUBLE => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&element[..8]);
            OracleValue::Float(f64::from_ne_bytes(raw))
        }
        SQLT_DAT => decode_oracle_date(&element[..7]).map(OracleValue::Date).unwrap_or(OracleValue::Null),
        SQLT_TIMESTAMP => decode_oracle_timestamp(&element[..11])
            .map(OracleValue::Timestamp)
            .unwrap_or(OracleValue::Null),
        _ => OracleValue::Integer(locator(view, pos) as i64),
    }
}

/// Text of a bound numeric value as the server received it.
pub fn number_text(value: &OracleValue) -> Option<&str> {
    match value {
        OracleValue::Number(text) => Some(text),
        _ => None,
    }
}
