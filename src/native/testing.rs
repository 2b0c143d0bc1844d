//! In-crate test doubles for the native seam.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::*;
use crate::environment::{Environment, EnvironmentConfig};
use crate::error::Error;

/// Allocator counting live handles.
#[derive(Default)]
pub(crate) struct CountingAllocator {
    next: AtomicU64,
    pub live: AtomicUsize,
    pub freed: Mutex<Vec<Handle>>,
}

impl HandleAllocator for CountingAllocator {
    fn alloc_handle(&self, _kind: HandleKind) -> Result<Handle> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn free_handle(&self, _kind: HandleKind, handle: Handle) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.freed.lock().unwrap().push(handle);
    }
}

pub(crate) fn test_env() -> (Arc<Environment>, Arc<CountingAllocator>) {
    let alloc = Arc::new(CountingAllocator::default());
    let env = Environment::new(EnvironmentConfig::default(), alloc.clone());
    (env, alloc)
}

/// Statement that only records bind calls.
#[derive(Default)]
pub(crate) struct RecordingStatement {
    pub binds: Vec<(BindTarget, BufferSpec)>,
    pub attributes: Vec<(BindTarget, BindAttribute)>,
    pub defines: Vec<(u32, BufferSpec)>,
}

impl NativeStatement for RecordingStatement {
    fn statement_type(&self) -> Result<StatementType> {
        Ok(StatementType::Begin)
    }

    fn bind(&mut self, target: &BindTarget, spec: &BufferSpec) -> Result<()> {
        self.binds.push((target.clone(), spec.clone()));
        Ok(())
    }

    fn set_bind_attribute(&mut self, target: &BindTarget, attribute: BindAttribute) -> Result<()> {
        self.attributes.push((target.clone(), attribute));
        Ok(())
    }

    fn define(&mut self, position: u32, spec: &BufferSpec) -> Result<()> {
        self.defines.push((position, spec.clone()));
        Ok(())
    }

    fn column_count(&self) -> Result<u32> {
        Ok(0)
    }

    fn describe_column(&self, position: u32) -> Result<ColumnMetadata> {
        Err(Error::oracle(1007, format!("variable not in select list: {}", position)))
    }

    fn bind_names(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn row_count(&self) -> Result<u64> {
        Ok(0)
    }

    async fn execute(
        &mut self,
        _iters: u32,
        _mode: ExecuteMode,
        _binds: &mut [BufferView<'_>],
    ) -> Result<()> {
        Ok(())
    }

    async fn fetch(&mut self, _rows: u32, _defines: &mut [BufferView<'_>]) -> Result<FetchStatus> {
        Ok(FetchStatus::NoData)
    }
}

/// Native layer holding a single LOB, for exercising [`crate::lob::Lob`].
///
/// Character LOB lengths and read amounts are in characters of
/// `bytes_per_char` bytes, as a fixed-width client character set reports them.
#[derive(Default)]
pub(crate) struct LobCli {
    pub data: Mutex<Vec<u8>>,
    pub bytes_per_char: usize,
    pub fail_reads: bool,
    pub calls: Mutex<Vec<&'static str>>,
    allocator: Arc<CountingAllocator>,
}

impl LobCli {
    pub fn new(data: &[u8], bytes_per_char: usize) -> Self {
        Self {
            data: Mutex::new(data.to_vec()),
            bytes_per_char: bytes_per_char.max(1),
            ..Default::default()
        }
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Cli for LobCli {
    type Statement = RecordingStatement;

    fn is_connected(&self) -> bool {
        true
    }

    fn handle_allocator(&self) -> Arc<dyn HandleAllocator> {
        self.allocator.clone()
    }

    async fn prepare(&self, _sql: &str) -> Result<RecordingStatement> {
        Ok(RecordingStatement::default())
    }

    fn statement_from_handle(&self, _handle: Handle) -> Result<RecordingStatement> {
        Ok(RecordingStatement::default())
    }

    async fn lob_length(&self, _locator: Handle) -> Result<u64> {
        Ok((self.data.lock().unwrap().len() / self.bytes_per_char) as u64)
    }

    async fn lob_read(
        &self,
        _locator: Handle,
        offset: u64,
        amount: u64,
        _charset_form: u8,
        buffer: &mut [u8],
    ) -> Result<u64> {
        self.record("read");
        if self.fail_reads {
            return Err(Error::oracle(22288, "file or LOB operation FILEOPEN failed"));
        }
        let data = self.data.lock().unwrap();
        let width = self.bytes_per_char;
        let start = ((offset - 1) as usize * width).min(data.len());
        let end = (start + amount as usize * width).min(data.len()).min(start + buffer.len());
        buffer[..end - start].copy_from_slice(&data[start..end]);
        Ok(((end - start) / width) as u64)
    }

    async fn lob_write(&self, _locator: Handle, offset: u64, bytes: &[u8], _charset_form: u8) -> Result<u64> {
        self.record("write");
        let mut data = self.data.lock().unwrap();
        let start = (offset - 1) as usize;
        if data.len() < start + bytes.len() {
            data.resize(start + bytes.len(), 0);
        }
        data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len() as u64)
    }

    async fn lob_trim(&self, _locator: Handle, new_size: u64) -> Result<()> {
        self.data.lock().unwrap().truncate(new_size as usize);
        Ok(())
    }

    async fn file_open(&self, _locator: Handle) -> Result<()> {
        self.record("open");
        Ok(())
    }

    async fn file_close(&self, _locator: Handle) -> Result<()> {
        self.record("close");
        Ok(())
    }

    async fn file_exists(&self, _locator: Handle) -> Result<bool> {
        Ok(true)
    }

    fn file_name(&self, _locator: Handle) -> Result<(String, String)> {
        Ok(("DIR".to_string(), "name".to_string()))
    }

    fn set_file_name(&self, _locator: Handle, _directory: &str, _name: &str) -> Result<()> {
        Ok(())
    }
}
