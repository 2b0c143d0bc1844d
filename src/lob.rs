//! Operations on a LOB locator read from a variable.
//!
//! A [`Lob`] is obtained from [`Cursor::lob`](crate::cursor::Cursor::lob),
//! which checks that the locator still belongs to the variable's current
//! fetch. Offsets are 1-based; amounts are characters for CLOB/NCLOB and
//! bytes otherwise.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::native::{Cli, Handle};
use crate::types::{LobKind, OracleValue};

pub struct Lob<'a, C: Cli> {
    cli: &'a C,
    env: Arc<Environment>,
    kind: LobKind,
    locator: Handle,
}

impl<'a, C: Cli> Lob<'a, C> {
    pub(crate) fn new(cli: &'a C, env: &Arc<Environment>, kind: LobKind, locator: Handle) -> Self {
        Self {
            cli,
            env: env.clone(),
            kind,
            locator,
        }
    }

    pub fn kind(&self) -> LobKind {
        self.kind
    }

    /// Length in characters for character LOBs, bytes otherwise.
    pub async fn size(&self) -> Result<u64> {
        self.cli.lob_length(self.locator).await
    }

    /// Read the raw bytes of a range. `offset` defaults to 1; `amount`
    /// defaults to the rest of the LOB and is at least 1.
    pub async fn read_bytes(&self, offset: Option<u64>, amount: Option<u64>) -> Result<Bytes> {
        let offset = offset.filter(|o| *o > 0).unwrap_or(1);
        let amount = match amount {
            Some(amount) => amount,
            None => {
                let size = self.size().await?;
                (size + 1).saturating_sub(offset).max(1)
            }
        };

        let mbpc = self.env.max_bytes_per_character() as u64;
        let unit = if self.kind.is_character() { mbpc } else { 1 };
        let buffer_size = usize::try_from(amount.saturating_mul(unit))
            .map_err(|_| Error::Allocation { requested: amount.saturating_mul(unit) })?;
        let mut buffer = vec![0u8; buffer_size];

        let mut read = if self.kind.is_file() {
            self.cli.file_open(self.locator).await?;
            match self
                .cli
                .lob_read(self.locator, offset, amount, self.kind.charset_form(), &mut buffer)
                .await
            {
                Ok(read) => {
                    self.cli.file_close(self.locator).await?;
                    read
                }
                Err(err) => {
                    // the read error is the one reported
                    let _ = self.cli.file_close(self.locator).await;
                    return Err(err);
                }
            }
        } else {
            self.cli
                .lob_read(self.locator, offset, amount, self.kind.charset_form(), &mut buffer)
                .await?
        };
        if self.kind.is_character() && self.env.fixed_width() {
            read *= mbpc;
        }

        buffer.truncate((read as usize).min(buffer_size));
        debug!(kind = ?self.kind, offset, amount, bytes = buffer.len(), "read LOB");
        Ok(Bytes::from(buffer))
    }

    /// Read a range as a value: text for CLOB/NCLOB, raw bytes otherwise.
    pub async fn read(&self, offset: Option<u64>, amount: Option<u64>) -> Result<OracleValue> {
        let data = self.read_bytes(offset, amount).await?;
        if self.kind.is_character() {
            Ok(OracleValue::String(decode_text(&data)?))
        } else {
            Ok(OracleValue::Raw(data.to_vec()))
        }
    }

    /// Read the whole content of a character LOB.
    pub async fn read_string(&self) -> Result<String> {
        if !self.kind.is_character() {
            return Err(Error::type_error("LOB does not contain character data"));
        }
        let data = self.read_bytes(None, None).await?;
        decode_text(&data)
    }

    /// Write `data` at `offset` (default 1), returning the amount written.
    pub async fn write(&self, data: &[u8], offset: Option<u64>) -> Result<u64> {
        if self.kind.is_file() {
            return Err(Error::not_supported("BFILE values are read only"));
        }
        let offset = offset.filter(|o| *o > 0).unwrap_or(1);
        let written = self
            .cli
            .lob_write(self.locator, offset, data, self.kind.charset_form())
            .await?;
        debug!(kind = ?self.kind, offset, written, "wrote LOB");
        Ok(written)
    }

    /// Truncate to `new_size`, emptying the LOB when `None`.
    pub async fn trim(&self, new_size: Option<u64>) -> Result<()> {
        if self.kind.is_file() {
            return Err(Error::not_supported("BFILE values are read only"));
        }
        self.cli.lob_trim(self.locator, new_size.unwrap_or(0)).await
    }

    fn ensure_file(&self) -> Result<()> {
        if self.kind.is_file() {
            Ok(())
        } else {
            Err(Error::programming("operation is only valid for BFILE values"))
        }
    }

    /// Directory alias and file name of a BFILE.
    pub fn file_name(&self) -> Result<(String, String)> {
        self.ensure_file()?;
        self.cli.file_name(self.locator)
    }

    pub fn set_file_name(&self, directory: &str, name: &str) -> Result<()> {
        self.ensure_file()?;
        self.cli.set_file_name(self.locator, directory, name)
    }

    pub async fn file_exists(&self) -> Result<bool> {
        self.ensure_file()?;
        self.cli.file_exists(self.locator).await
    }
}

fn decode_text(data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|e| Error::data(format!("LOB contains invalid character data: {e}")))
}

impl<C: Cli> fmt::Debug for Lob<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lob")
            .field("kind", &self.kind)
            .field("locator", &self.locator)
            .finish()
    }
}
