//! Row fetching over the define variables of the current query.
//!
//! Every caller-facing fetch (`fetch_one`, `fetch_many`, `fetch_all`, the
//! [`FetchRows`] trait and its stream adapter) is built on the same
//! primitive: rows are served from the define buffers until they run out,
//! then another native fetch of `fetch_array_size` rows is issued unless the
//! last one came back short.

use std::future::Future;

use futures::Stream;
use tracing::debug;

use super::Cursor;
use crate::error::{Error, Result};
use crate::native::{BindTarget, Cli, NativeStatement, StatementType};
use crate::types::{FromRow, Row};

/// Async iteration over the rows of an executed query.
///
/// # Example
///
/// ```no_run
/// use oracle_oci_rs::{FetchRows, Row};
///
/// async fn count_rows<F: FetchRows<Item = Row>>(rows: &mut F) -> oracle_oci_rs::Result<u64> {
///     let mut count = 0;
///     while rows.next().await?.is_some() {
///         count += 1;
///     }
///     Ok(count)
/// }
/// ```
pub trait FetchRows {
    /// The type of item produced.
    type Item;

    /// Get the next row, fetching from the server when the buffers are
    /// exhausted. Returns `Ok(None)` at the end of the result set.
    fn next(&mut self) -> impl Future<Output = Result<Option<Self::Item>>> + Send;

    /// Fetch every remaining row.
    fn fetch_all(&mut self) -> impl Future<Output = Result<Vec<Self::Item>>> + Send;

    /// Rows produced so far.
    fn row_count(&self) -> i64;
}

impl<C: Cli> FetchRows for Cursor<'_, C> {
    type Item = Row;

    async fn next(&mut self) -> Result<Option<Row>> {
        self.fetch_one().await
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>> {
        Cursor::fetch_all(self).await
    }

    fn row_count(&self) -> i64 {
        self.row_count
    }
}

/// Extension trait for converting a row source into a [`Stream`].
///
/// # Example
///
/// ```no_run
/// use futures::stream::TryStreamExt;
/// use oracle_oci_rs::native::Cli;
/// use oracle_oci_rs::{Connection, CursorStreamExt};
///
/// async fn names<C: Cli>(conn: &Connection<C>) -> oracle_oci_rs::Result<Vec<String>> {
///     let mut cursor = conn.cursor();
///     cursor.execute(Some("select name from users"), None).await?;
///     cursor
///         .into_stream()
///         .map_ok(|row| row.get(0).and_then(|v| v.as_str()).unwrap_or_default().to_string())
///         .try_collect()
///         .await
/// }
/// ```
pub trait CursorStreamExt: FetchRows + Sized {
    /// Convert into a stream of `Result<Item>`. The stream owns the source
    /// and ends after the first `Ok(None)`.
    fn into_stream(self) -> impl Stream<Item = Result<Self::Item>>;
}

impl<F: FetchRows> CursorStreamExt for F {
    fn into_stream(self) -> impl Stream<Item = Result<Self::Item>> {
        use futures::stream;

        stream::unfold(Some(self), |source| async move {
            let mut source = source?;
            match source.next().await {
                Ok(Some(item)) => Some((Ok(item), Some(source))),
                Ok(None) => None,
                Err(e) => Some((Err(e), Some(source))),
            }
        })
    }
}

impl<'conn, C: Cli> Cursor<'conn, C> {
    /// Fetch up to `num_rows` rows into the define variables.
    async fn internal_fetch(&mut self, num_rows: u32) -> Result<()> {
        let vars = self
            .fetch_vars
            .clone()
            .ok_or_else(|| Error::interface("query not executed"))?;
        let targets: Vec<_> = vars
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, BindTarget::Position(i as u32 + 1)))
            .collect();
        let stmt = self
            .handle
            .as_mut()
            .ok_or_else(|| Error::programming("no statement prepared"))?;
        let mut views = self.arena.views(&targets)?;
        let status = stmt.fetch(num_rows, &mut views).await;
        drop(views);
        let status = status?;

        for id in &vars {
            self.arena.get_mut(*id)?.mark_fetched();
        }
        let total = self.statement_mut()?.row_count()? as i64;
        self.actual_rows = total - self.row_count;
        self.row_num = 0;
        debug!(
            requested = num_rows,
            rows = self.actual_rows,
            ?status,
            "fetched rows"
        );
        Ok(())
    }

    /// Whether a buffered row is available, fetching another batch if the
    /// last one was full.
    async fn more_rows(&mut self) -> Result<bool> {
        if self.row_num >= self.actual_rows {
            if self.actual_rows < 0 || self.actual_rows == self.fetch_array_size as i64 {
                self.internal_fetch(self.fetch_array_size).await?;
            }
            if self.row_num >= self.actual_rows {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Build the row at the buffer cursor and advance.
    fn create_row(&mut self) -> Result<Row> {
        let vars = self
            .fetch_vars
            .as_ref()
            .ok_or_else(|| Error::interface("query not executed"))?;
        let pos = self.row_num as u32;
        let values = vars
            .iter()
            .map(|id| self.arena.get(*id)?.get_value(pos))
            .collect::<Result<Vec<_>>>()?;
        self.row_num += 1;
        self.row_count += 1;

        let row = Row::new(values, self.column_info.clone());
        match self.row_factory.as_mut() {
            Some(factory) => factory(row),
            None => Ok(row),
        }
    }

    fn verify_fetch(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.fixup_bound_cursor()?;
        if self.statement_type != Some(StatementType::Select) {
            return Err(Error::interface("not a query"));
        }
        Ok(())
    }

    async fn multi_fetch(&mut self, limit: Option<usize>) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while limit.map_or(true, |limit| rows.len() < limit) {
            if !self.more_rows().await? {
                break;
            }
            rows.push(self.create_row()?);
        }
        Ok(rows)
    }

    /// Fetch the next row, or `None` when the result set is exhausted.
    pub async fn fetch_one(&mut self) -> Result<Option<Row>> {
        self.verify_fetch()?;
        if self.more_rows().await? {
            self.create_row().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Fetch up to `rows` rows, `array_size` rows when `None`. A limit of
    /// zero fetches everything.
    pub async fn fetch_many(&mut self, rows: Option<u32>) -> Result<Vec<Row>> {
        self.verify_fetch()?;
        let limit = match rows.unwrap_or(self.array_size) {
            0 => None,
            n => Some(n as usize),
        };
        self.multi_fetch(limit).await
    }

    /// Fetch every remaining row.
    pub async fn fetch_all(&mut self) -> Result<Vec<Row>> {
        self.verify_fetch()?;
        self.multi_fetch(None).await
    }

    /// Like [`Cursor::fetch_one`], converting the row into `T` after the
    /// row factory has run.
    pub async fn fetch_one_as<T: FromRow>(&mut self) -> Result<Option<T>> {
        self.fetch_one().await?.map(T::from_row).transpose()
    }

    pub async fn fetch_many_as<T: FromRow>(&mut self, rows: Option<u32>) -> Result<Vec<T>> {
        self.fetch_many(rows)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect()
    }

    pub async fn fetch_all_as<T: FromRow>(&mut self) -> Result<Vec<T>> {
        self.fetch_all().await?.into_iter().map(T::from_row).collect()
    }

    /// Perform one native fetch of up to `rows` rows into the define
    /// variables without building rows, returning the number fetched.
    ///
    /// The values are read back through [`Cursor::fetch_variables`].
    pub async fn fetch_raw(&mut self, rows: Option<u32>) -> Result<u32> {
        self.verify_fetch()?;
        let requested = rows.unwrap_or(self.fetch_array_size);
        if requested > self.fetch_array_size {
            return Err(Error::interface("rows to fetch exceeds array size"));
        }
        if self.actual_rows > 0 && self.actual_rows < self.fetch_array_size as i64 {
            return Ok(0);
        }

        self.internal_fetch(requested).await?;
        self.row_count += self.actual_rows;
        let fetched = self.actual_rows.max(0) as u32;
        if self.actual_rows == requested as i64 {
            self.actual_rows = -1;
        }
        Ok(fetched)
    }
}
