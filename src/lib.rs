//! Typed data access core for Oracle's call-level interface.
//!
//! This crate sits between application code and a native call-level
//! interface. It owns the typed buffers statements bind and define against,
//! infers bind types from host values, and drives the prepare, bind,
//! execute, define and fetch lifecycle of a statement. The native library
//! itself is reached through the traits in [`native`], so the engine can run
//! against any implementation of them.
//!
//! # Example
//!
//! ```no_run
//! use oracle_oci_rs::native::Cli;
//! use oracle_oci_rs::{Connection, EnvironmentConfig, Params, Result};
//!
//! async fn run<C: Cli>(cli: C) -> Result<()> {
//!     let conn = Connection::new(cli, EnvironmentConfig::default());
//!     let mut cursor = conn.cursor();
//!
//!     cursor
//!         .execute(
//!             Some("insert into users (id, name) values (:1, :2)"),
//!             Some(&Params::Positional(vec![1i64.into(), "scott".into()])),
//!         )
//!         .await?;
//!     println!("inserted {} row(s)", cursor.row_count());
//!
//!     cursor.set_array_size(100);
//!     cursor.execute(Some("select id, name from users"), None).await?;
//!     for row in cursor.fetch_all().await? {
//!         println!("{:?}", row.values());
//!     }
//!     Ok(())
//! }
//! ```

mod binder;
pub mod codec;
pub mod connection;
pub mod cursor;
pub mod environment;
pub mod error;
pub mod lob;
pub mod native;
pub mod types;
pub mod variable;

pub use binder::{BindVariables, InputSize, InputSizes};
pub use connection::Connection;
pub use cursor::{ArrayContents, Cursor, CursorStreamExt, FetchRows, RowFactory};
pub use environment::{Environment, EnvironmentConfig, NumberNarrowing};
pub use error::{Error, ErrorKind, Result};
pub use lob::Lob;
pub use types::{
    Column, ColumnDescription, ColumnInfo, ColumnMetadata, DataType, LobHandle, LobKind,
    FromRow, FromValue, OracleValue, Param, Params, RefCursor, Row, VariableType,
};
pub use variable::{VarId, Variable};
