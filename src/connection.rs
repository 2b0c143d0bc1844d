//! Connection handle over a native session.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::cursor::Cursor;
use crate::environment::{Environment, EnvironmentConfig};
use crate::error::{Error, Result};
use crate::native::Cli;

/// An open session plus the environment its variables are sized against.
///
/// Session establishment happens outside this crate; a `Connection` wraps an
/// already connected [`Cli`] implementation.
///
/// # Example
///
/// ```no_run
/// use oracle_oci_rs::{Connection, EnvironmentConfig, FetchRows, Params};
///
/// async fn list_users<C: oracle_oci_rs::native::Cli>(cli: C) -> oracle_oci_rs::Result<()> {
///     let conn = Connection::new(cli, EnvironmentConfig::default());
///     let mut cursor = conn.cursor();
///     cursor.set_array_size(50);
///     cursor
///         .execute(Some("select id, name from users where active = :1"), Some(&Params::positional([1i64])))
///         .await?;
///     while let Some(row) = cursor.next().await? {
///         println!("{:?}", row);
///     }
///     Ok(())
/// }
/// ```
pub struct Connection<C: Cli> {
    cli: C,
    env: Arc<Environment>,
    autocommit: AtomicBool,
}

impl<C: Cli> Connection<C> {
    pub fn new(cli: C, config: EnvironmentConfig) -> Self {
        let env = Environment::new(config, cli.handle_allocator());
        debug!(?env, "connection created");
        Self {
            cli,
            env,
            autocommit: AtomicBool::new(false),
        }
    }

    pub fn cli(&self) -> &C {
        &self.cli
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    pub fn is_connected(&self) -> bool {
        self.cli.is_connected()
    }

    /// Fails with an interface error once the session has gone away.
    pub(crate) fn ensure_connected(&self) -> Result<()> {
        if self.cli.is_connected() {
            Ok(())
        } else {
            Err(Error::not_open())
        }
    }

    /// Whether statements commit on success.
    pub fn autocommit(&self) -> bool {
        self.autocommit.load(Ordering::Relaxed)
    }

    pub fn set_autocommit(&self, autocommit: bool) {
        self.autocommit.store(autocommit, Ordering::Relaxed);
    }

    /// Open a new cursor on this connection.
    pub fn cursor(&self) -> Cursor<'_, C> {
        Cursor::new(self)
    }
}

impl<C: Cli> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.cli.is_connected())
            .field("autocommit", &self.autocommit())
            .field("env", &self.env)
            .finish()
    }
}
