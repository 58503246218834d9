//! Bounded pool of [`Database`] connections, managed by `deadpool`.
//!
//! The pool is built once at startup and cloned into whatever needs it. A
//! checked-out connection goes back to the pool when its [`PooledDatabase`]
//! handle is dropped. SQLite calls block, so [`Pool::run`] moves them onto
//! tokio's blocking threads.

use std::path::{Path, PathBuf};

use deadpool::managed::{self, Metrics, PoolError, RecycleError, RecycleResult};

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Opens connections for the pool and vets them on return.
pub struct DatabaseManager {
    path: PathBuf,
}

impl managed::Manager for DatabaseManager {
    type Type = Database;
    type Error = StoreError;

    async fn create(&self) -> Result<Database> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || Database::open_at(&path)).await?
    }

    async fn recycle(&self, db: &mut Database, _metrics: &Metrics) -> RecycleResult<StoreError> {
        // A transaction still open here was leaked by a panicking caller.
        if !db.conn().is_autocommit() {
            return Err(RecycleError::Backend(StoreError::DirtyConnection));
        }
        Ok(())
    }
}

/// A connection checked out of a [`Pool`].
pub type PooledDatabase = managed::Object<DatabaseManager>;

#[derive(Clone)]
pub struct Pool {
    inner: managed::Pool<DatabaseManager>,
}

impl From<PoolError<StoreError>> for StoreError {
    fn from(e: PoolError<StoreError>) -> Self {
        match e {
            PoolError::Backend(e) => e,
            PoolError::Closed => StoreError::PoolClosed,
            other => StoreError::Pool(other.to_string()),
        }
    }
}

impl Pool {
    /// Build a pool of at most `size` connections (at least one) to the
    /// database at `path`.
    ///
    /// One connection is opened immediately so the file is created and
    /// migrated before any concurrent use.
    pub async fn open(path: &Path, size: usize) -> Result<Self> {
        let size = size.max(1);
        let inner = managed::Pool::builder(DatabaseManager {
            path: path.to_path_buf(),
        })
        .max_size(size)
        .build()
        .map_err(|e| StoreError::Pool(e.to_string()))?;

        drop(inner.get().await?);

        tracing::info!(path = %path.display(), size, "database pool ready");

        Ok(Self { inner })
    }

    /// Check out a connection, waiting until one is free.
    pub async fn get(&self) -> Result<PooledDatabase> {
        Ok(self.inner.get().await?)
    }

    /// Run `f` against a pooled connection on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut conn = self.get().await?;
        tokio::task::spawn_blocking(move || f(&mut *conn)).await?
    }

    /// Stop handing out connections. Waiters and later `get` calls fail
    /// with [`StoreError::PoolClosed`].
    pub fn close(&self) {
        self.inner.close();
    }

    /// Maximum number of connections.
    pub fn size(&self) -> usize {
        self.inner.status().max_size
    }

    /// Connections opened so far, checked out or not.
    pub fn open_count(&self) -> usize {
        self.inner.status().size
    }

    /// Connections currently sitting unused in the pool.
    pub fn idle_count(&self) -> usize {
        self.inner.status().available as usize
    }
}
