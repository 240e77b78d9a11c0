//! SQLite driver.
//!
//! Uses `r2d2` connection pooling with the `r2d2_sqlite` backend. A handle
//! hands out one pooled connection per plain statement; a transaction keeps
//! its connection until it finishes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use tracing::{debug, trace};

use crate::core::{DbError, Result, Value};
use crate::driver::{Database, Driver, SqliteConfig, Transaction};
use crate::result::{ExecResult, Rows};

type SqlitePool = Pool<SqliteConnectionManager>;
type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Pragmas applied to every new pooled connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout: Duration,
    foreign_keys: bool,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch(if self.foreign_keys {
            "PRAGMA foreign_keys = ON;"
        } else {
            "PRAGMA foreign_keys = OFF;"
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SqliteDriver {
    config: SqliteConfig,
}

impl SqliteDriver {
    pub const NAME: &'static str = "sqlite";

    pub fn with_config(config: SqliteConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }
}

/// Distinguishes the shared-cache names of in-memory databases.
static MEMORY_DATABASES: AtomicUsize = AtomicUsize::new(0);

impl Driver for SqliteDriver {
    /// `""` and `":memory:"` open a private in-memory database shared by the
    /// handle's pooled connections; anything else is handed to SQLite as a
    /// path or `file:` URI.
    ///
    /// In-memory databases use SQLite's shared cache, whose locks are per
    /// table: while a transaction holds a write on a table, other
    /// connections touching that table fail with a locked error instead of
    /// waiting.
    fn open(&self, data_source: &str) -> Result<Arc<dyn Database>> {
        let in_memory = data_source.is_empty() || data_source == ":memory:";
        let manager = if in_memory {
            let id = MEMORY_DATABASES.fetch_add(1, Ordering::Relaxed);
            SqliteConnectionManager::file(format!(
                "file:sqlsession-mem-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            ))
            .with_flags(OpenFlags::default() | OpenFlags::SQLITE_OPEN_URI)
        } else {
            SqliteConnectionManager::file(data_source)
        };
        let pool_size = self.config.pool_size;

        let mut builder = Pool::builder().max_size(pool_size);
        if in_memory {
            // The database lives only as long as one of its connections.
            builder = builder.idle_timeout(None).max_lifetime(None);
        }

        let pool = builder
            .connection_timeout(self.config.connection_timeout)
            .connection_customizer(Box::new(PragmaCustomizer {
                busy_timeout: self.config.busy_timeout,
                foreign_keys: self.config.foreign_keys,
            }))
            .build(manager)
            .map_err(|err| {
                DbError::ConnectionError(format!("opening {:?}: {}", data_source, err))
            })?;

        debug!(data_source, pool_size, "opened sqlite database");

        Ok(Arc::new(SqliteDatabase {
            pool,
            closed: AtomicBool::new(false),
            begin_statement: self.config.begin_statement(),
        }))
    }
}

struct SqliteDatabase {
    pool: SqlitePool,
    closed: AtomicBool,
    begin_statement: &'static str,
}

impl SqliteDatabase {
    fn connection(&self) -> Result<SqliteConnection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DbError::database_closed());
        }
        self.pool
            .get()
            .map_err(|err| DbError::ConnectionError(err.to_string()))
    }
}

impl Database for SqliteDatabase {
    fn exec(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        let conn = self.connection()?;
        run_exec(&conn, sql, args)
    }

    fn query(&self, sql: &str, args: &[Value]) -> Result<Rows> {
        let conn = self.connection()?;
        run_query(&conn, sql, args)
    }

    fn begin(&self) -> Result<Box<dyn Transaction>> {
        let conn = self.connection()?;
        conn.execute_batch(self.begin_statement)
            .map_err(|err| DbError::ExecutionError(err.to_string()))?;
        trace!(statement = self.begin_statement, "sqlite transaction started");
        Ok(Box::new(SqliteTransaction { conn, open: true }))
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!("closed sqlite database");
        }
        Ok(())
    }
}

struct SqliteTransaction {
    conn: SqliteConnection,
    open: bool,
}

impl SqliteTransaction {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(DbError::ExecutionError(
                "sql: transaction has already been committed or rolled back".into(),
            ))
        }
    }

    fn finish(&mut self, statement: &str) -> Result<()> {
        self.ensure_open()?;
        self.conn
            .execute_batch(statement)
            .map_err(|err| DbError::ExecutionError(err.to_string()))?;
        self.open = false;
        Ok(())
    }
}

impl Transaction for SqliteTransaction {
    fn exec(&mut self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        self.ensure_open()?;
        run_exec(&self.conn, sql, args)
    }

    fn query(&mut self, sql: &str, args: &[Value]) -> Result<Rows> {
        self.ensure_open()?;
        run_query(&self.conn, sql, args)
    }

    fn commit(&mut self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        // The connection goes back to the pool; it must not stay inside BEGIN.
        if self.open {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                debug!(error = %err, "discarded rollback error of dropped transaction");
            }
        }
    }
}

fn run_exec(conn: &Connection, sql: &str, args: &[Value]) -> Result<ExecResult> {
    trace!(sql, args = args.len(), "exec");
    let exec_err = |err: rusqlite::Error| DbError::ExecutionError(err.to_string());

    let mut stmt = conn.prepare(sql).map_err(exec_err)?;
    let changed = stmt.execute(params_from_iter(args.iter())).map_err(exec_err)?;

    Ok(ExecResult::new(
        Some(conn.last_insert_rowid()),
        Some(changed as i64),
    ))
}

fn run_query(conn: &Connection, sql: &str, args: &[Value]) -> Result<Rows> {
    trace!(sql, args = args.len(), "query");
    let query_err = |err: rusqlite::Error| DbError::QueryError(err.to_string());

    let mut stmt = conn.prepare(sql).map_err(query_err)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut rows = stmt.query(params_from_iter(args.iter())).map_err(query_err)?;
    let mut data = Vec::new();
    while let Some(row) = rows.next().map_err(query_err)? {
        let mut values = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            values.push(Value::from(row.get_ref(index).map_err(query_err)?));
        }
        data.push(values);
    }

    Ok(Rows::new(columns, data))
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Float(f),
            ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as SqliteValue;

        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqliteValue::Null),
            Value::Integer(i) => ToSqlOutput::Owned(SqliteValue::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(SqliteValue::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Boolean(b) => ToSqlOutput::Owned(SqliteValue::Integer(i64::from(*b))),
        })
    }
}
