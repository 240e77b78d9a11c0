//! Shared helpers for integration tests: a scripted mock driver that records
//! where each statement was routed, and temporary SQLite sessions.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sqlsession::{
    Database, DbError, Driver, ExecResult, Result, Rows, Session, Transaction, Value,
};
use tempfile::TempDir;

#[derive(Debug, Default)]
pub struct MockState {
    /// `"db: <sql>"` or `"tx: <sql>"` per statement, in call order
    pub log: Vec<String>,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    pub closed: bool,
    pub commits: usize,
    pub rollbacks: usize,
}

pub type SharedState = Arc<Mutex<MockState>>;

/// Mock handle. Its exec results carry a row count but never an insert id,
/// and every query returns one row with a `route` column naming where it ran.
pub struct MockDatabase {
    state: SharedState,
}

fn routed_rows(route: &str) -> Rows {
    Rows::new(
        vec!["route".to_string()],
        vec![vec![Value::Text(route.to_string())]],
    )
}

impl MockDatabase {
    fn record(&self, route: &str, sql: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(DbError::ConnectionError("sql: database is closed".into()));
        }
        state.log.push(format!("{}: {}", route, sql));
        Ok(())
    }
}

impl Database for MockDatabase {
    fn exec(&self, sql: &str, _args: &[Value]) -> Result<ExecResult> {
        self.record("db", sql)?;
        Ok(ExecResult::new(None, Some(1)))
    }

    fn query(&self, sql: &str, _args: &[Value]) -> Result<Rows> {
        self.record("db", sql)?;
        Ok(routed_rows("db"))
    }

    fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.record("db", "BEGIN")?;
        Ok(Box::new(MockTransaction {
            state: Arc::clone(&self.state),
        }))
    }

    fn close(&self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

pub struct MockTransaction {
    state: SharedState,
}

impl Transaction for MockTransaction {
    fn exec(&mut self, sql: &str, _args: &[Value]) -> Result<ExecResult> {
        self.state.lock().unwrap().log.push(format!("tx: {}", sql));
        Ok(ExecResult::new(None, Some(1)))
    }

    fn query(&mut self, sql: &str, _args: &[Value]) -> Result<Rows> {
        self.state.lock().unwrap().log.push(format!("tx: {}", sql));
        Ok(routed_rows("tx"))
    }

    fn commit(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commit {
            return Err(DbError::ExecutionError("commit refused".into()));
        }
        state.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_rollback {
            return Err(DbError::ExecutionError("rollback refused".into()));
        }
        state.rollbacks += 1;
        Ok(())
    }
}

pub struct MockDriver {
    pub state: SharedState,
}

impl Driver for MockDriver {
    fn open(&self, _data_source: &str) -> Result<Arc<dyn Database>> {
        Ok(Arc::new(MockDatabase {
            state: Arc::clone(&self.state),
        }))
    }
}

pub fn mock_session() -> (Session, SharedState) {
    let state = SharedState::default();
    let db = MockDatabase {
        state: Arc::clone(&state),
    };
    (Session::from_database(Arc::new(db)), state)
}

/// Route label of the single row a mock query returns.
pub fn route_of(session: &mut Session) -> String {
    let mut rows = session.query("SELECT route", &[]).unwrap();
    assert!(rows.advance());
    let mut slots = vec![sqlsession::Slot::Empty];
    rows.scan(&mut slots).unwrap();
    match slots.pop() {
        Some(sqlsession::Slot::Filled(Value::Text(route))) => route,
        other => panic!("unexpected slot {:?}", other),
    }
}

/// SQLite session on a fresh database file. Keep the `TempDir` alive for as
/// long as the session is used.
pub fn sqlite_session() -> (Session, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let session = Session::open("sqlite", path.to_str().unwrap()).unwrap();
    (session, dir)
}
