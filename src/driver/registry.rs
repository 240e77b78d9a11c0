use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;
use tracing::debug;

use crate::core::{DbError, Result};
use crate::driver::{Driver, SqliteDriver};

// Process-wide driver table, keyed by driver name
lazy_static! {
    static ref DRIVERS: RwLock<HashMap<String, Arc<dyn Driver>>> = {
        let mut drivers: HashMap<String, Arc<dyn Driver>> = HashMap::new();
        drivers.insert(SqliteDriver::NAME.to_string(), Arc::new(SqliteDriver::default()));
        RwLock::new(drivers)
    };
}

/// Registers `driver` under `name`, replacing any driver already registered
/// with that name.
pub fn register_driver(name: &str, driver: Arc<dyn Driver>) -> Result<()> {
    let mut drivers = DRIVERS.write()?;
    if drivers.insert(name.to_string(), driver).is_some() {
        debug!(driver = name, "replaced registered driver");
    }
    Ok(())
}

pub fn lookup_driver(name: &str) -> Result<Arc<dyn Driver>> {
    let drivers = DRIVERS.read()?;
    drivers.get(name).cloned().ok_or_else(|| {
        DbError::ConnectionError(format!(
            "sql: unknown driver {:?} (forgotten registration?)",
            name
        ))
    })
}

/// Sorted names of the registered drivers.
pub fn drivers() -> Result<Vec<String>> {
    let drivers = DRIVERS.read()?;
    let mut names: Vec<String> = drivers.keys().cloned().collect();
    names.sort();
    Ok(names)
}
