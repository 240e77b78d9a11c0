use std::time::Duration;

/// Configuration of the SQLite driver's handle.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Maximum number of pooled connections behind one handle
    pub pool_size: u32,

    /// How long SQLite waits on a locked database before failing
    pub busy_timeout: Duration,

    /// How long to wait for a free pooled connection
    pub connection_timeout: Duration,

    /// Enforce foreign key constraints
    pub foreign_keys: bool,

    /// Start transactions with `BEGIN IMMEDIATE` instead of a deferred `BEGIN`
    pub immediate_transactions: bool,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            pool_size: 16,
            busy_timeout: Duration::from_secs(5),
            connection_timeout: Duration::from_secs(5),
            foreign_keys: true,
            immediate_transactions: false,
        }
    }
}

impl SqliteConfig {
    /// Set maximum pooled connections
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Set busy timeout
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set pool checkout timeout
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn immediate_transactions(mut self, enabled: bool) -> Self {
        self.immediate_transactions = enabled;
        self
    }

    pub(crate) fn begin_statement(&self) -> &'static str {
        if self.immediate_transactions {
            "BEGIN IMMEDIATE"
        } else {
            "BEGIN"
        }
    }
}
