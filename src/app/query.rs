//! Query handler
//!
//! Point lookups against committed state. Reads go through a short-lived
//! engine view and never see the open block's staged writes.

use crate::engine::Engine;
use crate::error::Result;

/// Log marker for a key that exists
pub const LOG_EXISTS: &str = "exists";

/// Log marker for a missing key (not an error)
pub const LOG_NOT_FOUND: &str = "key does not exist";

/// Result of a point lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub value: Option<Vec<u8>>,
}

impl QueryResult {
    pub fn found(&self) -> bool {
        self.value.is_some()
    }

    /// Informational marker for the response log
    pub fn log(&self) -> &'static str {
        if self.found() {
            LOG_EXISTS
        } else {
            LOG_NOT_FOUND
        }
    }
}

/// Serves reads; any number may run at once
#[derive(Clone)]
pub struct QueryHandler {
    engine: Engine,
}

impl QueryHandler {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Look up `key` in committed state
    ///
    /// A missing key is `Ok` with no value; `Err` means storage failed.
    pub fn get(&self, key: &[u8]) -> Result<QueryResult> {
        let view = self.engine.view();
        let value = view.get(key)?;
        Ok(QueryResult { value })
    }
}
