//! Configuration for blockkv
//!
//! A node reads `{home}/config/config.toml`. Every section and every key is
//! optional; anything left out keeps its default.
//!
//! ```toml
//! [storage]
//! memtable_size_limit = 67108864
//! wal_sync = { every_n_entries = { count = 16 } }
//!
//! [network]
//! listen_addr = "127.0.0.1:26658"
//!
//! [log]
//! level = "info"
//! ```
//!
//! The data directory is not configurable: it is always `{home}/data`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BlockKvError, Result};

/// Full node configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the WAL (`wal.log`) and table files (`tables/`) live
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub storage: StorageConfig,
    pub network: NetworkConfig,
    pub log: LogConfig,
}

/// `[storage]`: durability and memory bounds of the embedded store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub wal_sync: WalSyncStrategy,
    /// MemTable bytes that trigger a flush to a table file
    pub memtable_size_limit: usize,
    /// Key and value bytes one block may stage before commit
    pub max_txn_bytes: usize,
}

/// `[network]`: the socket the consensus engine connects to
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub listen_addr: String,
    pub max_connections: usize,
    /// 0 disables the timeout
    pub read_timeout_ms: u64,
    /// 0 disables the timeout
    pub write_timeout_ms: u64,
}

/// `[log]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
}

/// When the WAL is fsynced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalSyncStrategy {
    /// After every committed block
    EveryWrite,
    /// After every `count` committed blocks
    EveryNEntries { count: usize },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./blockkv_data"),
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            wal_sync: WalSyncStrategy::EveryWrite,
            memtable_size_limit: 64 * 1024 * 1024,
            max_txn_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:26658".to_string(),
            max_connections: 64,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Config file location relative to the node home
    pub const CONFIG_FILE: &'static str = "config/config.toml";

    /// Storage location relative to the node home
    pub const DATA_SUBDIR: &'static str = "data";

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load the configuration of the node rooted at `home`
    ///
    /// A missing file is not an error. The result is validated.
    pub fn load(home: &Path) -> Result<Self> {
        let path = home.join(Self::CONFIG_FILE);

        let mut config = match fs::read_to_string(&path) {
            Ok(raw) => Self::from_toml(&raw)
                .map_err(|e| BlockKvError::Config(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("{} not found, using defaults", path.display());
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };

        config.data_dir = home.join(Self::DATA_SUBDIR);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| BlockKvError::Config(e.to_string()))
    }

    /// Reject settings the node cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.network.listen_addr.is_empty() {
            return Err(BlockKvError::Config("network.listen_addr is empty".to_string()));
        }
        if self.network.max_connections == 0 {
            return Err(BlockKvError::Config(
                "network.max_connections must be at least 1".to_string(),
            ));
        }
        if let WalSyncStrategy::EveryNEntries { count: 0 } = self.storage.wal_sync {
            return Err(BlockKvError::Config(
                "storage.wal_sync.every_n_entries.count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Programmatic construction, mostly for tests and embedding
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.storage.wal_sync = strategy;
        self
    }

    pub fn memtable_size_limit(mut self, bytes: usize) -> Self {
        self.config.storage.memtable_size_limit = bytes;
        self
    }

    pub fn max_txn_bytes(mut self, bytes: usize) -> Self {
        self.config.storage.max_txn_bytes = bytes;
        self
    }

    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.network.listen_addr = addr.into();
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.config.network.max_connections = max;
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.network.read_timeout_ms = ms;
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.network.write_timeout_ms = ms;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.log.level = level.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
