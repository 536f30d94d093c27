//! Storage layer
//!
//! Persistence over a single redb embedded database: one durable record per
//! agent plus the bounded per-agent memory ledger. Records survive process
//! restart; there are no transactional guarantees across agents.

pub mod agent;
pub mod memory;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use agent::AgentStorage;
pub use memory::{MEMORY_CAP, MemoryEntry, MemoryStorage};

/// Central storage manager that initializes all storage subsystems.
pub struct Storage {
    db: Arc<Database>,
    pub agents: AgentStorage,
    pub memory: MemoryStorage,
}

impl Storage {
    /// Create a storage instance at the given path, creating the database
    /// file and all required tables if they do not exist.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let agents = AgentStorage::new(db.clone())?;
        let memory = MemoryStorage::new(db.clone())?;

        Ok(Self { db, agents, memory })
    }

    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
