//! Agent storage - durable agent records keyed by id.

use crate::models::AgentConfig;
use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;
use tracing::warn;

const AGENT_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("agents");

pub struct AgentStorage {
    db: Arc<Database>,
}

impl AgentStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        // Create table if not exists
        let write_txn = db.begin_write()?;
        write_txn.open_table(AGENT_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Persist the full agent record, overwriting any previous version.
    pub fn save(&self, agent: &AgentConfig) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(AGENT_TABLE)?;
            let json_bytes = serde_json::to_vec(agent)?;
            table.insert(agent.id.as_str(), json_bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<AgentConfig>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AGENT_TABLE)?;

        if let Some(value) = table.get(id)? {
            let agent: AgentConfig = serde_json::from_slice(value.value())?;
            Ok(Some(agent))
        } else {
            Ok(None)
        }
    }

    /// List every stored agent. A record that no longer deserializes is
    /// logged and skipped rather than failing the whole listing.
    pub fn list(&self) -> Result<Vec<AgentConfig>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AGENT_TABLE)?;

        let mut agents = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            match serde_json::from_slice::<AgentConfig>(value.value()) {
                Ok(agent) => agents.push(agent),
                Err(err) => {
                    warn!(agent_id = key.value(), error = %err, "skipping corrupt agent record");
                }
            }
        }

        Ok(agents)
    }

    pub fn exists(&self, id: &str) -> Result<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AGENT_TABLE)?;
        Ok(table.get(id)?.is_some())
    }

    /// Delete by id, returns true if the record existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(AGENT_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }
}
