//! Short-term memory ledger - bounded append-log of past task outcomes.
//!
//! Entries are keyed `agent_id:{seq}` with a zero-padded per-agent sequence,
//! so lexicographic key order is insertion order. The ledger is capped at
//! [`MEMORY_CAP`] entries per agent; the append and the trim of anything
//! beyond the cap happen in the same write transaction.

use anyhow::Result;
use chrono::Utc;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum ledger entries kept per agent.
pub const MEMORY_CAP: usize = 20;

const MEMORY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("agent_memory");
/// agent_id -> last assigned sequence number
const MEMORY_SEQ_TABLE: TableDefinition<&str, u64> = TableDefinition::new("agent_memory_seq");

/// One immutable ledger entry. Never updated, only evicted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryEntry {
    /// Per-agent surrogate id, assigned from a monotonic sequence.
    pub id: u64,
    pub agent_id: String,
    pub content: String,
    /// Insertion timestamp, unix milliseconds.
    pub created_at: i64,
}

#[derive(Clone)]
pub struct MemoryStorage {
    db: Arc<Database>,
}

impl MemoryStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(MEMORY_TABLE)?;
        write_txn.open_table(MEMORY_SEQ_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    fn entry_key(agent_id: &str, seq: u64) -> String {
        format!("{}:{:020}", agent_id, seq)
    }

    /// Append an entry for the agent, evicting the oldest entries beyond the
    /// cap in the same transaction. The ledger for an unseen agent id is
    /// created lazily by the first append.
    pub fn append(&self, agent_id: &str, content: &str) -> Result<MemoryEntry> {
        let write_txn = self.db.begin_write()?;
        let entry = {
            let mut seq_table = write_txn.open_table(MEMORY_SEQ_TABLE)?;
            let seq = seq_table.get(agent_id)?.map(|v| v.value()).unwrap_or(0) + 1;
            seq_table.insert(agent_id, seq)?;

            let entry = MemoryEntry {
                id: seq,
                agent_id: agent_id.to_string(),
                content: content.to_string(),
                created_at: Utc::now().timestamp_millis(),
            };

            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            table.insert(
                Self::entry_key(agent_id, seq).as_str(),
                serde_json::to_vec(&entry)?.as_slice(),
            )?;

            let prefix = format!("{}:", agent_id);
            let stale: Vec<String> = {
                let mut keys = Vec::new();
                for item in table.iter()? {
                    let (key, _) = item?;
                    let key_str = key.value();
                    if key_str.starts_with(&prefix) {
                        keys.push(key_str.to_string());
                    }
                }
                keys.sort();
                let excess = keys.len().saturating_sub(MEMORY_CAP);
                keys.truncate(excess);
                keys
            };
            for key in &stale {
                table.remove(key.as_str())?;
            }

            entry
        };
        write_txn.commit()?;
        Ok(entry)
    }

    /// All entries for the agent, most recent first.
    pub fn read_all(&self, agent_id: &str) -> Result<Vec<MemoryEntry>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(MEMORY_TABLE)?;

        let prefix = format!("{}:", agent_id);
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            if key.value().starts_with(&prefix) {
                let entry: MemoryEntry = serde_json::from_slice(value.value())?;
                entries.push(entry);
            }
        }

        entries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(entries)
    }

    /// Content of the most recent entry, if any.
    pub fn read_latest(&self, agent_id: &str) -> Result<Option<String>> {
        Ok(self
            .read_all(agent_id)?
            .into_iter()
            .next()
            .map(|entry| entry.content))
    }

    /// Remove the whole ledger for an agent. Returns the number of entries
    /// removed.
    pub fn clear(&self, agent_id: &str) -> Result<u32> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(MEMORY_TABLE)?;
            let prefix = format!("{}:", agent_id);
            let keys: Vec<String> = {
                let mut keys = Vec::new();
                for item in table.iter()? {
                    let (key, _) = item?;
                    let key_str = key.value();
                    if key_str.starts_with(&prefix) {
                        keys.push(key_str.to_string());
                    }
                }
                keys
            };
            for key in &keys {
                table.remove(key.as_str())?;
            }

            let mut seq_table = write_txn.open_table(MEMORY_SEQ_TABLE)?;
            seq_table.remove(agent_id)?;

            keys.len() as u32
        };
        write_txn.commit()?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_storage() -> (MemoryStorage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        (MemoryStorage::new(db).unwrap(), temp_dir)
    }

    #[test]
    fn unseen_agent_reads_empty() {
        let (storage, _dir) = create_test_storage();
        assert!(storage.read_all("agent-001").unwrap().is_empty());
        assert!(storage.read_latest("agent-001").unwrap().is_none());
    }

    #[test]
    fn append_and_read_most_recent_first() {
        let (storage, _dir) = create_test_storage();

        storage.append("agent-001", "first").unwrap();
        storage.append("agent-001", "second").unwrap();
        storage.append("agent-001", "third").unwrap();

        let entries = storage.read_all("agent-001").unwrap();
        let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(contents, vec!["third", "second", "first"]);

        assert_eq!(
            storage.read_latest("agent-001").unwrap().as_deref(),
            Some("third")
        );
    }

    #[test]
    fn cap_evicts_oldest_entries() {
        let (storage, _dir) = create_test_storage();

        for i in 1..=25 {
            storage
                .append("agent-001", &format!("entry {}", i))
                .unwrap();
        }

        let entries = storage.read_all("agent-001").unwrap();
        assert_eq!(entries.len(), MEMORY_CAP);
        assert_eq!(entries[0].content, "entry 25");
        assert_eq!(entries[MEMORY_CAP - 1].content, "entry 6");
    }

    #[test]
    fn ledgers_are_scoped_per_agent() {
        let (storage, _dir) = create_test_storage();

        storage.append("agent-001", "for one").unwrap();
        storage.append("agent-002", "for two").unwrap();

        assert_eq!(storage.read_all("agent-001").unwrap().len(), 1);
        assert_eq!(
            storage.read_latest("agent-002").unwrap().as_deref(),
            Some("for two")
        );
    }

    #[test]
    fn entry_ids_stay_monotonic_across_eviction() {
        let (storage, _dir) = create_test_storage();

        for i in 1..=25 {
            storage
                .append("agent-001", &format!("entry {}", i))
                .unwrap();
        }

        // The sequence keeps counting past evicted entries.
        let next = storage.append("agent-001", "entry 26").unwrap();
        assert_eq!(next.id, 26);
    }

    #[test]
    fn clear_removes_the_ledger() {
        let (storage, _dir) = create_test_storage();

        storage.append("agent-001", "a").unwrap();
        storage.append("agent-001", "b").unwrap();
        storage.append("agent-002", "keep").unwrap();

        assert_eq!(storage.clear("agent-001").unwrap(), 2);
        assert!(storage.read_all("agent-001").unwrap().is_empty());
        assert_eq!(storage.read_all("agent-002").unwrap().len(), 1);
    }
}
