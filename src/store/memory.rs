use super::{CountryStore, apply_upserts};
use crate::error::{Error, Result};
use crate::models::CountryRecord;
use log::debug;
use std::sync::RwLock;

#[derive(Default)]
struct Table {
    rows: Vec<CountryRecord>,
    next_id: u64,
}

/// In-memory store guarded by an `RwLock`; rows keep insertion order.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::internal("memory store lock poisoned")
}

impl CountryStore for MemoryStore {
    fn upsert_all(&self, records: Vec<CountryRecord>) -> Result<Vec<CountryRecord>> {
        let mut table = self.inner.write().map_err(poisoned)?;
        let Table { rows, next_id } = &mut *table;
        let stored = apply_upserts(rows, next_id, records);
        debug!("memory store: upserted {} records", stored.len());
        Ok(stored)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let table = self.inner.read().map_err(poisoned)?;
        Ok(table.rows.iter().find(|r| r.has_name(name)).cloned())
    }

    fn find_all(&self) -> Result<Vec<CountryRecord>> {
        Ok(self.inner.read().map_err(poisoned)?.rows.clone())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.inner.read().map_err(poisoned)?.rows.len())
    }

    fn delete_by_name(&self, name: &str) -> Result<bool> {
        let mut table = self.inner.write().map_err(poisoned)?;
        let before = table.rows.len();
        table.rows.retain(|r| !r.has_name(name));
        Ok(table.rows.len() != before)
    }
}
