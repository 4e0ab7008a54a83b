//! Persistence for merged country records.
//!
//! A store is keyed by country name (case-insensitive) and hands out the
//! internal `id`. Two implementations ship: [`MemoryStore`] and
//! [`JsonFileStore`]. Both apply `upsert_all` as one unit: either the whole
//! batch becomes visible or none of it does.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::CountryRecord;
use chrono::{DateTime, Utc};

pub trait CountryStore: Send + Sync {
    /// Insert or overwrite by case-insensitive name. Returns the stored record.
    fn upsert(&self, record: CountryRecord) -> Result<CountryRecord> {
        let mut stored = self.upsert_all(vec![record])?;
        stored
            .pop()
            .ok_or_else(|| crate::Error::internal("upsert returned no record"))
    }

    /// Upsert a batch as a single unit of work.
    fn upsert_all(&self, records: Vec<CountryRecord>) -> Result<Vec<CountryRecord>>;

    fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>>;

    /// All records in store order.
    fn find_all(&self) -> Result<Vec<CountryRecord>>;

    fn find_by_region(&self, region: &str) -> Result<Vec<CountryRecord>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|r| same_text(r.region.as_deref(), region))
            .collect())
    }

    fn find_by_currency(&self, code: &str) -> Result<Vec<CountryRecord>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|r| same_text(r.currency_code.as_deref(), code))
            .collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.find_all()?.len())
    }

    fn latest_refresh(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .find_all()?
            .iter()
            .map(|r| r.last_refreshed_at)
            .max())
    }

    fn exists_by_name(&self, name: &str) -> Result<bool> {
        Ok(self.find_by_name(name)?.is_some())
    }

    /// Returns whether a record was removed.
    fn delete_by_name(&self, name: &str) -> Result<bool>;
}

fn same_text(field: Option<&str>, wanted: &str) -> bool {
    field.is_some_and(|f| f.to_lowercase() == wanted.to_lowercase())
}

/// Shared upsert rule used by both stores: reuse the id of a same-named record,
/// otherwise take the next free id. Later entries in `batch` win over earlier ones.
pub(crate) fn apply_upserts(
    rows: &mut Vec<CountryRecord>,
    next_id: &mut u64,
    batch: Vec<CountryRecord>,
) -> Vec<CountryRecord> {
    let mut stored = Vec::with_capacity(batch.len());
    for mut record in batch {
        match rows.iter_mut().find(|r| r.has_name(&record.name)) {
            Some(existing) => {
                record.id = existing.id;
                *existing = record.clone();
            }
            None => {
                *next_id += 1;
                record.id = *next_id;
                rows.push(record.clone());
            }
        }
        stored.push(record);
    }
    stored
}
