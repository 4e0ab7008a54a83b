use super::{CountryStore, apply_upserts};
use crate::error::{Error, Result};
use crate::models::CountryRecord;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_id: u64,
    countries: Vec<CountryRecord>,
}

/// Store backed by a single pretty-printed JSON file.
///
/// Every write replaces the file atomically (temp file + rename in the same
/// directory), so readers in other processes never see a half-written batch.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    fn load(&self) -> Result<Snapshot> {
        match File::open(&self.path) {
            Ok(f) => Ok(serde_json::from_reader(BufReader::new(f))?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut w = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut w, snapshot)?;
            w.flush()?;
        }
        tmp.persist(&self.path)
            .map_err(|e| Error::internal(format!("persist {}: {e}", self.path.display())))?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| Error::internal("json store lock poisoned"))
    }
}

impl CountryStore for JsonFileStore {
    fn upsert_all(&self, records: Vec<CountryRecord>) -> Result<Vec<CountryRecord>> {
        let _g = self.guard()?;
        let mut snap = self.load()?;
        let Snapshot { next_id, countries } = &mut snap;
        let stored = apply_upserts(countries, next_id, records);
        self.save(&snap)?;
        debug!(
            "json store: upserted {} records into {}",
            stored.len(),
            self.path.display()
        );
        Ok(stored)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CountryRecord>> {
        let _g = self.guard()?;
        Ok(self.load()?.countries.into_iter().find(|r| r.has_name(name)))
    }

    fn find_all(&self) -> Result<Vec<CountryRecord>> {
        let _g = self.guard()?;
        Ok(self.load()?.countries)
    }

    fn delete_by_name(&self, name: &str) -> Result<bool> {
        let _g = self.guard()?;
        let mut snap = self.load()?;
        let before = snap.countries.len();
        snap.countries.retain(|r| !r.has_name(name));
        let removed = snap.countries.len() != before;
        if removed {
            self.save(&snap)?;
        }
        Ok(removed)
    }
}
