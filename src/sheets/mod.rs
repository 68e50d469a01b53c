mod parse;
mod transport;

pub use parse::{parse_table, Grid, RowMap};
pub use transport::{decode_value_range, HttpSheetsTransport, SheetsTransport};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_CACHE_TTL_SECS};
use crate::error::SheetsError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    range: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    grid: Grid,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntryInfo {
    pub name: String,
    pub range: String,
    pub age: Duration,
}

/// Cached, read-only access to spreadsheet tabs.
///
/// Grids are cached per `(name, range)` for a fixed TTL. The lock is only held
/// around map access, so concurrent misses on the same key each go to the
/// network and the last one to finish overwrites the entry.
pub struct TabularStore {
    transport: Box<dyn SheetsTransport>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    tables: BTreeMap<String, String>,
    cache: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl TabularStore {
    pub fn new(transport: impl SheetsTransport + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport: Box::new(transport),
            clock,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            tables: BTreeMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let transport =
            HttpSheetsTransport::new(&cfg.sheets_base_url, &cfg.spreadsheet_id, &cfg.api_key)?;
        Ok(Self::new(transport, Arc::new(SystemClock))
            .with_ttl(cfg.cache_ttl())
            .with_tables(cfg.sheets.clone()))
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Logical name -> tab name used when building read ranges.
    pub fn with_tables(mut self, tables: BTreeMap<String, String>) -> Self {
        self.tables = tables;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn tables(&self) -> &BTreeMap<String, String> {
        &self.tables
    }

    fn a1_range(&self, name: &str, range: &str) -> String {
        let tab = self.tables.get(name).map(String::as_str).unwrap_or(name);
        if range.is_empty() {
            tab.to_string()
        } else {
            format!("{tab}!{range}")
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(entry.fetched_at).to_std() {
            Ok(age) => age < self.ttl,
            // Clock moved backwards; the entry is younger than "now".
            Err(_) => true,
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get_table(&self, name: &str, range: Option<&str>) -> Result<Grid, SheetsError> {
        let key = CacheKey {
            name: name.to_string(),
            range: range.unwrap_or_default().to_string(),
        };

        let now = self.clock.now();
        if let Some(entry) = self.lock_cache().get(&key) {
            if self.is_fresh(entry, now) {
                tracing::debug!(table = name, range = %key.range, "table cache hit");
                return Ok(entry.grid.clone());
            }
        }

        let a1 = self.a1_range(name, &key.range);
        tracing::debug!(table = name, range = %a1, "table cache miss; reading");
        let grid = match self.transport.read_range(&a1) {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(table = name, error = %e, "table read failed");
                return Err(e);
            }
        };

        self.lock_cache().insert(
            key,
            CacheEntry {
                grid: grid.clone(),
                fetched_at: self.clock.now(),
            },
        );
        Ok(grid)
    }

    pub fn fetch_and_parse(&self, name: &str) -> Result<Vec<RowMap>, SheetsError> {
        let grid = self.get_table(name, None)?;
        Ok(parse_table(&grid))
    }

    /// Drops every cached grid. Returns how many entries were removed.
    pub fn clear_cache(&self) -> usize {
        let mut cache = self.lock_cache();
        let n = cache.len();
        cache.clear();
        n
    }

    pub fn cached_entries(&self) -> Vec<CachedEntryInfo> {
        let now = self.clock.now();
        let mut out: Vec<CachedEntryInfo> = self
            .lock_cache()
            .iter()
            .map(|(k, e)| CachedEntryInfo {
                name: k.name.clone(),
                range: k.range.clone(),
                age: now
                    .signed_duration_since(e.fetched_at)
                    .to_std()
                    .unwrap_or_default(),
            })
            .collect();
        out.sort_by(|a, b| (&a.name, &a.range).cmp(&(&b.name, &b.range)));
        out
    }
}
