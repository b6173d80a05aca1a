//! Record Store
//!
//! Durable, keyed-by-date persistence for day snapshots:
//! - Write path: DaySnapshot → validate → encode groups → one transaction
//! - Read path: date range → rows → verify + decode per group → snapshots
//!
//! Rows are `(date, field_group)` keyed, so an upsert replaces only the groups
//! it carries. The SQLite connection is guarded by a mutex and every upsert is
//! one transaction, which serializes merges on the same date. Blocking calls
//! run on the blocking pool so callers can await them from async code.

use crate::snapshot::{validate_snapshot, DaySnapshot, FieldGroup};
use crate::storage::codec::{self, EncodedGroup};
use crate::storage::error::{StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Configuration for the record store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for the database
    pub data_dir: PathBuf,
    /// How long SQLite waits on a locked database before giving up
    pub busy_timeout_ms: u64,
    /// Days after which a snapshot can no longer be amended (0 = never)
    pub immutable_after_days: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("embermate_data"),
            busy_timeout_ms: 5000,
            immutable_after_days: 0,
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Builder method: enforce the amendment window
    pub fn immutable_after_days(mut self, days: u32) -> Self {
        self.immutable_after_days = days;
        self
    }

    /// Get path to the database file
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("embermate.db")
    }
}

/// A ranged history read.
///
/// `days` is ascending and sparse: dates without a snapshot are simply not
/// there. Days whose stored payload was corrupt are left out of `days` and
/// reported in `skipped` as `CorruptRecord` errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub days: Vec<DaySnapshot>,
    pub skipped: Vec<StoreError>,
}

impl History {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Snapshot for a date, if present
    pub fn day(&self, date: NaiveDate) -> Option<&DaySnapshot> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|i| &self.days[i])
    }

    /// Dates that were skipped as corrupt
    pub fn skipped_dates(&self) -> Vec<NaiveDate> {
        self.skipped
            .iter()
            .filter_map(|e| match e {
                StoreError::CorruptRecord { date, .. } => Some(*date),
                _ => None,
            })
            .collect()
    }
}

/// A day read group by group.
///
/// Unlike `get`, a damaged group does not hide the others: every group that
/// verified is in `snapshot`, and the damaged ones are listed in `corrupt`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayGroups {
    /// Groups that decoded; `None` when none did
    pub snapshot: Option<DaySnapshot>,
    pub corrupt: Vec<(FieldGroup, StoreError)>,
}

impl DayGroups {
    /// Groups whose stored payload failed verification
    pub fn corrupt_groups(&self) -> Vec<FieldGroup> {
        self.corrupt.iter().map(|(g, _)| *g).collect()
    }
}

/// Anything that can persist and serve day snapshots
#[async_trait]
pub trait DayStore: Send + Sync {
    /// Merge the groups carried by `snapshot` into the stored day
    async fn upsert(&self, snapshot: &DaySnapshot) -> StoreResult<()>;

    /// Point lookup; `None` for a day with no activity
    async fn get(&self, date: NaiveDate) -> StoreResult<Option<DaySnapshot>>;

    /// Point lookup that keeps healthy groups of a partly damaged day
    async fn get_groups(&self, date: NaiveDate) -> StoreResult<DayGroups> {
        Ok(DayGroups {
            snapshot: self.get(date).await?,
            corrupt: Vec::new(),
        })
    }

    /// Inclusive, ascending, sparse range read
    async fn range(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<History>;

    /// Whether `date` still accepts writes
    fn check_writable(&self, _date: NaiveDate) -> StoreResult<()> {
        Ok(())
    }
}

/// Raw row as read from the table, verified later
struct StoredRow {
    date: String,
    group: String,
    payload: Value,
    checksum: Value,
}

/// SQLite-backed record store
pub struct RecordStore {
    config: StoreConfig,
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Open or create the store
    pub async fn open(config: StoreConfig) -> StoreResult<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let path = config.db_path();
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let conn = tokio::task::spawn_blocking(move || Self::open_connection(&path, busy_timeout))
            .await
            .map_err(|e| StoreError::StoreUnavailable(format!("open task failed: {}", e)))??;

        tracing::info!("Opened record store at {:?}", config.db_path());

        Ok(Self {
            config,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn open_connection(path: &Path, busy_timeout: Duration) -> StoreResult<Connection> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.busy_timeout(busy_timeout)?;

        // A committed upsert must survive a crash
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            ",
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS day_groups (
                date TEXT NOT NULL,
                field_group TEXT NOT NULL,
                payload TEXT NOT NULL,
                checksum INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                PRIMARY KEY (date, field_group)
            )",
            [],
        )?;

        Ok(conn)
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|e| {
                StoreError::StoreUnavailable(format!("Failed to acquire connection lock: {}", e))
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::StoreUnavailable(format!("store task failed: {}", e)))?
    }

    /// Merge a snapshot's field groups into the stored day.
    ///
    /// Durable once this returns `Ok`. Groups absent from `snapshot` are not
    /// touched. An invalid field rejects the whole write before anything is
    /// merged.
    pub async fn upsert(&self, snapshot: &DaySnapshot) -> StoreResult<()> {
        validate_snapshot(snapshot)?;
        self.check_writable(snapshot.date)?;

        let groups = codec::encode_groups(snapshot)?;
        if groups.is_empty() {
            tracing::debug!(date = %snapshot.date, "Upsert carried no field groups");
            return Ok(());
        }

        let date = snapshot.date;
        let written: Vec<FieldGroup> = groups.iter().map(|g| g.group).collect();
        self.with_conn(move |conn| write_groups(conn, date, &groups))
            .await?;

        tracing::debug!(date = %date, groups = ?written, "Upserted day");
        Ok(())
    }

    /// Point lookup
    pub async fn get(&self, date: NaiveDate) -> StoreResult<Option<DaySnapshot>> {
        let key = date.to_string();
        let rows = self
            .with_conn(move |conn| load_rows(conn, &key, &key))
            .await?;

        let (mut days, mut corrupt) = assemble(rows);
        if let Some(err) = corrupt.pop() {
            return Err(err);
        }
        Ok(days.pop())
    }

    /// Point lookup per group: healthy groups are returned even when a
    /// sibling group of the same day is corrupt
    pub async fn get_groups(&self, date: NaiveDate) -> StoreResult<DayGroups> {
        let key = date.to_string();
        let rows = self
            .with_conn(move |conn| load_rows(conn, &key, &key))
            .await?;

        let mut snapshot = DaySnapshot::new(date);
        let mut corrupt = Vec::new();
        for row in &rows {
            let Some(group) = FieldGroup::from_tag(&row.group) else {
                tracing::warn!(date = %date, "Ignoring row with unknown field group {:?}", row.group);
                continue;
            };
            if let Err(err) = decode_row(&mut snapshot, row) {
                tracing::warn!("Damaged group: {}", err);
                corrupt.push((group, err));
            }
        }

        Ok(DayGroups {
            snapshot: (!snapshot.is_empty()).then_some(snapshot),
            corrupt,
        })
    }

    /// Inclusive range read, ascending by date.
    ///
    /// Corrupt days are skipped and reported; they never fail the call.
    pub async fn range(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<History> {
        if start > end {
            return Err(StoreError::InvalidRange { start, end });
        }

        let (from, to) = (start.to_string(), end.to_string());
        let rows = self
            .with_conn(move |conn| load_rows(conn, &from, &to))
            .await?;

        let (days, skipped) = assemble(rows);
        for err in &skipped {
            tracing::warn!("Skipping day in history: {}", err);
        }

        Ok(History { days, skipped })
    }

    /// Whether `date` still accepts writes under the amendment window
    pub fn check_writable(&self, date: NaiveDate) -> StoreResult<()> {
        let window = self.config.immutable_after_days;
        if window == 0 {
            return Ok(());
        }

        let today = chrono::Local::now().date_naive();
        match today.checked_sub_days(Days::new(u64::from(window))) {
            Some(cutoff) if date < cutoff => Err(StoreError::ImmutableRecord(date)),
            _ => Ok(()),
        }
    }

    /// Get storage statistics
    pub async fn stats(&self) -> StoreResult<StoreStats> {
        let (day_count, group_rows, first, last) = self
            .with_conn(|conn| {
                let row = conn.query_row(
                    "SELECT COUNT(DISTINCT date), COUNT(*), MIN(date), MAX(date) FROM day_groups",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<String>>(3)?,
                        ))
                    },
                )?;
                Ok(row)
            })
            .await?;

        let db_path = self.config.db_path();
        let storage_size_bytes = [db_path.clone(), db_path.with_extension("db-wal")]
            .iter()
            .filter_map(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        Ok(StoreStats {
            day_count: day_count as u64,
            group_rows: group_rows as u64,
            first_day: first.and_then(|s| s.parse().ok()),
            last_day: last.and_then(|s| s.parse().ok()),
            storage_size_bytes,
        })
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

#[async_trait]
impl DayStore for RecordStore {
    async fn upsert(&self, snapshot: &DaySnapshot) -> StoreResult<()> {
        RecordStore::upsert(self, snapshot).await
    }

    async fn get(&self, date: NaiveDate) -> StoreResult<Option<DaySnapshot>> {
        RecordStore::get(self, date).await
    }

    async fn get_groups(&self, date: NaiveDate) -> StoreResult<DayGroups> {
        RecordStore::get_groups(self, date).await
    }

    async fn range(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<History> {
        RecordStore::range(self, start, end).await
    }

    fn check_writable(&self, date: NaiveDate) -> StoreResult<()> {
        RecordStore::check_writable(self, date)
    }
}

fn write_groups(conn: &mut Connection, date: NaiveDate, groups: &[EncodedGroup]) -> StoreResult<()> {
    let key = date.to_string();
    let now = Utc::now().timestamp_millis();

    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO day_groups (date, field_group, payload, checksum, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(date, field_group) DO UPDATE SET
                payload = excluded.payload,
                checksum = excluded.checksum,
                updated_at = excluded.updated_at",
        )?;

        for group in groups {
            stmt.execute(params![
                key,
                group.group.as_str(),
                group.payload,
                i64::from(group.checksum),
                now
            ])?;
        }
    }
    tx.commit()?;

    Ok(())
}

fn load_rows(conn: &mut Connection, start: &str, end: &str) -> StoreResult<Vec<StoredRow>> {
    let mut stmt = conn.prepare_cached(
        "SELECT date, field_group, payload, checksum FROM day_groups
         WHERE date >= ?1 AND date <= ?2
         ORDER BY date, field_group",
    )?;

    let rows = stmt.query_map(params![start, end], |row| {
        Ok(StoredRow {
            date: row.get(0)?,
            group: row.get(1)?,
            payload: row.get(2)?,
            checksum: row.get(3)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Decode one row into the day being assembled
fn decode_row(snapshot: &mut DaySnapshot, row: &StoredRow) -> Result<(), StoreError> {
    let date = snapshot.date;
    let group = FieldGroup::from_tag(&row.group).ok_or_else(|| StoreError::CorruptRecord {
        date,
        group: row.group.clone(),
        reason: "unknown field group".to_string(),
    })?;

    let payload = match &row.payload {
        Value::Text(s) => s,
        _ => return Err(StoreError::corrupt(date, group, "payload is not text")),
    };
    let checksum = match row.checksum {
        Value::Integer(n) => u32::try_from(n)
            .map_err(|_| StoreError::corrupt(date, group, format!("checksum {} out of range", n)))?,
        _ => return Err(StoreError::corrupt(date, group, "checksum is not an integer")),
    };

    codec::apply_group(snapshot, group, payload, checksum)
        .map_err(|reason| StoreError::corrupt(date, group, reason))
}

/// Fold rows into per-day snapshots, isolating corrupt days
fn assemble(rows: Vec<StoredRow>) -> (Vec<DaySnapshot>, Vec<StoreError>) {
    let mut by_day: BTreeMap<NaiveDate, Result<DaySnapshot, StoreError>> = BTreeMap::new();

    for row in rows {
        let date: NaiveDate = match row.date.parse() {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Ignoring row with unparseable date {:?}: {}", row.date, e);
                continue;
            }
        };

        let entry = by_day
            .entry(date)
            .or_insert_with(|| Ok(DaySnapshot::new(date)));

        let failed = match entry {
            Ok(snapshot) => decode_row(snapshot, &row).err(),
            Err(_) => None,
        };
        if let Some(err) = failed {
            *entry = Err(err);
        }
    }

    let mut days = Vec::new();
    let mut corrupt = Vec::new();
    for (_, result) in by_day {
        match result {
            Ok(day) => days.push(day),
            Err(err) => corrupt.push(err),
        }
    }
    (days, corrupt)
}

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub day_count: u64,
    pub group_rows: u64,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub storage_size_bytes: u64,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = match (self.first_day, self.last_day) {
            (Some(a), Some(b)) => format!("{}..{}", a, b),
            _ => "empty".to_string(),
        };
        write!(
            f,
            "Days: {}, Groups: {}, Span: {}, Size: {:.2} MB",
            self.day_count,
            self.group_rows,
            span,
            self.storage_size_bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{CheckIn, DoseStatus, MedicationDose, MoodEntry, Sleep, Vitals};
    use tempfile::tempdir;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    async fn create_test_store() -> (RecordStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(StoreConfig::new(dir.path())).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn test_get_missing_day_is_none() {
        let (store, _dir) = create_test_store().await;
        assert_eq!(store.get(day("2025-01-01")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_upsert_merges_field_groups() {
        let (store, _dir) = create_test_store().await;
        let date = day("2025-01-01");

        store
            .upsert(&DaySnapshot::new(date).with_medications(vec![MedicationDose::new("m1", DoseStatus::Taken)]))
            .await
            .unwrap();
        store
            .upsert(&DaySnapshot::new(date).with_mood_entries(vec![MoodEntry::new(7, "better")]))
            .await
            .unwrap();

        let snap = store.get(date).await.unwrap().unwrap();
        assert_eq!(snap.doses().len(), 1);
        assert_eq!(snap.doses()[0].id, "m1");
        assert_eq!(snap.doses()[0].status, DoseStatus::Taken);
        assert_eq!(snap.moods().len(), 1);
        assert_eq!(snap.moods()[0].score, 7);
        assert_eq!(snap.moods()[0].label, "better");
    }

    #[tokio::test]
    async fn test_upsert_overrides_within_group_only() {
        let (store, _dir) = create_test_store().await;
        let date = day("2025-02-10");

        store
            .upsert(
                &DaySnapshot::new(date)
                    .with_vitals(Vitals {
                        systolic: Some(130),
                        diastolic: Some(85),
                        ..Default::default()
                    })
                    .with_sleep(Sleep {
                        hours: Some(5.0),
                        quality: Some(3),
                    }),
            )
            .await
            .unwrap();

        store
            .upsert(&DaySnapshot::new(date).with_vitals(Vitals {
                heart_rate: Some(70),
                ..Default::default()
            }))
            .await
            .unwrap();

        let snap = store.get(date).await.unwrap().unwrap();
        let vitals = snap.vitals.unwrap();
        assert_eq!(vitals.heart_rate, Some(70));
        assert_eq!(vitals.systolic, None);
        assert_eq!(snap.sleep.unwrap().hours, Some(5.0));
    }

    #[tokio::test]
    async fn test_range_is_sparse_and_bounded() {
        let (store, _dir) = create_test_store().await;

        for d in ["2024-12-31", "2025-01-03", "2025-01-08"] {
            store
                .upsert(&DaySnapshot::new(day(d)).with_check_in(CheckIn {
                    mood: Some(5),
                    ..Default::default()
                }))
                .await
                .unwrap();
        }

        let history = store.range(day("2025-01-01"), day("2025-01-07")).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history.days[0].date, day("2025-01-03"));
        assert!(history.skipped.is_empty());

        let all = store.range(day("2024-12-31"), day("2025-01-08")).await.unwrap();
        let dates: Vec<NaiveDate> = all.days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day("2024-12-31"), day("2025-01-03"), day("2025-01-08")]);
        assert!(all.day(day("2025-01-03")).is_some());
        assert!(all.day(day("2025-01-04")).is_none());
    }

    #[tokio::test]
    async fn test_range_rejects_inverted_bounds() {
        let (store, _dir) = create_test_store().await;
        let err = store.range(day("2025-01-07"), day("2025-01-01")).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidRange { .. }));
    }

    #[tokio::test]
    async fn test_invalid_field_leaves_stored_value() {
        let (store, _dir) = create_test_store().await;
        let date = day("2025-01-05");

        store
            .upsert(&DaySnapshot::new(date).with_mood_entries(vec![MoodEntry::new(6, "ok")]))
            .await
            .unwrap();

        let err = store
            .upsert(
                &DaySnapshot::new(date)
                    .with_mood_entries(vec![MoodEntry::new(11, "off the chart")])
                    .with_sleep(Sleep {
                        hours: Some(8.0),
                        quality: None,
                    }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidField(_)));

        let snap = store.get(date).await.unwrap().unwrap();
        assert_eq!(snap.moods()[0].score, 6);
        assert!(snap.sleep.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_day_isolated_in_range() {
        let (store, _dir) = create_test_store().await;

        for d in ["2025-01-01", "2025-01-02", "2025-01-03"] {
            store
                .upsert(&DaySnapshot::new(day(d)).with_sleep(Sleep {
                    hours: Some(7.0),
                    quality: Some(6),
                }))
                .await
                .unwrap();
        }

        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE day_groups SET payload = '{\"hours\":' WHERE date = '2025-01-02'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let history = store.range(day("2025-01-01"), day("2025-01-03")).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.skipped_dates(), vec![day("2025-01-02")]);

        let err = store.get(day("2025-01-02")).await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { .. }));
        assert!(store.get(day("2025-01-01")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_groups_keeps_healthy_groups() {
        let (store, _dir) = create_test_store().await;
        let date = day("2025-01-02");

        store
            .upsert(
                &DaySnapshot::new(date)
                    .with_mood_entries(vec![MoodEntry::new(4, "tired")])
                    .with_sleep(Sleep {
                        hours: Some(6.0),
                        quality: None,
                    }),
            )
            .await
            .unwrap();

        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE day_groups SET payload = 'garbage' WHERE field_group = 'sleep'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert!(store.get(date).await.is_err());

        let read = store.get_groups(date).await.unwrap();
        assert_eq!(read.corrupt_groups(), vec![FieldGroup::Sleep]);
        let snap = read.snapshot.unwrap();
        assert_eq!(snap.moods()[0].label, "tired");
        assert!(snap.sleep.is_none());

        let empty = store.get_groups(day("2025-01-03")).await.unwrap();
        assert_eq!(empty, DayGroups::default());
    }

    #[tokio::test]
    async fn test_checksum_tamper_detected() {
        let (store, _dir) = create_test_store().await;
        let date = day("2025-03-01");

        store
            .upsert(&DaySnapshot::new(date).with_check_in(CheckIn {
                mood: Some(4),
                energy: Some(4),
                pain: Some(7),
            }))
            .await
            .unwrap();

        // Valid JSON, wrong checksum
        store
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE day_groups SET payload = '{\"mood\":9}' WHERE date = '2025-03-01'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        match store.get(date).await.unwrap_err() {
            StoreError::CorruptRecord { group, reason, .. } => {
                assert_eq!(group, "check_in");
                assert!(reason.contains("checksum"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrent_upserts_same_day() {
        let (store, _dir) = create_test_store().await;
        let store = Arc::new(store);
        let date = day("2025-01-01");

        let meds = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .upsert(&DaySnapshot::new(date).with_medications(vec![MedicationDose::new("m1", DoseStatus::Taken)]))
                    .await
            })
        };
        let mood = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .upsert(&DaySnapshot::new(date).with_mood_entries(vec![MoodEntry::new(7, "better")]))
                    .await
            })
        };

        meds.await.unwrap().unwrap();
        mood.await.unwrap().unwrap();

        let snap = store.get(date).await.unwrap().unwrap();
        assert!(snap.medications.is_some());
        assert!(snap.mood_entries.is_some());
    }

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempdir().unwrap();
        let config = StoreConfig::new(dir.path());
        let date = day("2025-01-01");

        {
            let store = RecordStore::open(config.clone()).await.unwrap();
            store
                .upsert(&DaySnapshot::new(date).with_medications(vec![MedicationDose::new("m1", DoseStatus::Taken)]))
                .await
                .unwrap();
        }

        {
            let store = RecordStore::open(config).await.unwrap();
            let snap = store.get(date).await.unwrap().unwrap();
            assert_eq!(snap.doses()[0].status, DoseStatus::Taken);
        }
    }

    #[tokio::test]
    async fn test_unavailable_medium() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = RecordStore::open(StoreConfig::new(blocker.join("data"))).await;
        assert!(matches!(result, Err(StoreError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_immutable_window() {
        let dir = tempdir().unwrap();
        let store = RecordStore::open(StoreConfig::new(dir.path()).immutable_after_days(30))
            .await
            .unwrap();

        let old = day("2000-01-01");
        let err = store
            .upsert(&DaySnapshot::new(old).with_check_in(CheckIn::default()))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::ImmutableRecord(old));

        let today = chrono::Local::now().date_naive();
        store
            .upsert(&DaySnapshot::new(today).with_check_in(CheckIn::default()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_upsert_creates_nothing() {
        let (store, _dir) = create_test_store().await;
        let date = day("2025-01-01");
        store.upsert(&DaySnapshot::new(date)).await.unwrap();
        assert_eq!(store.get(date).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stats() {
        let (store, _dir) = create_test_store().await;

        store
            .upsert(
                &DaySnapshot::new(day("2025-01-01"))
                    .with_medications(vec![MedicationDose::new("m1", DoseStatus::Planned)])
                    .with_sleep(Sleep::default()),
            )
            .await
            .unwrap();
        store
            .upsert(&DaySnapshot::new(day("2025-01-04")).with_sleep(Sleep::default()))
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.day_count, 2);
        assert_eq!(stats.group_rows, 3);
        assert_eq!(stats.first_day, Some(day("2025-01-01")));
        assert_eq!(stats.last_day, Some(day("2025-01-04")));
        assert!(stats.storage_size_bytes > 0);
    }
}
