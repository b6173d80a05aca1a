//! Session Cache
//!
//! Write-through, in-memory view of recent days in front of a `DayStore`.
//! Local edits are applied and readable immediately; they reach the store on
//! the next flush. Each cached date moves through:
//!
//! ```text
//!   Clean ──edit──▶ Dirty ──flush──▶ Flushing ──ok──▶ Clean (or Dirty if edited meanwhile)
//!                                       └──err──▶ FlushFailed ──retry──▶ Flushing
//! ```
//!
//! Only the field groups edited locally are pending, and only pending groups
//! are sent on flush, so a flush never overwrites a group some other writer
//! changed in the store.
//!
//! Appends and dose status changes made while the stored copy cannot be read
//! are queued and replayed over the stored group before it is flushed. A
//! stored group that fails verification blocks appends to that group only.

use crate::session::error::{SessionError, SessionResult};
use crate::snapshot::{
    validate_snapshot, CheckIn, DaySnapshot, DoseStatus, FieldGroup, MedicationDose, MoodEntry,
    Sleep, Symptoms, Vitals,
};
use crate::storage::{DayGroups, DayStore, History, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{interval, Instant};

/// Flush and retry tunables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// How often the background task looks for dirty dates (milliseconds)
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,

    /// First retry delay after a failed flush (milliseconds)
    #[serde(default = "default_retry_base")]
    pub retry_base_ms: u64,

    /// Upper bound for the retry delay (milliseconds)
    #[serde(default = "default_retry_max")]
    pub retry_max_ms: u64,
}

fn default_flush_interval() -> u64 {
    1000
}

fn default_retry_base() -> u64 {
    500
}

fn default_retry_max() -> u64 {
    60_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval(),
            retry_base_ms: default_retry_base(),
            retry_max_ms: default_retry_max(),
        }
    }
}

impl SessionConfig {
    /// Delay before the next retry after `attempts` failed flushes
    pub fn backoff(&self, attempts: u32) -> Duration {
        let factor = 1u64.checked_shl(attempts).unwrap_or(u64::MAX);
        Duration::from_millis(self.retry_base_ms.saturating_mul(factor).min(self.retry_max_ms))
    }
}

/// Per-date flush state
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlushState {
    Clean,
    Dirty,
    Flushing,
    FlushFailed,
}

impl std::fmt::Display for FlushState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FlushState::Clean => "clean",
            FlushState::Dirty => "dirty",
            FlushState::Flushing => "flushing",
            FlushState::FlushFailed => "flush_failed",
        };
        f.write_str(s)
    }
}

/// What a single flush did
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    /// Nothing was pending
    Clean,
    /// Another flush for the date is in progress
    InFlight,
    /// These groups are now durable
    Flushed(Vec<FieldGroup>),
}

/// Result of flushing several dates
#[derive(Debug, Default)]
pub struct FlushReport {
    pub flushed: Vec<NaiveDate>,
    pub failed: Vec<(NaiveDate, SessionError)>,
}

impl FlushReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Published after every successful flush
#[derive(Debug, Clone, PartialEq)]
pub struct FlushEvent {
    pub date: NaiveDate,
    pub groups: Vec<FieldGroup>,
}

/// An edit that builds on the current value of its group
#[derive(Debug, Clone)]
enum Delta {
    AddDose(MedicationDose),
    DoseStatus { id: String, status: DoseStatus },
    AddMood(MoodEntry),
}

impl Delta {
    fn group(&self) -> FieldGroup {
        match self {
            Delta::AddDose(_) | Delta::DoseStatus { .. } => FieldGroup::Medications,
            Delta::AddMood(_) => FieldGroup::Mood,
        }
    }

    /// Apply to the cached day. With `strict`, a status change for a dose the
    /// day does not have is an error; otherwise it is held for the replay.
    fn apply(&self, day: &mut DaySnapshot, strict: bool) -> SessionResult<()> {
        match self {
            Delta::AddDose(dose) => day.medications.get_or_insert_with(Vec::new).push(dose.clone()),
            Delta::AddMood(entry) => day.mood_entries.get_or_insert_with(Vec::new).push(entry.clone()),
            Delta::DoseStatus { id, status } => {
                let dose = day
                    .medications
                    .as_mut()
                    .and_then(|doses| doses.iter_mut().find(|d| &d.id == id));
                match dose {
                    Some(dose) => dose.status = *status,
                    None if strict => {
                        return Err(SessionError::UnknownDose {
                            date: day.date,
                            id: id.clone(),
                        })
                    }
                    None => {}
                }
            }
        }
        Ok(())
    }

    /// Replay over a stored copy: stored entries first, then ids it lacks.
    ///
    /// Returns false for a status change naming a dose that is not there.
    fn replay(&self, day: &mut DaySnapshot) -> bool {
        match self {
            Delta::AddDose(dose) => {
                let doses = day.medications.get_or_insert_with(Vec::new);
                if !doses.iter().any(|d| d.id == dose.id) {
                    doses.push(dose.clone());
                }
                true
            }
            Delta::AddMood(entry) => {
                let entries = day.mood_entries.get_or_insert_with(Vec::new);
                if !entries.iter().any(|e| e.id == entry.id) {
                    entries.push(entry.clone());
                }
                true
            }
            Delta::DoseStatus { .. } => self.apply(day, true).is_ok(),
        }
    }
}

/// Cached state for one date
#[derive(Debug)]
struct Entry {
    snapshot: DaySnapshot,
    /// Locally edited groups and the edit version that last touched them
    pending: HashMap<FieldGroup, u64>,
    state: FlushState,
    attempts: u32,
    retry_at: Option<Instant>,
    last_error: Option<StoreError>,
    /// Whether the stored copy has been merged in
    hydrated: bool,
    /// Deltas made before the stored copy was loaded, in edit order
    queued: Vec<Delta>,
    /// Stored groups that failed verification and were not replaced since
    corrupt: HashMap<FieldGroup, StoreError>,
}

impl Entry {
    fn new(date: NaiveDate) -> Self {
        Self {
            snapshot: DaySnapshot::new(date),
            pending: HashMap::new(),
            state: FlushState::Clean,
            attempts: 0,
            retry_at: None,
            last_error: None,
            hydrated: false,
            queued: Vec::new(),
            corrupt: HashMap::new(),
        }
    }

    fn has_queued(&self, group: FieldGroup) -> bool {
        self.queued.iter().any(|d| d.group() == group)
    }

    /// Whether the cached group is the full current value
    fn knows(&self, group: FieldGroup) -> bool {
        self.hydrated || (self.snapshot.has_group(group) && !self.has_queued(group))
    }

    /// A whole-group write replaces whatever was stored or queued for it
    fn replaced(&mut self, group: FieldGroup) {
        self.queued.retain(|d| d.group() != group);
        self.corrupt.remove(&group);
    }

    /// Merge the stored copy into the cached day.
    ///
    /// Groups replaced locally win. Groups with queued deltas are rebuilt as
    /// stored value plus replayed deltas. Any other stored group is taken as is.
    fn absorb(&mut self, read: DayGroups) {
        let date = self.snapshot.date;
        let stored = read.snapshot.unwrap_or_else(|| DaySnapshot::new(date));

        for (group, err) in read.corrupt {
            if self.has_queued(group) {
                tracing::warn!(date = %date, group = %group, "Queued entries replace an unreadable group");
            } else if !self.snapshot.has_group(group) {
                self.corrupt.insert(group, err);
            }
        }

        for &group in FieldGroup::all() {
            if self.has_queued(group) {
                let mut merged = stored.project([group]);
                for delta in self.queued.iter().filter(|d| d.group() == group) {
                    if !delta.replay(&mut merged) {
                        tracing::warn!(date = %date, "Dropping status change for a dose the stored day lacks");
                    }
                }
                if !merged.has_group(group) {
                    self.pending.remove(&group);
                }
                self.snapshot.copy_group(&merged, group);
            } else if !self.snapshot.has_group(group) {
                self.snapshot.copy_group(&stored, group);
            }
        }

        self.queued.clear();
        self.hydrated = true;
        if self.pending.is_empty() && self.state != FlushState::Flushing {
            self.state = FlushState::Clean;
            self.attempts = 0;
            self.retry_at = None;
            self.last_error = None;
        }
    }

    /// Lay the pending groups over a stored day
    fn overlay(&self, day: &mut DaySnapshot) {
        for &group in self.pending.keys() {
            if self.has_queued(group) {
                for delta in self.queued.iter().filter(|d| d.group() == group) {
                    delta.replay(day);
                }
            } else {
                day.copy_group(&self.snapshot, group);
            }
        }
    }

    fn mark_pending(&mut self, group: FieldGroup, version: u64) {
        self.pending.insert(group, version);
        if self.state == FlushState::Clean {
            self.state = FlushState::Dirty;
        }
    }

    fn flush_succeeded(&mut self, sent: &HashMap<FieldGroup, u64>) {
        for (group, version) in sent {
            if self.pending.get(group) == Some(version) {
                self.pending.remove(group);
            }
        }
        self.attempts = 0;
        self.retry_at = None;
        self.last_error = None;
        self.state = if self.pending.is_empty() {
            FlushState::Clean
        } else {
            FlushState::Dirty
        };
    }

    fn flush_failed(&mut self, err: StoreError, delay: Duration) {
        self.state = FlushState::FlushFailed;
        self.attempts += 1;
        self.retry_at = Some(Instant::now() + delay);
        self.last_error = Some(err);
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.state {
            FlushState::Dirty => true,
            FlushState::FlushFailed => self.retry_at.map(|at| at <= now).unwrap_or(true),
            FlushState::Clean | FlushState::Flushing => false,
        }
    }
}

/// In-memory, write-through view of day snapshots
pub struct SessionCache {
    store: Arc<dyn DayStore>,
    config: SessionConfig,
    entries: Arc<RwLock<HashMap<NaiveDate, Entry>>>,
    version: AtomicU64,
    events: broadcast::Sender<FlushEvent>,
    shutdown: Arc<RwLock<bool>>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn DayStore>, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            config,
            entries: Arc::new(RwLock::new(HashMap::new())),
            version: AtomicU64::new(0),
            events,
            shutdown: Arc::new(RwLock::new(false)),
        }
    }

    pub fn store(&self) -> &Arc<dyn DayStore> {
        &self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Receive an event for every successful flush
    pub fn subscribe(&self) -> broadcast::Receiver<FlushEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Latest value for a date, including unflushed edits
    pub async fn get(&self, date: NaiveDate) -> SessionResult<Option<DaySnapshot>> {
        if let Err(err) = self.hydrate(date, true).await {
            let entries = self.entries.read().await;
            return match entries.get(&date) {
                Some(entry) if !entry.snapshot.is_empty() => {
                    tracing::warn!("Serving local edits for {} only: {}", date, err);
                    Ok(Some(entry.snapshot.clone()))
                }
                _ => Err(err.into()),
            };
        }

        let entries = self.entries.read().await;
        Ok(entries
            .get(&date)
            .map(|e| e.snapshot.clone())
            .filter(|s| !s.is_empty()))
    }

    /// Store range with unflushed edits laid over it
    pub async fn range(&self, start: NaiveDate, end: NaiveDate) -> SessionResult<History> {
        let mut history = self.store.range(start, end).await?;

        let entries = self.entries.read().await;
        for entry in entries.values() {
            let date = entry.snapshot.date;
            if date < start || date > end || entry.pending.is_empty() {
                continue;
            }

            match history.days.binary_search_by_key(&date, |d| d.date) {
                Ok(i) => entry.overlay(&mut history.days[i]),
                Err(i) => {
                    let mut local = DaySnapshot::new(date);
                    entry.overlay(&mut local);
                    if !local.is_empty() {
                        history.days.insert(i, local);
                    }
                }
            }
        }

        Ok(history)
    }

    /// Flush state of a date; `Clean` for dates never touched
    pub async fn state(&self, date: NaiveDate) -> FlushState {
        self.entries
            .read()
            .await
            .get(&date)
            .map(|e| e.state)
            .unwrap_or(FlushState::Clean)
    }

    /// Last flush error for a date, if its latest flush failed
    pub async fn last_error(&self, date: NaiveDate) -> Option<StoreError> {
        self.entries
            .read()
            .await
            .get(&date)
            .and_then(|e| e.last_error.clone())
    }

    /// Stored groups of a date that failed verification and were not replaced
    pub async fn corrupt_groups(&self, date: NaiveDate) -> Vec<FieldGroup> {
        let mut groups: Vec<FieldGroup> = self
            .entries
            .read()
            .await
            .get(&date)
            .map(|e| e.corrupt.keys().copied().collect())
            .unwrap_or_default();
        groups.sort();
        groups
    }

    /// Dates with edits not yet in the store, ascending
    pub async fn pending_dates(&self) -> Vec<NaiveDate> {
        let entries = self.entries.read().await;
        let mut dates: Vec<NaiveDate> = entries
            .iter()
            .filter(|(_, e)| !e.pending.is_empty())
            .map(|(d, _)| *d)
            .collect();
        dates.sort();
        dates
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Merge every group carried by `patch` into the cached day
    pub async fn upsert(&self, patch: &DaySnapshot) -> SessionResult<()> {
        validate_snapshot(patch)?;
        self.store.check_writable(patch.date)?;

        let groups = patch.groups();
        if groups.is_empty() {
            return Ok(());
        }

        self.hydrate(patch.date, false).await?;

        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(patch.date)
            .or_insert_with(|| Entry::new(patch.date));
        entry.snapshot.merge(patch);

        let version = self.next_version();
        for group in groups {
            entry.replaced(group);
            entry.mark_pending(group, version);
        }
        Ok(())
    }

    /// Mark one scheduled dose planned, taken or missed
    pub async fn set_dose_status(
        &self,
        date: NaiveDate,
        dose_id: &str,
        status: DoseStatus,
    ) -> SessionResult<()> {
        let delta = Delta::DoseStatus {
            id: dose_id.to_string(),
            status,
        };
        self.append(date, delta).await
    }

    /// Append a dose to the day's schedule
    pub async fn add_dose(&self, date: NaiveDate, dose: MedicationDose) -> SessionResult<()> {
        self.append(date, Delta::AddDose(dose)).await
    }

    /// Replace the day's whole dose schedule
    pub async fn set_medications(
        &self,
        date: NaiveDate,
        doses: Vec<MedicationDose>,
    ) -> SessionResult<()> {
        self.edit(date, FieldGroup::Medications, |day| {
            day.medications = Some(doses);
            Ok(())
        })
        .await
    }

    /// Append a mood entry; entries keep insertion order
    pub async fn add_mood(&self, date: NaiveDate, entry: MoodEntry) -> SessionResult<()> {
        self.append(date, Delta::AddMood(entry)).await
    }

    pub async fn set_vitals(&self, date: NaiveDate, vitals: Vitals) -> SessionResult<()> {
        self.edit(date, FieldGroup::Vitals, |day| {
            day.vitals = Some(vitals);
            Ok(())
        })
        .await
    }

    pub async fn set_symptoms(&self, date: NaiveDate, symptoms: Symptoms) -> SessionResult<()> {
        self.edit(date, FieldGroup::Symptoms, |day| {
            day.symptoms = Some(symptoms);
            Ok(())
        })
        .await
    }

    pub async fn set_sleep(&self, date: NaiveDate, sleep: Sleep) -> SessionResult<()> {
        self.edit(date, FieldGroup::Sleep, |day| {
            day.sleep = Some(sleep);
            Ok(())
        })
        .await
    }

    pub async fn set_check_in(&self, date: NaiveDate, check_in: CheckIn) -> SessionResult<()> {
        self.edit(date, FieldGroup::CheckIn, |day| {
            day.check_in = Some(check_in);
            Ok(())
        })
        .await
    }

    /// Replace one group of a day.
    ///
    /// The change runs on a draft; the cached day is only updated when the
    /// draft passes validation.
    async fn edit<F>(&self, date: NaiveDate, group: FieldGroup, change: F) -> SessionResult<()>
    where
        F: FnOnce(&mut DaySnapshot) -> SessionResult<()>,
    {
        self.store.check_writable(date)?;
        self.hydrate(date, false).await?;

        let mut entries = self.entries.write().await;
        let entry = entries.entry(date).or_insert_with(|| Entry::new(date));

        let mut draft = entry.snapshot.project([group]);
        change(&mut draft)?;
        validate_snapshot(&draft)?;

        entry.snapshot.copy_group(&draft, group);
        entry.replaced(group);
        let version = self.next_version();
        entry.mark_pending(group, version);

        tracing::debug!(date = %date, group = %group, state = %entry.state, "Cached edit");
        Ok(())
    }

    /// Apply an edit that builds on the group's current value.
    ///
    /// Without the stored copy (store unreachable) the delta is applied to the
    /// local view and queued; it is replayed over the stored group before that
    /// group is flushed.
    async fn append(&self, date: NaiveDate, delta: Delta) -> SessionResult<()> {
        self.store.check_writable(date)?;
        self.hydrate(date, false).await?;

        let group = delta.group();
        let mut entries = self.entries.write().await;
        let entry = entries.entry(date).or_insert_with(|| Entry::new(date));

        if let Some(err) = entry.corrupt.get(&group) {
            return Err(err.clone().into());
        }

        let known = entry.knows(group);
        let mut draft = entry.snapshot.project([group]);
        delta.apply(&mut draft, known)?;
        validate_snapshot(&draft)?;

        entry.snapshot.copy_group(&draft, group);
        if !known {
            entry.queued.push(delta);
        }
        let version = self.next_version();
        entry.mark_pending(group, version);

        tracing::debug!(date = %date, group = %group, queued = !known, "Cached edit");
        Ok(())
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Merge the stored copy of `date` into the cache once.
    ///
    /// Damaged stored groups are recorded and the healthy ones merged. When
    /// the store is unreachable and `required` is false, the edit proceeds and
    /// the stored copy is merged on a later access.
    async fn hydrate(&self, date: NaiveDate, required: bool) -> StoreResult<()> {
        let hydrated = self
            .entries
            .read()
            .await
            .get(&date)
            .map(|e| e.hydrated)
            .unwrap_or(false);
        if hydrated {
            return Ok(());
        }

        let read = match self.store.get_groups(date).await {
            Ok(read) => read,
            Err(err) if !required => {
                tracing::debug!(date = %date, "Editing without the stored copy: {}", err);
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let mut entries = self.entries.write().await;
        let entry = entries.entry(date).or_insert_with(|| Entry::new(date));
        if !entry.hydrated {
            entry.absorb(read);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flushing
    // ------------------------------------------------------------------

    /// Send a date's pending groups to the store now.
    ///
    /// On failure the date becomes `FlushFailed`, keeps its pending groups,
    /// and is retried with backoff by the background task.
    pub async fn flush(&self, date: NaiveDate) -> SessionResult<FlushOutcome> {
        let queued = self
            .entries
            .read()
            .await
            .get(&date)
            .map(|e| !e.queued.is_empty() && e.state != FlushState::Flushing)
            .unwrap_or(false);
        if queued {
            if let Err(err) = self.hydrate(date, true).await {
                return Err(self.record_failure(date, err).await);
            }
        }

        let (patch, sent) = {
            let mut entries = self.entries.write().await;
            let Some(entry) = entries.get_mut(&date) else {
                return Ok(FlushOutcome::Clean);
            };
            if entry.state == FlushState::Flushing {
                return Ok(FlushOutcome::InFlight);
            }
            if entry.pending.is_empty() {
                return Ok(FlushOutcome::Clean);
            }

            entry.state = FlushState::Flushing;
            let sent = entry.pending.clone();
            (entry.snapshot.project(sent.keys().copied()), sent)
        };

        if let Err(err) = self.store.upsert(&patch).await {
            return Err(self.record_failure(date, err).await);
        }

        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&date) else {
            return Ok(FlushOutcome::Clean);
        };

        entry.flush_succeeded(&sent);
        let groups = patch.groups();
        tracing::debug!(date = %date, groups = ?groups, state = %entry.state, "Flushed day");

        // No subscribers is fine
        let _ = self.events.send(FlushEvent {
            date,
            groups: groups.clone(),
        });
        Ok(FlushOutcome::Flushed(groups))
    }

    /// Move a date to `FlushFailed` and schedule its retry
    async fn record_failure(&self, date: NaiveDate, err: StoreError) -> SessionError {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(&date) {
            let delay = self.config.backoff(entry.attempts);
            tracing::warn!(
                date = %date,
                attempt = entry.attempts + 1,
                retry_in_ms = delay.as_millis() as u64,
                "Flush failed: {}",
                err
            );
            entry.flush_failed(err.clone(), delay);
        }
        err.into()
    }

    /// Flush every date with pending edits, ignoring backoff
    pub async fn flush_all(&self) -> FlushReport {
        let dates = self.pending_dates().await;
        self.flush_dates(dates).await
    }

    /// Flush dirty dates and failed dates whose backoff has elapsed
    pub async fn flush_due(&self) -> FlushReport {
        let now = Instant::now();
        let mut dates: Vec<NaiveDate> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(_, e)| e.is_due(now))
            .map(|(d, _)| *d)
            .collect();
        dates.sort();
        self.flush_dates(dates).await
    }

    async fn flush_dates(&self, dates: Vec<NaiveDate>) -> FlushReport {
        let mut report = FlushReport::default();
        for date in dates {
            match self.flush(date).await {
                Ok(FlushOutcome::Flushed(_)) => report.flushed.push(date),
                Ok(_) => {}
                Err(err) => report.failed.push((date, err)),
            }
        }
        report
    }

    /// Start the background flush task
    pub fn start_background_flush(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        let flush_interval = Duration::from_millis(cache.config.flush_interval_ms.max(1));

        tokio::spawn(async move {
            let mut ticker = interval(flush_interval);

            loop {
                ticker.tick().await;

                if *cache.shutdown.read().await {
                    break;
                }

                let report = cache.flush_due().await;
                for (date, err) in &report.failed {
                    tracing::error!("Background flush for {} failed: {}", date, err);
                }
            }
        })
    }

    /// Stop background flushing and push everything pending.
    ///
    /// Fails with `PendingWrites` when some dates could not be flushed; their
    /// edits are still held in memory.
    pub async fn shutdown(&self) -> SessionResult<()> {
        *self.shutdown.write().await = true;

        let report = self.flush_all().await;
        let pending = self.pending_dates().await;
        if !pending.is_empty() {
            tracing::error!(
                pending = pending.len(),
                failed = report.failed.len(),
                "Shutdown with unflushed changes"
            );
            return Err(SessionError::PendingWrites(pending));
        }

        tracing::info!(flushed = report.flushed.len(), "Session cache shut down");
        Ok(())
    }
}

#[async_trait]
impl DayStore for SessionCache {
    async fn upsert(&self, snapshot: &DaySnapshot) -> StoreResult<()> {
        SessionCache::upsert(self, snapshot).await.map_err(Into::into)
    }

    async fn get(&self, date: NaiveDate) -> StoreResult<Option<DaySnapshot>> {
        SessionCache::get(self, date).await.map_err(Into::into)
    }

    async fn range(&self, start: NaiveDate, end: NaiveDate) -> StoreResult<History> {
        SessionCache::range(self, start, end).await.map_err(Into::into)
    }

    fn check_writable(&self, date: NaiveDate) -> StoreResult<()> {
        self.store.check_writable(date)
    }
}
