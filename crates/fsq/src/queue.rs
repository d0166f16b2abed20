// Copyright 2025 Courier Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The file storage queue itself.
//!
//! ## Architecture
//!
//! Producers append under a single lock; a dedicated background thread
//! consumes finalized files and hands them to the processor. The two sides
//! meet only at the lock and at a wake channel:
//!
//! ```text
//! ┌──────────────┐   lock    ┌──────────────┐   crossbeam   ┌──────────────┐
//! │  producers   │ ────────► │  QueueState  │ ◄─── wake ─── │  fsq-worker  │
//! │ push_message │           │ active+queue │    channel    │  (bg thread) │
//! └──────────────┘           └──────────────┘               └──────┬───────┘
//!                                                                  │
//!                                                          FileProcessor
//! ```
//!
//! ## File lifecycle
//!
//! `current-<ts>.bin` (appending) → rename → `finalized-<ts>.bin`
//! (immutable, queued oldest-first) → deleted on processor success, or
//! evicted by the purge policy when storage ceilings are exceeded.
//!
//! ## Failure stance
//!
//! The directory is the source of truth. In-memory bookkeeping is rebuilt
//! from it at startup and deviations (a file deleted under us, a failed
//! rename) are logged and reconciled on the next natural trigger rather
//! than treated as fatal. Only an unusable storage directory at
//! construction time kills the queue.

use std::{
    collections::VecDeque,
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use snafu::{ResultExt, ensure};
use tracing::{debug, error, info, warn};

use crate::{
    Result,
    append::AppendStrategy,
    clock::Clock,
    error::{
        AppendSnafu, CreateActiveSnafu, FinalizeSnafu, RemoveSnafu, ShutDownSnafu,
        StorageDirSnafu, WorkerPanickedSnafu, WorkerSpawnSnafu,
    },
    file::{ActiveFile, FileInfo},
    finalize::FinalizePolicy,
    path::{self, ScannedFile, finalized_file_name},
    processor::{FileProcessingResult, FileProcessor},
    purge::PurgePolicy,
    resume::ResumePolicy,
    retry::RetryPolicy,
    status::{FinalizedFilesStatus, QueueStatus},
};

/// Wake signals from producers to the background worker.
enum Wake {
    /// A file was finalized; there may be work.
    Sealed,
    /// Process everything now, ignoring retry backoff.
    Force,
    /// Stop the worker.
    Shutdown,
}

/// Everything the builder collects before the queue starts.
pub(crate) struct QueueOptions {
    pub dir:                PathBuf,
    pub clock:              Arc<dyn Clock>,
    pub append:             Box<dyn AppendStrategy>,
    pub finalize:           Box<dyn FinalizePolicy>,
    pub purge:              Box<dyn PurgePolicy>,
    pub retry:              Box<dyn RetryPolicy>,
    pub resume:             Box<dyn ResumePolicy>,
    pub age_check_interval: Duration,
}

/// Mutable queue state, guarded by the producer lock.
#[derive(Default)]
struct QueueState {
    /// The single file currently accepting appends, if any.
    active:       Option<ActiveFile>,
    /// Finalized files awaiting processing, oldest first.
    sealed:       VecDeque<FileInfo>,
    /// Sum of sizes in `sealed`.
    sealed_total: u64,
}

struct Shared {
    dir:                PathBuf,
    clock:              Arc<dyn Clock>,
    append:             Box<dyn AppendStrategy>,
    finalize:           Box<dyn FinalizePolicy>,
    purge:              Box<dyn PurgePolicy>,
    age_check_interval: Duration,
    state:              Mutex<QueueState>,
    shutdown:           AtomicBool,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seals the active file, if one exists and holds data. Returns whether
    /// a file actually moved into the finalized queue.
    fn seal_active_locked(&self, state: &mut QueueState) -> Result<bool> {
        let Some(active) = state.active.take() else {
            return Ok(false);
        };
        if active.size() == 0 {
            // Nothing was ever appended; drop the empty file quietly.
            let empty = active.path().to_path_buf();
            drop(active);
            if let Err(e) = fs::remove_file(&empty) {
                warn!(error = %e, path = ?empty, "Failed to remove empty active file");
            }
            return Ok(false);
        }

        let from = active.path().to_path_buf();
        let to = self.dir.join(finalized_file_name(active.timestamp_ms()));
        let info = active.seal().context(FinalizeSnafu { from, to })?;
        debug!(file = %info.name, size = info.size, "Finalized active file");

        state.sealed_total += info.size;
        state.sealed.push_back(info);
        self.purge_excess_locked(state);
        Ok(true)
    }

    /// Evicts oldest finalized files while the purge policy reports the
    /// backlog as over its ceilings.
    fn purge_excess_locked(&self, state: &mut QueueState) {
        while !state.sealed.is_empty()
            && self
                .purge
                .should_purge(state.sealed_total, state.sealed.len())
        {
            let Some(oldest) = state.sealed.pop_front() else {
                break;
            };
            state.sealed_total = state.sealed_total.saturating_sub(oldest.size);
            warn!(
                file = %oldest.name,
                size = oldest.size,
                "Purging oldest finalized file to stay within storage ceilings"
            );
            if let Err(e) = fs::remove_file(&oldest.path)
                && e.kind() != io::ErrorKind::NotFound
            {
                error!(error = %e, file = %oldest.name, "Failed to remove purged file");
            }
        }
    }
}

/// A durable, disk-backed store-and-forward queue.
///
/// Thread-safe: any number of producer threads may push concurrently. One
/// instance exclusively owns its storage directory; pointing two instances
/// at the same directory is not defended against.
pub struct FileStorageQueue {
    shared:  Arc<Shared>,
    wake_tx: Sender<Wake>,
    worker:  Option<JoinHandle<()>>,
}

impl FileStorageQueue {
    /// Creates the queue: validates the directory, recovers leftover files
    /// from previous runs, and spawns the background worker.
    pub(crate) fn new(options: QueueOptions, processor: Box<dyn FileProcessor>) -> Result<Self> {
        let QueueOptions {
            dir,
            clock,
            append,
            finalize,
            purge,
            retry,
            resume,
            age_check_interval,
        } = options;

        fs::create_dir_all(&dir).context(StorageDirSnafu { path: &dir })?;
        probe_writable(&dir)?;

        let now = clock.now_ms();
        let mut state = QueueState::default();
        let mut recovered = Vec::new();

        let scanned = path::scan_queue_dir(&dir)?;
        for file in scanned.finalized {
            match fs::metadata(&file.path) {
                Ok(meta) => recovered.push(FileInfo {
                    name:         finalized_file_name(file.timestamp_ms),
                    path:         file.path,
                    size:         meta.len(),
                    timestamp_ms: file.timestamp_ms,
                }),
                Err(e) => {
                    warn!(error = %e, path = ?file.path, "Skipping unreadable finalized file");
                }
            }
        }

        // Of the leftover active-shaped files only the most recent is a
        // resume candidate; everything older is finalized outright so the
        // queue starts with zero or one active file.
        let mut leftovers = scanned.active;
        let newest = leftovers.pop();
        for old in leftovers {
            seal_leftover(old, now, &mut recovered);
        }
        if let Some(newest) = newest {
            if resume.should_resume() {
                match ActiveFile::resume(newest.path.clone(), newest.timestamp_ms, now) {
                    Ok(active) => {
                        debug!(path = ?active.path(), size = active.size(), "Resumed leftover active file");
                        state.active = Some(active);
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            path = ?newest.path,
                            "Failed to reopen leftover active file, finalizing it instead"
                        );
                        seal_leftover(newest, now, &mut recovered);
                    }
                }
            } else {
                seal_leftover(newest, now, &mut recovered);
            }
        }

        recovered.sort_by_key(|info| info.timestamp_ms);
        state.sealed_total = recovered.iter().map(|info| info.size).sum();
        state.sealed = recovered.into();

        let shared = Arc::new(Shared {
            dir,
            clock,
            append,
            finalize,
            purge,
            age_check_interval,
            state: Mutex::new(state),
            shutdown: AtomicBool::new(false),
        });

        let (backlog, resumed) = {
            let mut state = shared.lock_state();
            shared.purge_excess_locked(&mut state);
            (state.sealed.len(), state.active.is_some())
        };

        let (wake_tx, wake_rx) = unbounded();
        let worker = Worker {
            shared: shared.clone(),
            rx: wake_rx,
            processor,
            retry,
            force: false,
            halted: false,
        };
        let handle = thread::Builder::new()
            .name("fsq-worker".into())
            .spawn(move || worker.run())
            .context(WorkerSpawnSnafu)?;

        if backlog > 0 {
            let _ = wake_tx.send(Wake::Sealed);
        }

        info!(
            path = ?shared.dir,
            backlog,
            resumed,
            "File storage queue initialized"
        );

        Ok(Self {
            shared,
            wake_tx,
            worker: Some(handle),
        })
    }

    /// Appends one message to the active file, creating it on demand.
    ///
    /// The finalization policy is consulted BEFORE the append with the
    /// projected size, so a message that would cross the ceiling seals the
    /// file containing everything before it and itself opens the next one.
    ///
    /// Never blocks on the background worker. An I/O failure is returned to
    /// the caller and leaves queue bookkeeping intact; the directory scan
    /// at the next startup reconciles whatever the filesystem really holds.
    pub fn push_message(&self, payload: impl AsRef<[u8]>) -> Result<()> {
        let payload = payload.as_ref();
        ensure!(
            !self.shared.shutdown.load(Ordering::SeqCst),
            ShutDownSnafu
        );

        let now = self.shared.clock.now_ms();
        let mut state = self.shared.lock_state();

        if let Some(active) = state.active.as_ref()
            && active.size() > 0
        {
            let projected = active.size() + self.shared.append.framed_len(payload.len());
            let age_ms = now.saturating_sub(active.timestamp_ms());
            let backlog = !state.sealed.is_empty();
            if self
                .shared
                .finalize
                .should_finalize(projected, age_ms, backlog)
                && self.shared.seal_active_locked(&mut state)?
            {
                let _ = self.wake_tx.send(Wake::Sealed);
            }
        }

        if state.active.is_none() {
            let file = ActiveFile::create(&self.shared.dir, now).with_context(|_| {
                CreateActiveSnafu {
                    path: self.shared.dir.join(path::active_file_name(now)),
                }
            })?;
            state.active = Some(file);
        }
        if let Some(active) = state.active.as_mut() {
            let path = active.path().to_path_buf();
            active
                .append(self.shared.append.as_ref(), payload, now)
                .context(AppendSnafu { path })?;
        }
        Ok(())
    }

    /// Seals the active file (if it holds data) and asks the worker to
    /// attempt every finalized file now, overriding any retry backoff.
    ///
    /// A no-op on a fully empty queue; no spurious files are created.
    pub fn force_processing(&self) -> Result<()> {
        {
            let mut state = self.shared.lock_state();
            self.shared.seal_active_locked(&mut state)?;
        }
        let _ = self.wake_tx.send(Wake::Force);
        Ok(())
    }

    /// Seals the active file without forcing immediate processing.
    pub fn finalize_current_file(&self) -> Result<()> {
        let sealed = {
            let mut state = self.shared.lock_state();
            self.shared.seal_active_locked(&mut state)?
        };
        if sealed {
            let _ = self.wake_tx.send(Wake::Sealed);
        }
        Ok(())
    }

    /// Point-in-time snapshot under the producer lock.
    #[must_use]
    pub fn status(&self) -> QueueStatus {
        let state = self.shared.lock_state();
        QueueStatus {
            appended_file_size: state.active.as_ref().map_or(0, ActiveFile::size),
            finalized:          FinalizedFilesStatus {
                queue:      state.sealed.iter().cloned().collect(),
                total_size: state.sealed_total,
            },
        }
    }

    /// Stops the background worker gracefully. An in-flight processor call
    /// completes; no new file is started afterwards.
    pub fn shutdown(mut self) -> Result<()> { self.stop_worker() }

    /// Stops the worker and deletes every queue file (active and
    /// finalized) in the storage directory. For test and reset scenarios,
    /// not normal operation.
    pub fn shutdown_and_remove_all_files(mut self) -> Result<()> {
        self.stop_worker()?;
        self.shared.lock_state().active = None;

        let scanned = path::scan_queue_dir(&self.shared.dir)?;
        for file in scanned.active.into_iter().chain(scanned.finalized) {
            if let Err(e) = fs::remove_file(&file.path)
                && e.kind() != io::ErrorKind::NotFound
            {
                return Err(e).context(RemoveSnafu { path: file.path });
            }
        }
        Ok(())
    }

    fn stop_worker(&mut self) -> Result<()> {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        let _ = self.wake_tx.send(Wake::Shutdown);
        if let Some(handle) = self.worker.take() {
            handle
                .join()
                .map_err(|_| WorkerPanickedSnafu.build())?;
            info!("File storage queue shut down");
        }
        Ok(())
    }
}

impl Drop for FileStorageQueue {
    fn drop(&mut self) {
        if self.worker.is_some()
            && let Err(e) = self.stop_worker()
        {
            error!(error = %e, "Queue worker failed during drop");
        }
    }
}

fn probe_writable(dir: &Path) -> Result<()> {
    let probe = dir.join(".write-probe");
    let outcome = fs::write(&probe, b"probe");
    let _ = fs::remove_file(&probe);
    outcome.context(StorageDirSnafu { path: dir })
}

/// Finalizes a leftover active-shaped file found at startup. Unusable
/// leftovers are skipped with a warning; they never block construction.
fn seal_leftover(file: ScannedFile, now_ms: u64, recovered: &mut Vec<FileInfo>) {
    let sealed = ActiveFile::resume(file.path.clone(), file.timestamp_ms, now_ms)
        .and_then(ActiveFile::seal);
    match sealed {
        Ok(info) => {
            debug!(file = %info.name, "Finalized leftover active file");
            recovered.push(info);
        }
        Err(e) => {
            warn!(error = %e, path = ?file.path, "Skipping unusable leftover active file");
        }
    }
}

/// The background processing loop.
///
/// Waits on the wake channel (never busy-spins), bounded by the age-check
/// interval so an idle queue still seals the active file once it ages out.
struct Worker {
    shared:    Arc<Shared>,
    rx:        Receiver<Wake>,
    processor: Box<dyn FileProcessor>,
    retry:     Box<dyn RetryPolicy>,
    /// Process regardless of backoff; cleared once the backlog drains or an
    /// attempt fails.
    force:     bool,
    /// Set by an `Unavailable` verdict; cleared by the next wake.
    halted:    bool,
}

impl Worker {
    fn run(mut self) {
        info!("FSQ worker starting");

        loop {
            if self.shared.shutdown.load(Ordering::Relaxed) {
                break;
            }

            if self.check_active_age() {
                // An age-out seal is new activity; it ends an
                // `Unavailable` halt just as a producer-side seal would.
                self.halted = false;
            }

            if self.halted {
                if !self.wait_for_wake(None) {
                    break;
                }
                continue;
            }

            let now = self.shared.clock.now_ms();
            if !self.force
                && let Some(remaining) = self.retry.should_wait(now)
            {
                if !self.wait_for_wake(Some(Duration::from_millis(remaining))) {
                    break;
                }
                continue;
            }

            let Some(file) = self.peek_oldest() else {
                self.force = false;
                if !self.wait_for_wake(None) {
                    break;
                }
                continue;
            };

            let verdict = self
                .processor
                .on_file_ready(&file, self.shared.clock.now_ms());
            let now = self.shared.clock.now_ms();
            match verdict {
                FileProcessingResult::Success => {
                    self.retry.on_success(now);
                    self.complete(&file);
                }
                FileProcessingResult::FailureNeedRetry => {
                    self.force = false;
                    self.retry.on_failure(now);
                    debug!(file = %file.name, "Processing failed, backing off");
                }
                FileProcessingResult::Unavailable => {
                    self.force = false;
                    self.halted = true;
                    debug!(file = %file.name, "Processor unavailable, halting until next wake");
                }
            }
        }

        info!("FSQ worker stopped");
    }

    /// Sleeps until a wake arrives or the age-check tick elapses. Returns
    /// `false` when the worker should stop.
    fn wait_for_wake(&mut self, cap: Option<Duration>) -> bool {
        let tick = self.shared.age_check_interval;
        let wait = cap.map_or(tick, |c| c.min(tick));
        match self.rx.recv_timeout(wait) {
            Ok(Wake::Shutdown) | Err(RecvTimeoutError::Disconnected) => false,
            Ok(Wake::Force) => {
                self.halted = false;
                self.force = true;
                true
            }
            Ok(Wake::Sealed) => {
                self.halted = false;
                true
            }
            Err(RecvTimeoutError::Timeout) => true,
        }
    }

    fn peek_oldest(&self) -> Option<FileInfo> {
        self.shared.lock_state().sealed.front().cloned()
    }

    /// Seals the active file if it has aged past its ceiling. Returns
    /// whether a seal happened.
    ///
    /// This is the age-check tick: size ceilings are only evaluated on
    /// pushes, so the policy is consulted with a projected size of zero
    /// and only its age ceiling can trigger here.
    fn check_active_age(&self) -> bool {
        let now = self.shared.clock.now_ms();
        let mut state = self.shared.lock_state();
        let Some(active) = state.active.as_ref() else {
            return false;
        };
        if active.size() == 0 {
            return false;
        }
        let age_ms = now.saturating_sub(active.timestamp_ms());
        let backlog = !state.sealed.is_empty();
        if !self.shared.finalize.should_finalize(0, age_ms, backlog) {
            return false;
        }
        debug!(
            age_ms,
            idle_ms = now.saturating_sub(active.last_append_ms()),
            "Active file aged out"
        );
        match self.shared.seal_active_locked(&mut state) {
            Ok(sealed) => sealed,
            Err(e) => {
                error!(error = %e, "Failed to finalize aged active file");
                false
            }
        }
    }

    /// Applies a `Success` verdict: removes the file and pops it from the
    /// queue, tolerating a concurrent purge of the same head.
    fn complete(&mut self, file: &FileInfo) {
        if let Err(e) = fs::remove_file(&file.path)
            && e.kind() != io::ErrorKind::NotFound
        {
            // The processor consumed the file; keep bookkeeping moving and
            // let the next startup scan reconcile the directory.
            error!(error = %e, file = %file.name, "Failed to remove processed file");
        }

        let mut state = self.shared.lock_state();
        if state
            .sealed
            .front()
            .is_some_and(|head| head.name == file.name)
        {
            state.sealed_total = state.sealed_total.saturating_sub(file.size);
            state.sealed.pop_front();
        }
        self.shared.purge_excess_locked(&mut state);
        if state.sealed.is_empty() {
            self.force = false;
        }
        debug!(file = %file.name, "Processed and removed finalized file");
    }
}
