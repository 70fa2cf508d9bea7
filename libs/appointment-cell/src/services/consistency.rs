// libs/appointment-cell/src/services/consistency.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AppointmentError;

type DiaryKey = (Uuid, NaiveDate);

/// Serializes check-then-write sequences per specialist and date, so two
/// requests for the same diary page cannot both pass the gate and both insert.
/// Requests for different specialists or dates never wait on each other.
pub struct SchedulingLocks {
    locks: StdMutex<HashMap<DiaryKey, Arc<Mutex<()>>>>,
    timeout: Duration,
}

/// Held for the duration of a check-then-write.
pub struct DiaryGuard {
    key: DiaryKey,
    _guard: OwnedMutexGuard<()>,
}

impl DiaryGuard {
    pub fn specialist_id(&self) -> Uuid {
        self.key.0
    }

    pub fn date(&self) -> NaiveDate {
        self.key.1
    }
}

impl SchedulingLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: StdMutex::new(HashMap::new()),
            timeout,
        }
    }

    pub fn with_timeout_seconds(seconds: u64) -> Self {
        Self::new(Duration::from_secs(seconds))
    }

    /// Wait for exclusive access to one specialist's diary on one date.
    pub async fn acquire(&self, specialist_id: Uuid, date: NaiveDate) -> Result<DiaryGuard, AppointmentError> {
        let key = (specialist_id, date);
        let lock = self.lock_for(key)?;

        debug!("Acquiring scheduling lock for specialist {} on {}", specialist_id, date);
        match tokio::time::timeout(self.timeout, lock.lock_owned()).await {
            Ok(guard) => Ok(DiaryGuard { key, _guard: guard }),
            Err(_) => {
                warn!(
                    "Timed out after {:?} waiting for scheduling lock on specialist {} for {}",
                    self.timeout, specialist_id, date
                );
                Err(AppointmentError::LockTimeout)
            }
        }
    }

    /// Number of diary pages with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    fn lock_for(&self, key: DiaryKey) -> Result<Arc<Mutex<()>>, AppointmentError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| AppointmentError::DatabaseError("Scheduling lock registry poisoned".to_string()))?;

        // Entries nobody holds or waits on can go.
        locks.retain(|existing, lock| *existing == key || Arc::strong_count(lock) > 1);

        Ok(locks.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone())
    }
}

impl Default for SchedulingLocks {
    fn default() -> Self {
        Self::with_timeout_seconds(5)
    }
}
