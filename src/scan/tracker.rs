use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::error::RecognitionError;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionStatus {
    Idle,
    Pending,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecognitionSnapshot {
    pub status: RecognitionStatus,
    /// Display message of the last failed call, cleared by the next submission.
    pub last_error: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_completed_at: Option<OffsetDateTime>,
    pub completed: u64,
}

/// Admits one recognition call at a time. A submission while another is
/// pending is refused, never queued.
#[derive(Debug, Default)]
pub struct RecognitionTracker {
    in_flight: AtomicBool,
    completed: AtomicU64,
    last_error: Mutex<Option<String>>,
    last_completed_at: Mutex<Option<OffsetDateTime>>,
}

/// Held for the duration of a call; dropping it returns the tracker to idle.
#[derive(Debug)]
pub struct InFlight<'a> {
    tracker: &'a RecognitionTracker,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.tracker.in_flight.store(false, Ordering::Release);
    }
}

impl RecognitionTracker {
    pub async fn try_begin(&self) -> Result<InFlight<'_>, RecognitionError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| RecognitionError::Busy)?;
        *self.last_error.lock().await = None;
        Ok(InFlight { tracker: self })
    }

    pub fn status(&self) -> RecognitionStatus {
        if self.in_flight.load(Ordering::Acquire) {
            RecognitionStatus::Pending
        } else {
            RecognitionStatus::Idle
        }
    }

    pub async fn record_success(&self, _call: &InFlight<'_>) {
        self.completed.fetch_add(1, Ordering::AcqRel);
        *self.last_completed_at.lock().await = Some(OffsetDateTime::now_utc());
    }

    pub async fn record_failure(&self, _call: &InFlight<'_>, message: String) {
        *self.last_error.lock().await = Some(message);
    }

    pub async fn snapshot(&self) -> RecognitionSnapshot {
        RecognitionSnapshot {
            status: self.status(),
            last_error: self.last_error.lock().await.clone(),
            last_completed_at: *self.last_completed_at.lock().await,
            completed: self.completed.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_begin_is_refused_until_drop() {
        let tracker = RecognitionTracker::default();
        let call = tracker.try_begin().await.unwrap();
        assert_eq!(tracker.status(), RecognitionStatus::Pending);
        assert!(matches!(
            tracker.try_begin().await,
            Err(RecognitionError::Busy)
        ));
        drop(call);
        assert_eq!(tracker.status(), RecognitionStatus::Idle);
        assert!(tracker.try_begin().await.is_ok());
    }

    #[tokio::test]
    async fn failure_message_lasts_until_next_submission() {
        let tracker = RecognitionTracker::default();
        {
            let call = tracker.try_begin().await.unwrap();
            tracker.record_failure(&call, "No food detected in image".into()).await;
        }
        let snap = tracker.snapshot().await;
        assert_eq!(snap.status, RecognitionStatus::Idle);
        assert_eq!(snap.last_error.as_deref(), Some("No food detected in image"));

        let call = tracker.try_begin().await.unwrap();
        tracker.record_success(&call).await;
        drop(call);
        let snap = tracker.snapshot().await;
        assert_eq!(snap.last_error, None);
        assert_eq!(snap.completed, 1);
        assert!(snap.last_completed_at.is_some());
    }
}
