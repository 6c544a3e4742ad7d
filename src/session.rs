//! The explicit context object that owns the persisted slots.
//!
//! Onboarding completion and profile edits write the profile; a successful
//! recognition call writes the latest scan. Everything else only reads.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::{
    error::RecognitionError,
    profile::Profile,
    scan::{ImageUpload, RecognitionSnapshot, RecognitionTracker, Recognizer, ScanResult},
    store::{
        self, KeyValueStore, LATEST_SCAN_KEY, ONBOARDING_COMPLETE_KEY, PROFILE_KEY,
    },
};

const COMPLETE_FLAG: &str = "true";

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    onboarded: RwLock<bool>,
    profile: RwLock<Option<Profile>>,
    latest_scan: RwLock<Option<ScanResult>>,
    recognition: RecognitionTracker,
}

impl Session {
    /// Reads all slots from the store. Missing or malformed values leave the
    /// slot empty.
    #[instrument(skip(store))]
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let onboarded = match store.get(ONBOARDING_COMPLETE_KEY).await {
            Ok(flag) => flag.as_deref() == Some(COMPLETE_FLAG),
            Err(e) => {
                error!(error = %e, "read onboarding flag failed");
                false
            }
        };
        let profile: Option<Profile> = store::load_json(store.as_ref(), PROFILE_KEY).await;
        let latest_scan = store::load_json::<ScanResult>(store.as_ref(), LATEST_SCAN_KEY)
            .await
            .filter(|scan| match scan.validate() {
                Ok(()) => true,
                Err(reason) => {
                    warn!(%reason, "stored scan fails validation; ignoring it");
                    false
                }
            });

        info!(
            onboarded,
            has_profile = profile.is_some(),
            has_scan = latest_scan.is_some(),
            "session loaded"
        );
        Self {
            store,
            onboarded: RwLock::new(onboarded),
            profile: RwLock::new(profile),
            latest_scan: RwLock::new(latest_scan),
            recognition: RecognitionTracker::default(),
        }
    }

    pub async fn is_onboarded(&self) -> bool {
        *self.onboarded.read().await
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.profile.read().await.clone()
    }

    pub async fn latest_scan(&self) -> Option<ScanResult> {
        self.latest_scan.read().await.clone()
    }

    /// Writes the profile, then the completion flag.
    #[instrument(skip(self, profile))]
    pub async fn complete_onboarding(&self, profile: Profile) -> anyhow::Result<()> {
        store::save_json(self.store.as_ref(), PROFILE_KEY, &profile)
            .await
            .context("save profile")?;
        self.store
            .set(ONBOARDING_COMPLETE_KEY, COMPLETE_FLAG)
            .await
            .context("set onboarding flag")?;
        *self.profile.write().await = Some(profile);
        *self.onboarded.write().await = true;
        info!("onboarding complete");
        Ok(())
    }

    /// Replaces the stored profile wholesale.
    #[instrument(skip(self, profile))]
    pub async fn save_profile(&self, profile: Profile) -> anyhow::Result<()> {
        store::save_json(self.store.as_ref(), PROFILE_KEY, &profile)
            .await
            .context("save profile")?;
        *self.profile.write().await = Some(profile);
        info!("profile updated");
        Ok(())
    }

    /// Clears the completion flag, then the profile, so onboarding can run
    /// again. A failure part way never leaves the flag set without a profile.
    /// The latest scan is left in place.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> anyhow::Result<()> {
        self.store
            .remove(ONBOARDING_COMPLETE_KEY)
            .await
            .context("remove onboarding flag")?;
        *self.onboarded.write().await = false;
        self.store
            .remove(PROFILE_KEY)
            .await
            .context("remove profile")?;
        *self.profile.write().await = None;
        info!("profile reset");
        Ok(())
    }

    /// Runs one recognition call. Refused with `Busy` while another is in
    /// flight; on success the result becomes the latest scan.
    #[instrument(skip(self, recognizer, image))]
    pub async fn scan(
        &self,
        recognizer: &dyn Recognizer,
        image: ImageUpload,
        user_id: &str,
    ) -> Result<ScanResult, RecognitionError> {
        let call = self.recognition.try_begin().await?;

        let result = match recognizer.recognize(image, user_id).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "recognition failed");
                self.recognition
                    .record_failure(&call, e.display_message())
                    .await;
                return Err(e);
            }
        };

        if let Err(e) = store::save_json(self.store.as_ref(), LATEST_SCAN_KEY, &result).await {
            error!(error = %e, "persist latest scan failed; keeping it in memory");
        }
        *self.latest_scan.write().await = Some(result.clone());
        self.recognition.record_success(&call).await;
        info!(foods = result.detected_foods().len(), "scan stored");
        Ok(result)
    }

    pub async fn recognition(&self) -> RecognitionSnapshot {
        self.recognition.snapshot().await
    }
}
