use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::error::RecognitionError;
use crate::onboarding::Wizard;
use crate::scan::{FoodDetection, HttpRecognizer, ImageUpload, Nutrition, Recognizer, ScanResult};
use crate::session::Session;
use crate::store::{self, KeyValueStore, MemoryStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub session: Arc<Session>,
    pub recognizer: Arc<dyn Recognizer>,
    pub wizard: Arc<Mutex<Wizard>>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let store = store::connect(&config.store).await?;
        let recognizer = Arc::new(HttpRecognizer::from_config(&config.recognizer)?) as Arc<dyn Recognizer>;
        Ok(Self::from_parts(Arc::new(config), store, recognizer).await)
    }

    pub async fn from_parts(
        config: Arc<AppConfig>,
        store: Arc<dyn KeyValueStore>,
        recognizer: Arc<dyn Recognizer>,
    ) -> Self {
        let session = Session::load(store).await;
        let wizard = Wizard::start(&session).await.unwrap_or_else(Wizard::finished);
        Self {
            config,
            session: Arc::new(session),
            recognizer,
            wizard: Arc::new(Mutex::new(wizard)),
        }
    }

    /// In-memory state with a recognizer that always sees one bowl of dal.
    pub async fn fake() -> anyhow::Result<Self> {
        #[derive(Clone)]
        struct FakeRecognizer;
        #[async_trait]
        impl Recognizer for FakeRecognizer {
            async fn recognize(
                &self,
                image: ImageUpload,
                _user_id: &str,
            ) -> Result<ScanResult, RecognitionError> {
                image.check()?;
                Ok(ScanResult::from_detections(
                    vec![FoodDetection {
                        food_id: Some("dal".into()),
                        food_name: "Dal".into(),
                        confidence: 0.9,
                        estimated_grams: 200.0,
                        nutrition: Nutrition {
                            calories: 230.0,
                            protein_g: 18.0,
                            carbs_g: 40.0,
                            fat_g: 1.0,
                            fiber_g: 15.6,
                            ..Default::default()
                        },
                        portion_explanation: Some("One medium bowl".into()),
                    }],
                    vec![],
                    Some("Dal 200g".into()),
                ))
            }
        }

        let config = AppConfig::from_lookup(|k| (k == "STORE_BACKEND").then(|| "memory".into()))?;
        let store = Arc::new(MemoryStore::default()) as Arc<dyn KeyValueStore>;
        let recognizer = Arc::new(FakeRecognizer) as Arc<dyn Recognizer>;
        Ok(Self::from_parts(Arc::new(config), store, recognizer).await)
    }
}
