use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::services::ServiceError;
use crate::settings::{Settings, SettingsStore};

/// Shared settings document, loaded once and replaced whole on save
#[derive(Clone)]
pub struct SettingsService {
    store: SettingsStore,
    current: Arc<RwLock<Settings>>,
}

impl SettingsService {
    pub fn load(store: SettingsStore) -> Result<Self, ServiceError> {
        let settings = store.load_or_init()?;
        Ok(Self {
            store,
            current: Arc::new(RwLock::new(settings)),
        })
    }

    pub async fn get(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Validate, persist, then swap in the new document
    #[instrument(skip(self, settings))]
    pub async fn update(&self, settings: Settings) -> Result<Settings, ServiceError> {
        if settings.default_city.trim().is_empty() {
            return Err(ServiceError::Validation("default_city must not be empty".to_string()));
        }
        if settings.average_box_price < 0.0 {
            return Err(ServiceError::Validation(
                "average_box_price must not be negative".to_string(),
            ));
        }

        let mut current = self.current.write().await;
        self.store.save(&settings)?;
        *current = settings.clone();
        info!("Settings updated (city={})", settings.default_city);
        Ok(settings)
    }
}
