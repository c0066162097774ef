//! Settings Service
//!
//! Saves, restores and resets the calculator's input snapshot through a
//! [`SettingsStore`]. Restoring never fails: unreadable data falls back to
//! defaults with a warning.

use crate::error::Result;
use crate::services::SettingsStore;
use crate::types::TradeInputs;
use std::sync::Arc;
use tracing::{info, warn};

/// Default key the snapshot is stored under.
pub const DEFAULT_SETTINGS_KEY: &str = "calculator_settings";

/// Persistence front for the calculator inputs.
#[derive(Clone)]
pub struct SettingsService {
    store: Arc<dyn SettingsStore>,
    key: String,
}

impl SettingsService {
    pub fn new(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Persist the inputs as a flat JSON record.
    pub fn save(&self, inputs: &TradeInputs) -> Result<()> {
        let body = serde_json::to_string_pretty(&inputs.to_snapshot())?;
        self.store.save(&self.key, &body)?;
        info!("Saved calculator settings under '{}'", self.key);
        Ok(())
    }

    /// Restore saved inputs, or defaults when nothing usable is stored.
    pub fn load(&self) -> TradeInputs {
        let raw = match self.store.load(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return TradeInputs::default(),
            Err(e) => {
                warn!("Failed to load saved settings: {}", e);
                return TradeInputs::default();
            }
        };

        TradeInputs::from_snapshot_str(&raw).unwrap_or_else(|| {
            warn!("Saved settings under '{}' are not a JSON object; using defaults", self.key);
            TradeInputs::default()
        })
    }

    /// Whether a snapshot is currently stored.
    pub fn has_saved(&self) -> bool {
        matches!(self.store.load(&self.key), Ok(Some(_)))
    }

    /// Drop the saved snapshot and hand back the defaults.
    pub fn reset(&self) -> Result<TradeInputs> {
        self.store.remove(&self.key)?;
        info!("Reset calculator settings");
        Ok(TradeInputs::default())
    }
}
