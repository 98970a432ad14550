//! Per player-identity settings persistence.
//!
//! Grounded on the teacher's `AppConfig`/`AppConfigExt` (`confy`-backed,
//! profile-keyed) collapsed to the single-active-identity case spec §5 asks
//! for: "Persisted settings are read once per player-identity change;
//! writes are immediate."

use mapper_types::MapperSettings;

use crate::error::ConfigError;

#[derive(Debug, Default)]
pub struct SettingsStore {
    identity: Option<String>,
    settings: MapperSettings,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &MapperSettings {
        &self.settings
    }

    /// Reload from disk only if `identity` differs from the currently loaded
    /// one (or nothing has been loaded yet).
    pub fn ensure_identity(&mut self, identity: &str) {
        if self.identity.as_deref() == Some(identity) {
            return;
        }
        self.settings = confy::load("mapper", Some(identity)).unwrap_or_default();
        self.identity = Some(identity.to_string());
    }

    /// Mutate settings and write through immediately.
    pub fn update(&mut self, f: impl FnOnce(&mut MapperSettings)) -> Result<(), ConfigError> {
        f(&mut self.settings);
        if let Some(identity) = &self.identity {
            crate::error::save_settings(identity, &self.settings)?;
        }
        Ok(())
    }
}
