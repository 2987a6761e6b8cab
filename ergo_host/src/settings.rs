//! `SettingsStore` implementations standing in for EEPROM/NVS persistence.

use std::path::PathBuf;

use ergo_traits::SettingsStore;

/// Persists the settings TOML text to a plain file on disk.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&mut self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn save(&mut self, toml_text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml_text)?;
        Ok(())
    }
}

/// Validates a settings payload against [`ergo_config::Config`] before it is
/// handed to a [`SettingsStore`], mirroring the check a real NVS write would
/// want to perform before committing bytes that a reboot would then trust.
pub fn validate_before_save(toml_text: &str) -> eyre::Result<()> {
    ergo_config::load_toml(toml_text).map(|_| ())
}

/// In-memory store for tests and for a first run with no persisted settings.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    contents: Option<String>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&mut self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        self.contents
            .clone()
            .ok_or_else(|| "no settings persisted yet".into())
    }

    fn save(&mut self, toml_text: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.contents = Some(toml_text.to_string());
        Ok(())
    }
}
