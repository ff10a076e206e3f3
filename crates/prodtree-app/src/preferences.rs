//! Display preferences of the structure views and where they are kept.

use parking_lot::Mutex;
use prodtree_core::ItemId;
use prodtree_events::{ViewMode, ZoomLevel};
use prodtree_storage::Storage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Fixed key under which the structure table keeps its preferences.
pub const PREFERENCES_KEY: &str = "structure_table_settings";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPreferences {
    pub view_mode: ViewMode,
    pub zoom: ZoomLevel,
    pub expanded: Vec<ItemId>,
    pub show_today: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Table,
            zoom: ZoomLevel::Months,
            expanded: Vec::new(),
            show_today: true,
        }
    }
}

#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preferences are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Preferences storage error: {0}")]
    Storage(#[from] prodtree_storage::StorageError),
    #[error("No configuration directory available")]
    NoConfigDir,
}

/// Durable key-value home of [`DisplayPreferences`]. Read once at start-up,
/// written on every change.
pub trait PreferencesStore: Send + Sync {
    fn load(&self) -> Result<Option<DisplayPreferences>, PreferencesError>;
    fn save(&self, preferences: &DisplayPreferences) -> Result<(), PreferencesError>;
}

/// `<config dir>/prodtree/structure_table_settings.json`
pub struct JsonFilePreferences {
    path: PathBuf,
}

impl JsonFilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_config_dir() -> Result<Self, PreferencesError> {
        let config_dir = dirs::config_dir().ok_or(PreferencesError::NoConfigDir)?;
        Ok(Self::new(
            config_dir
                .join("prodtree")
                .join(format!("{PREFERENCES_KEY}.json")),
        ))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl PreferencesStore for JsonFilePreferences {
    fn load(&self) -> Result<Option<DisplayPreferences>, PreferencesError> {
        tracing::info!("Loading display preferences from {:?}", self.path);
        if !self.path.exists() {
            tracing::info!("Preferences file not found, using defaults");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, preferences: &DisplayPreferences) -> Result<(), PreferencesError> {
        if let Some(dir) = self.path.parent()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(preferences)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

/// Preferences kept in the item database's `setting` table.
pub struct SqlitePreferences {
    path: PathBuf,
}

impl SqlitePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferencesStore for SqlitePreferences {
    fn load(&self) -> Result<Option<DisplayPreferences>, PreferencesError> {
        let storage = Storage::open(&self.path)?;
        Ok(storage.get_setting_json(PREFERENCES_KEY)?)
    }

    fn save(&self, preferences: &DisplayPreferences) -> Result<(), PreferencesError> {
        let storage = Storage::open(&self.path)?;
        storage.set_setting_json(PREFERENCES_KEY, preferences)?;
        Ok(())
    }
}

/// Process-local store; also counts writes.
#[derive(Default)]
pub struct MemoryPreferences {
    inner: Mutex<(Option<DisplayPreferences>, usize)>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(preferences: DisplayPreferences) -> Self {
        Self {
            inner: Mutex::new((Some(preferences), 0)),
        }
    }

    pub fn current(&self) -> Option<DisplayPreferences> {
        self.inner.lock().0.clone()
    }

    pub fn save_count(&self) -> usize {
        self.inner.lock().1
    }
}

impl PreferencesStore for MemoryPreferences {
    fn load(&self) -> Result<Option<DisplayPreferences>, PreferencesError> {
        Ok(self.current())
    }

    fn save(&self, preferences: &DisplayPreferences) -> Result<(), PreferencesError> {
        let mut inner = self.inner.lock();
        inner.0 = Some(preferences.clone());
        inner.1 += 1;
        Ok(())
    }
}
