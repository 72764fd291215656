//! Auto-commit settings: the commit mode, summary model and message bound.
//!
//! Effective settings are layered as defaults <- settings file <- explicit
//! in-session updates. The file lives at
//! `<project>/.opencode/auto-commit.settings.yml`; a missing or unreadable
//! file simply contributes no overrides.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::SettingsError;

/// Settings file location relative to the project directory.
pub const SETTINGS_RELATIVE_PATH: &str = ".opencode/auto-commit.settings.yml";

/// Smallest accepted `maxCommitLength`.
pub const MIN_COMMIT_LENGTH: usize = 100;

pub const DEFAULT_MAX_COMMIT_LENGTH: usize = 10_000;

const KNOWN_KEYS: &[&str] = &["mode", "commitModel", "maxCommitLength"];

/// When automatic commits happen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Never commit.
    Disabled,
    /// Commit only inside a secondary worktree.
    #[default]
    Worktree,
    /// Commit in any checkout.
    Enabled,
}

impl CommitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitMode::Disabled => "disabled",
            CommitMode::Worktree => "worktree",
            CommitMode::Enabled => "enabled",
        }
    }
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective auto-commit settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCommitSettings {
    pub mode: CommitMode,
    /// Model for summary generation; `None` uses the generator's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_model: Option<String>,
    pub max_commit_length: usize,
}

impl Default for AutoCommitSettings {
    fn default() -> Self {
        Self {
            mode: CommitMode::default(),
            commit_model: None,
            max_commit_length: DEFAULT_MAX_COMMIT_LENGTH,
        }
    }
}

/// A partial settings update. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<CommitMode>,
    /// `Some(None)` (an explicit `null`) clears the model; `None` keeps it.
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit_model: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_commit_length: Option<usize>,
}

/// Tell an explicit `null` apart from an absent key: absent keys never reach
/// this function and stay at the `default` of `None`.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SettingsPatch {
    /// Parse and validate a patch supplied by a tool call.
    ///
    /// Unknown keys are rejected so a typo never silently does nothing.
    /// `null` is accepted as an empty patch.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, SettingsError> {
        if value.is_null() {
            return Ok(Self::default());
        }

        let Some(object) = value.as_object() else {
            return Err(SettingsError::InvalidPatch(format!(
                "expected an object, got {value}"
            )));
        };

        if let Some(key) = object.keys().find(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            return Err(SettingsError::UnknownKey(key.clone()));
        }

        let patch: SettingsPatch = serde_json::from_value(value.clone())
            .map_err(|e| SettingsError::InvalidPatch(e.to_string()))?;
        patch.validate()?;
        Ok(patch)
    }

    /// Parse and validate a patch from settings file contents.
    pub fn from_yaml(contents: &str) -> Result<Self, SettingsError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }

        let patch: SettingsPatch = serde_yaml::from_str(contents)
            .map_err(|e| SettingsError::InvalidPatch(e.to_string()))?;
        patch.validate()?;
        Ok(patch)
    }

    /// Check bounds that serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(value) = self.max_commit_length
            && value < MIN_COMMIT_LENGTH
        {
            return Err(SettingsError::MaxCommitLengthTooSmall {
                value,
                min: MIN_COMMIT_LENGTH,
            });
        }
        Ok(())
    }

    /// Overlay this patch on `base`.
    pub fn apply(&self, base: &AutoCommitSettings) -> AutoCommitSettings {
        AutoCommitSettings {
            mode: self.mode.unwrap_or(base.mode),
            commit_model: match &self.commit_model {
                Some(model) => model.clone(),
                None => base.commit_model.clone(),
            },
            max_commit_length: self.max_commit_length.unwrap_or(base.max_commit_length),
        }
    }
}

/// Path of the settings file for a project directory.
pub fn settings_path(project_dir: &Path) -> PathBuf {
    project_dir.join(SETTINGS_RELATIVE_PATH)
}

/// Read the file layer for a project.
///
/// Absence, read errors, parse errors and out-of-bounds values all yield an
/// empty patch; only the latter three are logged as warnings.
pub fn load_file_layer(project_dir: &Path) -> SettingsPatch {
    let path = settings_path(project_dir);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No settings file at {}, using defaults", path.display());
            return SettingsPatch::default();
        }
        Err(e) => {
            warn!("Cannot read {}: {}, using defaults", path.display(), e);
            return SettingsPatch::default();
        }
    };

    match SettingsPatch::from_yaml(&contents) {
        Ok(patch) => patch,
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            SettingsPatch::default()
        }
    }
}

/// In-memory settings for one project, seeded from the settings file.
#[derive(Debug)]
pub struct SettingsStore {
    project_dir: PathBuf,
    current: AutoCommitSettings,
}

impl SettingsStore {
    /// Load defaults <- file layer for `project_dir`.
    pub fn load(project_dir: impl Into<PathBuf>) -> Self {
        let project_dir = project_dir.into();
        let current = load_file_layer(&project_dir).apply(&AutoCommitSettings::default());
        Self {
            project_dir,
            current,
        }
    }

    /// Build a store with fixed settings, bypassing the file layer until the
    /// next `reset`.
    pub fn with_settings(project_dir: impl Into<PathBuf>, settings: AutoCommitSettings) -> Self {
        Self {
            project_dir: project_dir.into(),
            current: settings,
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn get(&self) -> AutoCommitSettings {
        self.current.clone()
    }

    /// Merge a validated patch into the live settings.
    pub fn set(&mut self, patch: &SettingsPatch) -> Result<AutoCommitSettings, SettingsError> {
        patch.validate()?;
        self.current = patch.apply(&self.current);
        Ok(self.get())
    }

    /// Re-read the settings file and drop all in-session updates.
    pub fn reset(&mut self) -> AutoCommitSettings {
        self.current = load_file_layer(&self.project_dir).apply(&AutoCommitSettings::default());
        self.get()
    }

    /// Write defaults <- `patch` to the settings file.
    ///
    /// The live settings are left untouched; call `reset` to pick the new
    /// file up.
    pub fn init(&self, patch: &SettingsPatch) -> Result<AutoCommitSettings, SettingsError> {
        patch.validate()?;
        let settings = patch.apply(&AutoCommitSettings::default());
        write_settings_file(&self.project_dir, &settings)?;
        Ok(settings)
    }
}

/// Atomically write `settings` as YAML to the project's settings file.
pub fn write_settings_file(
    project_dir: &Path,
    settings: &AutoCommitSettings,
) -> Result<PathBuf, SettingsError> {
    let path = settings_path(project_dir);
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| project_dir.to_path_buf());

    fs::create_dir_all(&dir).map_err(|source| SettingsError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;

    let yaml = serde_yaml::to_string(settings).map_err(SettingsError::Serialize)?;

    let write_err = |source: io::Error| SettingsError::Write {
        path: path.display().to_string(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(yaml.as_bytes()).map_err(write_err)?;
    tmp.persist(&path).map_err(|e| write_err(e.error))?;

    debug!("Wrote settings to {}", path.display());
    Ok(path)
}
