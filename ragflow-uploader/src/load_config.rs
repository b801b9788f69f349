/// `load_config` module: reads the persisted `KEY=value` settings file into
/// [`PersistedSettings`].
///
/// The file uses dotenv syntax (comments, quoting, `export` prefixes). It is parsed
/// with `dotenvy` without touching the process environment, so the file is the
/// only persisted source and environment variables never leak into a run.
///
/// # Errors
/// All errors use `anyhow::Error` with the file path in context and are surfaced
/// at the CLI boundary.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ragflow_uploader_core::config::PersistedSettings;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_SETTINGS_FILE: &str = ".env";

/// Where settings were read from, for logging once tracing is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    File(PathBuf),
    /// No explicit file and no default file present.
    None,
}

/// Load settings from `explicit`, or from [`DEFAULT_SETTINGS_FILE`] when it exists.
///
/// An explicitly named file must exist; a missing default file is not an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<(PersistedSettings, SettingsSource)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_SETTINGS_FILE);
            if !default.is_file() {
                return Ok((PersistedSettings::default(), SettingsSource::None));
            }
            default
        }
    };
    let settings = load_settings_file(&path)?;
    Ok((settings, SettingsSource::File(path)))
}

/// Parse one settings file.
pub fn load_settings_file(path: &Path) -> Result<PersistedSettings> {
    let pairs = dotenvy::from_path_iter(path)
        .with_context(|| format!("Failed to open settings file {}", path.display()))?
        .collect::<std::result::Result<Vec<(String, String)>, _>>()
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    PersistedSettings::from_pairs(pairs)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}
