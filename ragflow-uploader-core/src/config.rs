//! Configuration resolution.
//!
//! Three sources feed one [`EffectiveConfig`], in this priority order:
//! command-line overrides, the persisted key/value settings file, interactive
//! prompts. Everything else has a documented default.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::AppError;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

pub const KEY_API_KEY: &str = "RAGFLOW_API_KEY";
pub const KEY_BASE_URL: &str = "RAGFLOW_BASE_URL";
pub const KEY_BATCH_SIZE: &str = "BATCH_SIZE";
pub const KEY_AUTO_PARSE: &str = "AUTO_PARSE";
pub const KEY_SKIP_EXISTING: &str = "SKIP_EXISTING";
pub const KEY_LOG_FILE: &str = "LOG_FILE";

/// The fields that can be asked for interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    ApiKey,
    BaseUrl,
    DatasetName,
    Directory,
}

impl ConfigField {
    /// The command-line flag that supplies this field.
    pub fn flag(&self) -> &'static str {
        match self {
            ConfigField::ApiKey => "--api_key",
            ConfigField::BaseUrl => "--base_url",
            ConfigField::DatasetName => "--dataset_name",
            ConfigField::Directory => "--directory",
        }
    }

    /// Human prompt label.
    pub fn label(&self) -> &'static str {
        match self {
            ConfigField::ApiKey => "RAGFlow API key",
            ConfigField::BaseUrl => "RAGFlow server URL (e.g. http://localhost:9380)",
            ConfigField::DatasetName => "Knowledge base name (created if missing)",
            ConfigField::Directory => "Directory to upload",
        }
    }

    /// Whether the value must not be echoed back (e.g. as a prompt default).
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigField::ApiKey)
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConfigField::ApiKey => "api_key",
            ConfigField::BaseUrl => "base_url",
            ConfigField::DatasetName => "dataset_name",
            ConfigField::Directory => "directory",
        };
        f.write_str(name)
    }
}

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub api_key: String,
    pub base_url: String,
    pub dataset_name: String,
    pub directory: PathBuf,
    pub batch_size: NonZeroUsize,
    pub auto_parse: bool,
    pub skip_existing: bool,
    pub recursive: bool,
    pub log_file: PathBuf,
}

impl EffectiveConfig {
    pub fn trace_loaded(&self) {
        info!(
            api_key = %mask_secret(&self.api_key),
            base_url = %self.base_url,
            dataset_name = %self.dataset_name,
            directory = %self.directory.display(),
            batch_size = self.batch_size.get(),
            auto_parse = self.auto_parse,
            skip_existing = self.skip_existing,
            recursive = self.recursive,
            log_file = %self.log_file.display(),
            "Loaded configuration"
        );
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub dataset_name: Option<String>,
    pub directory: Option<PathBuf>,
    pub batch_size: Option<NonZeroUsize>,
    /// `Some(false)` when `--no_parse` was given.
    pub auto_parse: Option<bool>,
    /// `Some(true)` when `--skip_existing` was given.
    pub skip_existing: Option<bool>,
    pub recursive: bool,
    pub log_file: Option<PathBuf>,
    /// Prompt for the four prompt-eligible fields even when a value exists.
    pub interactive: bool,
    /// Never prompt; a missing required field is an error.
    pub non_interactive: bool,
}

/// Typed view of the persisted key/value settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub batch_size: Option<NonZeroUsize>,
    pub auto_parse: Option<bool>,
    pub skip_existing: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl PersistedSettings {
    /// Build from raw key/value pairs. Unknown keys are ignored; the last
    /// occurrence of a key wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut settings = PersistedSettings::default();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value: String = value.into();
            match key {
                KEY_API_KEY => settings.api_key = non_blank(Some(value)),
                KEY_BASE_URL => settings.base_url = non_blank(Some(value)),
                KEY_BATCH_SIZE => settings.batch_size = Some(parse_batch_size(key, &value)?),
                KEY_AUTO_PARSE => settings.auto_parse = Some(parse_bool(key, &value)?),
                KEY_SKIP_EXISTING => settings.skip_existing = Some(parse_bool(key, &value)?),
                KEY_LOG_FILE => settings.log_file = non_blank(Some(value)).map(PathBuf::from),
                other => debug!(key = other, "Ignoring unrecognised settings key"),
            }
        }
        Ok(settings)
    }
}

/// Source of interactive answers.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Prompter {
    /// Ask for `field`. `current` is the value that will be kept on a blank
    /// answer. Returns `None` for a blank answer.
    fn prompt(
        &mut self,
        field: ConfigField,
        current: Option<String>,
    ) -> Result<Option<String>, AppError>;
}

/// Merge the three sources into an [`EffectiveConfig`].
pub fn resolve(
    cli: ConfigOverrides,
    persisted: PersistedSettings,
    prompter: &mut dyn Prompter,
) -> Result<EffectiveConfig, AppError> {
    let mode = PromptMode::from(&cli);

    let api_key = require(
        ConfigField::ApiKey,
        non_blank(cli.api_key).or(persisted.api_key),
        mode,
        prompter,
    )?;
    let base_url = require(
        ConfigField::BaseUrl,
        non_blank(cli.base_url).or(persisted.base_url),
        mode,
        prompter,
    )?;
    let base_url = base_url.trim_end_matches('/').to_string();
    let dataset_name = require(
        ConfigField::DatasetName,
        non_blank(cli.dataset_name),
        mode,
        prompter,
    )?;
    let directory = require(
        ConfigField::Directory,
        non_blank(cli.directory.map(|p| p.to_string_lossy().into_owned())),
        mode,
        prompter,
    )?;

    let batch_size = cli
        .batch_size
        .or(persisted.batch_size)
        .unwrap_or(DEFAULT_BATCH_SIZE);
    let auto_parse = cli.auto_parse.or(persisted.auto_parse).unwrap_or(true);
    let skip_existing = cli.skip_existing.or(persisted.skip_existing).unwrap_or(false);
    let log_file = cli
        .log_file
        .or(persisted.log_file)
        .unwrap_or_else(|| default_log_file(chrono::Local::now().naive_local()));

    Ok(EffectiveConfig {
        api_key,
        base_url,
        dataset_name,
        directory: PathBuf::from(directory),
        batch_size,
        auto_parse,
        skip_existing,
        recursive: cli.recursive,
        log_file,
    })
}

/// `upload_YYYYMMDD_HHMMSS.log` for the given local time.
pub fn default_log_file(at: chrono::NaiveDateTime) -> PathBuf {
    PathBuf::from(format!("upload_{}.log", at.format("%Y%m%d_%H%M%S")))
}

/// Keep the last four characters of a secret, star the rest.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptMode {
    Forced,
    WhenMissing,
    Never,
}

impl From<&ConfigOverrides> for PromptMode {
    fn from(cli: &ConfigOverrides) -> Self {
        if cli.non_interactive {
            PromptMode::Never
        } else if cli.interactive {
            PromptMode::Forced
        } else {
            PromptMode::WhenMissing
        }
    }
}

fn require(
    field: ConfigField,
    current: Option<String>,
    mode: PromptMode,
    prompter: &mut dyn Prompter,
) -> Result<String, AppError> {
    let value = match (mode, current) {
        (PromptMode::Forced, current) => {
            let answer = non_blank(prompter.prompt(field, current.clone())?);
            answer.or(current)
        }
        (_, Some(value)) => Some(value),
        (PromptMode::WhenMissing, None) => non_blank(prompter.prompt(field, None)?),
        (PromptMode::Never, None) => None,
    };
    match value {
        Some(value) => {
            debug!(%field, "Configuration field resolved");
            Ok(value)
        }
        None => Err(AppError::MissingConfiguration { field }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true/false".to_string(),
        }),
    }
}

fn parse_batch_size(key: &str, value: &str) -> Result<NonZeroUsize, AppError> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map_err(|e| AppError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
            reason: format!("expected a positive integer ({e})"),
        })
}
