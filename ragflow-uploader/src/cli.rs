/// # ragflow-uploader CLI Interface (Module)
///
/// Command parsing and orchestration for the `ragflow-uploader` binary.
///
/// All upload logic (config resolution, scanning, dedup, batching, the run
/// summary) lives in [`ragflow-uploader-core`]. This module only maps flags onto
/// core types, wires the real HTTP client and prompter, and sets up logging.
///
/// ## How To Use
/// - From the shell: `ragflow-uploader --dataset_name manuals --directory ./docs`.
/// - Programmatically: build a [`Cli`] and call [`run`].
///
/// [`ragflow-uploader-core`]: ../../ragflow-uploader-core/
use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ragflow_uploader_core::config::{resolve, ConfigOverrides, EffectiveConfig, Prompter};
use ragflow_uploader_core::pipeline::{upload_directory, UploadPlan};
use ragflow_uploader_core::report::RunSummary;

use crate::load_config::{load_settings, SettingsSource};
use crate::logging::init_logging;
use crate::prompt::LinePrompter;
use crate::upload::RagflowClient;

/// Batch-upload a directory of documents into a RAGFlow knowledge base.
#[derive(Parser, Debug, Default)]
#[clap(
    name = "ragflow-uploader",
    version,
    about = "Batch-upload a directory of documents into a RAGFlow knowledge base"
)]
pub struct Cli {
    /// RAGFlow API key (overrides RAGFLOW_API_KEY in the settings file)
    #[clap(long = "api_key")]
    pub api_key: Option<String>,

    /// RAGFlow server URL, e.g. http://localhost:9380
    #[clap(long = "base_url")]
    pub base_url: Option<String>,

    /// Knowledge base to upload into; created when missing
    #[clap(long = "dataset_name")]
    pub dataset_name: Option<String>,

    /// Directory containing the documents
    #[clap(long)]
    pub directory: Option<PathBuf>,

    /// Files per batch (default 5)
    #[clap(long = "batch_size")]
    pub batch_size: Option<NonZeroUsize>,

    /// Do not start parsing after upload
    #[clap(long = "no_parse")]
    pub no_parse: bool,

    /// Skip files whose name already exists in the knowledge base
    #[clap(long = "skip_existing")]
    pub skip_existing: bool,

    /// Log file path (default upload_YYYYMMDD_HHMMSS.log)
    #[clap(long = "log_file")]
    pub log_file: Option<PathBuf>,

    /// Prompt for connection and target settings even when they are known
    #[clap(short, long, conflicts_with = "non_interactive")]
    pub interactive: bool,

    /// Never prompt, not even for dataset_name and directory; fail when a
    /// required setting is missing
    #[clap(long = "non_interactive")]
    pub non_interactive: bool,

    /// Include files in subdirectories
    #[clap(long)]
    pub recursive: bool,

    /// Settings file in KEY=value form (default ./.env when present)
    #[clap(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The command-line layer of configuration. Absent switches stay `None` so
    /// the settings file can supply them.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            dataset_name: self.dataset_name.clone(),
            directory: self.directory.clone(),
            batch_size: self.batch_size,
            auto_parse: self.no_parse.then_some(false),
            skip_existing: self.skip_existing.then_some(true),
            recursive: self.recursive,
            log_file: self.log_file.clone(),
            interactive: self.interactive,
            non_interactive: self.non_interactive,
        }
    }
}

/// Resolve the effective configuration from flags, the settings file and `prompter`.
pub fn resolve_config(
    cli: &Cli,
    prompter: &mut dyn Prompter,
) -> Result<(EffectiveConfig, SettingsSource)> {
    let (persisted, source) = load_settings(cli.config.as_deref())?;
    let config = resolve(cli.overrides(), persisted, prompter)?;
    Ok((config, source))
}

/// Full run: configuration, logging, upload. Used by `main`.
pub async fn run(cli: Cli) -> Result<RunSummary> {
    let mut prompter = LinePrompter::stdio();
    let (config, source) = resolve_config(&cli, &mut prompter)?;

    init_logging(&config.log_file)?;
    match &source {
        SettingsSource::File(path) => {
            tracing::info!(settings_file = %path.display(), "Loaded persisted settings")
        }
        SettingsSource::None => tracing::info!("No settings file found"),
    }
    config.trace_loaded();

    let client = RagflowClient::new(&config.base_url, &config.api_key)
        .context("Failed to build HTTP client")?;
    let summary = upload_directory(&client, &UploadPlan::from(&config)).await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn unset_switches_defer_to_the_settings_file() {
        let cli = Cli::parse_from(["ragflow-uploader", "--dataset_name", "kb"]);
        let overrides = cli.overrides();
        assert_eq!(overrides.dataset_name.as_deref(), Some("kb"));
        assert_eq!(overrides.auto_parse, None);
        assert_eq!(overrides.skip_existing, None);
        assert_eq!(overrides.batch_size, None);
    }

    #[test]
    fn switches_map_onto_overrides() {
        let cli = Cli::parse_from([
            "ragflow-uploader",
            "--no_parse",
            "--skip_existing",
            "--batch_size",
            "3",
            "-i",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.auto_parse, Some(false));
        assert_eq!(overrides.skip_existing, Some(true));
        assert_eq!(overrides.batch_size.map(NonZeroUsize::get), Some(3));
        assert!(overrides.interactive);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(Cli::try_parse_from(["ragflow-uploader", "--batch_size", "0"]).is_err());
    }

    #[test]
    fn interactive_modes_conflict() {
        let parsed = Cli::try_parse_from(["ragflow-uploader", "-i", "--non_interactive"]);
        assert!(parsed.is_err());
    }
}
