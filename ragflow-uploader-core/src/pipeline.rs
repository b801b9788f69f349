//! High-level pipeline: resolve dataset → scan → dedup → upload → parse.
//!
//! This module ties the components together for one run against any
//! [`KnowledgeBase`] implementation. It is used by the CLI crate and by the
//! integration tests (with a mocked knowledge base).
//!
//! # Error Handling
//! Setup failures (dataset resolution, scanning, listing remote documents) are
//! returned as [`AppError`] and abort the run. Per-file upload failures and a
//! failed parse trigger are recorded in the returned [`RunSummary`] instead.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, warn};

use crate::config::EffectiveConfig;
use crate::contract::KnowledgeBase;
use crate::dedup;
use crate::dispatch;
use crate::error::AppError;
use crate::remote;
use crate::report::{ParseOutcome, RunSummary, UploadResult};
use crate::scan;

/// The subset of [`EffectiveConfig`] the pipeline acts on.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub dataset_name: String,
    pub directory: PathBuf,
    pub batch_size: usize,
    pub auto_parse: bool,
    pub skip_existing: bool,
    pub recursive: bool,
}

impl From<&EffectiveConfig> for UploadPlan {
    fn from(config: &EffectiveConfig) -> Self {
        Self {
            dataset_name: config.dataset_name.clone(),
            directory: config.directory.clone(),
            batch_size: config.batch_size.get(),
            auto_parse: config.auto_parse,
            skip_existing: config.skip_existing,
            recursive: config.recursive,
        }
    }
}

/// Upload every supported file of `plan.directory` into the dataset.
pub async fn upload_directory<K>(kb: &K, plan: &UploadPlan) -> Result<RunSummary, AppError>
where
    K: KnowledgeBase + ?Sized,
{
    let started = Instant::now();
    info!(
        dataset = %plan.dataset_name,
        directory = %plan.directory.display(),
        "Starting upload run"
    );

    let dataset = remote::resolve_or_create_dataset(kb, &plan.dataset_name).await?;

    let files = scan::scan_directory(&plan.directory, plan.recursive)?;
    let scanned = files.len();
    if files.is_empty() {
        warn!(directory = %plan.directory.display(), "No supported files found");
        return Ok(RunSummary {
            dataset,
            scanned,
            results: Vec::new(),
            parse: if plan.auto_parse {
                ParseOutcome::NothingToParse
            } else {
                ParseOutcome::NotRequested
            },
            aborted: None,
            elapsed: started.elapsed(),
        });
    }

    let remote_names = if plan.skip_existing {
        remote::list_document_names(kb, &dataset).await?
    } else {
        Default::default()
    };
    let split = dedup::partition(files, &remote_names, plan.skip_existing);
    if split.to_upload.is_empty() {
        info!("No new files to upload");
    }

    let dispatched = dispatch::upload_batches(kb, &dataset, &split.to_upload, plan.batch_size).await;

    let mut results: Vec<UploadResult> = split
        .skipped
        .into_iter()
        .map(UploadResult::skipped)
        .chain(dispatched.results)
        .collect();
    results.sort_by(|a, b| a.file.path.cmp(&b.file.path));

    let mut summary = RunSummary {
        dataset,
        scanned,
        results,
        parse: ParseOutcome::NotRequested,
        aborted: dispatched.aborted,
        elapsed: started.elapsed(),
    };

    summary.parse = if !plan.auto_parse {
        info!("Automatic parsing disabled");
        ParseOutcome::NotRequested
    } else if let Some(reason) = &summary.aborted {
        warn!(%reason, "Not starting parsing after an aborted upload");
        ParseOutcome::Failed {
            detail: format!("not attempted: {reason}"),
        }
    } else {
        dispatch::trigger_parse(kb, &summary.dataset, summary.uploaded_document_ids()).await
    };
    summary.elapsed = started.elapsed();

    info!(
        succeeded = summary.succeeded(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        elapsed_secs = %format!("{:.2}", summary.elapsed.as_secs_f64()),
        "Upload run complete"
    );
    Ok(summary)
}
