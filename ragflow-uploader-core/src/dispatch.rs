//! Batch dispatcher: sequential upload of the filtered files.
//!
//! Files are grouped into batches of at most `batch_size` and uploaded one at a
//! time, in order. A failed file is recorded and the next one is tried; nothing
//! is retried. The only thing that stops the loop early is the remote service
//! disappearing, detected as several consecutive "unavailable" errors.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::contract::{DatasetHandle, KnowledgeBase, NewDocument};
use crate::report::{ParseOutcome, UploadResult, UploadStatus};
use crate::scan::FileEntry;

/// Consecutive "unavailable" upload errors after which the remaining files are
/// not attempted.
pub const MAX_CONSECUTIVE_UNAVAILABLE: usize = 3;

/// Upload results plus, when the loop stopped early, why.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub results: Vec<UploadResult>,
    pub aborted: Option<String>,
}

/// Consecutive groups of at most `batch_size` files. The last may be smaller.
pub fn plan_batches(files: &[FileEntry], batch_size: usize) -> Vec<&[FileEntry]> {
    files.chunks(batch_size.max(1)).collect()
}

/// Upload `files` batch by batch.
pub async fn upload_batches<K>(
    kb: &K,
    dataset: &DatasetHandle,
    files: &[FileEntry],
    batch_size: usize,
) -> DispatchOutcome
where
    K: KnowledgeBase + ?Sized,
{
    let batches = plan_batches(files, batch_size);
    info!(
        files = files.len(),
        batches = batches.len(),
        batch_size,
        "Starting upload"
    );

    let mut outcome = DispatchOutcome::default();
    let mut consecutive_unavailable = 0usize;

    for (index, batch) in batches.iter().enumerate() {
        let batch_num = index + 1;
        let batch_start = Instant::now();
        info!(batch = batch_num, files = batch.len(), "Uploading batch");

        for file in batch.iter() {
            if let Some(reason) = &outcome.aborted {
                outcome
                    .results
                    .push(UploadResult::failed(file.clone(), format!("not attempted: {reason}")));
                continue;
            }

            let content = match tokio::fs::read(&file.path).await {
                Ok(content) => content,
                Err(e) => {
                    error!(file = %file.path.display(), error = %e, "Failed to read file");
                    outcome
                        .results
                        .push(UploadResult::failed(file.clone(), format!("read failed: {e}")));
                    continue;
                }
            };
            debug!(
                file = %file.name,
                size_mb = %format!("{:.2}", content.len() as f64 / (1024.0 * 1024.0)),
                "File ready"
            );

            let document = NewDocument {
                name: file.name.clone(),
                content,
            };
            match kb.upload_document(dataset, document).await {
                Ok(ack) => {
                    consecutive_unavailable = 0;
                    info!(file = %file.name, document_id = %ack.document_id, "Uploaded file");
                    outcome
                        .results
                        .push(UploadResult::success(file.clone(), ack.document_id));
                }
                Err(e) => {
                    error!(file = %file.name, error = %e, "Upload failed");
                    if e.is_unavailable() {
                        consecutive_unavailable += 1;
                    } else {
                        consecutive_unavailable = 0;
                    }
                    outcome
                        .results
                        .push(UploadResult::failed(file.clone(), e.to_string()));
                    if consecutive_unavailable >= MAX_CONSECUTIVE_UNAVAILABLE {
                        let reason = format!(
                            "remote service unavailable after {consecutive_unavailable} consecutive errors"
                        );
                        warn!(%reason, "Abandoning remaining uploads");
                        outcome.aborted = Some(reason);
                    }
                }
            }
        }

        let batch_results = &outcome.results[outcome.results.len() - batch.len()..];
        let ok = batch_results
            .iter()
            .filter(|r| r.status == UploadStatus::Success)
            .count();
        info!(
            batch = batch_num,
            succeeded = ok,
            failed = batch.len() - ok,
            elapsed_secs = %format!("{:.2}", batch_start.elapsed().as_secs_f64()),
            "Batch finished"
        );
    }

    outcome
}

/// Start server-side parsing of `document_ids`. Never fails the run.
pub async fn trigger_parse<K>(
    kb: &K,
    dataset: &DatasetHandle,
    document_ids: Vec<String>,
) -> ParseOutcome
where
    K: KnowledgeBase + ?Sized,
{
    if document_ids.is_empty() {
        info!("No uploaded documents to parse");
        return ParseOutcome::NothingToParse;
    }
    let documents = document_ids.len();
    info!(documents, "Starting document parsing");
    match kb.parse_documents(dataset, document_ids).await {
        Ok(()) => {
            info!(documents, "Document parsing started");
            ParseOutcome::Triggered { documents }
        }
        Err(e) => {
            error!(error = %e, "Failed to start document parsing");
            ParseOutcome::Failed {
                detail: e.to_string(),
            }
        }
    }
}
