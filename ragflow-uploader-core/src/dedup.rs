//! Name-based dedup against the remote document listing.

use std::collections::HashSet;

use tracing::info;

use crate::scan::FileEntry;

/// Result of [`partition`]. Both sides keep the scan order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub to_upload: Vec<FileEntry>,
    pub skipped: Vec<FileEntry>,
}

/// Split `files` by whether their name already exists remotely.
///
/// Matching is exact and case-sensitive. With `skip_existing` off, nothing is
/// skipped.
pub fn partition(
    files: Vec<FileEntry>,
    remote_names: &HashSet<String>,
    skip_existing: bool,
) -> DedupOutcome {
    if !skip_existing {
        return DedupOutcome {
            to_upload: files,
            skipped: Vec::new(),
        };
    }

    let (skipped, to_upload): (Vec<_>, Vec<_>) = files
        .into_iter()
        .partition(|file| remote_names.contains(&file.name));
    for file in &skipped {
        info!(file = %file.name, "Skipping file already present in the knowledge base");
    }
    if !skipped.is_empty() {
        info!(
            skipped = skipped.len(),
            to_upload = to_upload.len(),
            "Dedup against remote documents complete"
        );
    }
    DedupOutcome { to_upload, skipped }
}
