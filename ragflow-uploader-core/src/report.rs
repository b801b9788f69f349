//! Per-file outcomes and the run summary.

use std::fmt;
use std::time::Duration;

use crate::contract::DatasetHandle;
use crate::scan::FileEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Success,
    Skipped,
    Failed,
}

/// What happened to one scanned file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub file: FileEntry,
    pub status: UploadStatus,
    /// Remote id, for successful uploads.
    pub document_id: Option<String>,
    pub error_detail: Option<String>,
}

impl UploadResult {
    pub fn success(file: FileEntry, document_id: String) -> Self {
        Self {
            file,
            status: UploadStatus::Success,
            document_id: Some(document_id),
            error_detail: None,
        }
    }

    pub fn skipped(file: FileEntry) -> Self {
        Self {
            file,
            status: UploadStatus::Skipped,
            document_id: None,
            error_detail: None,
        }
    }

    pub fn failed(file: FileEntry, detail: impl Into<String>) -> Self {
        Self {
            file,
            status: UploadStatus::Failed,
            document_id: None,
            error_detail: Some(detail.into()),
        }
    }
}

/// Whether and how server-side parsing was started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Auto-parse was disabled.
    NotRequested,
    /// Auto-parse was enabled but no document was uploaded.
    NothingToParse,
    Triggered { documents: usize },
    Failed { detail: String },
}

/// Aggregate of one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub dataset: DatasetHandle,
    /// Supported files found by the scanner.
    pub scanned: usize,
    /// One entry per scanned file, ordered by path.
    pub results: Vec<UploadResult>,
    pub parse: ParseOutcome,
    /// Set when the remaining uploads were abandoned because the service went away.
    pub aborted: Option<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn count(&self, status: UploadStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(UploadStatus::Success)
    }

    pub fn skipped(&self) -> usize {
        self.count(UploadStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(UploadStatus::Failed)
    }

    /// Files that were handed to the dispatcher.
    pub fn attempted(&self) -> usize {
        self.results.len() - self.skipped()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Ids of every successfully uploaded document, in result order.
    pub fn uploaded_document_ids(&self) -> Vec<String> {
        self.results
            .iter()
            .filter_map(|r| r.document_id.clone())
            .collect()
    }

    fn results_with(&self, status: UploadStatus) -> impl Iterator<Item = &UploadResult> {
        self.results.iter().filter(move |r| r.status == status)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(50);
        let secs = self.elapsed.as_secs_f64();
        writeln!(f, "{rule}")?;
        writeln!(f, "Upload summary for {} ({})", self.dataset.name, self.dataset.id)?;
        writeln!(f, "Files found:      {}", self.scanned)?;
        writeln!(f, "Skipped existing: {}", self.skipped())?;
        writeln!(f, "Attempted:        {}", self.attempted())?;
        writeln!(f, "Succeeded:        {}", self.succeeded())?;
        writeln!(f, "Failed:           {}", self.failed())?;
        writeln!(f, "Elapsed:          {secs:.2}s")?;
        if self.attempted() > 0 {
            writeln!(
                f,
                "Average per file: {:.2}s",
                secs / self.attempted() as f64
            )?;
        }
        match &self.parse {
            ParseOutcome::NotRequested => writeln!(f, "Parsing:          not requested")?,
            ParseOutcome::NothingToParse => writeln!(f, "Parsing:          nothing to parse")?,
            ParseOutcome::Triggered { documents } => {
                writeln!(f, "Parsing:          started for {documents} document(s)")?
            }
            ParseOutcome::Failed { detail } => {
                writeln!(f, "Parsing:          failed to start ({detail})")?
            }
        }
        if let Some(reason) = &self.aborted {
            writeln!(f, "Aborted:          {reason}")?;
        }
        if self.has_failures() {
            writeln!(f, "Failed files:")?;
            for r in self.results_with(UploadStatus::Failed) {
                writeln!(
                    f,
                    "  - {} ({})",
                    r.file.path.display(),
                    r.error_detail.as_deref().unwrap_or("unknown error")
                )?;
            }
        }
        if self.skipped() > 0 {
            writeln!(f, "Skipped files:")?;
            for r in self.results_with(UploadStatus::Skipped) {
                writeln!(f, "  - {}", r.file.path.display())?;
            }
        }
        write!(f, "{rule}")
    }
}
