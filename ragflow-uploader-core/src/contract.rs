//! # contract: the seam between the upload pipeline and the remote knowledge base
//!
//! This module defines a single trait ([`KnowledgeBase`]) and the plain data types
//! that cross it. The pipeline only ever talks to the remote service through this
//! trait, so a real HTTP client and a test mock are interchangeable.
//!
//! ## Interface
//! - All methods are async and return a typed [`RemoteError`].
//! - Responses are validated once by the implementor and handed back as
//!   [`DatasetHandle`], [`RemoteDocument`] and [`UploadAck`]; nothing downstream
//!   inspects raw API payloads.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` (`MockKnowledgeBase`), exported outside
//!   this crate behind the `test-export-mocks` feature.

use async_trait::async_trait;
use thiserror::Error;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// A remote dataset (knowledge base) the run uploads into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    pub id: String,
    pub name: String,
}

/// Settings used when the dataset has to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDataset {
    pub name: String,
    pub description: String,
    /// Server-side chunking strategy, e.g. `naive`.
    pub chunk_method: String,
    /// Who can see the dataset, e.g. `me`.
    pub permission: String,
}

impl NewDataset {
    /// Default settings for a dataset created by this tool.
    pub fn with_defaults(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Knowledge base created by ragflow-uploader: {name}"),
            chunk_method: "naive".to_string(),
            permission: "me".to_string(),
        }
    }
}

/// Minimal projection of a document listed in a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDocument {
    pub id: String,
    pub name: String,
}

/// A document to upload: display name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub name: String,
    pub content: Vec<u8>,
}

/// Acknowledgement of an accepted upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAck {
    pub document_id: String,
    pub name: String,
}

#[derive(Error, Debug)]
pub enum RemoteError {
    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The server answered but reported an application-level failure.
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// The response did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// True when the error says nothing about the request itself, only that the
    /// service could not be reached or is failing.
    pub fn is_unavailable(&self) -> bool {
        match self {
            RemoteError::Transport(_) => true,
            RemoteError::Http { status, .. } => *status >= 500,
            RemoteError::Api { .. } | RemoteError::Decode(_) => false,
        }
    }
}

/// Operations the uploader needs from a remote knowledge-base service.
///
/// The implementor owns transport, authentication and response validation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// Look up a dataset by exact name. `Ok(None)` when it does not exist.
    async fn find_dataset(&self, name: &str) -> Result<Option<DatasetHandle>, RemoteError>;

    /// Create a dataset.
    async fn create_dataset(&self, req: NewDataset) -> Result<DatasetHandle, RemoteError>;

    /// One page (1-based) of the documents in a dataset.
    async fn list_documents(
        &self,
        dataset: &DatasetHandle,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<RemoteDocument>, RemoteError>;

    /// Upload a single document. No retries.
    async fn upload_document(
        &self,
        dataset: &DatasetHandle,
        document: NewDocument,
    ) -> Result<UploadAck, RemoteError>;

    /// Ask the service to start parsing the given documents. Returns once the
    /// request is accepted, not when parsing finishes.
    async fn parse_documents(
        &self,
        dataset: &DatasetHandle,
        document_ids: Vec<String>,
    ) -> Result<(), RemoteError>;
}
