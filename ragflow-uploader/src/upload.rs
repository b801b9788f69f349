#![doc = "RAGFlow HTTP client: the real KnowledgeBase implementation used by the CLI."]
//
//! # RAGFlow client (CLI <-> Core)
//!
//! [`RagflowClient`] implements the core [`KnowledgeBase`] trait against the
//! RAGFlow HTTP API (`/api/v1`). All transport, authentication and response
//! validation live here; the core only ever sees typed handles and
//! [`RemoteError`]s.
//!
//! Every RAGFlow reply is an envelope `{"code": 0, "message": ..., "data": ...}`.
//! A non-zero `code` is an application error even on HTTP 200.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use ragflow_uploader_core::contract::{
    DatasetHandle, KnowledgeBase, NewDataset, NewDocument, RemoteDocument, RemoteError, UploadAck,
};

/// Per-request timeout, large enough for a sizeable document upload.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

pub struct RagflowClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl RagflowClient {
    /// `base_url` is the server root, e.g. `http://localhost:9380`.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("ragflow-uploader/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        let api_base = format!("{}/api/v1", base_url.trim_end_matches('/'));
        tracing::info!(api_base = %api_base, "Initialized RAGFlow client");
        Ok(Self {
            http,
            api_base,
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Send an authenticated request and unwrap the reply envelope.
    async fn call(&self, request: RequestBuilder) -> Result<Option<Value>, RemoteError> {
        let response = request
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        tracing::debug!(status, bytes = body.len(), "Received response");
        decode_envelope(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DatasetDto {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DocumentDto {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DocumentPage {
    #[serde(default)]
    docs: Vec<DocumentDto>,
}

#[derive(Debug, Serialize)]
struct CreateDatasetBody<'a> {
    name: &'a str,
    description: &'a str,
    chunk_method: &'a str,
    permission: &'a str,
}

#[derive(Debug, Serialize)]
struct ParseBody<'a> {
    document_ids: &'a [String],
}

fn transport_error(e: reqwest::Error) -> RemoteError {
    let mut detail = e.to_string();
    let mut source = std::error::Error::source(&e);
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    RemoteError::Transport(detail)
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut short: String = body.chars().take(MAX_ERROR_BODY).collect();
    short.push_str("...");
    short
}

/// Check the HTTP status and the envelope code, returning the `data` member.
fn decode_envelope(status: u16, body: &str) -> Result<Option<Value>, RemoteError> {
    if !(200..300).contains(&status) {
        return Err(RemoteError::Http {
            status,
            body: truncate(body),
        });
    }
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| RemoteError::Decode(format!("{e} in {:?}", truncate(body))))?;
    if envelope.code != 0 {
        return Err(RemoteError::Api {
            code: envelope.code,
            message: envelope
                .message
                .unwrap_or_else(|| "no message".to_string()),
        });
    }
    Ok(envelope.data)
}

fn decode_data<T: DeserializeOwned>(data: Option<Value>) -> Result<T, RemoteError> {
    let data = data.ok_or_else(|| RemoteError::Decode("missing data".to_string()))?;
    serde_json::from_value(data).map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl KnowledgeBase for RagflowClient {
    async fn find_dataset(&self, name: &str) -> Result<Option<DatasetHandle>, RemoteError> {
        tracing::debug!(dataset = name, "Looking up dataset");
        let request = self.http.get(self.url("/datasets")).query(&[("name", name)]);
        let data = self.call(request).await?;
        let datasets: Vec<DatasetDto> = match data {
            None | Some(Value::Null) => Vec::new(),
            data => decode_data(data)?,
        };
        Ok(datasets
            .into_iter()
            .find(|d| d.name == name)
            .map(|d| DatasetHandle {
                id: d.id,
                name: d.name,
            }))
    }

    async fn create_dataset(&self, req: NewDataset) -> Result<DatasetHandle, RemoteError> {
        tracing::debug!(dataset = %req.name, chunk_method = %req.chunk_method, "Creating dataset");
        let body = CreateDatasetBody {
            name: &req.name,
            description: &req.description,
            chunk_method: &req.chunk_method,
            permission: &req.permission,
        };
        let request = self.http.post(self.url("/datasets")).json(&body);
        let dataset: DatasetDto = decode_data(self.call(request).await?)?;
        Ok(DatasetHandle {
            id: dataset.id,
            name: dataset.name,
        })
    }

    async fn list_documents(
        &self,
        dataset: &DatasetHandle,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<RemoteDocument>, RemoteError> {
        let request = self
            .http
            .get(self.url(&format!("/datasets/{}/documents", dataset.id)))
            .query(&[("page", page), ("page_size", page_size)]);
        let page: DocumentPage = decode_data(self.call(request).await?)?;
        Ok(page
            .docs
            .into_iter()
            .map(|d| RemoteDocument {
                id: d.id,
                name: d.name,
            })
            .collect())
    }

    async fn upload_document(
        &self,
        dataset: &DatasetHandle,
        document: NewDocument,
    ) -> Result<UploadAck, RemoteError> {
        tracing::debug!(
            dataset_id = %dataset.id,
            file = %document.name,
            bytes = document.content.len(),
            "Uploading document"
        );
        let part = Part::bytes(document.content).file_name(document.name.clone());
        let form = Form::new().part("file", part);
        let request = self
            .http
            .post(self.url(&format!("/datasets/{}/documents", dataset.id)))
            .multipart(form);
        let uploaded: Vec<DocumentDto> = decode_data(self.call(request).await?)?;
        let first = uploaded.into_iter().next().ok_or_else(|| {
            RemoteError::Decode(format!("no document returned for {}", document.name))
        })?;
        Ok(UploadAck {
            document_id: first.id,
            name: first.name,
        })
    }

    async fn parse_documents(
        &self,
        dataset: &DatasetHandle,
        document_ids: Vec<String>,
    ) -> Result<(), RemoteError> {
        let body = ParseBody {
            document_ids: &document_ids,
        };
        let request = self
            .http
            .post(self.url(&format!("/datasets/{}/chunks", dataset.id)))
            .json(&body);
        self.call(request).await?;
        Ok(())
    }
}
