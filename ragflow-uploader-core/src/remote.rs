//! Dataset resolution and document listing on top of [`KnowledgeBase`].

use std::collections::HashSet;

use tracing::{debug, error, info, warn};

use crate::contract::{DatasetHandle, KnowledgeBase, NewDataset};
use crate::error::AppError;

/// Documents requested per listing page.
pub const LIST_PAGE_SIZE: usize = 50;

/// Upper bound on listing pages, against a server that never returns a short page.
pub const MAX_LIST_PAGES: usize = 1000;

/// Find the dataset called `name`, creating it with default settings if absent.
///
/// A failed lookup is not fatal on its own: the create call decides.
pub async fn resolve_or_create_dataset<K>(kb: &K, name: &str) -> Result<DatasetHandle, AppError>
where
    K: KnowledgeBase + ?Sized,
{
    info!(dataset = name, "Resolving dataset");
    match kb.find_dataset(name).await {
        Ok(Some(dataset)) => {
            info!(dataset = %dataset.name, id = %dataset.id, "Found existing dataset");
            return Ok(dataset);
        }
        Ok(None) => info!(dataset = name, "Dataset not found, creating it"),
        Err(e) => warn!(dataset = name, error = %e, "Dataset lookup failed, trying to create it"),
    }

    match kb.create_dataset(NewDataset::with_defaults(name)).await {
        Ok(dataset) => {
            info!(dataset = %dataset.name, id = %dataset.id, "Created dataset");
            Ok(dataset)
        }
        Err(e) => {
            error!(dataset = name, error = %e, "Failed to create dataset");
            Err(AppError::RemoteUnavailable(format!(
                "could not create dataset {name:?}: {e}"
            )))
        }
    }
}

/// Snapshot of every document name in `dataset`.
pub async fn list_document_names<K>(
    kb: &K,
    dataset: &DatasetHandle,
) -> Result<HashSet<String>, AppError>
where
    K: KnowledgeBase + ?Sized,
{
    info!(dataset = %dataset.name, "Listing existing documents");
    let mut names = HashSet::new();

    for page in 1..=MAX_LIST_PAGES {
        debug!(page, page_size = LIST_PAGE_SIZE, "Fetching document page");
        let documents = kb
            .list_documents(dataset, page, LIST_PAGE_SIZE)
            .await
            .map_err(|e| {
                error!(dataset = %dataset.name, page, error = %e, "Failed to list documents");
                AppError::RemoteUnavailable(format!(
                    "could not list documents of {:?}: {e}",
                    dataset.name
                ))
            })?;
        let count = documents.len();
        for doc in documents {
            debug!(name = %doc.name, id = %doc.id, "Existing document");
            names.insert(doc.name);
        }
        if count < LIST_PAGE_SIZE {
            info!(documents = names.len(), "Fetched existing documents");
            return Ok(names);
        }
        if page == MAX_LIST_PAGES {
            warn!(
                max_pages = MAX_LIST_PAGES,
                "Document listing page limit reached, stopping"
            );
        }
    }

    info!(documents = names.len(), "Fetched existing documents");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{MockKnowledgeBase, RemoteDocument, RemoteError};
    use mockall::predicate::eq;

    fn handle() -> DatasetHandle {
        DatasetHandle {
            id: "ds-1".into(),
            name: "manuals".into(),
        }
    }

    fn page_of(start: usize, len: usize) -> Vec<RemoteDocument> {
        (start..start + len)
            .map(|i| RemoteDocument {
                id: format!("doc-{i}"),
                name: format!("file-{i}.txt"),
            })
            .collect()
    }

    #[tokio::test]
    async fn existing_dataset_is_reused() {
        let mut kb = MockKnowledgeBase::new();
        kb.expect_find_dataset()
            .withf(|name| name == "manuals")
            .return_once(|_| Ok(Some(handle())));
        kb.expect_create_dataset().never();

        let dataset = resolve_or_create_dataset(&kb, "manuals").await.unwrap();
        assert_eq!(dataset, handle());
    }

    #[tokio::test]
    async fn lookup_error_falls_through_to_create() {
        let mut kb = MockKnowledgeBase::new();
        kb.expect_find_dataset().return_once(|_| {
            Err(RemoteError::Api {
                code: 102,
                message: "You don't own the dataset".into(),
            })
        });
        kb.expect_create_dataset()
            .withf(|req| req.name == "manuals" && req.chunk_method == "naive")
            .return_once(|_| Ok(handle()));

        let dataset = resolve_or_create_dataset(&kb, "manuals").await.unwrap();
        assert_eq!(dataset.id, "ds-1");
    }

    #[tokio::test]
    async fn create_failure_is_remote_unavailable() {
        let mut kb = MockKnowledgeBase::new();
        kb.expect_find_dataset().return_once(|_| Ok(None));
        kb.expect_create_dataset()
            .return_once(|_| Err(RemoteError::Transport("connection refused".into())));

        let err = resolve_or_create_dataset(&kb, "manuals").await.unwrap_err();
        assert!(matches!(err, AppError::RemoteUnavailable(_)));
    }

    #[tokio::test]
    async fn listing_pages_until_a_short_page() {
        let mut kb = MockKnowledgeBase::new();
        kb.expect_list_documents()
            .with(eq(handle()), eq(1), eq(LIST_PAGE_SIZE))
            .return_once(|_, _, _| Ok(page_of(0, LIST_PAGE_SIZE)));
        kb.expect_list_documents()
            .with(eq(handle()), eq(2), eq(LIST_PAGE_SIZE))
            .return_once(|_, _, _| Ok(page_of(LIST_PAGE_SIZE, 3)));

        let names = list_document_names(&kb, &handle()).await.unwrap();
        assert_eq!(names.len(), LIST_PAGE_SIZE + 3);
        assert!(names.contains("file-52.txt"));
    }

    #[tokio::test]
    async fn empty_dataset_lists_nothing() {
        let mut kb = MockKnowledgeBase::new();
        kb.expect_list_documents()
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let names = list_document_names(&kb, &handle()).await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let mut kb = MockKnowledgeBase::new();
        kb.expect_list_documents()
            .return_once(|_, _, _| Err(RemoteError::Transport("timed out".into())));

        let err = list_document_names(&kb, &handle()).await.unwrap_err();
        assert!(matches!(err, AppError::RemoteUnavailable(_)));
    }
}
