//! External collaborators: upload, metadata lookup and byte fetching.
//!
//! The editor never talks to storage directly. It hands an exported blob to
//! an [`Uploader`] and hydrates itself from a [`MetadataSource`] plus a
//! [`SourceFetcher`]. Implementations live with the host application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{self, DecodeError};
use crate::encode::{ExportBlob, ExportError};
use crate::session::{EditorSession, LoadOutcome};

/// Pixel dimensions as reported by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A persisted image as returned by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub filename: String,
    /// Where the image bytes can be fetched from.
    pub path: String,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    pub category: String,
    #[serde(default)]
    pub dimensions: Dimensions,
}

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

/// Persists exported images.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(
        &self,
        blob: &ExportBlob,
        category: &str,
    ) -> Result<ImageRecord, CollaboratorError>;
}

/// Looks up stored image metadata by identifier.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_record(&self, id: &str) -> Result<ImageRecord, CollaboratorError>;
}

/// Fetches raw image bytes from a record's path.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, CollaboratorError>;
}

/// Why publishing failed. The session is unchanged in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("A category is required")]
    MissingCategory,

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Upload failed: {0}")]
    Upload(#[source] CollaboratorError),
}

/// Why hydrating a session failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HydrateError {
    #[error("Metadata lookup failed: {0}")]
    Metadata(#[source] CollaboratorError),

    #[error("Fetching source bytes failed: {0}")]
    Fetch(#[source] CollaboratorError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Export the session and upload the blob under `category`.
///
/// Only reads the session, so a failed upload can simply be retried.
pub async fn publish(
    session: &EditorSession,
    uploader: &dyn Uploader,
    category: &str,
) -> Result<ImageRecord, PublishError> {
    let category = category.trim();
    if category.is_empty() {
        return Err(PublishError::MissingCategory);
    }

    let blob = session.export()?;
    let record = uploader
        .upload(&blob, category)
        .await
        .map_err(|e| {
            log::warn!("upload to category '{}' failed: {}", category, e);
            PublishError::Upload(e)
        })?;

    log::info!(
        "published {} ({}x{}) to '{}'",
        record.id,
        record.dimensions.width,
        record.dimensions.height,
        record.category
    );
    Ok(record)
}

/// Load the image stored under `id` into the session.
///
/// The record is fetched first, then the bytes behind its path; nothing is
/// cached between calls. Uses a load ticket, so a newer load that finishes
/// first wins and this one comes back as [`LoadOutcome::Stale`].
pub async fn hydrate(
    session: &mut EditorSession,
    metadata: &dyn MetadataSource,
    fetcher: &dyn SourceFetcher,
    id: &str,
) -> Result<(ImageRecord, LoadOutcome), HydrateError> {
    let record = metadata
        .fetch_record(id)
        .await
        .map_err(HydrateError::Metadata)?;

    let ticket = session.begin_load();
    let bytes = match fetcher.fetch_bytes(&record.path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            session.abandon_load(ticket);
            return Err(HydrateError::Fetch(e));
        }
    };

    let config = session.config();
    let result = decode::load(&bytes, config.max_image_size, config.resize_filter);
    let outcome = session.finish_load(ticket, result)?;

    log::debug!("hydrated {} from {} ({:?})", record.id, record.path, outcome);
    Ok((record, outcome))
}
