//! Decode and export off the calling task.
//!
//! Decoding and encoding are CPU-bound, so they run on tokio's blocking
//! pool. Everything else about a session stays synchronous.
//!
//! Several loads may be in flight at once; apply them with
//! [`EditorSession::finish_load`] in whatever order they complete and the
//! newest one wins:
//!
//! ```ignore
//! let first = session.start_load(bytes_a);
//! let second = session.start_load(bytes_b);
//!
//! let (ticket, result) = second.join().await;
//! session.finish_load(ticket, result)?;   // Applied
//! let (ticket, result) = first.join().await;
//! session.finish_load(ticket, result)?;   // Stale, dropped
//! ```

use tokio::task::JoinHandle;

use crate::decode::{self, DecodeError, FilterType, SourceImage};
use crate::encode::{self, ExportBlob, ExportError};
use crate::session::{EditorSession, LoadOutcome, LoadTicket};

/// Decode bytes on the blocking pool.
pub async fn decode_in_background(
    bytes: Vec<u8>,
    max_size: u32,
    filter: FilterType,
) -> Result<SourceImage, DecodeError> {
    tokio::task::spawn_blocking(move || decode::load(&bytes, max_size, filter))
        .await
        .map_err(|e| {
            log::warn!("decode task failed: {}", e);
            DecodeError::Cancelled
        })?
}

/// A decode running on the blocking pool, tied to a load ticket.
#[derive(Debug)]
pub struct PendingLoad {
    ticket: LoadTicket,
    task: JoinHandle<Result<SourceImage, DecodeError>>,
}

impl PendingLoad {
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    /// Wait for the decode. Pass the pair to
    /// [`EditorSession::finish_load`].
    pub async fn join(self) -> (LoadTicket, Result<SourceImage, DecodeError>) {
        let result = match self.task.await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("decode task for load {} failed: {}", self.ticket.generation(), e);
                Err(DecodeError::Cancelled)
            }
        };
        (self.ticket, result)
    }

    /// Abort the decode. The session stays busy until the ticket is
    /// finished with the result of [`join`](Self::join) or given back with
    /// [`EditorSession::abandon_load`].
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl EditorSession {
    /// Issue a load ticket and start decoding `bytes` on the blocking pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_load(&mut self, bytes: Vec<u8>) -> PendingLoad {
        let ticket = self.begin_load();
        let max_size = self.config().max_image_size;
        let filter = self.config().resize_filter;
        let task = tokio::task::spawn_blocking(move || decode::load(&bytes, max_size, filter));
        PendingLoad { ticket, task }
    }

    /// Decode `bytes` on the blocking pool and apply the result.
    ///
    /// Holding `&mut self` across the decode serializes it with every other
    /// edit; use [`start_load`](Self::start_load) for overlapping loads.
    pub async fn load_async(&mut self, bytes: Vec<u8>) -> Result<LoadOutcome, DecodeError> {
        let (ticket, result) = self.start_load(bytes).join().await;
        self.finish_load(ticket, result)
    }

    /// Bake the pending rotation, then encode on the blocking pool.
    ///
    /// The session stays borrowed until the blob is ready, so it cannot be
    /// edited while an export is outstanding.
    pub async fn export_async(&self) -> Result<ExportBlob, ExportError> {
        let raster = self.export_raster()?;
        let format = self.config().export_format;

        let blob = tokio::task::spawn_blocking(move || encode::encode(&raster, format))
            .await
            .map_err(|e| {
                log::warn!("export task failed: {}", e);
                ExportError::Cancelled
            })??;

        log::info!(
            "exported {}x{} {} ({} bytes)",
            blob.width,
            blob.height,
            blob.mime_type(),
            blob.len()
        );
        Ok(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::test_support::png_bytes;
    use crate::EditorConfig;

    #[tokio::test]
    async fn test_decode_in_background() {
        let source = decode_in_background(png_bytes(64, 32), 1000, FilterType::Bilinear)
            .await
            .unwrap();
        assert_eq!(source.dimensions(), (64, 32));
    }

    #[tokio::test]
    async fn test_decode_in_background_error() {
        let result = decode_in_background(b"nope".to_vec(), 1000, FilterType::Bilinear).await;
        assert_eq!(result, Err(DecodeError::InvalidFormat));
    }

    #[tokio::test]
    async fn test_load_async_applies() {
        let mut session = EditorSession::default();
        let outcome = session.load_async(png_bytes(120, 80)).await;

        assert_eq!(outcome, Ok(LoadOutcome::Applied));
        assert_eq!(session.dimensions(), (120, 80));
    }

    #[tokio::test]
    async fn test_overlapping_loads_last_wins() {
        let mut session = EditorSession::default();
        let first = session.start_load(png_bytes(300, 200));
        let second = session.start_load(png_bytes(40, 30));
        assert!(session.is_busy());

        let (ticket, result) = second.join().await;
        assert_eq!(session.finish_load(ticket, result), Ok(LoadOutcome::Applied));
        assert!(session.is_busy());

        let (ticket, result) = first.join().await;
        assert_eq!(session.finish_load(ticket, result), Ok(LoadOutcome::Stale));
        assert!(!session.is_busy());
        assert_eq!(session.dimensions(), (40, 30));
    }

    #[tokio::test]
    async fn test_aborted_load_reports_cancelled() {
        let mut session = EditorSession::default();
        session.load_async(png_bytes(10, 10)).await.unwrap();

        let pending = session.start_load(png_bytes(500, 500));
        pending.abort();
        let (ticket, result) = pending.join().await;

        // Abort may lose the race with a decode that already finished
        match session.finish_load(ticket, result) {
            Err(DecodeError::Cancelled) => assert_eq!(session.dimensions(), (10, 10)),
            Ok(LoadOutcome::Applied) => assert_eq!(session.dimensions(), (500, 500)),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_dropped_pending_load_can_be_abandoned() {
        let mut session = EditorSession::default();
        session.load_async(png_bytes(10, 10)).await.unwrap();

        let pending = session.start_load(png_bytes(20, 20));
        let ticket = pending.ticket();
        pending.abort();
        drop(pending);
        assert!(session.is_busy());

        session.abandon_load(ticket);
        assert!(!session.is_busy());
        assert_eq!(session.dimensions(), (10, 10));
    }

    #[tokio::test]
    async fn test_export_async_matches_sync_export() {
        let mut session = EditorSession::new(EditorConfig::default());
        session.load_async(png_bytes(50, 40)).await.unwrap();
        session.set_rotation(30.0);

        let blob = session.export_async().await.unwrap();
        assert_eq!(Ok(blob), session.export());
    }

    #[tokio::test]
    async fn test_export_async_without_image() {
        let session = EditorSession::default();
        assert_eq!(session.export_async().await, Err(ExportError::NoImage));
    }
}
