//! The byte pump that moves a transfer from its upload body to its
//! download body, emitting progress on the status channel as it goes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::channel::Channel;
use crate::session::status::StatusMessage;
use crate::utils::error::{RelayError, Result};

use super::{DownloadSink, UploadBody};

const CHUNK_SIZE: usize = 262_144;
const PROGRESS_CADENCE: Duration = Duration::from_millis(500);
const STATUS_BACKLOG_CAP: usize = 60;

/// Stream exactly `size` bytes from `upload` to `download`, reporting
/// progress on `status` no more than once per `PROGRESS_CADENCE`.
pub async fn run(
    mut upload: UploadBody,
    download: DownloadSink,
    status: Arc<Channel<StatusMessage>>,
    size: u64,
    cancel: CancellationToken,
) -> Result<()> {
    status.try_put(StatusMessage::Start);

    let mut done: u64 = 0;
    let mut pending = size;
    let mut last_progress: Option<Instant> = None;
    let mut buf = vec![0u8; CHUNK_SIZE.min(size as usize).max(1)];

    while pending > 0 {
        let want = (CHUNK_SIZE as u64).min(pending) as usize;
        let slice = &mut buf[..want];

        tokio::select! {
            _ = cancel.cancelled() => {
                return Err(RelayError::CopyFailure("session cancelled".into()));
            }
            res = upload.read_exact(slice) => {
                res.map_err(|e| RelayError::CopyFailure(format!("upload read failed: {e}")))?;
            }
        }

        download
            .send(Ok(Bytes::copy_from_slice(slice)))
            .await
            .map_err(|_| RelayError::CopyFailure("downloader disconnected".into()))?;

        done += want as u64;
        pending -= want as u64;

        let now = Instant::now();
        let should_emit = match last_progress {
            None => true,
            Some(t) => now.duration_since(t) >= PROGRESS_CADENCE,
        };
        if should_emit {
            if status.pending() > STATUS_BACKLOG_CAP {
                return Err(RelayError::SlowStatus);
            }
            status.try_put(StatusMessage::Progress { done, size });
            last_progress = Some(now);
        }
    }

    status.try_put(StatusMessage::Done);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tokio::sync::mpsc;

    fn cursor_upload(data: Vec<u8>) -> UploadBody {
        Box::new(Cursor::new(data))
    }

    #[tokio::test]
    async fn copies_exact_bytes_and_emits_start_then_done() {
        let data = b"hello world".to_vec();
        let size = data.len() as u64;
        let (tx, mut rx) = mpsc::channel::<std::io::Result<Bytes>>(8);
        let status = Arc::new(Channel::new());
        let cancel = CancellationToken::new();

        let result = run(cursor_upload(data.clone()), tx, status.clone(), size, cancel).await;
        assert!(result.is_ok());

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(received, data);

        assert!(matches!(status.get_nowait().unwrap(), StatusMessage::Start));
        let mut saw_done = false;
        loop {
            match status.get_nowait() {
                Ok(StatusMessage::Done) => {
                    saw_done = true;
                    break;
                }
                Ok(_) => continue,
                Err(_) => break,
            }
        }
        assert!(saw_done);
    }

    #[tokio::test]
    async fn short_upload_read_is_fatal() {
        let (tx, _rx) = mpsc::channel::<std::io::Result<Bytes>>(8);
        let status = Arc::new(Channel::new());
        let cancel = CancellationToken::new();

        // Declare a size larger than the data actually available.
        let result = run(cursor_upload(b"short".to_vec()), tx, status, 10, cancel).await;
        assert!(matches!(result, Err(RelayError::CopyFailure(_))));
    }

    #[tokio::test]
    async fn downloader_disconnect_fails_copy() {
        let (tx, rx) = mpsc::channel::<std::io::Result<Bytes>>(1);
        drop(rx);
        let status = Arc::new(Channel::new());
        let cancel = CancellationToken::new();

        let result = run(cursor_upload(vec![0u8; 10]), tx, status, 10, cancel).await;
        assert!(matches!(result, Err(RelayError::CopyFailure(_))));
    }

    #[tokio::test]
    async fn cancellation_aborts_copy_loop() {
        // A duplex stream whose write half is never written to blocks any read
        // forever, guaranteeing the cancellation branch of the loop's `select!`
        // is the one that resolves.
        let (read_half, _write_guard) = tokio::io::duplex(64);
        let upload: UploadBody = Box::new(read_half);
        let (tx, mut rx) = mpsc::channel::<std::io::Result<Bytes>>(1);
        let status = Arc::new(Channel::new());
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        let handle = tokio::spawn(run(upload, tx, status, 10, cancel));
        tokio::task::yield_now().await;
        cancel_clone.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(RelayError::CopyFailure(_))));
        let _ = rx.try_recv();
    }

    #[tokio::test]
    async fn slow_status_consumer_triggers_slow_status_error() {
        let (tx, mut rx) = mpsc::channel::<std::io::Result<Bytes>>(4);
        let status = Arc::new(Channel::new());
        for _ in 0..=STATUS_BACKLOG_CAP {
            status.put(StatusMessage::Progress { done: 0, size: 0 }).unwrap();
        }
        let cancel = CancellationToken::new();

        let result = run(cursor_upload(vec![0u8; 10]), tx, status, 10, cancel).await;
        assert!(matches!(result, Err(RelayError::SlowStatus)));
        let _ = rx.try_recv();
    }
}
