use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use futures::{SinkExt, StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::session::copy;
use crate::session::slot::{slot, SlotReceiver, SlotSender};
use crate::session::status::StatusMessage;
use crate::session::types::{FileDescriptor, SessionId};
use crate::utils::error::{RelayError, Result};

const RENDEZVOUS_TIMEOUT: Duration = Duration::from_secs(5);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

pub(crate) type UploadBody = Box<dyn AsyncRead + Unpin + Send>;
pub(crate) type DownloadSink = mpsc::Sender<std::io::Result<Bytes>>;
type StatusChannel = Arc<Channel<StatusMessage>>;

/// The per-transfer coordinator: rendezvouses the status, upload, and
/// download connections, runs the copy loop, and tears down on completion.
pub struct Session {
    pub id: SessionId,
    pub file: FileDescriptor,

    status_tx: SlotSender<StatusChannel>,
    status_rx: SlotReceiver<StatusChannel>,
    upload_tx: SlotSender<UploadBody>,
    upload_rx: SlotReceiver<UploadBody>,
    download_tx: SlotSender<DownloadSink>,
    download_rx: SlotReceiver<DownloadSink>,

    timed_out: AtomicBool,
    /// Fired by the WebSocket reader on a close/error frame; observed by
    /// the copy loop to abort promptly.
    cancel_requested: CancellationToken,
    /// Fired exactly once by the session task on every exit path.
    done: CancellationToken,
}

impl Session {
    /// Construct a session and spawn its background task.
    pub fn spawn(id: SessionId, file: FileDescriptor) -> Arc<Self> {
        let (status_tx, status_rx) = slot();
        let (upload_tx, upload_rx) = slot();
        let (download_tx, download_rx) = slot();

        let session = Arc::new(Self {
            id,
            file,
            status_tx,
            status_rx,
            upload_tx,
            upload_rx,
            download_tx,
            download_rx,
            timed_out: AtomicBool::new(false),
            cancel_requested: CancellationToken::new(),
            done: CancellationToken::new(),
        });

        let task_handle = session.clone();
        tokio::spawn(async move { task_handle.run().await });

        session
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out.load(Ordering::SeqCst)
    }

    /// Resolves once the session task has terminated, for any reason.
    pub async fn wait_done(&self) {
        self.done.clone().cancelled_owned().await;
    }

    fn mark_timed_out(&self) {
        self.timed_out.store(true, Ordering::SeqCst);
    }

    async fn run(self: Arc<Self>) {
        let rendezvous = tokio::select! {
            _ = self.cancel_requested.cancelled() => {
                debug!(session_id = self.id, "session cancelled during status/upload rendezvous");
                self.done.cancel();
                return;
            }
            result = timeout(RENDEZVOUS_TIMEOUT, async {
                tokio::join!(self.status_rx.recv(), self.upload_rx.recv())
            }) => result,
        };

        let (status, upload) = match rendezvous {
            Ok((Some(status), Some(upload))) => (status, upload),
            _ => {
                debug!(session_id = self.id, "status/upload rendezvous timed out");
                self.mark_timed_out();
                self.done.cancel();
                return;
            }
        };

        let download = tokio::select! {
            _ = self.cancel_requested.cancelled() => {
                debug!(session_id = self.id, "session cancelled during download rendezvous");
                status.try_put(StatusMessage::Error);
                status.close();
                self.done.cancel();
                return;
            }
            result = timeout(DOWNLOAD_TIMEOUT, self.download_rx.recv()) => {
                match result {
                    Ok(Some(download)) => download,
                    _ => {
                        debug!(session_id = self.id, "download rendezvous timed out");
                        self.mark_timed_out();
                        status.try_put(StatusMessage::Timeout);
                        status.close();
                        self.done.cancel();
                        return;
                    }
                }
            }
        };

        let result = copy::run(
            upload,
            download,
            status.clone(),
            self.file.size,
            self.cancel_requested.clone(),
        )
        .await;

        if let Err(err) = result {
            warn!(session_id = self.id, error = %err, "copy loop failed");
            status.try_put(StatusMessage::Error);
        }

        status.close();
        self.done.cancel();
    }

    /// `GET /api/status?id=N` — upgrades to a WebSocket carrying status events.
    pub fn status_response(self: &Arc<Self>, ws: WebSocketUpgrade) -> Result<Response> {
        if self.status_tx.is_filled() || self.timed_out() {
            return Err(RelayError::NotFound);
        }
        let channel: StatusChannel = Arc::new(Channel::new());
        if !self.status_tx.fill(channel.clone()) {
            return Err(RelayError::NotFound);
        }

        let session = self.clone();
        Ok(ws.on_upgrade(move |socket| async move {
            session.run_status_socket(socket, channel).await;
        }))
    }

    async fn run_status_socket(self: Arc<Self>, socket: WebSocket, channel: StatusChannel) {
        // Closing the channel once the session ends unblocks the writer loop
        // below even if no terminal status message was ever produced.
        let closer_channel = channel.clone();
        let closer_done = self.done.clone();
        tokio::spawn(async move {
            closer_done.cancelled_owned().await;
            closer_channel.close();
        });

        let (mut sink, mut stream) = socket.split();
        let local_cancel = CancellationToken::new();

        let writer = {
            let channel = channel.clone();
            let local_cancel = local_cancel.clone();
            async move {
                tokio::select! {
                    _ = local_cancel.cancelled() => {}
                    _ = async {
                        loop {
                            match channel.get().await {
                                Ok(msg) => {
                                    let text = serde_json::to_string(&msg).unwrap_or_default();
                                    if sink.send(Message::Text(text.into())).await.is_err() {
                                        break;
                                    }
                                }
                                Err(_) => break,
                            }
                        }
                    } => {}
                }
                let _ = sink.close().await;
                local_cancel.cancel();
            }
        };

        let reader = {
            let cancel_requested = self.cancel_requested.clone();
            let local_cancel = local_cancel.clone();
            async move {
                tokio::select! {
                    _ = local_cancel.cancelled() => {}
                    _ = async {
                        while let Some(msg) = stream.next().await {
                            match msg {
                                Ok(Message::Close(_)) => {
                                    cancel_requested.cancel();
                                    break;
                                }
                                Ok(Message::Text(_)) => break,
                                Err(_) => {
                                    cancel_requested.cancel();
                                    break;
                                }
                                _ => continue,
                            }
                        }
                    } => {}
                }
                local_cancel.cancel();
            }
        };

        tokio::join!(writer, reader);
    }

    /// `POST /u/{id}` — streams the uploader's request body into the copy loop.
    pub async fn upload_response(self: &Arc<Self>, request: Request<Body>) -> Result<&'static str> {
        if self.upload_tx.is_filled() || self.timed_out() {
            return Err(RelayError::NotFound);
        }

        let stream = request
            .into_body()
            .into_data_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let reader: UploadBody = Box::new(StreamReader::new(stream));

        if !self.upload_tx.fill(reader) {
            return Err(RelayError::NotFound);
        }

        self.wait_done().await;
        Ok("Ok")
    }

    /// `GET /d/{id}` — returns a streaming response fed by the copy loop.
    pub fn download_response(self: &Arc<Self>) -> Result<Response> {
        if self.download_tx.is_filled() || self.timed_out() {
            return Err(RelayError::NotFound);
        }

        let (tx, rx) = mpsc::channel::<std::io::Result<Bytes>>(4);
        if !self.download_tx.fill(tx) {
            return Err(RelayError::NotFound);
        }

        let body = Body::from_stream(ReceiverStream::new(rx));
        let disposition = format!("attachment; filename=\"{}\"", self.file.name);

        Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(header::CONTENT_LENGTH, self.file.size)
            .header(header::CONTENT_DISPOSITION, disposition)
            .header(header::CONNECTION, "close")
            .body(body)
            .expect("static headers are always valid"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn file(size: u64) -> FileDescriptor {
        FileDescriptor::new("test.bin", size, "application/octet-stream")
    }

    fn cursor_upload(data: Vec<u8>) -> UploadBody {
        Box::new(Cursor::new(data))
    }

    #[tokio::test(start_paused = true)]
    async fn rendezvous_timeout_marks_session_timed_out() {
        let session = Session::spawn(1, file(10));
        session.wait_done().await;
        assert!(session.timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn download_timeout_emits_timeout_status_and_closes_channel() {
        let session = Session::spawn(2, file(10));

        let channel: StatusChannel = Arc::new(Channel::new());
        assert!(session.status_tx.fill(channel.clone()));
        assert!(session.upload_tx.fill(cursor_upload(vec![0u8; 10])));

        session.wait_done().await;

        assert!(session.timed_out());
        assert!(matches!(channel.get_nowait().unwrap(), StatusMessage::Timeout));
        assert!(channel.closed());
    }

    #[tokio::test]
    async fn cancellation_before_status_upload_rendezvous_ends_session_untimed_out() {
        let session = Session::spawn(3, file(10));
        session.cancel_requested.cancel();
        session.wait_done().await;
        assert!(!session.timed_out());
    }

    #[tokio::test]
    async fn cancellation_during_download_rendezvous_emits_error_and_closes_status() {
        let session = Session::spawn(4, file(10));

        let channel: StatusChannel = Arc::new(Channel::new());
        assert!(session.status_tx.fill(channel.clone()));
        assert!(session.upload_tx.fill(cursor_upload(vec![0u8; 10])));

        // Let the background task clear the status/upload rendezvous and start
        // waiting on the download slot before requesting cancellation.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        session.cancel_requested.cancel();
        session.wait_done().await;

        assert!(!session.timed_out());
        assert!(matches!(channel.get_nowait().unwrap(), StatusMessage::Error));
        assert!(channel.closed());
    }

    #[tokio::test]
    async fn happy_path_copies_bytes_and_emits_start_then_done() {
        let session = Session::spawn(5, file(11));

        let channel: StatusChannel = Arc::new(Channel::new());
        assert!(session.status_tx.fill(channel.clone()));
        assert!(session.upload_tx.fill(cursor_upload(b"hello world".to_vec())));

        let (tx, mut rx) = mpsc::channel::<std::io::Result<Bytes>>(4);
        assert!(session.download_tx.fill(tx));

        session.wait_done().await;
        assert!(!session.timed_out());

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(received, b"hello world");

        let mut saw_start = false;
        let mut saw_done = false;
        loop {
            match channel.get_nowait() {
                Ok(StatusMessage::Start) => saw_start = true,
                Ok(StatusMessage::Done) => {
                    saw_done = true;
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        assert!(saw_start);
        assert!(saw_done);
        assert!(channel.closed());
    }

    #[tokio::test]
    async fn second_slot_fill_is_rejected() {
        let session = Session::spawn(6, file(10));
        assert!(session.upload_tx.fill(cursor_upload(vec![0u8; 10])));
        assert!(!session.upload_tx.fill(cursor_upload(vec![1u8; 10])));
    }
}
