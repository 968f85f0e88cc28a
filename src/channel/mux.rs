// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Type-multiplexed duplex channel.
//!
//! One background task reads NDJSON lines from the transport and routes each
//! message into a FIFO queue keyed by its `type`. Consumers wait on the queue
//! for the type they care about, so a `confirmation` reply never lands in the
//! hands of whoever is waiting for `stop`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::{ChannelError, ChannelResult};
use super::protocol::{decode, encode, TypedMessage};
use super::transport::{BoxedReader, BoxedWriter, ChannelIo};

type QueueReceiver = Arc<Mutex<mpsc::UnboundedReceiver<TypedMessage>>>;

/// Per-type FIFO queue.
struct Queue {
    tx: mpsc::UnboundedSender<TypedMessage>,
    rx: QueueReceiver,
}

impl Queue {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }
}

type Queues = Arc<Mutex<HashMap<String, Queue>>>;

/// Receive loop lifecycle.
struct LoopState {
    /// Read half, present until `start` hands it to the loop.
    reader: Option<BoxedReader>,
    /// Handle of the running receive loop.
    handle: Option<JoinHandle<()>>,
}

/// Duplex channel that demultiplexes inbound messages by type.
pub struct Channel {
    /// Identifier used in log output.
    id: String,
    /// Write half of the transport.
    writer: Mutex<BoxedWriter>,
    /// Lazily created per-type queues.
    queues: Queues,
    /// Receive loop state.
    state: Mutex<LoopState>,
    /// Cancelled when the channel shuts down for any reason.
    shutdown: CancellationToken,
    /// Wait bound applied by [`Channel::receive`].
    reply_timeout: Option<Duration>,
}

impl Channel {
    /// Create a channel over a bidirectional stream.
    pub fn new<S>(stream: S) -> Self
    where
        S: ChannelIo + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        Self::from_parts(Box::new(read_half), Box::new(write_half))
    }

    /// Create a channel from separate read and write halves.
    pub fn from_parts(reader: BoxedReader, writer: BoxedWriter) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            writer: Mutex::new(writer),
            queues: Arc::new(Mutex::new(HashMap::new())),
            state: Mutex::new(LoopState {
                reader: Some(reader),
                handle: None,
            }),
            shutdown: CancellationToken::new(),
            reply_timeout: None,
        }
    }

    /// Bound every [`Channel::receive`] by `timeout` (`None` waits forever).
    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout
    }

    /// Whether shutdown has been signalled.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Token cancelled when the channel shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Start the background receive loop. Calling it again is a no-op.
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        let Some(reader) = state.reader.take() else {
            debug!(channel = %self.id, "Receive loop already started");
            return;
        };

        let queues = Arc::clone(&self.queues);
        let shutdown = self.shutdown.clone();
        let id = self.id.clone();

        state.handle = Some(tokio::spawn(async move {
            receive_loop(id, reader, queues, shutdown).await;
        }));
        debug!(channel = %self.id, "Receive loop started");
    }

    /// Send a message of the given type.
    ///
    /// A transport failure shuts the channel down before the error is returned.
    pub async fn send(&self, kind: impl AsRef<str>, content: impl Into<Value>) -> ChannelResult<()> {
        self.send_message(&TypedMessage::new(kind, content)).await
    }

    /// Send a fully built message.
    pub async fn send_message(&self, message: &TypedMessage) -> ChannelResult<()> {
        let line = encode(message)?;
        let mut writer = self.writer.lock().await;

        let result = async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            error!(channel = %self.id, kind = %message.kind, "Failed to send message: {}", e);
            self.shutdown.cancel();
            return Err(ChannelError::WriteFailed(e.to_string()));
        }

        debug!(channel = %self.id, kind = %message.kind, "Sent message");
        Ok(())
    }

    /// Wait for the next message of the given type, bounded by the reply timeout.
    pub async fn receive(&self, kind: impl AsRef<str>) -> ChannelResult<TypedMessage> {
        self.receive_timeout(kind, self.reply_timeout).await
    }

    /// Wait for the next message of the given type with an explicit bound.
    ///
    /// Messages already queued are delivered even after shutdown; an empty
    /// queue on a closed channel yields [`ChannelError::Closed`].
    pub async fn receive_timeout(
        &self,
        kind: impl AsRef<str>,
        timeout: Option<Duration>,
    ) -> ChannelResult<TypedMessage> {
        let kind = kind.as_ref();
        let rx = self.queue(kind).await;
        let mut rx = rx.lock().await;

        if let Ok(message) = rx.try_recv() {
            return Ok(message);
        }
        if self.shutdown.is_cancelled() {
            return Err(ChannelError::Closed);
        }

        let wait = async {
            tokio::select! {
                biased;
                message = rx.recv() => message.ok_or(ChannelError::Closed),
                _ = self.shutdown.cancelled() => Err(ChannelError::Closed),
            }
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| ChannelError::Timeout(kind.to_string()))?,
            None => wait.await,
        }
    }

    /// Signal the receive loop to end and wait for it.
    pub async fn stop(&self) {
        self.shutdown.cancel();
        let handle = self.state.lock().await.handle.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(channel = %self.id, "Receive loop ended abnormally: {}", e);
            }
            debug!(channel = %self.id, "Receive loop stopped");
        }
    }

    async fn queue(&self, kind: &str) -> QueueReceiver {
        let mut queues = self.queues.lock().await;
        let queue = queues.entry(kind.to_string()).or_insert_with(Queue::new);
        Arc::clone(&queue.rx)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn route(queues: &Queues, message: TypedMessage) {
    let mut queues = queues.lock().await;
    let queue = queues
        .entry(message.kind.clone())
        .or_insert_with(Queue::new);
    // The receiver lives in the same map entry, so the send cannot fail.
    let _ = queue.tx.send(message);
}

async fn receive_loop(
    id: String,
    reader: BoxedReader,
    queues: Queues,
    shutdown: CancellationToken,
) {
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!(channel = %id, "Receive loop cancelled");
                break;
            }
            result = reader.read_line(&mut line) => {
                match result {
                    Ok(0) => {
                        info!(channel = %id, "Peer disconnected");
                        break;
                    }
                    Ok(_) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        match decode(&line) {
                            Ok(message) => {
                                debug!(channel = %id, kind = %message.kind, "Routing message");
                                route(&queues, message).await;
                            }
                            Err(e) => {
                                warn!(channel = %id, "Discarding undecodable message: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        error!(channel = %id, "Error reading from channel: {}", e);
                        break;
                    }
                }
            }
        }
    }

    shutdown.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

    fn pair() -> (Channel, DuplexStream) {
        let (server, client) = tokio::io::duplex(4096);
        (Channel::new(server), client)
    }

    async fn write_lines(client: &mut DuplexStream, lines: &[&str]) {
        for line in lines {
            client.write_all(line.as_bytes()).await.unwrap();
            client.write_all(b"\n").await.unwrap();
        }
        client.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_per_type_fifo() {
        let (channel, mut client) = pair();
        channel.start().await;

        write_lines(
            &mut client,
            &[
                r#"{"type": "log", "content": "a"}"#,
                r#"{"type": "confirmation", "content": "1"}"#,
                r#"{"type": "log", "content": "b"}"#,
                r#"{"type": "confirmation", "content": "2"}"#,
            ],
        )
        .await;

        assert_eq!(channel.receive("confirmation").await.unwrap().content_str(), "1");
        assert_eq!(channel.receive("confirmation").await.unwrap().content_str(), "2");
        assert_eq!(channel.receive("log").await.unwrap().content_str(), "a");
        assert_eq!(channel.receive("log").await.unwrap().content_str(), "b");
    }

    #[tokio::test]
    async fn test_untyped_message_routes_to_default() {
        let (channel, mut client) = pair();
        channel.start().await;

        write_lines(&mut client, &[r#"{"content": "start"}"#]).await;

        let msg = channel.receive("default").await.unwrap();
        assert_eq!(msg.content_str(), "start");
    }

    #[tokio::test]
    async fn test_undecodable_line_is_skipped() {
        let (channel, mut client) = pair();
        channel.start().await;

        write_lines(&mut client, &["garbage", "", r#"{"type": "stop"}"#]).await;

        let msg = channel.receive("stop").await.unwrap();
        assert!(msg.is("stop"));
        assert!(!channel.is_closed());
    }

    #[tokio::test]
    async fn test_send_writes_ndjson_line() {
        let (channel, client) = pair();
        channel.send("log", "hello").await.unwrap();

        let mut reader = BufReader::new(client);
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();

        let msg = decode(&line).unwrap();
        assert_eq!(msg.kind, "log");
        assert_eq!(msg.content_str(), "hello");
    }

    #[tokio::test]
    async fn test_receive_after_stop_returns_closed() {
        let (channel, _client) = pair();
        channel.start().await;
        channel.stop().await;

        let result = channel.receive("confirmation").await;
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_queued_messages_drain_after_close() {
        let (channel, mut client) = pair();
        channel.start().await;

        write_lines(&mut client, &[r#"{"type": "question", "content": "late"}"#]).await;
        drop(client);

        // Wait for the loop to observe EOF
        channel.shutdown_token().cancelled().await;

        let msg = channel.receive("question").await.unwrap();
        assert_eq!(msg.content_str(), "late");
        assert!(matches!(
            channel.receive("question").await,
            Err(ChannelError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_peer_disconnect_wakes_waiting_receiver() {
        let (channel, client) = pair();
        let channel = Arc::new(channel);
        channel.start().await;

        let waiter = {
            let channel = Arc::clone(&channel);
            tokio::spawn(async move { channel.receive("stop").await })
        };

        drop(client);
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ChannelError::Closed)));
    }

    #[tokio::test]
    async fn test_receive_timeout() {
        let (channel, _client) = pair();
        channel.start().await;

        let result = channel
            .receive_timeout("confirmation", Some(Duration::from_millis(20)))
            .await;
        assert!(matches!(result, Err(ChannelError::Timeout(kind)) if kind == "confirmation"));
    }

    #[tokio::test]
    async fn test_configured_reply_timeout_applies() {
        let (server, _client) = tokio::io::duplex(64);
        let channel = Channel::new(server).with_reply_timeout(Some(Duration::from_millis(10)));
        channel.start().await;

        assert!(matches!(
            channel.receive("question").await,
            Err(ChannelError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let (channel, mut client) = pair();
        channel.start().await;
        channel.start().await;

        write_lines(&mut client, &[r#"{"type": "log", "content": "once"}"#]).await;
        assert_eq!(channel.receive("log").await.unwrap().content_str(), "once");
    }

    #[tokio::test]
    async fn test_send_failure_shuts_down() {
        let (channel, client) = pair();
        drop(client);

        let result = channel.send("log", "nobody home").await;
        assert!(matches!(result, Err(ChannelError::WriteFailed(_))));
        assert!(channel.is_closed());
    }
}
