// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Client side of an in-memory channel for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

use codepilot::channel::{decode, Channel, TypedMessage};

pub struct TestClient {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl TestClient {
    /// Next message from the server.
    pub async fn next(&mut self) -> TypedMessage {
        let line = self
            .lines
            .next_line()
            .await
            .expect("read failed")
            .expect("server closed the channel");
        decode(&line).expect("server sent invalid JSON")
    }

    /// Read until a message of `kind` arrives, returning everything seen including it.
    pub async fn until(&mut self, kind: &str) -> Vec<TypedMessage> {
        let mut seen = Vec::new();
        loop {
            let msg = self.next().await;
            let done = msg.is(kind);
            seen.push(msg);
            if done {
                return seen;
            }
        }
    }

    pub async fn send(&mut self, kind: &str, content: impl Into<Value>) {
        self.send_json(json!({"type": kind, "content": content.into()}))
            .await;
    }

    pub async fn send_json(&mut self, value: Value) {
        let line = format!("{}\n", value);
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("write failed");
    }

    pub async fn send_raw(&mut self, raw: &str) {
        self.writer
            .write_all(raw.as_bytes())
            .await
            .expect("write failed");
    }
}

/// A started server channel and its client.
pub async fn connected() -> (Arc<Channel>, TestClient) {
    let (server, client) = tokio::io::duplex(256 * 1024);
    let channel = Arc::new(Channel::new(server));
    channel.start().await;
    (channel, client_for(client))
}

/// An unstarted server channel and its client.
pub fn pair() -> (Channel, TestClient) {
    let (server, client) = tokio::io::duplex(256 * 1024);
    (Channel::new(server), client_for(client))
}

fn client_for(stream: DuplexStream) -> TestClient {
    let (read, writer) = tokio::io::split(stream);
    TestClient {
        lines: BufReader::new(read).lines(),
        writer,
    }
}

/// Contents of all `log` messages.
pub fn logs(messages: &[TypedMessage]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.is("log"))
        .map(TypedMessage::content_str)
        .collect()
}
