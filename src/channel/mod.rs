// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Typed message channel between the control plane and its client.
//!
//! # Protocol
//!
//! Newline-delimited JSON, one `{"type": ..., "content": ...}` object per
//! line. Inbound messages are queued per `type`; a message without a `type`
//! is filed under `default`.
//!
//! # Transports
//!
//! - Unix domain socket (`codepilot serve`)
//! - Standard input/output (`codepilot stdio`)
//! - In-memory duplex streams in tests

pub mod error;
pub mod mux;
pub mod protocol;
pub mod transport;

pub use error::{ChannelError, ChannelResult};
pub use mux::Channel;
pub use protocol::{decode, encode, MessageKind, TypedMessage, DEFAULT_MESSAGE_TYPE};
pub use transport::{BoxedReader, BoxedWriter, ChannelIo};
