// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transport helpers for the typed message channel.
//!
//! A channel runs over any byte stream. The server accepts Unix socket
//! connections; the `stdio` command uses the process's standard streams.

use std::io;
use std::path::Path;

use tokio::io::{AsyncRead, AsyncWrite};

pub trait ChannelIo: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ChannelIo for T where T: AsyncRead + AsyncWrite + Unpin + Send {}

pub type BoxedReader = Box<dyn AsyncRead + Unpin + Send>;
pub type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

/// Reader and writer halves of the process's standard streams.
pub fn stdio() -> (BoxedReader, BoxedWriter) {
    (Box::new(tokio::io::stdin()), Box::new(tokio::io::stdout()))
}

#[cfg(unix)]
pub use self::unix::{bind, cleanup, ChannelListener};

#[cfg(unix)]
mod unix {
    use super::*;
    use tokio::net::{UnixListener, UnixStream};

    /// Listening Unix domain socket.
    pub struct ChannelListener {
        inner: UnixListener,
    }

    /// Bind a listener at `path`, replacing a stale socket file.
    pub async fn bind(path: &Path) -> io::Result<ChannelListener> {
        if path.exists() {
            let _ = std::fs::remove_file(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let inner = UnixListener::bind(path)?;
        Ok(ChannelListener { inner })
    }

    impl ChannelListener {
        pub async fn accept(&self) -> io::Result<UnixStream> {
            let (stream, _addr) = self.inner.accept().await?;
            Ok(stream)
        }
    }

    /// Remove the socket file if it is still present.
    pub fn cleanup(path: &Path) -> io::Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}
